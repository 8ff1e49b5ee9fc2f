//! VentAssist: ventilator settings calculator and ABG interpreter
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ventassist::tui::App;

fn main() -> Result<()> {
    // The TUI owns the terminal, so interactive runs log to a file and
    // piped runs log to stdout.
    let log_mode = std::env::var("VENTASSIST_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let use_file = match log_mode.as_str() {
        "file" => true,
        "stdout" => false,
        _ => std::io::stdout().is_terminal(),
    };

    let (writer, _guard) = if use_file {
        let log_file = std::env::var("VENTASSIST_LOG_FILE")
            .unwrap_or_else(|_| "ventassist.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    tracing::info!("Starting VentAssist...");

    let mut app = App::new()?;
    app.run()?;

    tracing::info!("VentAssist shutdown complete.");
    Ok(())
}
