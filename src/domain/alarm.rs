//! Alarm bands derived from the active settings.

use serde::{Deserialize, Serialize};

use super::settings::{format_number, ParamKey};

/// Low/high alarm limits around a current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmRange {
    pub low: f64,
    pub high: f64,
    pub current: f64,
    pub unit: String,
}

impl AlarmRange {
    /// `low - high unit`, using the parameter's display precision.
    #[must_use]
    pub fn describe(&self, key: ParamKey) -> String {
        let p = key.precision();
        format!(
            "{} - {} {}",
            format_number(self.low, p),
            format_number(self.high, p),
            self.unit
        )
    }
}

/// Alarm bands for the monitored parameters. A band is absent when the
/// active settings do not carry its parameter (e.g. no rate in CPAP).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmRanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<AlarmRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mvent: Option<AlarmRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peep: Option<AlarmRange>,
}

impl AlarmRanges {
    /// Present bands, keyed by parameter, in display order.
    #[must_use]
    pub fn entries(&self) -> Vec<(ParamKey, &AlarmRange)> {
        [
            (ParamKey::RespiratoryRate, self.respiratory_rate.as_ref()),
            (ParamKey::Mvent, self.mvent.as_ref()),
            (ParamKey::Peep, self.peep.as_ref()),
        ]
        .into_iter()
        .filter_map(|(k, r)| r.map(|r| (k, r)))
        .collect()
    }
}
