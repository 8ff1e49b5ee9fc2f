//! Static laboratory reference rows.

use serde::Serialize;

/// One row of the lab reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub test_name: &'static str,
    pub tube_type: &'static str,
    /// Empty when the laboratory reports its own reference interval
    pub normal_range: &'static str,
}

pub const LAB_TESTS: &[LabTest] = &[
    LabTest {
        test_name: "CBC",
        tube_type: "Lavender (EDTA)",
        normal_range: "WBC: 4-10, RBC: 4.5-5.9, HGB: 13-17",
    },
    LabTest {
        test_name: "AMMONIA",
        tube_type: "Lavender (EDTA), on ice",
        normal_range: "15-45 µg/dL",
    },
    LabTest {
        test_name: "NA",
        tube_type: "Gold (SST)",
        normal_range: "135-145 mEq/L",
    },
    LabTest {
        test_name: "K",
        tube_type: "Gold (SST)",
        normal_range: "3.5-5.0 mEq/L",
    },
    LabTest {
        test_name: "Glucose",
        tube_type: "Gray (Fluoride)",
        normal_range: "70-110 mg/dL (fasting)",
    },
    LabTest {
        test_name: "Cholesterol",
        tube_type: "Red or Gold (SST)",
        normal_range: "< 200 mg/dL",
    },
    LabTest {
        test_name: "CRP",
        tube_type: "Green (Heparin)",
        normal_range: "< 10 mg/L",
    },
    LabTest {
        test_name: "D-DIMER",
        tube_type: "Light blue (Citrate)",
        normal_range: "< 0.5 µg/mL FEU",
    },
    LabTest {
        test_name: "PT-PTT",
        tube_type: "Light blue (Citrate)",
        normal_range: "",
    },
];
