use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed category set a fax can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaxCategory {
    MedicalRecords,
    LabResults,
    Prescriptions,
    Referrals,
    Insurance,
    Billing,
    PatientCorrespondence,
    Administrative,
    Urgent,
    Unknown,
}

/// Catalogue entry for UIs and prompts.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

impl FaxCategory {
    /// All categories in enumeration order. Keyword matching walks this order.
    pub const ALL: [FaxCategory; 10] = [
        Self::MedicalRecords,
        Self::LabResults,
        Self::Prescriptions,
        Self::Referrals,
        Self::Insurance,
        Self::Billing,
        Self::PatientCorrespondence,
        Self::Administrative,
        Self::Urgent,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MedicalRecords => "medical_records",
            Self::LabResults => "lab_results",
            Self::Prescriptions => "prescriptions",
            Self::Referrals => "referrals",
            Self::Insurance => "insurance",
            Self::Billing => "billing",
            Self::PatientCorrespondence => "patient_correspondence",
            Self::Administrative => "administrative",
            Self::Urgent => "urgent",
            Self::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MedicalRecords => "Medical Records",
            Self::LabResults => "Lab Results",
            Self::Prescriptions => "Prescriptions",
            Self::Referrals => "Referrals",
            Self::Insurance => "Insurance",
            Self::Billing => "Billing",
            Self::PatientCorrespondence => "Patient Correspondence",
            Self::Administrative => "Administrative",
            Self::Urgent => "Urgent",
            Self::Unknown => "Unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::MedicalRecords => "Patient medical records, charts, history",
            Self::LabResults => "Laboratory test results, blood work, diagnostic tests",
            Self::Prescriptions => "Prescription requests, medication orders, refill requests",
            Self::Referrals => "Patient referrals to specialists or other providers",
            Self::Insurance => "Insurance forms, authorizations, coverage information",
            Self::Billing => "Bills, invoices, payment information",
            Self::PatientCorrespondence => {
                "Letters to/from patients, appointment confirmations"
            }
            Self::Administrative => "Office memos, general administrative documents",
            Self::Urgent => "Time-sensitive documents requiring immediate attention",
            Self::Unknown => "Cannot determine category",
        }
    }

    pub fn info(&self) -> CategoryInfo {
        CategoryInfo {
            value: self.as_str(),
            label: self.label(),
            description: self.description(),
        }
    }

    pub fn catalogue() -> Vec<CategoryInfo> {
        Self::ALL.iter().map(FaxCategory::info).collect()
    }

    /// Lenient lookup used for model output: case-insensitive, and spaces or
    /// hyphens are accepted in place of underscores.
    pub fn parse_loose(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
    }
}

impl fmt::Display for FaxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaxCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s).ok_or_else(|| format!("unknown fax category '{}'", s))
    }
}
