use serde::{Deserialize, Serialize};

use super::enums::{PrivacyLevel, PrivacyMode, StageLevel};

/// One owner's caregiving profile in canonical shape.
///
/// `legal_name`, `hospital` and caregiver names are owner-only fields;
/// the disclosure layer never copies them into shared output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseProfile {
    pub case_id: u32,
    pub display_name: String,
    pub legal_name: Option<String>,
    pub birth_year: Option<i32>,
    pub gender: Option<String>,
    pub diagnosis: Diagnosis,
    pub stage: Stage,
    pub privacy_mode: PrivacyMode,
    pub share_token: Option<String>,
    pub caregivers: Vec<Caregiver>,
    pub hospital: HospitalInfo,
    pub notes: Option<String>,
    pub activity: ActivitySummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub name: Option<String>,
    pub diagnosed_year: Option<i32>,
    pub notes: Option<String>,
}

/// Computed and manual stage are kept independently; manual wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub auto: StageLevel,
    pub manual: Option<StageLevel>,
}

impl Stage {
    pub fn effective(&self) -> StageLevel {
        self.manual.unwrap_or(self.auto)
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            auto: StageLevel::Unknown,
            manual: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caregiver {
    pub name: String,
    pub relation: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalInfo {
    pub name: Option<String>,
    pub department: Option<String>,
    pub doctor: Option<String>,
}

/// Filled from the case list handed to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub case_count: u32,
    pub first_event_date: Option<String>,
    pub last_event_date: Option<String>,
}

/// One cognitive-scale result used to compute `stage.auto`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleResult {
    pub scale: String,
    pub score: f64,
    pub date: Option<String>,
}

impl CaseProfile {
    pub fn privacy_level(&self) -> PrivacyLevel {
        self.privacy_mode.level()
    }

    /// Index-based pseudonyms: "Primary caregiver", "Caregiver A", "Caregiver B", ...
    pub fn caregiver_pseudonyms(&self) -> Vec<String> {
        (0..self.caregivers.len()).map(caregiver_pseudonym).collect()
    }

    /// Strings that must never leave the owner tier verbatim.
    pub fn sensitive_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        terms.extend(self.legal_name.iter().cloned());
        terms.extend(self.hospital.name.iter().cloned());
        terms.extend(self.hospital.doctor.iter().cloned());
        terms.extend(self.caregivers.iter().map(|c| c.name.clone()));
        terms.retain(|t| !t.trim().is_empty());
        terms
    }
}

pub fn caregiver_pseudonym(index: usize) -> String {
    if index == 0 {
        return "Primary caregiver".to_string();
    }
    let mut n = index - 1;
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    format!("Caregiver {letters}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudonyms_are_index_based() {
        assert_eq!(caregiver_pseudonym(0), "Primary caregiver");
        assert_eq!(caregiver_pseudonym(1), "Caregiver A");
        assert_eq!(caregiver_pseudonym(2), "Caregiver B");
        assert_eq!(caregiver_pseudonym(26), "Caregiver Z");
        assert_eq!(caregiver_pseudonym(27), "Caregiver AA");
    }

    #[test]
    fn manual_stage_overrides_auto() {
        let stage = Stage {
            auto: StageLevel::Mild,
            manual: Some(StageLevel::Moderate),
        };
        assert_eq!(stage.effective(), StageLevel::Moderate);
        assert_eq!(Stage::default().effective(), StageLevel::Unknown);
    }
}
