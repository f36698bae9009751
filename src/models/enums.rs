use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + lenient parse + serde string form
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            /// Exact match on the canonical string form.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($s => Some(Self::$variant)),+,
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ShareMode {
    Private => "private",
    Token => "token",
    Public => "public",
});

impl ShareMode {
    /// Legacy `protected` is the old name of `token`. Anything unknown is
    /// treated as non-disclosure.
    pub fn canonicalize(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "protected" => Self::Token,
            other => Self::parse(other).unwrap_or(Self::Private),
        }
    }
}

str_enum!(Visibility {
    Private => "private",
    Family => "family",
    Clinician => "clinician",
    Anonymized => "anonymized",
});

impl Visibility {
    pub fn canonicalize(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "clinic" => Self::Clinician,
            "public" => Self::Anonymized,
            other => Self::parse(other).unwrap_or(Self::Private),
        }
    }
}

str_enum!(AnonymizationLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl AnonymizationLevel {
    pub fn canonicalize(s: &str) -> Self {
        Self::parse(s.trim().to_ascii_lowercase().as_str()).unwrap_or(Self::High)
    }
}

// Profile-wide privacy mode as stored on the profile.
str_enum!(PrivacyMode {
    Public => "public",
    Masked => "masked",
    Private => "private",
});

impl PrivacyMode {
    /// Accepts both the stored mode names and the share-level names
    /// (`limited` is the share-facing name of `masked`).
    pub fn canonicalize(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "limited" => Self::Masked,
            other => Self::parse(other).unwrap_or(Self::Private),
        }
    }

    pub fn level(self) -> PrivacyLevel {
        match self {
            Self::Public => PrivacyLevel::Public,
            Self::Masked => PrivacyLevel::Limited,
            Self::Private => PrivacyLevel::Private,
        }
    }
}

// Privacy level as seen by share-link holders.
str_enum!(PrivacyLevel {
    Private => "private",
    Limited => "limited",
    Public => "public",
});

str_enum!(SymptomCategory {
    Memory => "memory",
    Orientation => "orientation",
    Behavior => "behavior",
    Emotion => "emotion",
    Sleep => "sleep",
    Interaction => "interaction",
    Other => "other",
});

str_enum!(StageLevel {
    Unknown => "unknown",
    Normal => "normal",
    VeryMild => "very_mild",
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(Emotion {
    Positive => "positive",
    Neutral => "neutral",
    Negative => "negative",
});

str_enum!(RiskLevel {
    Low => "low",
    Moderate => "moderate",
    High => "high",
});

impl RiskLevel {
    pub fn from_severity(severity: u8) -> Self {
        match severity {
            0..=1 => Self::Low,
            2..=3 => Self::Moderate,
            _ => Self::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_mode_legacy_protected_maps_to_token() {
        assert_eq!(ShareMode::canonicalize("protected"), ShareMode::Token);
        assert_eq!(ShareMode::canonicalize("PUBLIC"), ShareMode::Public);
        assert_eq!(ShareMode::canonicalize("everyone"), ShareMode::Private);
    }

    #[test]
    fn visibility_aliases() {
        assert_eq!(Visibility::canonicalize("clinic"), Visibility::Clinician);
        assert_eq!(Visibility::canonicalize("public"), Visibility::Anonymized);
        assert_eq!(Visibility::canonicalize("family"), Visibility::Family);
        assert_eq!(Visibility::canonicalize(""), Visibility::Private);
    }

    #[test]
    fn privacy_mode_maps_to_share_level() {
        assert_eq!(PrivacyMode::canonicalize("limited"), PrivacyMode::Masked);
        assert_eq!(PrivacyMode::Masked.level(), PrivacyLevel::Limited);
        assert_eq!(PrivacyMode::canonicalize("???").level(), PrivacyLevel::Private);
    }

    #[test]
    fn category_order_is_declaration_order() {
        let names: Vec<_> = SymptomCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            vec!["memory", "orientation", "behavior", "emotion", "sleep", "interaction", "other"]
        );
        assert!(SymptomCategory::Memory < SymptomCategory::Other);
    }

    #[test]
    fn serde_uses_canonical_strings() {
        let json = serde_json::to_string(&Visibility::Clinician).unwrap();
        assert_eq!(json, "\"clinician\"");
        let back: StageLevel = serde_json::from_str("\"very_mild\"").unwrap();
        assert_eq!(back, StageLevel::VeryMild);
    }

    #[test]
    fn risk_from_severity() {
        assert_eq!(RiskLevel::from_severity(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_severity(3), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_severity(5), RiskLevel::High);
    }
}
