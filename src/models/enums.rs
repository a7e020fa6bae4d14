use serde::{Deserialize, Serialize};

/// Error returned when a stored string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form doubles as the serde representation.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        $(#[$meta])*
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(EntryStatus {
    Draft => "draft",
    Published => "published",
    Archived => "archived",
});

str_enum!(
    /// Disclosure tier for a non-owner. Variants are declared in increasing
    /// order of disclosure, so `Ord` compares how much a scope reveals.
    #[derive(PartialOrd, Ord)]
    ShareScope {
        None => "NONE",
        TitleOnly => "TITLE_ONLY",
        SummaryOnly => "SUMMARY_ONLY",
        FullAccess => "FULL_ACCESS",
    }
);

str_enum!(
    /// Tag attached to a text blob or digest. The local keyword scan only
    /// ever emits `ClinicalReviewRequired`; the category flags come from the
    /// provider's structured classification.
    #[derive(PartialOrd, Ord)]
    RiskFlag {
        ClinicalReviewRequired => "CLINICAL_REVIEW_REQUIRED",
        SelfHarm => "SELF_HARM",
        Violence => "VIOLENCE",
        Substance => "SUBSTANCE",
        Psychosis => "PSYCHOSIS",
        Abuse => "ABUSE",
    }
);

str_enum!(
    #[derive(PartialOrd, Ord)]
    RiskLevel {
        None => "NONE",
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
    }
);

str_enum!(SentimentTrend {
    Improving => "improving",
    Stable => "stable",
    Declining => "declining",
});

str_enum!(SummaryPeriod {
    Week => "week",
    Month => "month",
    Quarter => "quarter",
});

impl SummaryPeriod {
    /// Maximum number of bullets kept after salience filtering.
    pub fn bullet_cap(&self) -> usize {
        match self {
            Self::Week => 7,
            Self::Month => 20,
            Self::Quarter => 30,
        }
    }
}
