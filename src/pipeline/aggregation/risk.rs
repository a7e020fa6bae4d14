use std::collections::BTreeSet;

use crate::models::{RiskFlag, RiskLevel};

/// Overall risk level for a set of flags.
///
/// Self-harm or violence is `HIGH`, substance use or psychosis `MEDIUM`,
/// any other flag `LOW`.
pub fn aggregate_risk_level(flags: &BTreeSet<RiskFlag>) -> RiskLevel {
    flags
        .iter()
        .map(|flag| match flag {
            RiskFlag::SelfHarm | RiskFlag::Violence => RiskLevel::High,
            RiskFlag::Substance | RiskFlag::Psychosis => RiskLevel::Medium,
            RiskFlag::ClinicalReviewRequired | RiskFlag::Abuse => RiskLevel::Low,
        })
        .max()
        .unwrap_or(RiskLevel::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(flags: &[RiskFlag]) -> RiskLevel {
        aggregate_risk_level(&flags.iter().copied().collect())
    }

    #[test]
    fn no_flags_is_none() {
        assert_eq!(level(&[]), RiskLevel::None);
    }

    #[test]
    fn review_flag_alone_is_low() {
        assert_eq!(level(&[RiskFlag::ClinicalReviewRequired]), RiskLevel::Low);
        assert_eq!(level(&[RiskFlag::Abuse]), RiskLevel::Low);
    }

    #[test]
    fn substance_or_psychosis_is_medium() {
        assert_eq!(level(&[RiskFlag::Substance]), RiskLevel::Medium);
        assert_eq!(
            level(&[RiskFlag::Psychosis, RiskFlag::ClinicalReviewRequired]),
            RiskLevel::Medium
        );
    }

    #[test]
    fn self_harm_or_violence_is_high() {
        assert_eq!(level(&[RiskFlag::Violence]), RiskLevel::High);
        assert_eq!(
            level(&[RiskFlag::Substance, RiskFlag::SelfHarm]),
            RiskLevel::High
        );
    }
}
