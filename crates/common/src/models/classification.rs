use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::signal::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approved,
    Blocked,
}

impl Decision {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "APPROVED" | "APPROVE" => Some(Decision::Approved),
            "BLOCKED" | "BLOCK" => Some(Decision::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    #[default]
    Standard,
    Scalping,
    Parabolic,
    BlackSwan,
}

impl Profile {
    /// Ignores case, spaces, dashes and underscores.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "standard" => Some(Profile::Standard),
            "scalping" | "scalp" => Some(Profile::Scalping),
            "parabolic" => Some(Profile::Parabolic),
            "blackswan" => Some(Profile::BlackSwan),
            _ => None,
        }
    }

    pub const fn risk_fraction(self) -> f64 {
        match self {
            Profile::Scalping => 0.015,
            Profile::Standard => 0.03,
            Profile::Parabolic => 0.04,
            Profile::BlackSwan => 0.04,
        }
    }

    pub const fn target_rule(self) -> TargetRule {
        match self {
            Profile::Scalping => TargetRule::FirstTarget,
            Profile::Standard => TargetRule::SecondTarget,
            Profile::Parabolic | Profile::BlackSwan => {
                TargetRule::ExtendedSecondTarget { multiplier: 5.0 }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Standard => "Standard",
            Profile::Scalping => "Scalping",
            Profile::Parabolic => "Parabolic",
            Profile::BlackSwan => "BlackSwan",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetRule {
    FirstTarget,
    SecondTarget,
    /// `entry ± multiplier × |tp2 − entry|`, signed by side.
    ExtendedSecondTarget { multiplier: f64 },
}

impl TargetRule {
    /// Raw target before sanitization. An extended target needs a usable
    /// `tp2`; without one the result is NaN so the fallback applies.
    pub fn target_price(self, side: Side, entry: f64, tp1: f64, tp2: f64) -> f64 {
        match self {
            TargetRule::FirstTarget => tp1,
            TargetRule::SecondTarget => tp2,
            TargetRule::ExtendedSecondTarget { .. } if !tp2.is_finite() || tp2 <= 0.0 => f64::NAN,
            TargetRule::ExtendedSecondTarget { multiplier } => {
                entry + side.direction() * multiplier * (tp2 - entry).abs()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub decision: Decision,
    pub profile: Profile,
    pub reason: String,
}

impl Classification {
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Approved,
            profile: Profile::Standard,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_names_are_lenient() {
        assert_eq!(Profile::parse("Parabolic"), Some(Profile::Parabolic));
        assert_eq!(Profile::parse("black swan"), Some(Profile::BlackSwan));
        assert_eq!(Profile::parse("BLACK_SWAN"), Some(Profile::BlackSwan));
        assert_eq!(Profile::parse("scalping"), Some(Profile::Scalping));
        assert_eq!(Profile::parse("YOLO"), None);
    }

    #[test]
    fn test_risk_table() {
        assert_eq!(Profile::Scalping.risk_fraction(), 0.015);
        assert_eq!(Profile::Standard.risk_fraction(), 0.03);
        assert_eq!(Profile::Parabolic.risk_fraction(), 0.04);
        assert_eq!(Profile::BlackSwan.risk_fraction(), 0.04);
    }

    #[test]
    fn test_target_rules() {
        let (entry, tp1, tp2) = (95_000.0, 96_000.0, 97_000.0);
        assert_eq!(
            Profile::Scalping.target_rule().target_price(Side::Buy, entry, tp1, tp2),
            96_000.0
        );
        assert_eq!(
            Profile::Standard.target_rule().target_price(Side::Buy, entry, tp1, tp2),
            97_000.0
        );
        assert_eq!(
            Profile::Parabolic.target_rule().target_price(Side::Buy, entry, tp1, tp2),
            105_000.0
        );
        // Short: distance is taken in absolute terms and pointed downwards.
        assert_eq!(
            Profile::BlackSwan
                .target_rule()
                .target_price(Side::Sell, 40_000.0, 39_000.0, 38_000.0),
            30_000.0
        );
    }

    #[test]
    fn test_extended_target_without_second_level_is_nan() {
        for tp2 in [0.0, -1.0, f64::NAN] {
            for profile in [Profile::Parabolic, Profile::BlackSwan] {
                let target = profile
                    .target_rule()
                    .target_price(Side::Sell, 95_000.0, 94_000.0, tp2);
                assert!(target.is_nan(), "{profile} {tp2}");
            }
        }
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!(Decision::parse("approved"), Some(Decision::Approved));
        assert_eq!(Decision::parse(" BLOCKED "), Some(Decision::Blocked));
        assert_eq!(Decision::parse("maybe"), None);
    }
}
