use std::fmt;

use common::models::{Classification, Decision, Profile, Side};

#[derive(Debug, Clone, PartialEq)]
pub enum VetoReason {
    /// BlackSwan only ever sells.
    BlackSwanBuy,
    Blocked(String),
}

impl fmt::Display for VetoReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VetoReason::BlackSwanBuy => f.write_str("BlackSwan profile forbids buying"),
            VetoReason::Blocked(reason) => write!(f, "blocked by classifier: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    Proceed,
    Veto(VetoReason),
}

/// The BlackSwan/buy check runs first and ignores the decision field.
pub fn gate(classification: &Classification, side: Side) -> Gate {
    if classification.profile == Profile::BlackSwan && side == Side::Buy {
        return Gate::Veto(VetoReason::BlackSwanBuy);
    }
    if classification.decision == Decision::Blocked {
        return Gate::Veto(VetoReason::Blocked(classification.reason.clone()));
    }
    Gate::Proceed
}
