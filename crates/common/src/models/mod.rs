pub mod classification;
pub mod exchange;
pub mod signal;

pub use classification::{Classification, Decision, Profile, TargetRule};
pub use exchange::{Asset, Fill, OrderAck, Order, PlanType, Position, PositionSide, TriggerRequest};
pub use signal::{InboundSignal, Side, SignalError, TradeSignal};
