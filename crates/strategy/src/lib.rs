pub mod chat;
pub mod classifier;
pub mod gate;
pub mod prompt;
pub mod verdict;

pub use classifier::{Classifier, ClassifierError, GroqClassifier, MarketContext};
pub use gate::{Gate, VetoReason, gate};
