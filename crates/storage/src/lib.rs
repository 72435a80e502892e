pub mod trade_memory;

pub use trade_memory::{TradeMemory, TradeMemoryEntry};
