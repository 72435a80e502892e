pub mod client;
pub mod error;
pub mod format;
pub mod remote;
pub mod traits;

pub use client::ExchangeClient;
pub use error::ExchangeError;
pub use remote::WeexClient;
