pub mod responses;
pub mod weex_client;

pub use weex_client::WeexClient;
