pub mod api_client;
pub mod dispatch;
pub mod engine;
pub mod protocol;
pub mod store;
