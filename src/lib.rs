pub mod api;
pub mod config;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod poller;
pub mod status;
