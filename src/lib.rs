pub mod api;
pub mod config;
pub mod persistence;
pub mod quotes;
pub mod trade;
pub mod types;
