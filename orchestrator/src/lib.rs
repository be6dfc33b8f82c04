pub mod agents;
pub mod api;
pub mod config;
pub mod emailer;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod research;
pub mod sessions;
