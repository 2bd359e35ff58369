pub mod cache;
pub mod card;
pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod render;
pub mod report;
