//! Tutor daemon library - exposes modules for testing.

pub mod answer;
pub mod config;
pub mod error;
pub mod health;
pub mod orchestrator;
pub mod render;
pub mod routes;
pub mod server;
pub mod status;
pub mod store;
