//! Tutor Control - polling client for the tutor daemon.

pub mod client;
pub mod poll;

pub use client::TutordClient;
pub use poll::{poll_until_terminal, PollOutcome};
