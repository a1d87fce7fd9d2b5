//! HTTP service and command-line front end for the scheduler.
//!
//! The binary reads [`config::Config`], then either serves the JSON API
//! together with the static front end, or resolves a single repeat rule.

pub mod api;
pub mod cli;
pub mod config;
pub mod telemetry;
