//! Flight status board
//!
//! Normalizes live telemetry and departure/arrival lists from third-party
//! flight data providers and serves them over HTTP.

pub mod board;
pub mod config;
pub mod errors;
pub mod models;
pub mod normalizer;
pub mod provider;
pub mod reference;
pub mod scheduler;
pub mod server;
pub mod service;
