//! # Tezlik Speed Test Library
//!
//! This library provides the core functionality for the tezlik speed-test
//! service, including handlers, models, and server configuration.

pub mod auth;
pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod server;
pub mod speedtest;
pub mod telemetry;
pub use migration;
