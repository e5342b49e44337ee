//! Core module: configuration
//!
//! - [`Config`] - store configuration loaded from the environment

pub mod config;

pub use config::Config;
