//! Core domain + application logic for the Discord conversation export bot.
//!
//! This crate is intentionally framework-agnostic. Discord and the PDF backend
//! live behind ports (traits) implemented in adapter crates.

pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod export;
pub mod logging;
pub mod ports;
pub mod session;

pub use errors::{Error, Result};
