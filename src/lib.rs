#![forbid(unsafe_code)]

pub mod capture;
pub mod config;
pub mod devices;
pub mod errors;
pub mod interrupt;
pub mod service;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
