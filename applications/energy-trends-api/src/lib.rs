pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod services;
pub mod trends;

pub use config::Config;
pub use error::{AppError, Result};
