pub mod capture;
pub mod config;
pub mod error;
pub mod models;
pub mod replay;
pub mod restore;
pub mod visca;

#[cfg(test)]
mod testing;

pub use error::{AppError, Result};
