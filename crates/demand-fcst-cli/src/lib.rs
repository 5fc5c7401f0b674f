//! Training runner and forecast query tool for `demand-fcst-core`.

pub mod app;
pub mod cli;
pub mod error;

pub use error::AppError;
