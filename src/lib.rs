pub mod error;
pub mod extractor;
pub mod variant;
pub mod sweep;
pub mod runner;
pub mod driver;
pub mod results;
pub mod report;
pub mod chart;
pub mod config;

pub use error::{Error, Result};
