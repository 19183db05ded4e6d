pub mod dataset;
pub mod error;
pub mod levels;
pub mod models;

pub use error::{Error, Result};
