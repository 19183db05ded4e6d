pub mod bundle;
pub mod config;
#[cfg(feature = "diagnostics")]
pub mod diagnostics;
pub mod error;
pub mod explore;
pub mod features;
pub mod formation;
pub mod input;
pub mod models;
pub mod recommendation;
pub mod tier;

pub use bundle::ModelBundle;
pub use config::EngineConfig;
pub use error::{Error, Result};
