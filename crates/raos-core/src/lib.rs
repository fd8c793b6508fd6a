pub mod cache;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fence;
pub mod gate;
pub mod io;
pub mod mockup;
pub mod paths;
pub mod pipeline;
pub mod requirement;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ExtractionError, GenerationError, RaosError, Result};
pub use pipeline::Pipeline;
