pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod session;
pub mod strategy;

pub use error::{ConsolidateError, Result};
