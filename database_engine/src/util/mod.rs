//! Utilities for moving row data out of Apache Arrow and into drivers.

pub mod escape;
mod hash;
mod project;
pub mod value;

pub use hash::{surrogate_hash, with_surrogate_key};
pub use project::project_by_name;
pub use value::Value;
