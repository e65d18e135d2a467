//! The Bronze → Silver → Gold stage contract.
//!
//! Each stage reads the whole source object, derives its output purely from
//! it, and overwrites the destination object.

pub mod aggregate;
pub mod clean;
pub mod parser;
pub mod stages;
pub mod stats;
pub mod types;
pub mod utility;
