//! Concrete [`TransitApi`](crate::services::transit_api::TransitApi) sources.

mod file_source;
pub mod socrata;

pub use file_source::FileSource;
