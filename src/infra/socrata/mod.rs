mod client;

pub use client::{DEFAULT_ENDPOINT, DEFAULT_ROW_LIMIT, SocrataClient};
