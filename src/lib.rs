//! Medallion ETL for transit ridership: ingest raw CSV into Bronze, clean it
//! into Silver, aggregate it into Gold, and fit a ridership model on Gold.

pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod services;
pub mod storage;
