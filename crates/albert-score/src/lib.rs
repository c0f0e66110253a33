//! Albert Score: a stateful financial health scoring engine with its HTTP and ledger surfaces.

pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
