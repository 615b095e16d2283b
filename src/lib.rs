//! Trend widget core: statistics, least-squares trend line and deviation
//! bands over a labelled time series, plus the selection / fetch pipeline
//! that decides when they are recomputed.

pub mod color;
pub mod config;
pub mod data;
pub mod engine;
pub mod pipeline;
pub mod state;
pub mod worker;
