//! Statistical reductions used by the monthly accumulator
//!
//! This module provides the two means the pipeline needs: a NaN-skipping mean
//! along one axis (collapsing a snapshot's time axis) and a NaN-skipping mean
//! of two equally shaped arrays (the time-mean merge of a bucket).
//!
//! # Organization
//!
//! - [`operations`]: reduction traits and the sequential kernels behind them

pub mod operations;

pub use operations::{nanmean_axis, nanmean_pair, StatOperation, StatisticalReduction};
