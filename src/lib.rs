//! Core library for the `percentile-rollup` CLI.
//!
//! The binary scans a trailing window of access-log events, splits each
//! service's events into minute buckets, picks the p50/p80/p95/p99 events of
//! every bucket by nearest rank and writes one percentile record per service
//! and minute, skipping records that already exist. The pipeline is generic
//! over [`store::DocumentStore`]; [`store::ElasticsearchStore`] is the
//! production implementation; an in-memory store backs the unit tests.
pub mod args;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod store;
