//! LNXMirror Core - Domain types and ports for one-way directory mirroring
//!
//! This crate contains the hexagonal core shared by the mirroring engine,
//! the operation log and the CLI:
//! - **Domain types** - `DirectoryHandle`, `ComparisonResult`, `Operation`
//! - **Port definitions** - `IMirrorFileSystem`, `IOperationSink`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module holds plain data with no I/O. Ports define the trait
//! interfaces the engine in `lnxmirror-sync` is written against, so the
//! reconciliation logic can be exercised with test doubles.

pub mod config;
pub mod domain;
pub mod ports;
