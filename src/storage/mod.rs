//! Storage module
//!
//! Object-store access for the job's input and output roots.
//!
//! # Overview
//!
//! This module provides:
//! - `Storage` - a root location on local disk, S3, GCS or Azure, with
//!   listing and cleanup through `object_store` and the matching location
//!   the query engine reads and writes

mod location;

pub use location::Storage;
