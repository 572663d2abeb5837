//! Shared test utilities for doctrack integration tests.
//!
//! This module provides:
//! - `JobBuilder` for registering a job with a prepared stage history
//! - `shared_registry` for tests that hand the registry to several threads

#![allow(dead_code)]

pub mod builders;

use std::sync::Arc;

#[allow(unused_imports)]
pub use builders::JobBuilder;
use doctrack::JobRegistry;

/// Registry shared the way a pipeline host shares it.
pub fn shared_registry() -> Arc<JobRegistry> {
    Arc::new(JobRegistry::new())
}

/// Ids of the given records, in order.
pub fn ids<H>(jobs: &[doctrack::TrackedJob<H>]) -> Vec<String> {
    jobs.iter().map(|job| job.id.clone()).collect()
}
