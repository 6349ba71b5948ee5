//! Core pipeline logic.
//!
//! This module contains:
//! - Generator: artifact synthesis with deterministic fallback
//! - Publisher: repository provisioning and content writes
//! - Notifier: callback delivery with bounded retry
//! - Orchestrator: stage sequencing and run tracking

pub mod generator;
pub mod notifier;
pub mod orchestrator;
pub mod publisher;

// Re-export commonly used types
pub use generator::Generator;
pub use notifier::{Notifier, RetryPolicy};
pub use orchestrator::{Orchestrator, RunError, RunSet};
pub use publisher::{PublishError, Publisher};
