//! Domain types for the deployment pipeline.
//!
//! This module contains the core data structures:
//! - DeployRequest: one accepted unit of work
//! - ArtifactSet: generated files destined for a repository
//! - Deployment / DeploymentReport: publish outcome and callback payload

pub mod artifact;
pub mod deployment;
pub mod request;

// Re-export commonly used types
pub use artifact::{ArtifactSet, INDEX_HTML, LICENSE_FILE, README_MD};
pub use deployment::{Deployment, DeploymentReport, Stage};
pub use request::{Attachment, DeployRequest};
