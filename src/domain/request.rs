//! Inbound deployment request.
//!
//! A DeployRequest is the unit of work for the whole pipeline: one request
//! produces one generated app, one repository, and one callback notification.

use serde::{Deserialize, Serialize};

/// A single deployment request, owned by exactly one orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    /// Requester email, echoed back in the completion notification
    pub email: String,

    /// Task identifier, combined with the round to derive the repository name
    pub task: String,

    /// Revision counter for repeated attempts on the same task
    #[serde(default = "default_round")]
    pub round: u32,

    /// Opaque correlation token echoed back in the completion notification
    pub nonce: String,

    /// Natural-language description of the application to generate
    pub brief: String,

    /// Acceptance criteria the generated application must satisfy
    #[serde(default)]
    pub checks: Vec<String>,

    /// Callback URL that receives the completion notification
    pub evaluation_url: String,

    /// Supporting files, referenced by name and URL in the model prompt
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A named attachment reference; the URL may be a data URI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename the attachment should be known by
    pub name: String,

    /// Location of the attachment content
    pub url: String,
}

fn default_round() -> u32 {
    1
}
