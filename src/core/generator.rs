//! Artifact generation via a generative model.
//!
//! The generator never fails: a model error, an unparseable response, or a
//! response missing the required files all produce the deterministic
//! fallback artifact set, so the pipeline always has something to publish.

use tracing::{info, instrument, warn};

use crate::adapters::ModelClient;
use crate::domain::{ArtifactSet, DeployRequest, INDEX_HTML, README_MD};

/// Attachment URLs are referenced in the prompt by a bounded prefix only
const ATTACHMENT_URL_PREVIEW_CHARS: usize = 100;

/// Produces an [`ArtifactSet`] for a request
pub struct Generator<M: ModelClient> {
    model: M,
}

impl<M: ModelClient> Generator<M> {
    /// Create a generator backed by the given model client
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Generate artifacts for a request.
    ///
    /// Total: every failure path yields the fallback set, which always
    /// contains both required files.
    #[instrument(skip(self, request), fields(task = %request.task, round = request.round))]
    pub async fn generate(&self, request: &DeployRequest) -> ArtifactSet {
        let prompt = build_prompt(request);

        match self.model.complete(&prompt).await {
            Ok(response) => match extract_artifacts(&response) {
                Some(files) => {
                    info!(files = files.len(), "Model produced an artifact set");
                    files
                }
                None => {
                    warn!("No usable artifact object in model response, using fallback");
                    fallback_artifacts(request)
                }
            },
            Err(error) => {
                warn!(error = %error, "Model call failed, using fallback");
                fallback_artifacts(request)
            }
        }
    }
}

/// Assemble the single instruction sent to the model.
///
/// Attachments are referenced by name and a bounded URL prefix so large
/// data URIs never blow up the instruction size.
pub fn build_prompt(request: &DeployRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are an expert web developer. Generate a complete, working static web application.\n\n",
    );
    prompt.push_str(&format!("Task ID: {}\n", request.task));
    prompt.push_str(&format!("Round: {}\n\n", request.round));
    prompt.push_str(&format!("Brief: {}\n\n", request.brief));

    prompt.push_str("Requirements/Checks that MUST be satisfied:\n");
    for check in &request.checks {
        prompt.push_str(&format!("- {check}\n"));
    }

    if !request.attachments.is_empty() {
        prompt.push_str("\nAttachments provided:\n");
        for attachment in &request.attachments {
            prompt.push_str(&format!(
                "- {}: {}...\n",
                attachment.name,
                char_prefix(&attachment.url, ATTACHMENT_URL_PREVIEW_CHARS)
            ));
        }
    }

    prompt.push_str(concat!(
        "\nGenerate a JSON response with exactly this structure:\n",
        "{\n",
        "    \"index.html\": \"<complete HTML file content>\",\n",
        "    \"README.md\": \"<complete README content>\"\n",
        "}\n\n",
        "The index.html must:\n",
        "1. Be a complete, self-contained HTML file\n",
        "2. Include all CSS and JavaScript inline or from a CDN\n",
        "3. Satisfy ALL the checks listed above\n",
        "4. Decode and use attachments that are data URIs\n\n",
        "The README.md must include: a project summary, setup instructions, ",
        "a usage guide, an explanation of the code, and MIT license information.\n\n",
        "Return ONLY the JSON object, no other text.\n",
    ));

    prompt
}

/// Locate and parse the artifact object embedded in a model response.
///
/// The response may wrap the object in prose or code fences; the candidate
/// slice runs from the first `{` to the last `}` and must mention both
/// required filenames. Anything unparseable yields `None`.
pub fn extract_artifacts(response: &str) -> Option<ArtifactSet> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }

    let candidate = &response[start..=end];
    if !candidate.contains("\"index.html\"") || !candidate.contains("\"README.md\"") {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    ArtifactSet::from_json_object(&value)
}

/// Deterministic artifact set used whenever generation fails.
///
/// Self-contained: inline style only, no external network references.
pub fn fallback_artifacts(request: &DeployRequest) -> ArtifactSet {
    let mut check_items = String::new();
    for check in &request.checks {
        check_items.push_str(&format!("        <li>{check}</li>\n"));
    }

    let mut check_lines = String::new();
    for check in &request.checks {
        check_lines.push_str(&format!("- {check}\n"));
    }

    let index_html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{task}</title>
    <style>
        body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }}
        h1 {{ border-bottom: 1px solid #ccc; padding-bottom: 0.5rem; }}
        #output {{ margin-top: 1rem; }}
    </style>
</head>
<body>
    <h1>{task}</h1>
    <p>{brief}</p>
    <ul>
{checks}    </ul>
    <div id="output"></div>
    <script>
        console.log('Application for task {task} loaded');
    </script>
</body>
</html>
"#,
        task = request.task,
        brief = request.brief,
        checks = check_items,
    );

    let readme = format!(
        r#"# {task}

## Summary

{brief}

## Setup

No build step required. Open `index.html` in a browser, or serve this
directory with any static file server.

## Usage

The page renders immediately; interact with the controls it shows.

## Code Explanation

A single self-contained HTML page aiming to satisfy these checks:
{checks}
## License

MIT
"#,
        task = request.task,
        brief = request.brief,
        checks = check_lines,
    );

    let mut files = ArtifactSet::new();
    files.insert(INDEX_HTML, index_html);
    files.insert(README_MD, readme);
    files
}

/// First `max` characters of `s` (never splits a UTF-8 code point)
fn char_prefix(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
