use std::sync::LazyLock;

use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

pub const INCIDENT_CREATE: &str = "OpsItem Create";

pub const INCIDENT_OPEN: &str = "Open";

const FIX_PREFIXES: &[&str] = &["fix", "hotfix"];

const FIX_SUFFIXES: &[&str] = &["hotfix", "fix"];

/// `from <ref>` up to the end of the line, where the ref contains a slash
static SOURCE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfrom[ \t]+([^\n/]*/[^\n]*)").expect("Invalid regex pattern")
});

/// Incident ticket lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentEvent {
    pub detail_type: String,
    pub status: String,
}

impl IncidentEvent {
    /// Only a newly created, still open incident counts as a failed change
    pub fn is_new_failure(&self) -> bool {
        self.detail_type == INCIDENT_CREATE && self.status == INCIDENT_OPEN
    }
}

/// Pulls the incident id out of a merge commit message.
///
/// `fix/<id>/hotfix` style refs yield the middle segment, any other ref its
/// last segment. A leading fork owner (`owner/fix/<id>/hotfix`, as in GitHub
/// merge messages) is ignored.
pub fn extract_incident_id(commit_message: &str) -> Option<String> {
    let source_ref = SOURCE_REF.captures(commit_message)?.get(1)?.as_str().trim();

    let mut segments: Vec<&str> = source_ref.split('/').collect();
    if segments.len() == 4 {
        segments.remove(0);
    }

    let incident_id = match segments.as_slice() {
        [prefix, id, suffix] if FIX_PREFIXES.contains(prefix) && FIX_SUFFIXES.contains(suffix) => {
            *id
        }
        _ => source_ref.rsplit('/').next()?,
    };
    let incident_id = incident_id.trim();
    if incident_id.is_empty() {
        return None;
    }

    tracing::debug!(source_ref = %source_ref, incident_id = %incident_id, "Extracted incident id");
    Some(incident_id.to_string())
}
