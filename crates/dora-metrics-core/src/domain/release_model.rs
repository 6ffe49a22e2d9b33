use std::collections::HashSet;

use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseModel {
    /// Every change goes to production through the main pipeline
    TrunkBased,
    /// Production deploys come from a dedicated release branch
    ReleaseBranch,
}

impl std::fmt::Display for ReleaseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseModel::TrunkBased => write!(f, "trunk-based"),
            ReleaseModel::ReleaseBranch => write!(f, "release-branch"),
        }
    }
}

/// Exact, case-sensitive membership test against the trunk-based set
pub fn resolve(repository_name: &str, trunk_based: &HashSet<String>) -> ReleaseModel {
    if trunk_based.contains(repository_name) {
        ReleaseModel::TrunkBased
    } else {
        ReleaseModel::ReleaseBranch
    }
}
