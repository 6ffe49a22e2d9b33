pub mod change_failure_rate;
pub mod deployment_frequency;
pub mod lead_time;
pub mod mean_time_to_restore;

use std::collections::HashSet;

use crate::domain::{
    resolve,
    ReleaseModel,
};
use crate::infrastructure::config::DoraConfig;

/// Branch and stage names the calculators compare events against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSettings {
    pub default_branch: String,
    pub release_branch: String,
    pub prod_stage_name: String,
    pub trunk_based: HashSet<String>,
}

impl ReleaseSettings {
    pub fn from_config(config: &DoraConfig) -> Self {
        Self {
            default_branch: config.general.default_branch.clone(),
            release_branch: config.general.release_branch.clone(),
            prod_stage_name: config.general.prod_stage_name.clone(),
            trunk_based: config.trunk_based_set(),
        }
    }

    pub fn release_model(&self, repository_name: Option<&str>) -> ReleaseModel {
        let model = resolve(repository_name.unwrap_or_default(), &self.trunk_based);
        tracing::info!(repository = ?repository_name, model = %model, "Resolved release model");
        model
    }
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self::from_config(&DoraConfig::default())
    }
}
