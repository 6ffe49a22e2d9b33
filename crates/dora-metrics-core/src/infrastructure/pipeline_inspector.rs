use std::sync::Arc;

use dora_metrics_api::{
    PipelineDefinition,
    PipelineIntrospection,
};

use crate::domain::{
    DomainResult,
    SourceConfig,
    StageStatus,
};

pub const SOURCE_STAGE_NAME: &str = "Source";

const BRANCH_KEY: &str = "BranchName";

const REPOSITORY_KEY: &str = "RepositoryName";

const FULL_REPOSITORY_KEY: &str = "FullRepositoryId";

/// Reads stage status and source configuration from the pipeline platform
pub struct PipelineInspector {
    pipelines: Arc<dyn PipelineIntrospection>,
}

impl PipelineInspector {
    pub fn new(pipelines: Arc<dyn PipelineIntrospection>) -> Self {
        Self { pipelines }
    }

    /// Latest status of each stage, in declaration order.
    ///
    /// A response without stage data yields an empty sequence.
    pub async fn stage_statuses(&self, pipeline_name: &str) -> DomainResult<Vec<StageStatus>> {
        let state = self.pipelines.get_pipeline_state(pipeline_name).await?;

        let Some(stage_states) = state.stage_states else {
            tracing::error!(
                pipeline = %pipeline_name,
                "Pipeline state response has no stage states"
            );
            return Ok(Vec::new());
        };

        let statuses: Vec<StageStatus> = stage_states
            .into_iter()
            .map(|stage| StageStatus {
                stage_name: stage.stage_name,
                execution_status: stage.latest_status,
            })
            .collect();

        tracing::debug!(pipeline = %pipeline_name, stages = ?statuses, "Fetched stage statuses");
        Ok(statuses)
    }

    pub async fn source_config(&self, pipeline_name: &str) -> DomainResult<SourceConfig> {
        let definition = self.pipelines.get_pipeline(pipeline_name).await?;
        let config = extract_source_config(&definition);

        if config.is_found() {
            tracing::info!(
                pipeline = %pipeline_name,
                branch = ?config.branch_name,
                repository = ?config.repository_name,
                "Resolved source configuration"
            );
        } else {
            tracing::warn!(
                pipeline = %pipeline_name,
                "Pipeline has no '{}' stage with a source action",
                SOURCE_STAGE_NAME
            );
        }

        Ok(config)
    }

    /// Fails with `PipelineNotFound` for an unknown pipeline
    pub async fn ensure_exists(&self, pipeline_name: &str) -> DomainResult<()> {
        self.pipelines.get_pipeline(pipeline_name).await?;
        Ok(())
    }
}

pub fn extract_source_config(definition: &PipelineDefinition) -> SourceConfig {
    let Some(action) = definition
        .stages
        .iter()
        .find(|stage| stage.name == SOURCE_STAGE_NAME)
        .and_then(|stage| stage.actions.iter().find(|action| action.is_source()))
    else {
        return SourceConfig::not_found();
    };

    let config = &action.configuration;
    SourceConfig {
        branch_name: config.get(BRANCH_KEY).cloned(),
        repository_name: config
            .get(REPOSITORY_KEY)
            .or_else(|| config.get(FULL_REPOSITORY_KEY))
            .cloned(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use dora_metrics_api::fakes::FakePipelines;
    use dora_metrics_api::{
        ActionDeclaration,
        PipelineState,
        StageDeclaration,
        StageState,
    };

    use super::*;
    use crate::domain::DomainError;

    fn action(category: &str, config: &[(&str, &str)]) -> ActionDeclaration {
        ActionDeclaration {
            name: "Checkout".to_string(),
            category: category.to_string(),
            configuration: config
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn definition(stages: Vec<StageDeclaration>) -> PipelineDefinition {
        PipelineDefinition {
            name: "app".to_string(),
            stages,
        }
    }

    #[test]
    fn test_extract_from_source_stage() {
        let def = definition(vec![
            StageDeclaration {
                name: "Source".to_string(),
                actions: vec![
                    action("Approval", &[("BranchName", "wrong")]),
                    action(
                        "Source",
                        &[("BranchName", "master"), ("RepositoryName", "billing")],
                    ),
                ],
            },
            StageDeclaration {
                name: "Build".to_string(),
                actions: vec![action("Build", &[])],
            },
        ]);

        let config = extract_source_config(&def);
        assert_eq!(config.branch_name.as_deref(), Some("master"));
        assert_eq!(config.repository_name.as_deref(), Some("billing"));
    }

    #[test]
    fn test_full_repository_id_fallback() {
        let def = definition(vec![StageDeclaration {
            name: "Source".to_string(),
            actions: vec![action(
                "Source",
                &[("BranchName", "main"), ("FullRepositoryId", "acme/checkout")],
            )],
        }]);

        assert_eq!(
            extract_source_config(&def).repository_name.as_deref(),
            Some("acme/checkout")
        );
    }

    #[test]
    fn test_stage_must_be_named_source() {
        let def = definition(vec![StageDeclaration {
            name: "Checkout".to_string(),
            actions: vec![action("Source", &[("BranchName", "main")])],
        }]);

        assert_eq!(extract_source_config(&def), SourceConfig::not_found());
    }

    #[tokio::test]
    async fn test_missing_stage_states_yield_empty() {
        let fake = FakePipelines::new().with_pipeline(
            definition(Vec::new()),
            PipelineState {
                pipeline_name: "app".to_string(),
                stage_states: None,
            },
        );

        let inspector = PipelineInspector::new(Arc::new(fake));
        assert!(inspector.stage_statuses("app").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stage_statuses_keep_order() {
        let fake = FakePipelines::new().with_pipeline(
            definition(Vec::new()),
            PipelineState {
                pipeline_name: "app".to_string(),
                stage_states: Some(vec![
                    StageState {
                        stage_name: "Build".to_string(),
                        latest_status: Some("Succeeded".to_string()),
                    },
                    StageState {
                        stage_name: "DeployPROD".to_string(),
                        latest_status: None,
                    },
                ]),
            },
        );

        let statuses = PipelineInspector::new(Arc::new(fake))
            .stage_statuses("app")
            .await
            .unwrap();
        let names: Vec<_> = statuses.iter().map(|s| s.stage_name.as_str()).collect();
        assert_eq!(names, vec!["Build", "DeployPROD"]);
    }

    #[tokio::test]
    async fn test_unknown_pipeline_is_distinct_error() {
        let inspector = PipelineInspector::new(Arc::new(FakePipelines::new()));

        assert!(matches!(
            inspector.stage_statuses("ghost").await.unwrap_err(),
            DomainError::PipelineNotFound(_)
        ));
        assert!(matches!(
            inspector.source_config("ghost").await.unwrap_err(),
            DomainError::PipelineNotFound(_)
        ));
        assert!(matches!(
            inspector.ensure_exists("ghost").await.unwrap_err(),
            DomainError::PipelineNotFound(_)
        ));
    }
}
