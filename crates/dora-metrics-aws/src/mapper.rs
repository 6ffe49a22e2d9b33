use chrono::{
    DateTime,
    SecondsFormat,
    Utc,
};
use dora_metrics_api::{
    ActionDeclaration,
    CollectorError,
    CollectorResult,
    FilterOperator,
    IncidentFilter,
    IncidentSummary,
    MetricDatum,
    PipelineDefinition,
    PipelineState,
    QueryExecutionState,
    QueryExecutionStatus,
    ResultRow,
    StageDeclaration,
    StageState,
};

use crate::types;

pub(crate) fn map_pipeline(wire: types::PipelineDeclaration) -> PipelineDefinition {
    PipelineDefinition {
        name: wire.name,
        stages: wire
            .stages
            .into_iter()
            .map(|stage| StageDeclaration {
                name: stage.name,
                actions: stage
                    .actions
                    .into_iter()
                    .map(|action| ActionDeclaration {
                        name: action.name,
                        category: action.action_type_id.category,
                        configuration: action.configuration,
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub(crate) fn map_pipeline_state(
    requested_name: &str, wire: types::GetPipelineStateResponse,
) -> PipelineState {
    PipelineState {
        pipeline_name: wire
            .pipeline_name
            .unwrap_or_else(|| requested_name.to_string()),
        stage_states: wire.stage_states.map(|states| {
            states
                .into_iter()
                .filter_map(|state| {
                    Some(StageState {
                        stage_name: state.stage_name?,
                        latest_status: state.latest_execution.and_then(|e| e.status),
                    })
                })
                .collect()
        }),
    }
}

pub(crate) fn map_query_status(wire: types::QueryStatusWire) -> CollectorResult<QueryExecutionStatus> {
    let state = wire
        .state
        .parse::<QueryExecutionState>()
        .map_err(CollectorError::SerializationError)?;

    Ok(QueryExecutionStatus {
        state,
        reason: wire.state_change_reason,
    })
}

/// Converts a result page; the first row of the first page is the column header
pub(crate) fn map_result_rows(wire: types::ResultSet, first_page: bool) -> Vec<ResultRow> {
    let skip = usize::from(first_page);
    wire.rows
        .into_iter()
        .skip(skip)
        .map(|row| ResultRow {
            values: row.data.into_iter().map(|d| d.var_char_value).collect(),
        })
        .collect()
}

pub(crate) fn map_filter(filter: &IncidentFilter) -> types::OpsItemFilter {
    let operator = match filter.operator {
        FilterOperator::Equal => "Equal",
    };

    types::OpsItemFilter {
        key: filter.key.clone(),
        values: filter.values.clone(),
        operator: operator.to_string(),
    }
}

pub(crate) fn map_ops_item(wire: types::OpsItemSummary) -> CollectorResult<IncidentSummary> {
    let millis = (wire.created_time * 1000.0).round() as i64;
    let created_time = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        CollectorError::SerializationError(format!(
            "OpsItem {} has an invalid CreatedTime: {}",
            wire.ops_item_id, wire.created_time
        ))
    })?;

    Ok(IncidentSummary {
        id: wire.ops_item_id,
        created_time,
        status: wire.status,
        title: wire.title,
    })
}

/// Form parameters for a single-datum `PutMetricData` call
pub(crate) fn metric_datum_params(datum: &MetricDatum) -> Vec<(&'static str, String)> {
    vec![
        ("Action", "PutMetricData".to_string()),
        ("Version", "2010-08-01".to_string()),
        ("Namespace", datum.namespace.clone()),
        ("MetricData.member.1.MetricName", datum.metric_name.clone()),
        ("MetricData.member.1.Value", datum.value.to_string()),
        ("MetricData.member.1.Unit", datum.unit.as_str().to_string()),
        (
            "MetricData.member.1.Timestamp",
            datum
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use dora_metrics_api::MetricUnit;

    use super::*;

    #[test]
    fn test_map_pipeline_reads_category() {
        let wire: types::GetPipelineResponse = serde_json::from_str(
            r#"{
                "pipeline": {
                    "name": "app",
                    "roleArn": "arn:aws:iam::1:role/x",
                    "stages": [
                        {
                            "name": "Source",
                            "actions": [
                                {
                                    "name": "Checkout",
                                    "actionTypeId": {"category": "Source", "owner": "AWS", "provider": "CodeStarSourceConnection", "version": "1"},
                                    "configuration": {"BranchName": "main", "FullRepositoryId": "acme/app"}
                                }
                            ]
                        },
                        {"name": "DeployPROD", "actions": []}
                    ]
                },
                "metadata": {"pipelineArn": "arn"}
            }"#,
        )
        .unwrap();

        let definition = map_pipeline(wire.pipeline);
        assert_eq!(definition.stages.len(), 2);
        let action = &definition.stages[0].actions[0];
        assert!(action.is_source());
        assert_eq!(action.configuration["BranchName"], "main");
    }

    #[test]
    fn test_map_pipeline_state_without_stage_data() {
        let wire: types::GetPipelineStateResponse =
            serde_json::from_str(r#"{"pipelineName": "app", "pipelineVersion": 3}"#).unwrap();
        let state = map_pipeline_state("app", wire);
        assert!(state.stage_states.is_none());
    }

    #[test]
    fn test_map_pipeline_state_never_executed_stage() {
        let wire: types::GetPipelineStateResponse = serde_json::from_str(
            r#"{"stageStates": [
                {"stageName": "Build", "latestExecution": {"pipelineExecutionId": "e1", "status": "Succeeded"}},
                {"stageName": "DeployPROD"}
            ]}"#,
        )
        .unwrap();

        let state = map_pipeline_state("app", wire);
        assert_eq!(state.pipeline_name, "app");
        let stages = state.stage_states.unwrap();
        assert_eq!(stages[0].latest_status.as_deref(), Some("Succeeded"));
        assert_eq!(stages[1].latest_status, None);
    }

    #[test]
    fn test_map_query_status() {
        let status = map_query_status(types::QueryStatusWire {
            state: "FAILED".to_string(),
            state_change_reason: Some("SYNTAX_ERROR".to_string()),
        })
        .unwrap();
        assert_eq!(status.state, QueryExecutionState::Failed);
        assert_eq!(status.reason.as_deref(), Some("SYNTAX_ERROR"));

        assert!(map_query_status(types::QueryStatusWire {
            state: "EXPLODED".to_string(),
            state_change_reason: None,
        })
        .is_err());
    }

    #[test]
    fn test_map_result_rows_skips_header_on_first_page() {
        let wire: types::ResultSet = serde_json::from_str(
            r#"{"Rows": [
                {"Data": [{"VarCharValue": "earliest_commit_time"}]},
                {"Data": [{"VarCharValue": "2023-01-01 10:00:00.000"}]},
                {"Data": [{}]}
            ]}"#,
        )
        .unwrap();

        let rows = map_result_rows(wire, true);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].first_value(), Some("2023-01-01 10:00:00.000"));
        assert_eq!(rows[1].first_value(), None);
    }

    #[test]
    fn test_map_ops_item_epoch_seconds() {
        let item = map_ops_item(types::OpsItemSummary {
            ops_item_id: "oi-123".to_string(),
            created_time: 1_672_567_200.25,
            status: Some("Open".to_string()),
            title: None,
        })
        .unwrap();

        assert_eq!(
            item.created_time,
            Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn test_metric_datum_params() {
        let params = metric_datum_params(&MetricDatum {
            namespace: "DORA".to_string(),
            metric_name: "LeadTimeForChange".to_string(),
            value: 7200.0,
            unit: MetricUnit::Seconds,
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap(),
        });

        assert!(params.contains(&("MetricData.member.1.Value", "7200".to_string())));
        assert!(params.contains(&("MetricData.member.1.Unit", "Seconds".to_string())));
        assert!(params.contains(&(
            "MetricData.member.1.Timestamp",
            "2023-01-01T12:00:00Z".to_string()
        )));
    }
}
