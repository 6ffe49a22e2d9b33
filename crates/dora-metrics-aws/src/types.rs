//! Wire types for the AWS JSON-protocol APIs
//!
//! These types are internal implementation details for serializing requests
//! and deserializing responses.

use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

// CodePipeline uses camelCase members.

#[derive(Debug, Serialize)]
pub(crate) struct PipelineNameRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetPipelineResponse {
    pub pipeline: PipelineDeclaration,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PipelineDeclaration {
    pub name: String,
    #[serde(default)]
    pub stages: Vec<StageDeclaration>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StageDeclaration {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<ActionDeclaration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActionDeclaration {
    pub name: String,
    pub action_type_id: ActionTypeId,
    #[serde(default)]
    pub configuration: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionTypeId {
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetPipelineStateResponse {
    pub pipeline_name: Option<String>,
    pub stage_states: Option<Vec<StageStateWire>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StageStateWire {
    pub stage_name: Option<String>,
    pub latest_execution: Option<StageExecution>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StageExecution {
    pub status: Option<String>,
}

// Athena and SSM use PascalCase members.

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct StartQueryExecutionRequest<'a> {
    pub query_string: &'a str,
    pub query_execution_context: QueryExecutionContext<'a>,
    pub result_configuration: ResultConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct QueryExecutionContext<'a> {
    pub database: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResultConfiguration<'a> {
    pub output_location: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct StartQueryExecutionResponse {
    pub query_execution_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct QueryExecutionIdRequest<'a> {
    pub query_execution_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetQueryExecutionResponse {
    pub query_execution: QueryExecution,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct QueryExecution {
    pub status: QueryStatusWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct QueryStatusWire {
    pub state: String,
    pub state_change_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetQueryResultsResponse {
    pub result_set: ResultSet,
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResultSet {
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Row {
    #[serde(default)]
    pub data: Vec<Datum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Datum {
    pub var_char_value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeOpsItemsRequest {
    pub ops_item_filters: Vec<OpsItemFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct OpsItemFilter {
    pub key: String,
    pub values: Vec<String>,
    pub operator: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeOpsItemsResponse {
    #[serde(default)]
    pub ops_item_summaries: Vec<OpsItemSummary>,
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct OpsItemSummary {
    pub ops_item_id: String,
    /// Epoch seconds with a fractional part
    pub created_time: f64,
    pub status: Option<String>,
    pub title: Option<String>,
}

// Container and instance metadata credential endpoints.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct MetadataCredentials {
    /// Only sent by the instance metadata service; `Success` when usable
    pub code: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub token: Option<String>,
    pub expiration: Option<String>,
}
