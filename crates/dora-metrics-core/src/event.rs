//! Inbound event parsing.
//!
//! Raw EventBridge-style payloads are validated here into tagged variants so
//! the calculators never see a half-populated event.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    parse_timestamp,
    DomainError,
    DomainResult,
    IncidentEvent,
    PipelineEvent,
    PipelineExecutionState,
};

const INCIDENT_DETAIL_TYPE_PREFIX: &str = "OpsItem";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    PipelineStateChanged(PipelineEvent),
    IncidentChanged(IncidentEvent),
}

impl InboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::PipelineStateChanged(_) => "pipeline-state-changed",
            InboundEvent::IncidentChanged(_) => "incident-changed",
        }
    }

    pub fn parse(payload: &Value) -> DomainResult<Self> {
        tracing::debug!(payload = %payload, "Parsing inbound event");

        let envelope: Envelope = serde_json::from_value(payload.clone())?;
        let detail = envelope
            .detail
            .as_ref()
            .and_then(Value::as_object)
            .ok_or_else(|| DomainError::MalformedEvent("Event has no detail object".to_string()))?;

        if let Some(detail_type) = envelope
            .detail_type
            .as_deref()
            .filter(|t| t.starts_with(INCIDENT_DETAIL_TYPE_PREFIX))
        {
            let status = required_str(detail, "status")?;
            return Ok(InboundEvent::IncidentChanged(IncidentEvent {
                detail_type: detail_type.to_string(),
                status,
            }));
        }

        if detail.contains_key("pipeline") {
            return parse_pipeline(&envelope, detail).map(InboundEvent::PipelineStateChanged);
        }

        match envelope.detail_type {
            Some(detail_type) => Err(DomainError::UnsupportedEvent(detail_type)),
            None => Err(DomainError::MalformedEvent(
                "Event is neither a pipeline nor an incident event".to_string(),
            )),
        }
    }

    pub fn into_pipeline_event(self) -> DomainResult<PipelineEvent> {
        match self {
            InboundEvent::PipelineStateChanged(event) => Ok(event),
            other => Err(DomainError::UnsupportedEvent(format!(
                "Expected a pipeline event, got {}",
                other.kind()
            ))),
        }
    }

    pub fn into_incident_event(self) -> DomainResult<IncidentEvent> {
        match self {
            InboundEvent::IncidentChanged(event) => Ok(event),
            other => Err(DomainError::UnsupportedEvent(format!(
                "Expected an incident event, got {}",
                other.kind()
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "detail-type")]
    detail_type: Option<String>,
    time: Option<String>,
    detail: Option<Value>,
}

type Object = serde_json::Map<String, Value>;

fn required_str(object: &Object, key: &str) -> DomainResult<String> {
    optional_str(object, key)
        .ok_or_else(|| DomainError::MalformedEvent(format!("Missing required field '{}'", key)))
}

fn optional_str(object: &Object, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_pipeline(envelope: &Envelope, detail: &Object) -> DomainResult<PipelineEvent> {
    let pipeline_name = required_str(detail, "pipeline")?;
    let state = required_str(detail, "state")?;

    let raw_time = envelope
        .time
        .as_deref()
        .ok_or_else(|| DomainError::MalformedEvent("Missing required field 'time'".to_string()))?;
    let event_timestamp = parse_timestamp(raw_time).ok_or_else(|| {
        DomainError::MalformedEvent(format!("Invalid event time '{}'", raw_time))
    })?;

    let trigger = detail.get("execution-trigger").and_then(Value::as_object);
    let trigger_field = |key: &str| trigger.and_then(|t| optional_str(t, key));

    Ok(PipelineEvent {
        pipeline_name,
        state: PipelineExecutionState::parse(&state),
        repository_name: trigger_field("full-repository-name"),
        branch_name: trigger_field("branch-name"),
        commit_id: trigger_field("commit-id"),
        commit_message: trigger_field("commit-message"),
        event_timestamp,
    })
}
