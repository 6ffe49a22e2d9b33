//! Earliest-commit lookups against the historical push log.

use std::sync::Arc;
use std::time::Duration;

use chrono::{
    DateTime,
    Utc,
};
use dora_metrics_api::{
    QueryEngine,
    QueryExecutionState,
    QueryRequest,
};

use super::clock::Clock;
use crate::domain::{
    parse_timestamp,
    quote_literal,
    validate_commit_id,
    validate_identifier,
    validate_repository_name,
    DomainError,
    DomainResult,
};

#[derive(Debug, Clone)]
pub struct HistorySettings {
    pub database: String,
    pub table: String,
    pub output_location: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

/// Where a submitted query is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollState {
    Submitted,
    Polling,
    Succeeded,
    Failed(String),
    TimedOut,
}

pub struct HistoryQueryClient {
    engine: Arc<dyn QueryEngine>,
    clock: Arc<dyn Clock>,
    settings: HistorySettings,
}

impl HistoryQueryClient {
    pub fn new(
        engine: Arc<dyn QueryEngine>, clock: Arc<dyn Clock>, settings: HistorySettings,
    ) -> Self {
        Self {
            engine,
            clock,
            settings,
        }
    }

    /// Earliest time the commit was pushed to the repository, if recorded.
    ///
    /// A failed or timed out query aborts the invocation.
    pub async fn earliest_commit_time(
        &self, commit_id: &str, repository_name: &str,
    ) -> DomainResult<Option<DateTime<Utc>>> {
        let query = build_earliest_commit_query(
            &self.settings.database,
            &self.settings.table,
            commit_id,
            repository_name,
        )?;

        let request = QueryRequest {
            query,
            database: self.settings.database.clone(),
            output_location: self.settings.output_location.clone(),
        };

        let execution_id = self.engine.start_query(&request).await?;
        tracing::info!(
            execution_id = %execution_id,
            commit_id = %commit_id,
            repository = %repository_name,
            "History query submitted"
        );

        self.await_completion(&execution_id).await?;

        let rows = self.engine.query_results(&execution_id).await?;
        let Some(raw) = rows.first().and_then(|row| row.first_value()) else {
            tracing::error!(
                commit_id = %commit_id,
                repository = %repository_name,
                "No earliest commit time recorded"
            );
            return Ok(None);
        };

        match parse_timestamp(raw) {
            Some(timestamp) => {
                tracing::info!(commit_id = %commit_id, earliest = %timestamp, "Earliest commit time found");
                Ok(Some(timestamp))
            }
            None => {
                tracing::error!(value = %raw, "Unparseable earliest commit time");
                Ok(None)
            }
        }
    }

    async fn await_completion(&self, execution_id: &str) -> DomainResult<()> {
        let started = self.clock.now();
        let timeout = chrono::Duration::milliseconds(self.settings.timeout.as_millis() as i64);
        let mut state = PollState::Submitted;

        loop {
            state = match state {
                PollState::Submitted | PollState::Polling => {
                    let status = self.engine.query_status(execution_id).await?;
                    if status.state == QueryExecutionState::Succeeded {
                        PollState::Succeeded
                    } else if status.state.is_terminal() {
                        PollState::Failed(status.reason.unwrap_or_else(|| {
                            format!("query ended in state {}", status.state.as_str())
                        }))
                    } else if self.clock.now() - started >= timeout {
                        PollState::TimedOut
                    } else {
                        tracing::debug!(
                            execution_id = %execution_id,
                            state = %status.state.as_str(),
                            "Query still running"
                        );
                        self.clock.sleep(self.settings.poll_interval).await;
                        PollState::Polling
                    }
                }
                PollState::Succeeded => {
                    tracing::info!(execution_id = %execution_id, "History query succeeded");
                    return Ok(());
                }
                PollState::Failed(reason) => {
                    tracing::error!(execution_id = %execution_id, reason = %reason, "History query failed");
                    return Err(DomainError::QueryFailed(reason));
                }
                PollState::TimedOut => {
                    tracing::error!(execution_id = %execution_id, "History query timed out");
                    return Err(DomainError::QueryTimedOut(self.settings.timeout.as_secs()));
                }
            };
        }
    }
}

/// Minimum commit timestamp among pushes whose head is `commit_id`
pub fn build_earliest_commit_query(
    database: &str, table: &str, commit_id: &str, repository_name: &str,
) -> DomainResult<String> {
    validate_identifier("history.database", database)?;
    validate_identifier("history.table", table)?;
    validate_commit_id(commit_id)?;
    validate_repository_name(repository_name)?;

    Ok(format!(
        r#"WITH UnnestedCommits AS (
    SELECT
        c.id,
        c.message,
        c.timestamp,
        "after",
        repository.full_name
    FROM {database}.{table}, UNNEST(commits) AS t(c)
    WHERE
        "after" = {commit}
        AND repository.full_name = {repository}
)
SELECT
    MIN(UnnestedCommits.timestamp) AS earliest_commit_time
FROM UnnestedCommits"#,
        commit = quote_literal(commit_id),
        repository = quote_literal(repository_name),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use dora_metrics_api::fakes::ScriptedQueryEngine;
    use dora_metrics_api::ResultRow;

    use super::*;
    use crate::infrastructure::clock::ManualClock;

    const COMMIT: &str = "a1b2c3d4e5f6";

    fn settings() -> HistorySettings {
        HistorySettings {
            database: "github_logs_db".to_string(),
            table: "github_logs_table".to_string(),
            output_location: "s3://github-athena-dora/".to_string(),
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(10),
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
    }

    fn client(engine: Arc<ScriptedQueryEngine>, clock: Arc<ManualClock>) -> HistoryQueryClient {
        HistoryQueryClient::new(engine, clock, settings())
    }

    #[test]
    fn test_query_text() {
        let query =
            build_earliest_commit_query("github_logs_db", "github_logs_table", COMMIT, "acme/app")
                .unwrap();

        assert!(query.contains("FROM github_logs_db.github_logs_table, UNNEST(commits) AS t(c)"));
        assert!(query.contains(r#""after" = 'a1b2c3d4e5f6'"#));
        assert!(query.contains("repository.full_name = 'acme/app'"));
        assert!(query.contains("MIN(UnnestedCommits.timestamp) AS earliest_commit_time"));
    }

    #[test]
    fn test_query_rejects_unsafe_input() {
        assert!(matches!(
            build_earliest_commit_query("db", "tbl", "abc' OR 1=1", "acme/app").unwrap_err(),
            DomainError::MalformedEvent(_)
        ));
        assert!(matches!(
            build_earliest_commit_query("db", "tbl", COMMIT, "acme/app'--").unwrap_err(),
            DomainError::MalformedEvent(_)
        ));
        assert!(matches!(
            build_earliest_commit_query("db; DROP", "tbl", COMMIT, "acme/app").unwrap_err(),
            DomainError::InvalidConfig(_)
        ));
    }

    #[tokio::test]
    async fn test_polls_until_succeeded() {
        let engine = Arc::new(ScriptedQueryEngine::new(
            vec![
                QueryExecutionState::Queued,
                QueryExecutionState::Running,
                QueryExecutionState::Running,
                QueryExecutionState::Succeeded,
            ],
            vec![ResultRow {
                values: vec![Some("2023-01-01 00:00:00.000".to_string())],
            }],
        ));
        let clock = Arc::new(ManualClock::new(start()));

        let earliest = client(engine.clone(), clock.clone())
            .earliest_commit_time(COMMIT, "acme/app")
            .await
            .unwrap();

        assert_eq!(earliest, Some(start()));
        assert_eq!(engine.status_polls(), 4);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(10); 3]);

        let submitted = engine.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].database, "github_logs_db");
        assert_eq!(submitted[0].output_location, "s3://github-athena-dora/");
    }

    #[tokio::test]
    async fn test_failed_query_is_fatal() {
        let engine = Arc::new(ScriptedQueryEngine::new(
            vec![QueryExecutionState::Running, QueryExecutionState::Failed],
            Vec::new(),
        ));
        let clock = Arc::new(ManualClock::new(start()));

        let err = client(engine.clone(), clock)
            .earliest_commit_time(COMMIT, "acme/app")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::QueryFailed(_)));
        assert_eq!(engine.status_polls(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_query_is_fatal() {
        let engine = Arc::new(ScriptedQueryEngine::new(
            vec![QueryExecutionState::Queued, QueryExecutionState::Cancelled],
            Vec::new(),
        ));
        let clock = Arc::new(ManualClock::new(start()));

        let err = client(engine.clone(), clock)
            .earliest_commit_time(COMMIT, "acme/app")
            .await
            .unwrap_err();

        match err {
            DomainError::QueryFailed(reason) => assert_eq!(reason, "query ended in state CANCELLED"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_running_forever_times_out() {
        let engine = Arc::new(ScriptedQueryEngine::new(
            vec![QueryExecutionState::Running],
            Vec::new(),
        ));
        let clock = Arc::new(ManualClock::new(start()));

        let err = client(engine.clone(), clock.clone())
            .earliest_commit_time(COMMIT, "acme/app")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::QueryTimedOut(300)));
        // Polls at 0s, 10s, ... 300s.
        assert_eq!(engine.status_polls(), 31);
        assert_eq!(clock.now(), start() + chrono::Duration::seconds(300));
    }

    #[tokio::test]
    async fn test_no_rows_or_null_value_is_absent() {
        let clock = Arc::new(ManualClock::new(start()));

        let empty = Arc::new(ScriptedQueryEngine::new(
            vec![QueryExecutionState::Succeeded],
            Vec::new(),
        ));
        assert_eq!(
            client(empty, clock.clone())
                .earliest_commit_time(COMMIT, "acme/app")
                .await
                .unwrap(),
            None
        );

        let null = Arc::new(ScriptedQueryEngine::new(
            vec![QueryExecutionState::Succeeded],
            vec![ResultRow { values: vec![None] }],
        ));
        assert_eq!(
            client(null, clock)
                .earliest_commit_time(COMMIT, "acme/app")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_invalid_commit_is_never_submitted() {
        let engine = Arc::new(ScriptedQueryEngine::succeeding_with("2023-01-01 00:00:00"));
        let clock = Arc::new(ManualClock::new(start()));

        let err = client(engine.clone(), clock)
            .earliest_commit_time("not-a-sha", "acme/app")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::MalformedEvent(_)));
        assert!(engine.submitted().is_empty());
    }
}
