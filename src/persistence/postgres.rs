//! PostgreSQL implementation of the record source.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection};

use super::source::RecordSource;
use crate::domain::Inquiry;
use crate::error::BackupError;

/// Raw column tuple as selected by [`PostgresRecordSource`].
type InquiryRow = (
    i64,
    i64,
    Option<String>,
    String,
    Option<String>,
    String,
    String,
    DateTime<Utc>,
    String,
    Option<String>,
);

/// PostgreSQL-backed record source.
///
/// Every fetch opens its own connection and closes it before returning,
/// so no connection is held while the caller serializes or writes files.
#[derive(Debug, Clone)]
pub struct PostgresRecordSource {
    database_url: String,
    table: String,
    connect_timeout: Duration,
}

impl PostgresRecordSource {
    /// Creates a source reading `table` from the database at `database_url`.
    ///
    /// `table` must already be a validated identifier (see
    /// [`crate::config::VaultConfig`]).
    #[must_use]
    pub fn new(database_url: impl Into<String>, table: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            database_url: database_url.into(),
            table: table.into(),
            connect_timeout,
        }
    }

    /// Builds the SELECT statement, optionally bounded by `created_at >= $1`.
    fn select_sql(&self, windowed: bool) -> String {
        let filter = if windowed { " WHERE created_at >= $1" } else { "" };
        format!(
            "SELECT id::int8, user_id::int8, username, COALESCE(first_name, ''), last_name, \
             COALESCE(message, ''), COALESCE(response, ''), created_at::timestamptz, \
             COALESCE(status, ''), contact_info \
             FROM {}{filter} ORDER BY created_at DESC, id DESC",
            self.table
        )
    }

    async fn connect(&self) -> Result<PgConnection, BackupError> {
        match tokio::time::timeout(self.connect_timeout, PgConnection::connect(&self.database_url))
            .await
        {
            Ok(result) => result.map_err(BackupError::from),
            Err(_) => Err(BackupError::Source(format!(
                "timed out after {}s connecting to database",
                self.connect_timeout.as_secs()
            ))),
        }
    }

    async fn fetch(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Inquiry>, BackupError> {
        let mut conn = self.connect().await?;
        let sql = self.select_sql(since.is_some());

        let query = sqlx::query_as::<_, InquiryRow>(&sql);
        let query = match since {
            Some(since) => query.bind(since),
            None => query,
        };
        let result = query.fetch_all(&mut conn).await;

        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "failed to close database connection cleanly");
        }

        let rows = result?;
        tracing::debug!(table = %self.table, rows = rows.len(), windowed = since.is_some(), "records fetched");
        Ok(rows.into_iter().map(into_inquiry).collect())
    }
}

impl RecordSource for PostgresRecordSource {
    async fn fetch_all(&self) -> Result<Vec<Inquiry>, BackupError> {
        self.fetch(None).await
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Inquiry>, BackupError> {
        self.fetch(Some(since)).await
    }
}

fn into_inquiry(
    (id, user_id, username, first_name, last_name, message, response, created_at, status, contact_info): InquiryRow,
) -> Inquiry {
    Inquiry {
        id,
        user_id,
        username,
        first_name,
        last_name,
        message,
        response,
        created_at,
        status,
        contact_info,
    }
}
