//! The inquiry record and its tabular projections.
//!
//! [`Inquiry`] is the single record shape the engine archives. Full
//! snapshots use [`Inquiry::COLUMNS`]; windowed exports use the narrower
//! review projection [`ReviewRow`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A row that can be written by the [`crate::archive::TabularSerializer`].
///
/// `cells` must yield exactly one entry per column, in column order.
/// `None` marks an absent value.
pub trait TabularRecord {
    /// Column names, in output order.
    const COLUMNS: &'static [&'static str];

    /// Cell values in the same order as [`TabularRecord::COLUMNS`].
    fn cells(&self) -> Vec<Option<String>>;
}

/// One business inquiry captured by the assistant.
///
/// Read-only from the engine's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    /// Source-assigned unique id.
    pub id: i64,
    /// Identity of the person who sent the inquiry.
    pub user_id: i64,
    /// Handle of the sender, if they have one.
    pub username: Option<String>,
    /// Sender first name.
    pub first_name: String,
    /// Sender last name, if known.
    pub last_name: Option<String>,
    /// Free-form inquiry text.
    pub message: String,
    /// Reply sent back to the sender.
    pub response: String,
    /// Source-assigned creation time.
    pub created_at: DateTime<Utc>,
    /// Workflow status (e.g. `"new"`); not validated here.
    pub status: String,
    /// Contact detail extracted from the conversation.
    pub contact_info: Option<String>,
}

impl TabularRecord for Inquiry {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "username",
        "first_name",
        "last_name",
        "message",
        "response",
        "created_at",
        "status",
        "contact_info",
    ];

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            Some(self.user_id.to_string()),
            self.username.clone(),
            Some(self.first_name.clone()),
            self.last_name.clone(),
            Some(self.message.clone()),
            Some(self.response.clone()),
            Some(format_timestamp(&self.created_at)),
            Some(self.status.clone()),
            self.contact_info.clone(),
        ]
    }
}

/// Review projection of an [`Inquiry`] used by windowed exports.
#[derive(Debug, Clone, Copy)]
pub struct ReviewRow<'a>(pub &'a Inquiry);

impl TabularRecord for ReviewRow<'_> {
    const COLUMNS: &'static [&'static str] = &[
        "username",
        "first_name",
        "message",
        "created_at",
        "status",
        "contact_info",
    ];

    fn cells(&self) -> Vec<Option<String>> {
        let inquiry = self.0;
        vec![
            inquiry.username.clone(),
            Some(inquiry.first_name.clone()),
            Some(inquiry.message.clone()),
            Some(format_timestamp(&inquiry.created_at)),
            Some(inquiry.status.clone()),
            inquiry.contact_info.clone(),
        ]
    }
}

/// Archive timestamp format: RFC 3339, microseconds, `Z` suffix.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
