//! Delimited text serializer for archive files.
//!
//! Produces one header line followed by one line per record. A field is
//! quoted only when it contains the delimiter or a quote character, and
//! embedded quotes are doubled. Newlines inside a field are folded to a
//! single space before quoting, so a record never spans more than one line.

use std::borrow::Cow;
use std::io;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::TabularRecord;
use crate::error::BackupError;

/// Field delimiter of every archive.
pub const DELIMITER: u8 = b',';

/// Stateless tabular serializer.
///
/// The same records in the same order always yield byte-identical output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularSerializer;

impl TabularSerializer {
    /// Creates a serializer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Streams the header and every record into `sink`, one line each.
    ///
    /// Returns the number of data rows written.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Serialization`] if the sink rejects a write.
    pub fn write<W, I>(&self, sink: W, records: I) -> Result<usize, BackupError>
    where
        W: io::Write,
        I: IntoIterator,
        I::Item: TabularRecord,
    {
        let mut writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .quote_style(QuoteStyle::Necessary)
            .double_quote(true)
            .terminator(Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(sink);

        writer.write_record(<I::Item as TabularRecord>::COLUMNS)?;

        let mut rows = 0usize;
        for record in records {
            let cells = record.cells();
            let fields: Vec<Cow<'_, str>> = cells
                .iter()
                .map(|cell| fold_newlines(cell.as_deref().unwrap_or_default()))
                .collect();
            writer.write_record(fields.iter().map(|f| f.as_bytes()))?;
            rows = rows.saturating_add(1);
        }

        writer
            .flush()
            .map_err(|e| BackupError::Serialization(e.to_string()))?;
        Ok(rows)
    }

    /// Serializes into an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Serialization`] on encoder failure.
    pub fn to_bytes<I>(&self, records: I) -> Result<(Vec<u8>, usize), BackupError>
    where
        I: IntoIterator,
        I::Item: TabularRecord,
    {
        let mut buf = Vec::new();
        let rows = self.write(&mut buf, records)?;
        Ok((buf, rows))
    }
}

impl<T: TabularRecord> TabularRecord for &T {
    const COLUMNS: &'static [&'static str] = T::COLUMNS;

    fn cells(&self) -> Vec<Option<String>> {
        (**self).cells()
    }
}

/// Replaces each `\r\n`, `\n` or `\r` with a single space.
fn fold_newlines(value: &str) -> Cow<'_, str> {
    if !value.contains(['\n', '\r']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace("\r\n", " ").replace(['\n', '\r'], " "))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::{Inquiry, ReviewRow};
    use chrono::{Duration, TimeZone, Utc};

    fn inquiry(id: i64, message: &str) -> Inquiry {
        let base = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .unwrap_or_default();
        Inquiry {
            id,
            user_id: 1000 + id,
            username: if id % 2 == 0 { Some(format!("user{id}")) } else { None },
            first_name: "Grace".into(),
            last_name: None,
            message: message.into(),
            response: "We will get back to you, \"soon\".".into(),
            created_at: base - Duration::hours(id),
            status: "new".into(),
            contact_info: Some(String::new()),
        }
    }

    fn serialize(records: &[Inquiry]) -> String {
        let Ok((bytes, _)) = TabularSerializer::new().to_bytes(records) else {
            panic!("serialization failed");
        };
        let Ok(text) = String::from_utf8(bytes) else {
            panic!("output is not utf-8");
        };
        text
    }

    fn parse(text: &str) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());
        let Ok(headers) = reader.headers() else {
            panic!("missing header");
        };
        let headers = headers.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|r| {
                let Ok(r) = r else {
                    panic!("bad row");
                };
                r.iter().map(str::to_string).collect()
            })
            .collect();
        (headers, rows)
    }

    #[test]
    fn header_lists_columns_in_schema_order() {
        let text = serialize(&[inquiry(1, "hello")]);
        let first = text.lines().next().unwrap_or_default();
        assert_eq!(
            first,
            "id,user_id,username,first_name,last_name,message,response,created_at,status,contact_info"
        );
    }

    #[test]
    fn parse_recovers_delimiters_and_quotes() {
        let records = vec![
            inquiry(1, "plain"),
            inquiry(2, "price, delivery, and setup"),
            inquiry(3, "they said \"urgent\""),
            inquiry(4, "mix, of \"both\""),
        ];
        let (headers, rows) = parse(&serialize(&records));
        assert_eq!(headers.len(), Inquiry::COLUMNS.len());
        assert_eq!(rows.len(), records.len());
        for (row, record) in rows.iter().zip(&records) {
            assert_eq!(row.len(), headers.len());
            assert_eq!(row[0], record.id.to_string());
            assert_eq!(row[5], record.message);
            assert_eq!(row[6], record.response);
        }
    }

    #[test]
    fn embedded_newlines_become_single_spaces() {
        let records = vec![inquiry(1, "line one\nline two\r\nline three\rend")];
        let text = serialize(&records);
        assert_eq!(text.lines().count(), 2);
        let (_, rows) = parse(&text);
        assert_eq!(rows[0][5], "line one line two line three end");
    }

    #[test]
    fn quoting_only_when_needed() {
        let text = serialize(&[inquiry(1, "needs, quotes"), inquiry(3, "bare")]);
        assert!(text.contains(",\"needs, quotes\","));
        assert!(text.contains(",bare,"));
        assert!(text.contains("\"We will get back to you, \"\"soon\"\".\""));
    }

    #[test]
    fn absent_and_empty_values_serialize_identically() {
        let text = serialize(&[inquiry(1, "x")]);
        let (_, rows) = parse(&text);
        // username (None), last_name (None) and contact_info (Some("")) are all empty.
        assert_eq!(rows[0][2], "");
        assert_eq!(rows[0][4], "");
        assert_eq!(rows[0][9], "");
    }

    #[test]
    fn row_count_matches_input_for_any_length() {
        for n in [0usize, 1, 7, 64] {
            let records: Vec<Inquiry> = (0..n)
                .map(|i| inquiry(i64::try_from(i).unwrap_or_default(), "m, \"q\"\nn"))
                .collect();
            let Ok((bytes, rows)) = TabularSerializer::new().to_bytes(&records) else {
                panic!("serialization failed");
            };
            assert_eq!(rows, n);
            let text = String::from_utf8(bytes).unwrap_or_default();
            assert_eq!(text.lines().count(), n + 1);
        }
    }

    #[test]
    fn output_is_deterministic() {
        let records = vec![inquiry(1, "a, b"), inquiry(2, "c\nd")];
        assert_eq!(serialize(&records), serialize(&records));
    }

    #[test]
    fn review_projection_writes_its_own_header() {
        let records = [inquiry(2, "hi")];
        let Ok((bytes, rows)) = TabularSerializer::new().to_bytes(records.iter().map(ReviewRow))
        else {
            panic!("serialization failed");
        };
        assert_eq!(rows, 1);
        let text = String::from_utf8(bytes).unwrap_or_default();
        let (headers, parsed) = parse(&text);
        assert_eq!(headers, ReviewRow::COLUMNS);
        assert_eq!(parsed[0][0], "user2");
        assert_eq!(parsed[0][2], "hi");
    }
}
