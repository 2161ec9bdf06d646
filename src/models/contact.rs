use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::db::Row;
use crate::error::{Error, Result};

/// Separator used when the database folds a card's EMAIL rows into one
/// column. U+001F cannot occur in a valid e-mail address.
pub const EMAIL_DELIMITER: char = '\u{1f}';

/// One card reduced to the fields the host consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: i64,
    pub name: String,
    pub email: BTreeSet<String>,
}

impl ContactRecord {
    /// Build a record from an aggregated `id, name, email` row
    pub fn from_row(row: &Row) -> Result<Self> {
        let id = column_i64(row, "id")?;
        let name = column_text(row, "name")?.unwrap_or_default();
        let email = column_text(row, "email")?
            .map(|joined| split_emails(&joined))
            .unwrap_or_default();

        Ok(Self { id, name, email })
    }

    /// First address in sort order
    pub fn primary_email(&self) -> Option<&str> {
        self.email.iter().next().map(String::as_str)
    }
}

/// Split an aggregated EMAIL column back into its addresses
pub fn split_emails(joined: &str) -> BTreeSet<String> {
    joined
        .split(EMAIL_DELIMITER)
        .filter(|e| !e.is_empty())
        .map(String::from)
        .collect()
}

/// Records of one listing plus the paging numbers they belong to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    pub records: Vec<ContactRecord>,
    /// Total number of matches, or the page-local count when counting was skipped
    pub count: u64,
    /// Offset of the first record in the full listing
    pub first: u64,
}

impl ResultSet {
    pub fn new(count: u64, first: u64) -> Self {
        Self {
            records: Vec::new(),
            count,
            first,
        }
    }

    pub fn add(&mut self, record: ContactRecord) {
        self.records.push(record);
    }

    pub fn first_record(&self) -> Option<&ContactRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn column<'r>(row: &'r Row, name: &str) -> Result<&'r Value> {
    row.get(name)
        .ok_or_else(|| Error::MissingColumn(name.to_string()))
}

pub(crate) fn column_i64(row: &Row, name: &str) -> Result<i64> {
    match column(row, name)? {
        Value::Integer(i) => Ok(*i),
        // cardid is declared INTEGER but Nextcloud on other engines may hand it over as text
        Value::Text(s) => s.trim().parse().map_err(|_| Error::ColumnType {
            column: name.to_string(),
            found: "non-numeric text",
        }),
        other => Err(Error::ColumnType {
            column: name.to_string(),
            found: value_kind(other),
        }),
    }
}

pub(crate) fn column_text(row: &Row, name: &str) -> Result<Option<String>> {
    match column(row, name)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s.clone())),
        Value::Integer(i) => Ok(Some(i.to_string())),
        Value::Real(f) => Ok(Some(f.to_string())),
        Value::Blob(b) => String::from_utf8(b.clone())
            .map(Some)
            .map_err(|_| Error::ColumnType {
                column: name.to_string(),
                found: "non-utf8 blob",
            }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Integer(_) => "integer",
        Value::Real(_) => "real",
        Value::Text(_) => "text",
        Value::Blob(_) => "blob",
    }
}
