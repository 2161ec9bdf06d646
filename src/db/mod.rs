//! Database gateway.
//!
//! The address book core only talks to the database through [`Gateway`].
//! [`Database`] is the SQLite implementation used against a Nextcloud
//! instance running on the SQLite backend.

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

pub mod schema;

pub use schema::{TablePrefix, DEFAULT_TABLE_PREFIX, PROP_EMAIL, PROP_FULL_NAME};

/// One result row keyed by column name
pub type Row = HashMap<String, Value>;

/// Parameterized access to the backing database.
///
/// Implementations must bind every parameter; callers never splice user
/// input into SQL text.
pub trait Gateway {
    /// Run a query and collect all rows
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a query and return its first row, if any
    fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Run a query bounded to `limit` rows starting at `offset`
    fn limit_query(
        &self,
        sql: &str,
        offset: u64,
        limit: u64,
        params: &[Value],
    ) -> Result<Vec<Row>>;

    /// Quote a string as an SQL literal
    fn quote(&self, value: &str) -> String;

    /// Escape pattern metacharacters so `value` matches literally
    fn escape_pattern(&self, value: &str) -> String;

    /// Case-insensitive pattern match of `column` against one bound pattern.
    ///
    /// SQLite's `LOWER` folds ASCII letters only, so with [`Database`]
    /// non-ASCII letters still match case-sensitively (`MÜLLER` does not
    /// find `Müller`).
    fn ilike(&self, column: &str) -> String;

    /// Render `sql` with its parameters inlined, for debug output only
    fn render(&self, sql: &str, params: &[Value]) -> String {
        let mut params = params.iter();
        let mut out = String::with_capacity(sql.len());
        for c in sql.chars() {
            if c == '?' {
                if let Some(value) = params.next() {
                    out.push_str(&self.literal(value));
                    continue;
                }
            }
            out.push(c);
        }
        out
    }

    /// SQL literal for a bound value
    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(s) => self.quote(s),
            Value::Blob(b) => format!("<{} byte blob>", b.len()),
        }
    }
}

pub struct Database {
    conn: Connection,
    sql_debug: bool,
}

impl Database {
    /// Open an existing Nextcloud SQLite database read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!(path = %path.as_ref().display(), "opened nextcloud database");
        Ok(Self {
            conn,
            sql_debug: false,
        })
    }

    /// Open in-memory database with the address book tables, for testing
    pub fn open_memory(prefix: &TablePrefix) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&prefix.create_tables_sql())?;
        Ok(Self {
            conn,
            sql_debug: false,
        })
    }

    /// Log every statement with its parameters inlined
    pub fn with_sql_debug(mut self, sql_debug: bool) -> Self {
        self.sql_debug = sql_debug;
        self
    }

    #[allow(dead_code)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn trace(&self, sql: &str, params: &[Value]) {
        if self.sql_debug {
            tracing::debug!(target: "nc_addressbook::sql", "{}", self.render(sql, params));
        } else {
            tracing::trace!(target: "nc_addressbook::sql", params = params.len(), "{}", sql);
        }
    }
}

impl Gateway for Database {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.trace(sql, params);

        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                let mut map = Row::with_capacity(columns.len());
                for (idx, name) in columns.iter().enumerate() {
                    map.insert(name.clone(), row.get::<_, Value>(idx)?);
                }
                Ok(map)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn limit_query(
        &self,
        sql: &str,
        offset: u64,
        limit: u64,
        params: &[Value],
    ) -> Result<Vec<Row>> {
        let sql = format!("{}\nLIMIT ? OFFSET ?", sql.trim_end());
        let mut bound = params.to_vec();
        bound.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        bound.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
        self.query(&sql, &bound)
    }

    fn quote(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Escape LIKE metacharacters (% _ \)
    fn escape_pattern(&self, value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '%' | '_' | '\\' => {
                    result.push('\\');
                    result.push(c);
                }
                _ => result.push(c),
            }
        }
        result
    }

    fn ilike(&self, column: &str) -> String {
        // ESCAPE '\' enables backslash escaping for % and _ literals
        format!("LOWER({}) LIKE LOWER(?) ESCAPE '\\'", column)
    }
}
