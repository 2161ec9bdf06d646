//! Table naming for the Nextcloud CardDAV schema.
//!
//! The schema belongs to Nextcloud and is never migrated from here. The DDL
//! below mirrors the columns we read so in-memory fixtures look like a real
//! instance.

use crate::error::{Error, Result};

pub const DEFAULT_TABLE_PREFIX: &str = "oc_";

/// Property name holding the formatted (full) name of a card
pub const PROP_FULL_NAME: &str = "FN";
/// Property name holding one e-mail address of a card
pub const PROP_EMAIL: &str = "EMAIL";

const TABLES_V1: &str = r#"
CREATE TABLE IF NOT EXISTS {prefix}addressbooks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    principaluri TEXT,
    displayname TEXT,
    uri TEXT,
    description TEXT,
    synctoken INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS {prefix}cards_properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    addressbookid INTEGER NOT NULL DEFAULT 0,
    cardid INTEGER NOT NULL DEFAULT 0,
    name TEXT,
    value TEXT,
    preferred INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS {prefix}card_value_index ON {prefix}cards_properties(value);
CREATE INDEX IF NOT EXISTS {prefix}card_name_index ON {prefix}cards_properties(name);
CREATE INDEX IF NOT EXISTS {prefix}card_contactid_index ON {prefix}cards_properties(cardid);
"#;

/// Validated table name prefix.
///
/// The prefix is spliced into SQL text, so it is restricted to identifier
/// characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePrefix(String);

impl TablePrefix {
    pub fn parse(prefix: &str) -> Result<Self> {
        if prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            Ok(Self(prefix.to_string()))
        } else {
            Err(Error::InvalidTablePrefix(prefix.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn addressbooks(&self) -> String {
        format!("{}addressbooks", self.0)
    }

    pub fn cards_properties(&self) -> String {
        format!("{}cards_properties", self.0)
    }

    /// DDL for the tables this crate reads
    pub fn create_tables_sql(&self) -> String {
        TABLES_V1.replace("{prefix}", &self.0)
    }
}

impl Default for TablePrefix {
    fn default() -> Self {
        Self(DEFAULT_TABLE_PREFIX.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_table_names() {
        let prefix = TablePrefix::parse("nc_").unwrap();
        assert_eq!(prefix.addressbooks(), "nc_addressbooks");
        assert_eq!(prefix.cards_properties(), "nc_cards_properties");
    }

    #[test]
    fn test_empty_prefix_is_allowed() {
        let prefix = TablePrefix::parse("").unwrap();
        assert_eq!(prefix.cards_properties(), "cards_properties");
    }

    #[test]
    fn test_prefix_rejects_sql() {
        assert!(TablePrefix::parse("oc_; DROP TABLE x; --").is_err());
        assert!(TablePrefix::parse("oc-").is_err());
        assert!(TablePrefix::parse("oc.").is_err());
    }

    #[test]
    fn test_create_sql_uses_prefix() {
        let sql = TablePrefix::default().create_tables_sql();
        assert!(sql.contains("oc_addressbooks"));
        assert!(sql.contains("oc_cards_properties"));
        assert!(!sql.contains("{prefix}"));
    }
}
