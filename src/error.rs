use thiserror::Error;

/// Errors surfaced by the address book core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Column '{0}' missing from result row")]
    MissingColumn(String),

    #[error("Column '{column}' holds an unexpected {found} value")]
    ColumnType { column: String, found: &'static str },

    #[error("Invalid page request: {0}")]
    InvalidPage(String),

    #[error("Invalid table prefix '{0}': only letters, digits and '_' are allowed")]
    InvalidTablePrefix(String),

    #[error("Unsupported database DSN '{0}': expected an SQLite file")]
    UnsupportedDsn(String),

    #[error("Invalid address book id {0}: backing ids must not be negative")]
    InvalidAddressBookId(i64),

    #[error("Address book {book} does not belong to {principal}")]
    AccessDenied { book: String, principal: String },
}

pub type Result<T> = std::result::Result<T, Error>;
