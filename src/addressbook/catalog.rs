use rusqlite::types::Value;
use tracing::{info, warn};

use super::{AddressBookCatalog, ContactBackend};
use crate::db::{Gateway, TablePrefix};
use crate::error::{Error, Result};
use crate::models::{column_i64, column_text, AddressBookRef};

/// Nextcloud stores the owner of a book as this prefix plus the user name
pub const PRINCIPAL_PREFIX: &str = "principals/users/";

pub fn principal_uri(username: &str) -> String {
    format!("{}{}", PRINCIPAL_PREFIX, username)
}

pub struct NextcloudCatalog<'g, G: Gateway + ?Sized> {
    gateway: &'g G,
    tables: TablePrefix,
}

impl<'g, G: Gateway + ?Sized> NextcloudCatalog<'g, G> {
    pub fn new(gateway: &'g G, tables: TablePrefix) -> Self {
        Self { gateway, tables }
    }

    /// Append the user's books to the autocomplete sources, keeping order
    /// and skipping ids that are already listed
    pub fn autocomplete_sources(&self, existing: &[String], username: &str) -> Result<Vec<String>> {
        let mut sources = existing.to_vec();
        for book in self.list(username)? {
            if !sources.iter().any(|s| s == book.public_id()) {
                sources.push(book.public_id().to_string());
            }
        }
        Ok(sources)
    }

    fn owner_of(&self, book_id: i64) -> Result<Option<String>> {
        let sql = format!(
            "SELECT principaluri FROM {} WHERE id = ?",
            self.tables.addressbooks()
        );
        match self.gateway.query_one(&sql, &[Value::Integer(book_id)])? {
            Some(row) => column_text(&row, "principaluri"),
            None => Ok(None),
        }
    }
}

impl<'g, G: Gateway + ?Sized> AddressBookCatalog for NextcloudCatalog<'g, G> {
    type Source = ContactBackend<'g, G>;

    fn list(&self, username: &str) -> Result<Vec<AddressBookRef>> {
        if username.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, displayname FROM {} WHERE principaluri = ? ORDER BY displayname",
            self.tables.addressbooks()
        );
        let rows = self
            .gateway
            .query(&sql, &[Value::Text(principal_uri(username))])?;

        rows.iter()
            .map(|row| {
                let id = column_i64(row, "id")?;
                let name = column_text(row, "displayname")?.unwrap_or_default();
                AddressBookRef::new(id, name)
            })
            .collect()
    }

    fn open(&self, public_id: &str, username: &str) -> Result<Option<Self::Source>> {
        let Some(book_id) = AddressBookRef::parse_public_id(public_id) else {
            return Ok(None);
        };

        let expected = principal_uri(username);
        if username.is_empty() || self.owner_of(book_id)?.as_deref() != Some(expected.as_str()) {
            warn!(book = public_id, user = username, "address book access denied");
            return Err(Error::AccessDenied {
                book: public_id.to_string(),
                principal: expected,
            });
        }

        info!(book = public_id, user = username, "opened address book");
        Ok(Some(ContactBackend::new(
            self.gateway,
            self.tables.clone(),
            book_id,
        )))
    }
}
