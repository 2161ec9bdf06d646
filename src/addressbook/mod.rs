//! Nextcloud address books exposed as read-only contact sources.
//!
//! [`AddressBookCatalog`] finds the books of a user and opens them;
//! [`AddressBookSource`] lists, searches and counts the contacts of one
//! book. A source keeps its filter and count cache between calls, so one
//! instance serves one request and is never shared.

use crate::error::Result;
use crate::models::{AddressBookRef, ContactRecord, PageSpec, ResultSet};

pub mod backend;
pub mod catalog;
pub mod query;

pub use backend::{ContactBackend, SearchRequest, SearchState};
pub use catalog::NextcloudCatalog;
pub use query::{MatchMode, Predicate, QueryBuilder, SearchField, SearchFields};

/// List, search and count the contacts of a single address book
pub trait AddressBookSource {
    /// Display name annotated with the book's origin
    fn name(&self) -> Result<String>;

    /// Replace the active filter. Drops the cached count and last result.
    fn set_filter(&mut self, filter: Option<Predicate>);

    fn filter(&self) -> Option<&Predicate>;

    /// Forget filter, cached count and last result
    fn reset(&mut self);

    fn set_page(&mut self, page: PageSpec);

    fn page(&self) -> PageSpec;

    /// One page of contacts matching the active filter
    fn list_records(&mut self, page: PageSpec, no_count: bool) -> Result<ResultSet>;

    /// Store a new filter built from `request` and list or count its matches
    fn search(&mut self, request: &SearchRequest) -> Result<ResultSet>;

    /// Number of contacts matching the active filter
    fn count(&mut self) -> Result<u64>;

    /// Direct lookup by card id, ignoring the active filter
    fn get_record(&mut self, id: i64) -> Result<Option<ContactRecord>>;

    /// Result of the last listing or lookup
    fn result(&self) -> Option<&ResultSet>;
}

/// The address books available to a user
pub trait AddressBookCatalog {
    type Source: AddressBookSource;

    fn list(&self, username: &str) -> Result<Vec<AddressBookRef>>;

    /// Resolve a public id into a source.
    ///
    /// `Ok(None)` means the id belongs to some other catalog. Books that
    /// are not owned by `username` are refused.
    fn open(&self, public_id: &str, username: &str) -> Result<Option<Self::Source>>;
}
