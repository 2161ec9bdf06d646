//! Read-only contact listing over one Nextcloud address book.

use rusqlite::types::Value;
use tracing::debug;

use super::query::{MatchMode, Predicate, QueryBuilder, SearchField, SearchFields};
use super::AddressBookSource;
use crate::db::{Gateway, TablePrefix, PROP_EMAIL, PROP_FULL_NAME};
use crate::error::Result;
use crate::models::{
    annotate_origin, column_i64, AddressBookRef, ContactRecord, PageSpec, ResultSet,
    EMAIL_DELIMITER,
};

/// Parameters of a single search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub fields: SearchFields,
    pub value: String,
    pub mode: MatchMode,
    /// `false` only counts matches without fetching them
    pub select: bool,
    /// Report the page-local record count instead of the full total
    pub no_count: bool,
    /// Fields that must not be empty in matching records
    pub required: Vec<SearchField>,
}

impl SearchRequest {
    pub fn new(fields: SearchFields, value: impl Into<String>) -> Self {
        Self {
            fields,
            value: value.into(),
            mode: MatchMode::default(),
            select: true,
            no_count: false,
            required: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn count_only(mut self) -> Self {
        self.select = false;
        self
    }

    pub fn no_count(mut self) -> Self {
        self.no_count = true;
        self
    }

    pub fn require(mut self, field: SearchField) -> Self {
        self.required.push(field);
        self
    }
}

/// Filter, page and count cache of one listing session.
///
/// `count` always belongs to `filter`: changing the filter drops it.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    filter: Option<Predicate>,
    page: PageSpec,
    count: Option<u64>,
}

pub struct ContactBackend<'g, G: Gateway + ?Sized> {
    gateway: &'g G,
    tables: TablePrefix,
    book_id: i64,
    state: SearchState,
    result: Option<ResultSet>,
}

impl<'g, G: Gateway + ?Sized> ContactBackend<'g, G> {
    pub fn new(gateway: &'g G, tables: TablePrefix, book_id: i64) -> Self {
        Self {
            gateway,
            tables,
            book_id,
            state: SearchState::default(),
            result: None,
        }
    }

    pub fn book_id(&self) -> i64 {
        self.book_id
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Property rows of this book: EMAIL rows as `p_email`, joined with the
    /// FN row of the same card as `p_name`
    fn from_clause(&self) -> String {
        let props = self.tables.cards_properties();
        format!(
            r#"FROM {props} AS p_email
                JOIN {props} AS p_name
                    ON p_name.cardid = p_email.cardid
                        AND p_name.name = '{fn_prop}'
            WHERE p_email.addressbookid = ?
                AND p_email.name = '{email_prop}'"#,
            props = props,
            fn_prop = PROP_FULL_NAME,
            email_prop = PROP_EMAIL,
        )
    }

    /// One row per card with all its EMAIL values folded into one column
    fn aggregate_sql(&self, condition: &str) -> String {
        format!(
            r#"SELECT
                p_email.cardid AS id,
                group_concat(p_email.value, char({delim}) ORDER BY p_email.value) AS email,
                p_name.value AS name
            {from}
                {condition}
            GROUP BY p_email.cardid
            ORDER BY name, email"#,
            delim = EMAIL_DELIMITER as u32,
            from = self.from_clause(),
            condition = condition,
        )
    }

    /// Listing query and parameters for the active filter.
    ///
    /// Matching cards are selected in a subquery so a card matched through
    /// one address still lists all of its addresses.
    fn listing_query(&self) -> (String, Vec<Value>) {
        let mut params = vec![Value::Integer(self.book_id)];
        let condition = match &self.state.filter {
            Some(filter) => {
                params.push(Value::Integer(self.book_id));
                params.extend(filter.params().iter().cloned());
                format!(
                    "AND p_email.cardid IN (SELECT p_email.cardid {} AND ({}))",
                    self.from_clause(),
                    filter.sql()
                )
            }
            None => String::new(),
        };
        (self.aggregate_sql(&condition), params)
    }

    fn fetch_count(&self) -> Result<u64> {
        let mut params = vec![Value::Integer(self.book_id)];
        let condition = match &self.state.filter {
            Some(filter) => {
                params.extend(filter.params().iter().cloned());
                format!("AND ({})", filter.sql())
            }
            None => String::new(),
        };
        let sql = format!(
            "SELECT COUNT(DISTINCT p_email.cardid) AS cnt\n{}\n{}",
            self.from_clause(),
            condition
        );

        let count = match self.gateway.query_one(&sql, &params)? {
            Some(row) => column_i64(&row, "cnt")?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl<'g, G: Gateway + ?Sized> AddressBookSource for ContactBackend<'g, G> {
    fn name(&self) -> Result<String> {
        let sql = format!(
            "SELECT displayname FROM {} WHERE id = ?",
            self.tables.addressbooks()
        );
        let row = self
            .gateway
            .query_one(&sql, &[Value::Integer(self.book_id)])?;

        match row.and_then(|r| r.get("displayname").cloned()) {
            Some(Value::Text(name)) => Ok(annotate_origin(&name)),
            _ => Ok(annotate_origin(&AddressBookRef::public_id_for(self.book_id)?)),
        }
    }

    fn set_filter(&mut self, filter: Option<Predicate>) {
        self.state.filter = filter;
        self.state.count = None;
        self.result = None;
    }

    fn filter(&self) -> Option<&Predicate> {
        self.state.filter.as_ref()
    }

    fn reset(&mut self) {
        self.set_filter(None);
    }

    fn set_page(&mut self, page: PageSpec) {
        self.state.page = page;
    }

    fn page(&self) -> PageSpec {
        self.state.page
    }

    fn list_records(&mut self, page: PageSpec, no_count: bool) -> Result<ResultSet> {
        self.state.page = page;

        let (sql, params) = self.listing_query();
        let rows = self
            .gateway
            .limit_query(&sql, page.offset(), u64::from(page.size()), &params)?;

        let mut result = ResultSet::new(0, page.offset());
        for row in &rows {
            result.add(ContactRecord::from_row(row)?);
        }

        result.count = if no_count {
            result.len() as u64
        } else {
            self.count()?
        };

        debug!(
            book = self.book_id,
            page = page.number(),
            size = page.size(),
            records = result.len(),
            count = result.count,
            "listed contacts"
        );

        self.result = Some(result.clone());
        Ok(result)
    }

    fn search(&mut self, request: &SearchRequest) -> Result<ResultSet> {
        let builder = QueryBuilder::new(self.gateway);
        let Some(mut filter) = builder.build(&request.fields, &request.value, request.mode) else {
            debug!(book = self.book_id, fields = ?request.fields, "no searchable fields requested");
            return Ok(ResultSet::default());
        };
        if let Some(required) = builder.required(&request.required) {
            filter = filter.and(required);
        }

        debug!(book = self.book_id, mode = request.mode.as_str(), "search");
        self.set_filter(Some(filter));

        if request.select {
            self.list_records(self.state.page, request.no_count)
        } else {
            let count = self.count()?;
            Ok(ResultSet::new(count, self.state.page.offset()))
        }
    }

    fn count(&mut self) -> Result<u64> {
        if let Some(count) = self.state.count {
            return Ok(count);
        }
        let count = self.fetch_count()?;
        self.state.count = Some(count);
        Ok(count)
    }

    fn get_record(&mut self, id: i64) -> Result<Option<ContactRecord>> {
        let sql = self.aggregate_sql("AND p_email.cardid = ?");
        let row = self.gateway.query_one(
            &sql,
            &[Value::Integer(self.book_id), Value::Integer(id)],
        )?;

        let Some(row) = row else {
            debug!(book = self.book_id, card = id, "contact not found");
            return Ok(None);
        };

        let record = ContactRecord::from_row(&row)?;
        let mut result = ResultSet::new(1, 0);
        result.add(record.clone());
        self.result = Some(result);

        Ok(Some(record))
    }

    fn result(&self) -> Option<&ResultSet> {
        self.result.as_ref()
    }
}
