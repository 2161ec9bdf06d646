//! Translation of search requests into SQL predicate fragments.
//!
//! Fragments reference the aliases of the listing query: `p_email` for the
//! EMAIL property rows and `p_name` for the FN row of the same card.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::Gateway;

const CARD_ID_COLUMN: &str = "p_email.cardid";

/// A field that can be searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    Email,
}

impl SearchField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Name => "p_name.value",
            Self::Email => "p_email.value",
        }
    }

    pub fn all() -> &'static [SearchField] {
        &[Self::Name, Self::Email]
    }
}

/// Which fields a search looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFields {
    /// Exact card id lookup
    Id,
    /// Every searchable field
    All,
    /// Named fields; names that are not searchable are ignored
    Named(Vec<String>),
}

impl SearchFields {
    /// `ID`, `*`, or a comma separated list of field names
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "ID" => Self::Id,
            "*" => Self::All,
            list => Self::Named(
                list.split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect(),
            ),
        }
    }
}

/// How a value is compared against a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Exact, case-sensitive equality
    Strict,
    /// Case-insensitive, value at the start
    Prefix,
    /// Case-insensitive, value anywhere
    #[default]
    Substring,
}

impl MatchMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" | "exact" => Some(Self::Strict),
            "prefix" => Some(Self::Prefix),
            "substring" | "contains" => Some(Self::Substring),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Prefix => "prefix",
            Self::Substring => "substring",
        }
    }
}

/// SQL condition plus the values bound to its placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    sql: String,
    params: Vec<Value>,
}

impl Predicate {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// OR all parts together; `None` when there are no parts
    pub fn any(parts: Vec<Predicate>) -> Option<Predicate> {
        if parts.is_empty() {
            return None;
        }
        let sql = parts
            .iter()
            .map(|p| p.sql.as_str())
            .collect::<Vec<_>>()
            .join(" OR ");
        let params = parts.into_iter().flat_map(|p| p.params).collect();
        Some(Self::new(format!("({})", sql), params))
    }

    pub fn and(mut self, other: Predicate) -> Predicate {
        self.sql = format!("{} AND {}", self.sql, other.sql);
        self.params.extend(other.params);
        self
    }
}

/// Builds predicates, escaping through the gateway's dialect helpers
pub struct QueryBuilder<'g, G: Gateway + ?Sized> {
    gateway: &'g G,
}

impl<'g, G: Gateway + ?Sized> QueryBuilder<'g, G> {
    pub fn new(gateway: &'g G) -> Self {
        Self { gateway }
    }

    /// Build the predicate for a search.
    ///
    /// `None` means no searchable field was requested. Callers must treat
    /// that as "nothing to search for", never as "match everything".
    pub fn build(&self, fields: &SearchFields, value: &str, mode: MatchMode) -> Option<Predicate> {
        match fields {
            SearchFields::Id => Some(Predicate::new(
                format!("{} = ?", CARD_ID_COLUMN),
                vec![Value::Integer(coerce_card_id(value))],
            )),
            SearchFields::All => Predicate::any(
                SearchField::all()
                    .iter()
                    .map(|f| self.field(*f, value, mode))
                    .collect(),
            ),
            SearchFields::Named(names) => Predicate::any(
                names
                    .iter()
                    .filter_map(|name| SearchField::parse(name))
                    .map(|f| self.field(f, value, mode))
                    .collect(),
            ),
        }
    }

    /// Predicate for a single field
    pub fn field(&self, field: SearchField, value: &str, mode: MatchMode) -> Predicate {
        let column = field.column();
        match mode {
            MatchMode::Strict => Predicate::new(
                format!("{} = ?", column),
                vec![Value::Text(value.to_string())],
            ),
            MatchMode::Prefix => Predicate::new(
                self.gateway.ilike(column),
                vec![Value::Text(format!("{}%", self.gateway.escape_pattern(value)))],
            ),
            MatchMode::Substring => Predicate::new(
                self.gateway.ilike(column),
                vec![Value::Text(format!("%{}%", self.gateway.escape_pattern(value)))],
            ),
        }
    }

    /// Require the given fields to be non-empty
    pub fn required(&self, fields: &[SearchField]) -> Option<Predicate> {
        let mut fields = fields.to_vec();
        fields.dedup();
        fields
            .into_iter()
            .map(|f| Predicate::new(format!("{} <> ''", f.column()), Vec::new()))
            .reduce(Predicate::and)
    }
}

/// Leading-integer conversion: optional sign and digits after leading
/// whitespace; anything else yields 0. Out of range values saturate.
pub fn coerce_card_id(value: &str) -> i64 {
    let s = value.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut n: i64 = 0;
    for d in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(d - b'0');
        n = match n.checked_mul(10).and_then(|n| {
            if negative {
                n.checked_sub(d)
            } else {
                n.checked_add(d)
            }
        }) {
            Some(n) => n,
            None if negative => return i64::MIN,
            None => return i64::MAX,
        };
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, TablePrefix};

    fn db() -> Database {
        Database::open_memory(&TablePrefix::default()).unwrap()
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_id_predicate() {
        let db = db();
        let p = QueryBuilder::new(&db)
            .build(&SearchFields::Id, "42", MatchMode::Substring)
            .unwrap();
        assert_eq!(p.sql(), "p_email.cardid = ?");
        assert_eq!(p.params(), &[Value::Integer(42)]);
    }

    #[test]
    fn test_id_non_numeric_is_zero() {
        let db = db();
        let p = QueryBuilder::new(&db)
            .build(&SearchFields::Id, "abc", MatchMode::Strict)
            .unwrap();
        assert_eq!(p.params(), &[Value::Integer(0)]);
    }

    #[test]
    fn test_coerce_card_id() {
        assert_eq!(coerce_card_id("42"), 42);
        assert_eq!(coerce_card_id("  17abc"), 17);
        assert_eq!(coerce_card_id("-5"), -5);
        assert_eq!(coerce_card_id("+8"), 8);
        assert_eq!(coerce_card_id(""), 0);
        assert_eq!(coerce_card_id("x1"), 0);
        assert_eq!(coerce_card_id("99999999999999999999"), i64::MAX);
        assert_eq!(coerce_card_id("-99999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_wildcard_ors_name_and_email() {
        let db = db();
        let p = QueryBuilder::new(&db)
            .build(&SearchFields::All, "smith", MatchMode::Substring)
            .unwrap();
        assert_eq!(
            p.sql(),
            "(LOWER(p_name.value) LIKE LOWER(?) ESCAPE '\\' OR LOWER(p_email.value) LIKE LOWER(?) ESCAPE '\\')"
        );
        assert_eq!(p.params(), &[text("%smith%"), text("%smith%")]);
    }

    #[test]
    fn test_named_fields_skip_unknown() {
        let db = db();
        let fields = SearchFields::Named(vec!["phone".into(), "email".into()]);
        let p = QueryBuilder::new(&db)
            .build(&fields, "jo", MatchMode::Prefix)
            .unwrap();
        assert_eq!(p.sql(), "(LOWER(p_email.value) LIKE LOWER(?) ESCAPE '\\')");
        assert_eq!(p.params(), &[text("jo%")]);
    }

    #[test]
    fn test_no_known_fields_is_empty() {
        let db = db();
        let fields = SearchFields::Named(vec!["phone".into(), "ID".into()]);
        assert!(QueryBuilder::new(&db)
            .build(&fields, "x", MatchMode::Substring)
            .is_none());
        assert!(QueryBuilder::new(&db)
            .build(&SearchFields::Named(vec![]), "x", MatchMode::Substring)
            .is_none());
    }

    #[test]
    fn test_strict_binds_value_verbatim() {
        let db = db();
        let p = QueryBuilder::new(&db).field(SearchField::Name, "50%_off", MatchMode::Strict);
        assert_eq!(p.sql(), "p_name.value = ?");
        assert_eq!(p.params(), &[text("50%_off")]);
    }

    #[test]
    fn test_pattern_value_is_escaped() {
        let db = db();
        let p = QueryBuilder::new(&db).field(SearchField::Email, "a_b%", MatchMode::Substring);
        assert_eq!(p.params(), &[text("%a\\_b\\%%")]);
    }

    #[test]
    fn test_value_never_in_sql_text() {
        let db = db();
        let evil = "x' OR 1=1 --";
        for mode in [MatchMode::Strict, MatchMode::Prefix, MatchMode::Substring] {
            let p = QueryBuilder::new(&db)
                .build(&SearchFields::All, evil, mode)
                .unwrap();
            assert!(!p.sql().contains(evil));
        }
    }

    #[test]
    fn test_required_fields() {
        let db = db();
        let builder = QueryBuilder::new(&db);
        assert!(builder.required(&[]).is_none());

        let p = builder
            .required(&[SearchField::Name, SearchField::Email])
            .unwrap();
        assert_eq!(p.sql(), "p_name.value <> '' AND p_email.value <> ''");
        assert!(p.params().is_empty());
    }

    #[test]
    fn test_and_keeps_param_order() {
        let a = Predicate::new("a = ?", vec![Value::Integer(1)]);
        let b = Predicate::new("b = ?", vec![Value::Integer(2)]);
        let p = a.and(b);
        assert_eq!(p.sql(), "a = ? AND b = ?");
        assert_eq!(p.params(), &[Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn test_parse_fields_and_modes() {
        assert_eq!(SearchFields::parse("ID"), SearchFields::Id);
        assert_eq!(SearchFields::parse("*"), SearchFields::All);
        assert_eq!(
            SearchFields::parse("name, email"),
            SearchFields::Named(vec!["name".into(), "email".into()])
        );
        assert_eq!(MatchMode::parse("PREFIX"), Some(MatchMode::Prefix));
        assert_eq!(MatchMode::parse("fuzzy"), None);
        assert_eq!(MatchMode::default(), MatchMode::Substring);
        assert_eq!(SearchField::parse("Email"), Some(SearchField::Email));
    }
}
