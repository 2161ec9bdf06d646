use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Literal prefix of every public address book id we hand out
pub const PUBLIC_ID_PREFIX: &str = "nextcloud";
/// Separates [`PUBLIC_ID_PREFIX`] from the backing id
pub const PUBLIC_ID_DELIMITER: char = '_';
/// The host joins contact ids and address book ids with this character,
/// so it must never appear in a public address book id.
pub const CONTACT_ID_SEPARATOR: char = '-';
/// Appended to display names to tell these books apart from local ones
pub const ORIGIN_SUFFIX: &str = " (Nextcloud)";

/// One Nextcloud address book as seen by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBookRef {
    id: i64,
    display_name: String,
    public_id: String,
}

impl AddressBookRef {
    pub fn new(id: i64, display_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id,
            display_name: display_name.into(),
            public_id: Self::public_id_for(id)?,
        })
    }

    /// Backing id (`addressbooks.id`)
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    /// Display name annotated with its origin
    pub fn host_name(&self) -> String {
        annotate_origin(&self.display_name)
    }

    pub fn public_id_for(id: i64) -> Result<String> {
        if id < 0 {
            return Err(Error::InvalidAddressBookId(id));
        }
        let public_id = format!("{}{}{}", PUBLIC_ID_PREFIX, PUBLIC_ID_DELIMITER, id);
        debug_assert!(!public_id.contains(CONTACT_ID_SEPARATOR));
        Ok(public_id)
    }

    /// Parse a public id back into its backing id.
    ///
    /// Returns `None` for ids that belong to some other source.
    pub fn parse_public_id(public_id: &str) -> Option<i64> {
        let (prefix, rest) = public_id.split_once(PUBLIC_ID_DELIMITER)?;
        if prefix != PUBLIC_ID_PREFIX || rest.is_empty() {
            return None;
        }
        if !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    }
}

pub fn annotate_origin(display_name: &str) -> String {
    format!("{}{}", display_name, ORIGIN_SUFFIX)
}
