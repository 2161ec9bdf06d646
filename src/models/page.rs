use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A 1-based page window over an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    number: u32,
    size: u32,
}

impl PageSpec {
    /// Validate a page request.
    ///
    /// Negative sizes would ask for the tail of the listing, which is not
    /// supported and rejected like any other invalid size.
    pub fn new(size: i64, number: i64) -> Result<Self> {
        if size < 0 {
            return Err(Error::InvalidPage(format!(
                "page size {} asks for a tail listing, which is not supported",
                size
            )));
        }
        let size = u32::try_from(size)
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| Error::InvalidPage(format!("page size {} out of range", size)))?;
        let number = u32::try_from(number)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| Error::InvalidPage(format!("page number {} out of range", number)))?;

        Ok(Self { number, size })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Index of the first record on this page
    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}
