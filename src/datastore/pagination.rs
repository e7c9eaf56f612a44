//! Offset pagination for post listings. Every listing page shows [`PAGE_SIZE`] posts and
//! reports the total so clients can render page links.
use crate::datastore::structs::PostDetail;
use serde::Deserialize;

/// Posts shown per listing page.
pub const PAGE_SIZE: i64 = 10;

/// A 1-based page number requested by a client.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub struct Page(u32);

impl Page {
    pub fn new(number: u32) -> Self {
        // Page numbers start at 1.
        Page(number.max(1))
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn offset(self) -> i64 {
        i64::from(self.0 - 1) * PAGE_SIZE
    }
}

impl Default for Page {
    fn default() -> Self {
        Page(1)
    }
}

/// One page of a post listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostPage {
    pub posts: Vec<PostDetail>,
    /// The page that was served.
    pub number: u32,
    /// Total matching posts across all pages.
    pub total: i64,
}

impl PostPage {
    pub fn num_pages(&self) -> u32 {
        // An empty listing still has one (empty) page.
        ((self.total + PAGE_SIZE - 1) / PAGE_SIZE).max(1) as u32
    }
}
