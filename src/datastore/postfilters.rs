//! Ways to filter posts based on their fields. Filter semantics work just like SQL:
//! If a field is unset, its filter won't be applied.
//! If set, filter out posts that don't match the filter.
use serde::Deserialize;
use uuid::Uuid;

/// Filters that can be applied to post listings on the datastore.
#[derive(Default, Deserialize, Debug, Eq, PartialEq)]
pub struct PostFilters {
    pub id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub text_contains: Option<String>,
}

impl PostFilters {
    /// Posts in one group, the listing behind `/group/{slug}`.
    pub fn by_group(group_id: Uuid) -> Self {
        Self {
            group_id: Some(group_id),
            ..Default::default()
        }
    }

    /// Posts by one author, the listing behind `/{username}`.
    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Default::default()
        }
    }
}
