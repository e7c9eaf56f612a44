use crate::datastore::postfilters::PostFilters;
use crate::datastore::tables::{comments, follows, groups, posts, users};
use chrono::{offset::Utc, DateTime};
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An author/reader. Accounts are provisioned by the login service; this service
/// only ever reads them.
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

/// A named category that posts can belong to.
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
}

/// A post from a user. `created_at` is set on insert and never modified.
#[derive(
    Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, Associations,
)]
#[belongs_to(User, foreign_key = "author_id")]
pub struct Post {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
    pub image_kind: Option<ImageKind>,
}

/// Image formats the service accepts, stored alongside the media path so the file can be
/// served with the right content type.
#[derive(DbEnum, Debug, PartialEq, Serialize, Deserialize, Clone, Copy, Eq, Hash)]
pub enum ImageKind {
    Gif,
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl Post {
    /// Does this post match all specified filters?
    pub fn matches(&self, filters: &PostFilters) -> bool {
        if let Some(id) = filters.id {
            if id != self.id {
                return false;
            }
        }
        if let Some(author_id) = filters.author_id {
            if author_id != self.author_id {
                return false;
            }
        }
        if let Some(group_id) = filters.group_id {
            if Some(group_id) != self.group_id {
                return false;
            }
        }
        if let Some(substring) = &filters.text_contains {
            if !self.text.contains(substring) {
                return false;
            }
        }
        true
    }
}

/// Parameters for the database statement which inserts new posts.
#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
    pub image_kind: Option<ImageKind>,
}

/// Fields an author may change on one of their posts. The creation timestamp is not
/// among them. `image: None` leaves the existing attachment in place.
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<(String, ImageKind)>,
}

/// A comment on a post.
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Comment {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
}

/// Parameters for the database statement which inserts new comments.
#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub text: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
}

/// A directed subscription edge: `user_id` follows `author_id`. The pair is the table's
/// primary key, so a pair can never appear twice.
#[derive(Queryable, Insertable, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[table_name = "follows"]
pub struct Follow {
    pub user_id: Uuid,
    pub author_id: Uuid,
}

/// A post joined with the names a page actually displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostDetail {
    pub post: Post,
    pub author: String,
    pub group: Option<String>,
}

/// A comment joined with its author's username.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentDetail {
    pub comment: Comment,
    pub author: String,
}

/// Follower numbers shown on profile and post pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FollowStats {
    /// How many accounts follow this author.
    pub followers: i64,
    /// How many accounts this author follows.
    pub following: i64,
    /// Whether the viewing user follows this author. False for anonymous viewers.
    pub viewer_follows: bool,
}

#[cfg(test)]
mod post_tests {
    use super::*;

    fn post() -> Post {
        Post {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            text: "example text".to_owned(),
            author_id: Uuid::new_v4(),
            group_id: Some(Uuid::new_v4()),
            image: None,
            image_kind: None,
        }
    }

    #[test]
    fn test_post_matches_filters() {
        let post = post();

        assert!(post.matches(&PostFilters {
            author_id: Some(post.author_id),
            ..Default::default()
        }));

        assert!(post.matches(&PostFilters {
            group_id: post.group_id,
            ..Default::default()
        }));

        assert!(post.matches(&PostFilters {
            text_contains: Some("ample".to_owned()),
            ..Default::default()
        }));

        assert!(!post.matches(&PostFilters {
            author_id: Some(Uuid::new_v4()),
            ..Default::default()
        }));

        // A post with no group never matches a group filter.
        let ungrouped = Post {
            group_id: None,
            ..post
        };
        assert!(!ungrouped.matches(&PostFilters {
            group_id: Some(Uuid::new_v4()),
            ..Default::default()
        }));
    }
}
