#[cfg(test)]
pub mod mock;
pub mod pagination;
pub mod postfilters;
pub mod postgres;
pub mod structs;
pub mod tables;

use crate::datastore::structs::{
    Comment, CommentDetail, FollowStats, Group, NewComment, NewPost, Post, PostChanges,
    PostDetail, User,
};
use crate::errors::Fallible;
use async_trait::async_trait;
use pagination::{Page, PostPage};
use postfilters::PostFilters;
use uuid::Uuid;

#[async_trait]
/// The interface for storing posts, comments and the follow graph.
pub trait Store: Clone + Send + Sync + 'static {
    async fn new_post(&self, new_post: NewPost) -> Fallible<Post>;

    /// Apply `changes` to a post, but only if `author_id` wrote it. Returns None when no
    /// such post/author pair exists.
    async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        changes: PostChanges,
    ) -> Fallible<Option<Post>>;

    /// One page of posts matching `filters`, newest first.
    async fn list_posts(&self, filters: PostFilters, page: Page) -> Fallible<PostPage>;

    /// Look up a post by its author's username and its id.
    async fn find_post(&self, username: String, post_id: Uuid) -> Fallible<Option<PostDetail>>;

    async fn user_by_name(&self, username: String) -> Fallible<Option<User>>;
    async fn group_by_slug(&self, slug: String) -> Fallible<Option<Group>>;

    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment>;

    /// All comments on a post, oldest first.
    async fn comments_for(&self, post_id: Uuid) -> Fallible<Vec<CommentDetail>>;

    /// Record that `user_id` follows `author_id`. A no-op if the edge already exists, or
    /// if a user tries to follow themselves.
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()>;

    /// Remove the follow edge if it exists; a no-op otherwise.
    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()>;

    /// One page of posts written by the authors `user_id` follows, newest first.
    async fn feed(&self, user_id: Uuid, page: Page) -> Fallible<PostPage>;

    /// Follower counts for an author, plus whether `viewer` follows them.
    async fn follow_stats(&self, author_id: Uuid, viewer: Option<Uuid>) -> Fallible<FollowStats>;
}
