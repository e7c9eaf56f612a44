use crate::datastore::{
    pagination::{Page, PostPage, PAGE_SIZE},
    postfilters::PostFilters,
    structs::{
        Comment, CommentDetail, Follow, FollowStats, Group, NewComment, NewPost, Post,
        PostChanges, PostDetail, User,
    },
    Store,
};
use crate::errors::Fallible;
use async_trait::async_trait;
use chrono::offset::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Table<T> = Arc<Mutex<Vec<T>>>;

/// An in-memory implementation of datastore::Store
#[derive(Clone, Default, Debug)]
pub struct MockStore {
    users: Table<User>,
    groups: Table<Group>,
    posts: Table<Post>,
    comments: Table<Comment>,
    follows: Table<Follow>,
}

/// Seeding and inspection helpers for tests.
impl MockStore {
    pub fn add_user(&self, username: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            username: username.to_owned(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn add_group(&self, title: &str, slug: &str) -> Group {
        let group = Group {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            description: format!("About {}", title),
            slug: slug.to_owned(),
        };
        self.groups.lock().unwrap().push(group.clone());
        group
    }

    pub fn add_post(&self, author: &User, text: &str) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            text: text.to_owned(),
            author_id: author.id,
            group_id: None,
            image: None,
            image_kind: None,
        };
        self.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn all_follows(&self) -> Vec<Follow> {
        self.follows.lock().unwrap().clone()
    }

    pub fn all_posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    pub fn all_comments(&self) -> Vec<Comment> {
        self.comments.lock().unwrap().clone()
    }

    fn username_of(&self, user_id: Uuid) -> String {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn slug_of(&self, group_id: Uuid) -> Option<String> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.slug.clone())
    }

    fn detail(&self, post: Post) -> PostDetail {
        let author = self.username_of(post.author_id);
        let group = post.group_id.and_then(|id| self.slug_of(id));
        PostDetail {
            post,
            author,
            group,
        }
    }

    /// Sort newest-first and cut out the requested page, like the real queries do.
    fn page_of(&self, mut matching: Vec<Post>, page: Page) -> PostPage {
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let posts = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(PAGE_SIZE as usize)
            .map(|post| self.detail(post))
            .collect();
        PostPage {
            posts,
            number: page.number(),
            total,
        }
    }
}

#[async_trait]
impl Store for MockStore {
    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            text: new_post.text,
            author_id: new_post.author_id,
            group_id: new_post.group_id,
            image: new_post.image,
            image_kind: new_post.image_kind,
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        changes: PostChanges,
    ) -> Fallible<Option<Post>> {
        let updated = self
            .posts
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == post_id && p.author_id == author_id)
            .map(|post| {
                post.text = changes.text;
                post.group_id = changes.group_id;
                if let Some((path, kind)) = changes.image {
                    post.image = Some(path);
                    post.image_kind = Some(kind);
                }
                post.clone()
            });
        Ok(updated)
    }

    async fn list_posts(&self, filters: PostFilters, page: Page) -> Fallible<PostPage> {
        let matching: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.matches(&filters))
            .cloned()
            .collect();
        Ok(self.page_of(matching, page))
    }

    async fn find_post(&self, username: String, post_id: Uuid) -> Fallible<Option<PostDetail>> {
        let author = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned();
        guard!(let Some(author) = author else {
            return Ok(None);
        });
        let post = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == post_id && p.author_id == author.id)
            .cloned();
        Ok(post.map(|p| self.detail(p)))
    }

    async fn user_by_name(&self, username: String) -> Fallible<Option<User>> {
        let user = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned();
        Ok(user)
    }

    async fn group_by_slug(&self, slug: String) -> Fallible<Option<Group>> {
        let group = self
            .groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.slug == slug)
            .cloned();
        Ok(group)
    }

    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            text: new_comment.text,
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn comments_for(&self, post_id: Uuid) -> Fallible<Vec<CommentDetail>> {
        let mut matching: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching
            .into_iter()
            .map(|comment| {
                let author = self.username_of(comment.author_id);
                CommentDetail { comment, author }
            })
            .collect())
    }

    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()> {
        if user_id == author_id {
            return Ok(());
        }
        let mut follows = self.follows.lock().unwrap();
        let exists = follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id);
        if !exists {
            follows.push(Follow { user_id, author_id });
        }
        Ok(())
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()> {
        self.follows
            .lock()
            .unwrap()
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(())
    }

    async fn feed(&self, user_id: Uuid, page: Page) -> Fallible<PostPage> {
        let followed: Vec<Uuid> = self
            .follows
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.author_id)
            .collect();
        let matching: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| followed.contains(&p.author_id))
            .cloned()
            .collect();
        Ok(self.page_of(matching, page))
    }

    async fn follow_stats(&self, author_id: Uuid, viewer: Option<Uuid>) -> Fallible<FollowStats> {
        let follows = self.follows.lock().unwrap();
        let followers = follows.iter().filter(|f| f.author_id == author_id).count() as i64;
        let following = follows.iter().filter(|f| f.user_id == author_id).count() as i64;
        let viewer_follows = viewer
            .map(|v| {
                follows
                    .iter()
                    .any(|f| f.user_id == v && f.author_id == author_id)
            })
            .unwrap_or(false);
        Ok(FollowStats {
            followers,
            following,
            viewer_follows,
        })
    }
}

#[cfg(test)]
mod follow_tests {
    use super::*;
    use crate::datastore::pagination::Page;

    #[actix_rt::test]
    async fn test_feed_is_followed_authors_newest_first() {
        let ds = MockStore::default();
        let reader = ds.add_user("leo");
        let followed = ds.add_user("anna");
        let stranger = ds.add_user("boris");
        let first = ds.add_post(&followed, "first");
        std::thread::sleep(std::time::Duration::from_micros(10));
        let second = ds.add_post(&followed, "second");
        ds.add_post(&stranger, "unrelated");

        ds.follow(reader.id, followed.id).await.unwrap();
        let feed = ds.feed(reader.id, Page::default()).await.unwrap();

        let ids: Vec<_> = feed.posts.iter().map(|d| d.post.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(feed.total, 2);
    }

    #[actix_rt::test]
    async fn test_follow_twice_keeps_one_edge() {
        let ds = MockStore::default();
        let reader = ds.add_user("leo");
        let author = ds.add_user("anna");

        ds.follow(reader.id, author.id).await.unwrap();
        ds.follow(reader.id, author.id).await.unwrap();

        assert_eq!(ds.all_follows().len(), 1);
    }

    #[actix_rt::test]
    async fn test_unfollow_without_edge_is_a_noop() {
        let ds = MockStore::default();
        let reader = ds.add_user("leo");
        let author = ds.add_user("anna");

        ds.unfollow(reader.id, author.id).await.unwrap();

        assert!(ds.all_follows().is_empty());
    }

    #[actix_rt::test]
    async fn test_cannot_follow_yourself() {
        let ds = MockStore::default();
        let reader = ds.add_user("leo");

        ds.follow(reader.id, reader.id).await.unwrap();

        assert!(ds.all_follows().is_empty());
    }

    #[actix_rt::test]
    async fn test_follow_then_unfollow_empties_the_feed() {
        let ds = MockStore::default();
        let reader = ds.add_user("leo");
        let author = ds.add_user("anna");
        ds.add_post(&author, "hello");

        ds.follow(reader.id, author.id).await.unwrap();
        assert_eq!(ds.feed(reader.id, Page::default()).await.unwrap().total, 1);

        ds.unfollow(reader.id, author.id).await.unwrap();
        let feed = ds.feed(reader.id, Page::default()).await.unwrap();
        assert!(feed.posts.is_empty());
        assert_eq!(feed.total, 0);
    }
}
