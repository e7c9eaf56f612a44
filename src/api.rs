//! HTTP handlers. For every business-logic struct in `datastore`, this module has a
//! matching view struct shaping what pages actually display.
use crate::datastore::pagination::{Page, PostPage};
use crate::datastore::structs::{CommentDetail, FollowStats, PostDetail};
use crate::datastore::Store;
use crate::errors::{AppError, Describe, Fallible, PublicError};
use crate::metrics;
use actix_web::{http::header, web, HttpResponse};
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub mod admin;
pub mod comments;
pub mod follows;
pub mod posts;

/// Shared state for the userfacing handlers.
#[derive(Clone)]
pub struct State<S> {
    pub ds: Arc<S>,
    /// Where uploaded post images get written.
    pub media_root: PathBuf,
}

/// Wire up the userfacing routes. Literal segments (`/group`, `/new`, `/follow`) are
/// registered before the `/{username}` catch-alls so they win the match.
pub fn configure<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(posts::index::<S>)))
        .service(web::resource("/group/{slug}").route(web::get().to(posts::group_posts::<S>)))
        .service(web::resource("/new").route(web::post().to(posts::new_post::<S>)))
        .service(web::resource("/follow").route(web::get().to(follows::follow_index::<S>)))
        .service(web::resource("/{username}").route(web::get().to(follows::profile::<S>)))
        .service(
            web::resource("/{username}/follow").route(web::get().to(follows::profile_follow::<S>)),
        )
        .service(
            web::resource("/{username}/unfollow")
                .route(web::get().to(follows::profile_unfollow::<S>)),
        )
        .service(web::resource("/{username}/{post_id}").route(web::get().to(posts::post_view::<S>)))
        .service(
            web::resource("/{username}/{post_id}/edit").route(web::post().to(posts::post_edit::<S>)),
        )
        .service(
            web::resource("/{username}/{post_id}/comment")
                .route(web::post().to(comments::add_comment::<S>)),
        );
}

/// Just a named pair that can be extracted from the path of many endpoints. The post id
/// stays a string here so a mangled id takes the 404 path instead of failing extraction.
#[derive(Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq, Clone)]
pub struct AuthorPost {
    pub username: String,
    pub post_id: String,
}

impl AuthorPost {
    /// Parse the id segment. A non-UUID id can't name a post, so it reads as missing.
    pub fn post_uuid(&self) -> Result<Uuid, AppError> {
        self.post_id.parse().map_err(|_| not_found("No such post"))
    }
}

/// Page number from the query string, e.g. `?page=3`. Parsed leniently: anything that
/// isn't a positive number serves page 1, the way the original paginator does.
#[derive(Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        self.page
            .as_deref()
            .and_then(|p| p.parse().ok())
            .map(Page::new)
            .unwrap_or_default()
    }
}

/// A post as shown to users.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct PostView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub author: String,
    pub group: Option<String>,
    pub image: Option<String>,
}

impl From<PostDetail> for PostView {
    fn from(d: PostDetail) -> Self {
        Self {
            id: d.post.id,
            created_at: d.post.created_at,
            text: d.post.text,
            author: d.author,
            group: d.group,
            image: d.post.image,
        }
    }
}

/// A comment as shown on a post page.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct CommentView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub author: String,
}

impl From<CommentDetail> for CommentView {
    fn from(d: CommentDetail) -> Self {
        Self {
            id: d.comment.id,
            created_at: d.comment.created_at,
            text: d.comment.text,
            author: d.author,
        }
    }
}

/// One listing page plus the paginator context the original templates rendered.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct PageBody {
    pub page: u32,
    pub num_pages: u32,
    pub total: i64,
    pub posts: Vec<PostView>,
}

impl From<PostPage> for PageBody {
    fn from(p: PostPage) -> Self {
        let num_pages = p.num_pages();
        Self {
            page: p.number,
            num_pages,
            total: p.total,
            posts: p.posts.coerce_into(),
        }
    }
}

/// Follower numbers, reused by the profile and post pages.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct StatsView {
    pub followers: i64,
    pub following: i64,
    pub viewer_follows: bool,
}

impl From<FollowStats> for StatsView {
    fn from(s: FollowStats) -> Self {
        Self {
            followers: s.followers,
            following: s.following,
            viewer_follows: s.viewer_follows,
        }
    }
}

pub trait CoerceColl<T>
where
    Self: IntoIterator<Item = T>,
{
    fn coerce_into<U: From<T>>(self) -> Vec<U>;
}

impl<T> CoerceColl<T> for Vec<T> {
    fn coerce_into<U: From<T>>(self) -> Vec<U> {
        self.into_iter().map(|v| v.into()).collect()
    }
}

/// The 302 that ends every successful form submission.
pub(crate) fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .header(header::LOCATION, location)
        .finish()
}

/// A 404 whose internal face says which lookup missed.
pub(crate) fn not_found(text: &'static str) -> AppError {
    anyhow::anyhow!("lookup missed: {}", text).describe(PublicError::not_found(text))
}

/// Execute the closure, then log its operational metrics, e.g. time taken, whether it returned Ok/Err, etc.
async fn observe<F, Fut, R>(name: &'static str, f: F) -> Fallible<R>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Fallible<R>>,
{
    let start = Instant::now();
    let return_val = f().await;
    let duration = start.elapsed();
    metrics::HANDLER_SECS
        .with_label_values(&[name])
        .observe(duration.as_secs_f64());
    metrics::RESPONSES
        .with_label_values(&[name, variant_name(&return_val)])
        .inc();
    return_val
}

fn variant_name<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "err"
    }
}
