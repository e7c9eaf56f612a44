use crate::api::{
    not_found, observe, redirect_to, AuthorPost, CoerceColl, CommentView, PageBody, PageQuery,
    PostView, State, StatsView,
};
use crate::auth::Identity;
use crate::datastore::postfilters::PostFilters;
use crate::datastore::structs::{ImageKind, NewPost, PostChanges};
use crate::datastore::Store;
use crate::errors::Fallible;
use crate::forms::{FormErrors, PostForm};
use crate::media;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// The front page: every post, newest first.
pub(crate) async fn index<S: Store>(
    state: web::Data<State<S>>,
    query: web::Query<PageQuery>,
) -> Fallible<web::Json<PageBody>> {
    observe("index", || async {
        let page = state
            .ds
            .list_posts(PostFilters::default(), query.page())
            .await?;
        Ok(web::Json(page.into()))
    })
    .await
}

/// A group page: the group's own fields plus one page of its posts.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct GroupBody {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub page: PageBody,
}

pub(crate) async fn group_posts<S: Store>(
    state: web::Data<State<S>>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Fallible<web::Json<GroupBody>> {
    observe("group_posts", || async {
        guard!(let Some(group) = state.ds.group_by_slug(slug.into_inner()).await? else {
            return Err(not_found("No such group"));
        });
        let page = state
            .ds
            .list_posts(PostFilters::by_group(group.id), query.page())
            .await?;
        Ok(web::Json(GroupBody {
            title: group.title,
            description: group.description,
            slug: group.slug,
            page: page.into(),
        }))
    })
    .await
}

/// A single post with its comments and the author's follower numbers.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct PostBody {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub author_stats: StatsView,
}

pub(crate) async fn post_view<S: Store>(
    state: web::Data<State<S>>,
    path: web::Path<AuthorPost>,
    viewer: Option<Identity>,
) -> Fallible<web::Json<PostBody>> {
    observe("post_view", || async {
        let path = path.into_inner();
        let post_id = path.post_uuid()?;
        guard!(let Some(detail) = state.ds.find_post(path.username, post_id).await? else {
            return Err(not_found("No such post"));
        });
        let comments = state.ds.comments_for(detail.post.id).await?;
        let stats = state
            .ds
            .follow_stats(detail.post.author_id, viewer.map(|v| v.user_id))
            .await?;
        Ok(web::Json(PostBody {
            post: detail.into(),
            comments: comments.coerce_into(),
            author_stats: stats.into(),
        }))
    })
    .await
}

// Create a post from a form submission, then send the author to the front page.
pub(crate) async fn new_post<S: Store>(
    state: web::Data<State<S>>,
    identity: Identity,
    form: web::Form<PostForm>,
) -> Fallible<HttpResponse> {
    observe("new_post", || async {
        let input = match form.into_inner().validate() {
            Ok(input) => input,
            Err(errors) => return Ok(HttpResponse::Ok().json(errors)),
        };
        let group_id = match group_id_for(&state, input.group_slug).await? {
            Ok(group_id) => group_id,
            Err(errors) => return Ok(HttpResponse::Ok().json(errors)),
        };
        let (image, image_kind) = match store_uploaded(&state, input.image)? {
            Some((path, kind)) => (Some(path), Some(kind)),
            None => (None, None),
        };
        state
            .ds
            .new_post(NewPost {
                text: input.text,
                author_id: identity.user_id,
                group_id,
                image,
                image_kind,
            })
            .await?;
        Ok(redirect_to("/"))
    })
    .await
}

// Edit a post. A caller who isn't the author is bounced to the read-only view with
// nothing saved.
pub(crate) async fn post_edit<S: Store>(
    state: web::Data<State<S>>,
    path: web::Path<AuthorPost>,
    identity: Identity,
    form: web::Form<PostForm>,
) -> Fallible<HttpResponse> {
    observe("post_edit", || async {
        let path = path.into_inner();
        let post_url = format!("/{}/{}", path.username, path.post_id);
        if identity.username != path.username {
            return Ok(redirect_to(&post_url));
        }
        let post_id = path.post_uuid()?;
        guard!(let Some(detail) = state.ds.find_post(path.username, post_id).await? else {
            return Err(not_found("No such post"));
        });
        let input = match form.into_inner().validate() {
            Ok(input) => input,
            Err(errors) => return Ok(HttpResponse::Ok().json(errors)),
        };
        let group_id = match group_id_for(&state, input.group_slug).await? {
            Ok(group_id) => group_id,
            Err(errors) => return Ok(HttpResponse::Ok().json(errors)),
        };
        let image = store_uploaded(&state, input.image)?;
        state
            .ds
            .update_post(
                detail.post.id,
                identity.user_id,
                PostChanges {
                    text: input.text,
                    group_id,
                    image,
                },
            )
            .await?;
        Ok(redirect_to(&post_url))
    })
    .await
}

/// Resolve the form's group slug. An unknown slug is a field error, like the original
/// form's choice validation, not a 404.
async fn group_id_for<S: Store>(
    state: &State<S>,
    slug: Option<String>,
) -> Fallible<Result<Option<Uuid>, FormErrors>> {
    guard!(let Some(slug) = slug else {
        return Ok(Ok(None));
    });
    match state.ds.group_by_slug(slug).await? {
        Some(group) => Ok(Ok(Some(group.id))),
        None => Ok(Err(FormErrors::single("group", "Choose an existing group."))),
    }
}

fn store_uploaded<S>(
    state: &State<S>,
    image: Option<(Vec<u8>, ImageKind)>,
) -> Fallible<Option<(String, ImageKind)>> {
    match image {
        Some((bytes, kind)) => Ok(Some((
            media::store_image(&state.media_root, &bytes, kind)?,
            kind,
        ))),
        None => Ok(None),
    }
}
