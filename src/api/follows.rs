use crate::api::{not_found, observe, redirect_to, PageBody, PageQuery, State, StatsView};
use crate::auth::Identity;
use crate::datastore::postfilters::PostFilters;
use crate::datastore::Store;
use crate::errors::Fallible;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

/// A profile page: the author's posts and their follower numbers.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ProfileBody {
    pub username: String,
    pub stats: StatsView,
    pub page: PageBody,
}

pub(crate) async fn profile<S: Store>(
    state: web::Data<State<S>>,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
    viewer: Option<Identity>,
) -> Fallible<web::Json<ProfileBody>> {
    observe("profile", || async {
        guard!(let Some(author) = state.ds.user_by_name(username.into_inner()).await? else {
            return Err(not_found("No such user"));
        });
        let page = state
            .ds
            .list_posts(PostFilters::by_author(author.id), query.page())
            .await?;
        let stats = state
            .ds
            .follow_stats(author.id, viewer.map(|v| v.user_id))
            .await?;
        Ok(web::Json(ProfileBody {
            username: author.username,
            stats: stats.into(),
            page: page.into(),
        }))
    })
    .await
}

// Start following an author, then bounce back to their profile. Following someone twice,
// or yourself, changes nothing.
pub(crate) async fn profile_follow<S: Store>(
    state: web::Data<State<S>>,
    username: web::Path<String>,
    identity: Identity,
) -> Fallible<HttpResponse> {
    observe("profile_follow", || async {
        let username = username.into_inner();
        guard!(let Some(author) = state.ds.user_by_name(username.clone()).await? else {
            return Err(not_found("No such user"));
        });
        state.ds.follow(identity.user_id, author.id).await?;
        Ok(redirect_to(&format!("/{}", username)))
    })
    .await
}

pub(crate) async fn profile_unfollow<S: Store>(
    state: web::Data<State<S>>,
    username: web::Path<String>,
    identity: Identity,
) -> Fallible<HttpResponse> {
    observe("profile_unfollow", || async {
        let username = username.into_inner();
        guard!(let Some(author) = state.ds.user_by_name(username.clone()).await? else {
            return Err(not_found("No such user"));
        });
        state.ds.unfollow(identity.user_id, author.id).await?;
        Ok(redirect_to(&format!("/{}", username)))
    })
    .await
}

// The caller's feed: posts by everyone they follow, newest first.
pub(crate) async fn follow_index<S: Store>(
    state: web::Data<State<S>>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> Fallible<web::Json<PageBody>> {
    observe("follow_index", || async {
        let page = state.ds.feed(identity.user_id, query.page()).await?;
        Ok(web::Json(page.into()))
    })
    .await
}
