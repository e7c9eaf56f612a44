use crate::api::{PageBody, PageQuery, State};
use crate::datastore::{postfilters::PostFilters, Store};
use crate::errors::Fallible;
use actix_web::web;

pub fn configure<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/posts").route(web::get().to(list_all_posts::<S>)));
}

// Admin endpoint: posts across all authors, with raw datastore filters exposed.
async fn list_all_posts<S: Store>(
    state: web::Data<State<S>>,
    filters: web::Query<PostFilters>,
    query: web::Query<PageQuery>,
) -> Fallible<web::Json<PageBody>> {
    let page = state
        .ds
        .list_posts(filters.into_inner(), query.page())
        .await?;
    Ok(web::Json(page.into()))
}
