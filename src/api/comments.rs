use crate::api::{not_found, observe, redirect_to, AuthorPost, State};
use crate::auth::Identity;
use crate::datastore::structs::NewComment;
use crate::datastore::Store;
use crate::errors::Fallible;
use crate::forms::CommentForm;
use actix_web::{web, HttpResponse};

// Add a comment to a post, then bounce back to the post page.
pub(crate) async fn add_comment<S: Store>(
    state: web::Data<State<S>>,
    path: web::Path<AuthorPost>,
    identity: Identity,
    form: web::Form<CommentForm>,
) -> Fallible<HttpResponse> {
    observe("add_comment", || async {
        let path = path.into_inner();
        let post_id = path.post_uuid()?;
        guard!(let Some(detail) = state.ds.find_post(path.username.clone(), post_id).await? else {
            return Err(not_found("No such post"));
        });
        let text = match form.into_inner().validate() {
            Ok(text) => text,
            Err(errors) => return Ok(HttpResponse::Ok().json(errors)),
        };
        state
            .ds
            .new_comment(NewComment {
                text,
                post_id: detail.post.id,
                author_id: identity.user_id,
            })
            .await?;
        Ok(redirect_to(&format!(
            "/{}/{}",
            path.username, path.post_id
        )))
    })
    .await
}
