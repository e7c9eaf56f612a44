use crate::datastore::{
    pagination::{Page, PostPage, PAGE_SIZE},
    postfilters::PostFilters,
    postgres::{
        errors::{BlockingResp, DbPoolResult},
        PostgresStore,
    },
    structs::{
        Comment, CommentDetail, Follow, FollowStats, Group, NewComment, NewPost, Post,
        PostChanges, PostDetail, User,
    },
    tables::{comments, follows, groups, posts, users},
    Store,
};
use crate::errors::{AppError, Fallible};
use actix_web::web::block;
use async_trait::async_trait;
use diesel::{
    dsl::exists,
    expression::BoxableExpression,
    pg::{Pg, PgConnection},
    query_dsl::{QueryDsl, RunQueryDsl},
    result::Error as DieselError,
    sql_types::Bool,
    Connection, ExpressionMethods, OptionalExtension, TextExpressionMethods,
};
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
impl Store for PostgresStore {
    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        let conn = self.pool.get()?;
        let post = block(move || {
            conn.transaction::<_, AppError, _>(|| {
                // Insert the new post
                let post: Post = diesel::insert_into(posts::table)
                    .values(&new_post)
                    .get_result(&conn)?;

                Ok(post)
            })
        })
        .await
        .to_resp()?;
        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        changes: PostChanges,
    ) -> Fallible<Option<Post>> {
        let conn = self.pool.get()?;
        let post = block(move || {
            conn.transaction::<_, AppError, _>(|| {
                // The author filter is what stops one user editing another's post.
                // created_at is deliberately absent from both branches.
                let target = posts::table.find(post_id);
                let updated: Option<Post> = match changes.image {
                    Some((path, kind)) => diesel::update(target)
                        .filter(posts::author_id.eq(author_id))
                        .set((
                            posts::text.eq(changes.text),
                            posts::group_id.eq(changes.group_id),
                            posts::image.eq(Some(path)),
                            posts::image_kind.eq(Some(kind)),
                        ))
                        .get_result(&conn)
                        .optional()?,
                    None => diesel::update(target)
                        .filter(posts::author_id.eq(author_id))
                        .set((
                            posts::text.eq(changes.text),
                            posts::group_id.eq(changes.group_id),
                        ))
                        .get_result(&conn)
                        .optional()?,
                };
                Ok(updated)
            })
        })
        .await
        .to_resp()?;
        Ok(post)
    }

    async fn list_posts(&self, filters: PostFilters, page: Page) -> Fallible<PostPage> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let mut count_query = posts::table.into_boxed();
            for filter in filters.as_sql_where() {
                count_query = count_query.filter(filter);
            }
            let total = count_query.count().get_result::<i64>(&conn)?;

            let mut query = posts::table.into_boxed();
            for filter in filters.as_sql_where() {
                query = query.filter(filter);
            }
            let page_posts: Vec<Post> = query
                .order_by(posts::created_at.desc())
                .offset(page.offset())
                .limit(PAGE_SIZE)
                .get_results(&conn)?;

            Ok(PostPage {
                posts: attach_names(&conn, page_posts)?,
                number: page.number(),
                total,
            })
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn find_post(&self, username: String, post_id: Uuid) -> Fallible<Option<PostDetail>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let target: Option<(Post, String)> = posts::table
                .inner_join(users::table)
                .filter(posts::id.eq(post_id))
                .filter(users::username.eq(username))
                .select((posts::all_columns, users::username))
                .first(&conn)
                .optional()?;

            guard!(let Some((post, author)) = target else {
                return Ok(None);
            });

            let group = match post.group_id {
                Some(group_id) => groups::table
                    .find(group_id)
                    .select(groups::slug)
                    .first(&conn)
                    .optional()?,
                None => None,
            };

            Ok(Some(PostDetail {
                post,
                author,
                group,
            }))
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn user_by_name(&self, username: String) -> Fallible<Option<User>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let user: Option<User> = users::table
                .filter(users::username.eq(username))
                .first(&conn)
                .optional()?;
            Ok(user)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn group_by_slug(&self, slug: String) -> Fallible<Option<Group>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let group: Option<Group> = groups::table
                .filter(groups::slug.eq(slug))
                .first(&conn)
                .optional()?;
            Ok(group)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let conn = self.pool.get()?;
        let comment = block(move || {
            conn.transaction::<_, AppError, _>(|| {
                let comment: Comment = diesel::insert_into(comments::table)
                    .values(&new_comment)
                    .get_result(&conn)?;

                Ok(comment)
            })
        })
        .await
        .to_resp()?;
        Ok(comment)
    }

    async fn comments_for(&self, post_id: Uuid) -> Fallible<Vec<CommentDetail>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let rows: Vec<(Comment, String)> = comments::table
                .inner_join(users::table)
                .filter(comments::post_id.eq(post_id))
                .order_by(comments::created_at.asc())
                .select((comments::all_columns, users::username))
                .get_results(&conn)?;
            Ok(rows
                .into_iter()
                .map(|(comment, author)| CommentDetail { comment, author })
                .collect::<Vec<_>>())
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()> {
        // Self-follow is a silent no-op, matching unfollow-without-an-edge.
        if user_id == author_id {
            return Ok(());
        }
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            // The primary key makes a repeat follow hit the conflict arm instead of
            // inserting a second edge.
            diesel::insert_into(follows::table)
                .values(&Follow { user_id, author_id })
                .on_conflict_do_nothing()
                .execute(&conn)?;
            Ok(())
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            // Deleting zero rows is fine.
            diesel::delete(
                follows::table
                    .filter(follows::user_id.eq(user_id))
                    .filter(follows::author_id.eq(author_id)),
            )
            .execute(&conn)?;
            Ok(())
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn feed(&self, user_id: Uuid, page: Page) -> Fallible<PostPage> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let followed_authors = || {
                follows::table
                    .filter(follows::user_id.eq(user_id))
                    .select(follows::author_id)
            };

            let total = posts::table
                .filter(posts::author_id.eq_any(followed_authors()))
                .count()
                .get_result::<i64>(&conn)?;

            let page_posts: Vec<Post> = posts::table
                .filter(posts::author_id.eq_any(followed_authors()))
                .order_by(posts::created_at.desc())
                .offset(page.offset())
                .limit(PAGE_SIZE)
                .get_results(&conn)?;

            Ok(PostPage {
                posts: attach_names(&conn, page_posts)?,
                number: page.number(),
                total,
            })
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn follow_stats(&self, author_id: Uuid, viewer: Option<Uuid>) -> Fallible<FollowStats> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let followers = follows::table
                .filter(follows::author_id.eq(author_id))
                .count()
                .get_result::<i64>(&conn)?;
            let following = follows::table
                .filter(follows::user_id.eq(author_id))
                .count()
                .get_result::<i64>(&conn)?;
            let viewer_follows = match viewer {
                Some(viewer_id) => diesel::select(exists(
                    follows::table
                        .filter(follows::user_id.eq(viewer_id))
                        .filter(follows::author_id.eq(author_id)),
                ))
                .get_result(&conn)?,
                None => false,
            };
            Ok(FollowStats {
                followers,
                following,
                viewer_follows,
            })
        })
        .await;
        Ok(query_result.to_resp()?)
    }
}

/// Fetch the usernames and group slugs for one page of posts.
fn attach_names(
    conn: &PgConnection,
    page_posts: Vec<Post>,
) -> Result<Vec<PostDetail>, DieselError> {
    let author_ids: Vec<Uuid> = page_posts.iter().map(|p| p.author_id).collect();
    let authors: HashMap<Uuid, String> = users::table
        .filter(users::id.eq_any(author_ids))
        .load::<User>(conn)?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let group_ids: Vec<Uuid> = page_posts.iter().filter_map(|p| p.group_id).collect();
    let slugs: HashMap<Uuid, String> = groups::table
        .filter(groups::id.eq_any(group_ids))
        .load::<Group>(conn)?
        .into_iter()
        .map(|g| (g.id, g.slug))
        .collect();

    Ok(page_posts
        .into_iter()
        .map(|post| {
            // The FK on author_id means the author row exists.
            let author = authors.get(&post.author_id).cloned().unwrap_or_default();
            let group = post.group_id.and_then(|id| slugs.get(&id).cloned());
            PostDetail {
                post,
                author,
                group,
            }
        })
        .collect())
}

impl PostFilters {
    pub fn as_sql_where(
        &self,
    ) -> Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> {
        let mut wheres: Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> =
            Vec::new();
        if let Some(id) = self.id {
            wheres.push(Box::new(posts::id.eq(id)))
        }
        if let Some(author_id) = self.author_id {
            wheres.push(Box::new(posts::author_id.eq(author_id)))
        }
        if let Some(group_id) = self.group_id {
            wheres.push(Box::new(posts::group_id.eq(group_id)))
        }
        if let Some(substring) = &self.text_contains {
            wheres.push(Box::new(posts::text.like(format!("%{}%", substring))))
        }
        wheres
    }
}
