#[allow(unused_imports)]
use diesel::sql_types::*;

table! {
    users (id) {
        id -> Uuid,
        created_at -> Timestamptz,
        username -> Text,
    }
}

table! {
    groups (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        slug -> Text,
    }
}

table! {
    use crate::datastore::structs::ImageKindMapping;
    #[allow(unused_imports)]
    use diesel::sql_types::*;
    posts (id) {
        id -> Uuid,
        created_at -> Timestamptz,
        text -> Text,
        author_id -> Uuid,
        group_id -> Nullable<Uuid>,
        image -> Nullable<Text>,
        image_kind -> Nullable<ImageKindMapping>,
    }
}

table! {
    comments (id) {
        id -> Uuid,
        created_at -> Timestamptz,
        text -> Text,
        post_id -> Uuid,
        author_id -> Uuid,
    }
}

// The (user_id, author_id) primary key is what makes follow edges unique.
table! {
    follows (user_id, author_id) {
        user_id -> Uuid,
        author_id -> Uuid,
    }
}

joinable!(posts -> users (author_id));
joinable!(posts -> groups (group_id));
joinable!(comments -> posts (post_id));
joinable!(comments -> users (author_id));

allow_tables_to_appear_in_same_query!(posts, users, groups);
allow_tables_to_appear_in_same_query!(comments, users);
allow_tables_to_appear_in_same_query!(follows, users);
allow_tables_to_appear_in_same_query!(follows, posts);
