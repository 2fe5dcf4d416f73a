diesel::table! {
    users (id) {
        id -> Int8,
        nickname -> Text,
        fullname -> Text,
        about -> Text,
        email -> Text,
    }
}

diesel::table! {
    forums (id) {
        id -> Int8,
        title -> Text,
        username -> Text,
        slug -> Text,
        posts -> Int8,
        threads -> Int4,
    }
}

diesel::table! {
    threads (id) {
        id -> Int8,
        title -> Text,
        author -> Text,
        forum -> Text,
        message -> Text,
        votes -> Int4,
        slug -> Nullable<Text>,
        created -> Timestamptz,
    }
}

diesel::table! {
    posts (id) {
        id -> Int8,
        parent -> Int8,
        path -> Array<Int8>,
        author -> Text,
        message -> Text,
        isedited -> Bool,
        forum -> Text,
        thread -> Int8,
        created -> Timestamptz,
    }
}

diesel::table! {
    votes (id) {
        id -> Int8,
        user_id -> Int8,
        thread_id -> Int8,
        voice -> Int4,
    }
}

diesel::joinable!(posts -> threads (thread));
diesel::joinable!(votes -> threads (thread_id));
diesel::joinable!(votes -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    forums,
    posts,
    threads,
    users,
    votes,
);
