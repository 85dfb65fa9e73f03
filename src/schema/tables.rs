use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, DEFAULT_TIMESTAMP};

pub const USER_PREFERENCES_TABLE: Table = Table {
    name: "user_preferences",
    columns: &[
        sqlite_column!("user_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("theme", &SqlType::Text, default_value = Some("'default'")),
        sqlite_column!("role", &SqlType::Text, default_value = Some("'member'")),
        sqlite_column!("username", &SqlType::Text),
        sqlite_column!("email", &SqlType::Text),
    ],
};

pub const MOVIES_TABLE: Table = Table {
    name: "movies_v2",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("genre", &SqlType::Text),
        sqlite_column!("director", &SqlType::Text),
        sqlite_column!("cast", &SqlType::Text),
        sqlite_column!("runtime", &SqlType::Integer),
        sqlite_column!("plot", &SqlType::Text),
        sqlite_column!("poster", &SqlType::Text),
        sqlite_column!("rating", &SqlType::Real),
        sqlite_column!("media_format", &SqlType::Text),
        sqlite_column!("is_ripped", &SqlType::Integer, default_value = Some("0")),
        sqlite_column!("is_locked", &SqlType::Integer, default_value = Some("0")),
        sqlite_column!("placement", &SqlType::Text),
    ],
};

pub const WISHLIST_TABLE: Table = Table {
    name: "wishlist",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("genre", &SqlType::Text),
        sqlite_column!("poster", &SqlType::Text),
        sqlite_column!("priority", &SqlType::Text, default_value = Some("'Medium'")),
    ],
};

pub const APP_SETTINGS_TABLE: Table = Table {
    name: "app_settings",
    columns: &[
        sqlite_column!("setting_key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("setting_value", &SqlType::Text),
    ],
};

pub const AUDIT_LOG_TABLE: Table = Table {
    name: "audit_log",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "timestamp",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("user_name", &SqlType::Text),
        sqlite_column!("action", &SqlType::Text),
        sqlite_column!("movie_title", &SqlType::Text),
        sqlite_column!("details", &SqlType::Text),
    ],
};

/// Every table the application needs, in creation order.
pub const CANONICAL_TABLES: [&Table; 5] = [
    &USER_PREFERENCES_TABLE,
    &MOVIES_TABLE,
    &WISHLIST_TABLE,
    &APP_SETTINGS_TABLE,
    &AUDIT_LOG_TABLE,
];
