mod connection;
mod like;
mod table;

pub use connection::{Database, RetryPolicy};
pub use like::like_pattern;
pub use table::{list_tables, Column, SqlType, Table, DEFAULT_TIMESTAMP};
