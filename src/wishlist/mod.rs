mod models;
mod store;

pub use models::{MovedItem, NewWishlistItem, Priority, WishlistItem};
pub use store::{SqliteWishlistStore, WishlistStore};
