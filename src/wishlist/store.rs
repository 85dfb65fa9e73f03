use super::models::{MovedItem, NewWishlistItem, WishlistItem};
use crate::catalog::{insert_movie, MovieFields};
use crate::sqlite_persistence::Database;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

const WISHLIST_COLUMNS: &str = "id, title, year, genre, poster, priority";

pub trait WishlistStore: Send + Sync {
    fn add_item(&self, item: &NewWishlistItem) -> Result<i64>;

    /// High priority first, then Medium, then Low; ties by title.
    fn list_items(&self) -> Result<Vec<WishlistItem>>;

    fn get_item(&self, id: i64) -> Result<Option<WishlistItem>>;

    /// Returns false if there was no such item.
    fn remove_item(&self, id: i64) -> Result<bool>;

    /// Moves an item into the collection as a fresh, unrated, not ripped,
    /// not locked movie. Insert and delete happen in one transaction.
    /// Returns `None` if the item does not exist.
    fn move_to_collection(&self, id: i64) -> Result<Option<MovedItem>>;
}

#[derive(Clone)]
pub struct SqliteWishlistStore {
    database: Database,
}

impl SqliteWishlistStore {
    pub fn new(database: Database) -> Self {
        SqliteWishlistStore { database }
    }

    fn connect(&self) -> Result<Connection> {
        self.database
            .connect()
            .context("Failed to open wishlist database")
    }
}

fn select_item(conn: &Connection, id: i64) -> rusqlite::Result<Option<WishlistItem>> {
    conn.query_row(
        &format!("SELECT {} FROM wishlist WHERE id = ?1", WISHLIST_COLUMNS),
        params![id],
        WishlistItem::from_row,
    )
    .optional()
}

impl WishlistStore for SqliteWishlistStore {
    fn add_item(&self, item: &NewWishlistItem) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO wishlist (title, year, genre, poster, priority) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.title,
                item.year,
                item.genre,
                item.poster,
                item.priority.as_str()
            ],
        )
        .with_context(|| format!("Failed to add {:?} to the wishlist", item.title))?;
        Ok(conn.last_insert_rowid())
    }

    fn list_items(&self) -> Result<Vec<WishlistItem>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM wishlist ORDER BY \
             CASE priority WHEN 'High' THEN 1 WHEN 'Medium' THEN 2 WHEN 'Low' THEN 3 ELSE 4 END, \
             title ASC",
            WISHLIST_COLUMNS
        ))?;
        let items = stmt
            .query_map([], WishlistItem::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    fn get_item(&self, id: i64) -> Result<Option<WishlistItem>> {
        let conn = self.connect()?;
        Ok(select_item(&conn, id)?)
    }

    fn remove_item(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let deleted = conn.execute("DELETE FROM wishlist WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn move_to_collection(&self, id: i64) -> Result<Option<MovedItem>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let item = match select_item(&tx, id)? {
            Some(item) => item,
            None => return Ok(None),
        };

        let movie_id = insert_movie(
            &tx,
            &MovieFields {
                title: item.title.clone(),
                year: item.year,
                genre: item.genre.clone(),
                poster: item.poster.clone(),
                rating: Some(0.0),
                ..Default::default()
            },
        )
        .with_context(|| format!("Failed to move wishlist item {} to the collection", id))?;
        tx.execute("DELETE FROM wishlist WHERE id = ?1", params![id])?;
        tx.commit()?;

        Ok(Some(MovedItem { movie_id, item }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogStore, SqliteCatalogStore};
    use crate::schema::{MOVIES_TABLE, WISHLIST_TABLE};
    use crate::wishlist::Priority;
    use tempfile::TempDir;

    fn create_tmp_stores() -> (SqliteWishlistStore, SqliteCatalogStore, Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let database = Database::new(temp_dir.path(), "test");
        database.create_if_missing().unwrap();
        let conn = database.connect().unwrap();
        WISHLIST_TABLE.create_if_not_exists(&conn).unwrap();
        MOVIES_TABLE.create_if_not_exists(&conn).unwrap();
        (
            SqliteWishlistStore::new(database.clone()),
            SqliteCatalogStore::new(database.clone()),
            database,
            temp_dir,
        )
    }

    fn wish(title: &str, priority: Priority) -> NewWishlistItem {
        NewWishlistItem {
            title: Some(title.to_string()),
            year: Some(2021),
            genre: Some("Sci-Fi".to_string()),
            poster: Some(format!("https://posters/{}.jpg", title)),
            priority,
        }
    }

    #[test]
    fn lists_by_priority_then_title() {
        let (store, _, _, _temp_dir) = create_tmp_stores();
        store.add_item(&wish("Zodiac", Priority::Low)).unwrap();
        store.add_item(&wish("Dune", Priority::Medium)).unwrap();
        store.add_item(&wish("Tenet", Priority::High)).unwrap();
        store.add_item(&wish("Arrival", Priority::Medium)).unwrap();
        store.add_item(&wish("Blade Runner", Priority::High)).unwrap();

        let titles: Vec<String> = store
            .list_items()
            .unwrap()
            .into_iter()
            .filter_map(|i| i.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Blade Runner", "Tenet", "Arrival", "Dune", "Zodiac"]
        );
    }

    #[test]
    fn removes_items() {
        let (store, _, _, _temp_dir) = create_tmp_stores();
        let id = store.add_item(&wish("Dune", Priority::High)).unwrap();

        assert!(store.get_item(id).unwrap().is_some());
        assert!(store.remove_item(id).unwrap());
        assert!(store.get_item(id).unwrap().is_none());
        assert!(!store.remove_item(id).unwrap());
    }

    #[test]
    fn moving_transfers_item_to_collection() {
        let (store, catalog, _, _temp_dir) = create_tmp_stores();
        let id = store.add_item(&wish("Dune", Priority::High)).unwrap();

        let moved = store.move_to_collection(id).unwrap().unwrap();

        assert_eq!(moved.item.title.as_deref(), Some("Dune"));
        assert!(store.get_item(id).unwrap().is_none());
        assert!(store.list_items().unwrap().is_empty());

        let movie = catalog.get_movie(moved.movie_id).unwrap().unwrap();
        assert_eq!(movie.fields.title.as_deref(), Some("Dune"));
        assert_eq!(movie.fields.year, Some(2021));
        assert_eq!(movie.fields.genre.as_deref(), Some("Sci-Fi"));
        assert_eq!(movie.fields.poster.as_deref(), Some("https://posters/Dune.jpg"));
        assert_eq!(movie.fields.rating, Some(0.0));
        assert!(!movie.fields.is_ripped);
        assert!(!movie.fields.is_locked);
        assert_eq!(movie.fields.media_format, None);
        assert_eq!(movie.fields.placement, None);
    }

    #[test]
    fn moving_missing_item_is_none() {
        let (store, catalog, _, _temp_dir) = create_tmp_stores();
        assert!(store.move_to_collection(42).unwrap().is_none());
        assert_eq!(catalog.collection_stats().unwrap().total, 0);
    }

    #[test]
    fn failed_move_keeps_the_wishlist_item() {
        let (store, _, database, _temp_dir) = create_tmp_stores();
        let id = store.add_item(&wish("Dune", Priority::High)).unwrap();
        database
            .connect()
            .unwrap()
            .execute("DROP TABLE movies_v2", [])
            .unwrap();

        assert!(store.move_to_collection(id).is_err());
        assert!(store.get_item(id).unwrap().is_some());
    }
}
