//! Collection persistence
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Multi-row writes are transactional.

use crate::error::{StoreError, StoreResult};
use crate::models::{Collection, ResolvedCard};
use bigdecimal::BigDecimal;
use mtg_common::Finish;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::str::FromStr;

/// Where reconciled cards are kept
pub trait CollectionStore {
    fn create_collection(&mut self, owner: &str, name: &str) -> StoreResult<Collection>;

    fn get_collection_by_name(&self, owner: &str, name: &str) -> StoreResult<Option<Collection>>;

    /// All collections of an owner, by name
    fn list_collections(&self, owner: &str) -> StoreResult<Vec<Collection>>;

    /// Store cards under `collection`; returns the number of rows written
    fn create_cards(&mut self, cards: &[ResolvedCard], collection: &Collection)
        -> StoreResult<usize>;

    /// Cards of a collection in the order they were stored
    fn cards_in_collection(&self, collection: &Collection) -> StoreResult<Vec<ResolvedCard>>;

    /// Remove all cards but keep the collection; returns the number removed
    fn clear_collection(&mut self, collection: &Collection) -> StoreResult<usize>;

    fn delete_collection(&mut self, collection: &Collection) -> StoreResult<()>;
}

/// SQLite-backed store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::InvalidData(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        log::info!("Opened collection database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Create tables if they don't exist:
/// - `collections`: one row per (owner, name)
/// - `cards`: priced cards, price kept as decimal text
pub fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS collections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (owner, name)
        );

        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection_id INTEGER NOT NULL,
            card_name TEXT NOT NULL,
            external_id INTEGER NOT NULL,
            catalog_id TEXT NOT NULL,
            set_name TEXT NOT NULL,
            set_code TEXT NOT NULL,
            collector_number TEXT NOT NULL,
            finish TEXT NOT NULL,
            print_uri TEXT NOT NULL,
            price TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_cards_collection ON cards(collection_id);
        ",
    )?;

    log::debug!("Collection schema initialized");
    Ok(())
}

fn collection_from_row(row: &Row<'_>) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Card columns as stored, before decoding price and finish
struct CardRow {
    card_name: String,
    external_id: u64,
    catalog_id: String,
    set_name: String,
    set_code: String,
    collector_number: String,
    finish: String,
    print_uri: String,
    price: String,
    quantity: u32,
}

impl CardRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            card_name: row.get(0)?,
            external_id: row.get(1)?,
            catalog_id: row.get(2)?,
            set_name: row.get(3)?,
            set_code: row.get(4)?,
            collector_number: row.get(5)?,
            finish: row.get(6)?,
            print_uri: row.get(7)?,
            price: row.get(8)?,
            quantity: row.get(9)?,
        })
    }

    fn into_card(self, collection_id: i64) -> StoreResult<ResolvedCard> {
        let price = BigDecimal::from_str(&self.price).map_err(|e| {
            StoreError::InvalidData(format!(
                "price '{}' of {}: {}",
                self.price, self.card_name, e
            ))
        })?;
        Ok(ResolvedCard {
            card_name: self.card_name,
            external_id: self.external_id,
            catalog_id: self.catalog_id,
            set_name: self.set_name,
            set_code: self.set_code,
            collector_number: self.collector_number,
            finish: Finish::parse(&self.finish),
            print_uri: self.print_uri,
            price,
            quantity: self.quantity,
            collection_ref: Some(collection_id),
        })
    }
}

fn find_collection(conn: &Connection, owner: &str, name: &str) -> StoreResult<Option<Collection>> {
    let collection = conn
        .query_row(
            "SELECT id, owner, name, created_at FROM collections WHERE owner = ?1 AND name = ?2",
            params![owner, name],
            collection_from_row,
        )
        .optional()?;
    Ok(collection)
}

fn insert_cards_tx(
    tx: &Transaction<'_>,
    cards: &[ResolvedCard],
    collection_id: i64,
) -> StoreResult<usize> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO cards
         (collection_id, card_name, external_id, catalog_id, set_name, set_code,
          collector_number, finish, print_uri, price, quantity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;

    let mut count = 0;
    for card in cards {
        stmt.execute(params![
            collection_id,
            &card.card_name,
            card.external_id,
            &card.catalog_id,
            &card.set_name,
            &card.set_code,
            &card.collector_number,
            card.finish.as_str(),
            &card.print_uri,
            card.price.to_string(),
            card.quantity,
        ])?;
        count += 1;
    }
    Ok(count)
}

impl CollectionStore for SqliteStore {
    fn create_collection(&mut self, owner: &str, name: &str) -> StoreResult<Collection> {
        let tx = self.conn.transaction()?;
        if find_collection(&tx, owner, name)?.is_some() {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        tx.execute(
            "INSERT INTO collections (owner, name) VALUES (?1, ?2)",
            params![owner, name],
        )?;
        let collection = find_collection(&tx, owner, name)?
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;
        tx.commit()?;

        log::info!("Created collection '{}' for {}", name, owner);
        Ok(collection)
    }

    fn get_collection_by_name(&self, owner: &str, name: &str) -> StoreResult<Option<Collection>> {
        find_collection(&self.conn, owner, name)
    }

    fn list_collections(&self, owner: &str) -> StoreResult<Vec<Collection>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, name, created_at FROM collections WHERE owner = ?1 ORDER BY name",
        )?;
        let collections = stmt
            .query_map(params![owner], collection_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(collections)
    }

    fn create_cards(
        &mut self,
        cards: &[ResolvedCard],
        collection: &Collection,
    ) -> StoreResult<usize> {
        let tx = self.conn.transaction()?;
        let count = insert_cards_tx(&tx, cards, collection.id)?;
        tx.commit()?;

        log::info!(
            "Stored {} cards in collection '{}'",
            count,
            collection.name
        );
        Ok(count)
    }

    fn cards_in_collection(&self, collection: &Collection) -> StoreResult<Vec<ResolvedCard>> {
        let mut stmt = self.conn.prepare(
            "SELECT card_name, external_id, catalog_id, set_name, set_code, collector_number,
                    finish, print_uri, price, quantity
             FROM cards
             WHERE collection_id = ?1
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![collection.id], CardRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|row| row.into_card(collection.id))
            .collect()
    }

    fn clear_collection(&mut self, collection: &Collection) -> StoreResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM cards WHERE collection_id = ?1",
            params![collection.id],
        )?;
        log::info!(
            "Removed {} cards from collection '{}'",
            removed,
            collection.name
        );
        Ok(removed)
    }

    fn delete_collection(&mut self, collection: &Collection) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM cards WHERE collection_id = ?1",
            params![collection.id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM collections WHERE id = ?1",
            params![collection.id],
        )?;
        if deleted == 0 {
            return Err(StoreError::CollectionNotFound(collection.name.clone()));
        }
        tx.commit()?;

        log::info!("Deleted collection '{}'", collection.name);
        Ok(())
    }
}
