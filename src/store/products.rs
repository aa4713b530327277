//! Product catalog storage.

use crate::models::{Product, ProductPayload};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::info;
use uuid::Uuid;

pub struct ProductStore {
    db_path: String,
}

impl ProductStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL,
                category TEXT NOT NULL,
                stock INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path).context("Failed to open product database")
    }

    fn row_to_product(row: &Row) -> rusqlite::Result<Product> {
        let id: String = row.get(0)?;
        let id = Uuid::parse_str(&id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Product {
            id,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            category: row.get(4)?,
            stock: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn list(&self) -> Result<Vec<Product>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, price, category, stock, created_at
             FROM products ORDER BY created_at",
        )?;

        let products = stmt
            .query_map([], Self::row_to_product)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<Product>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, price, category, stock, created_at
             FROM products WHERE id = ?1",
        )?;

        match stmt.query_row(params![id.to_string()], Self::row_to_product) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn create(&self, payload: &ProductPayload) -> Result<Product> {
        let product = Product {
            id: Uuid::new_v4(),
            name: payload.name.clone(),
            description: payload.description.clone(),
            price: payload.price,
            category: payload.category.clone(),
            stock: payload.stock,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO products (id, name, description, price, category, stock, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                product.id.to_string(),
                product.name,
                product.description,
                product.price,
                product.category,
                product.stock,
                product.created_at,
            ],
        )?;

        info!(product_id = %product.id, name = %product.name, "Created product");
        Ok(product)
    }

    /// Update all mutable fields. Returns false when the id is absent.
    pub fn update(&self, id: &Uuid, payload: &ProductPayload) -> Result<bool> {
        let conn = self.open()?;
        let affected = conn.execute(
            "UPDATE products SET name = ?1, description = ?2, price = ?3, category = ?4, stock = ?5
             WHERE id = ?6",
            params![
                payload.name,
                payload.description,
                payload.price,
                payload.category,
                payload.stock,
                id.to_string(),
            ],
        )?;
        Ok(affected > 0)
    }

    /// Delete a product. Returns false when the id is absent.
    pub fn delete(&self, id: &Uuid) -> Result<bool> {
        let conn = self.open()?;
        let affected =
            conn.execute("DELETE FROM products WHERE id = ?1", params![id.to_string()])?;
        if affected > 0 {
            info!(product_id = %id, "Deleted product");
        }
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_store() -> (ProductStore, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let store = ProductStore::new(temp.path().to_str().unwrap()).unwrap();
        (store, temp)
    }

    fn sample_payload() -> ProductPayload {
        ProductPayload {
            name: "X".to_string(),
            description: "d".to_string(),
            price: 9.99,
            category: "c".to_string(),
            stock: 5,
        }
    }

    #[test]
    fn test_create_and_get() {
        let (store, _temp) = test_store();

        let created = store.create(&sample_payload()).unwrap();
        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "X");
        assert_eq!(fetched.price, 9.99);
        assert_eq!(fetched.stock, 5);
    }

    #[test]
    fn test_list_orders_by_creation() {
        let (store, _temp) = test_store();
        assert!(store.list().unwrap().is_empty());

        store.create(&sample_payload()).unwrap();
        store
            .create(&ProductPayload {
                name: "Y".to_string(),
                ..sample_payload()
            })
            .unwrap();

        let all = store.list().unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_update_idempotent() {
        let (store, _temp) = test_store();

        let product = store.create(&sample_payload()).unwrap();
        let patch = ProductPayload {
            price: 12.50,
            ..sample_payload()
        };

        assert!(store.update(&product.id, &patch).unwrap());
        assert!(store.update(&product.id, &patch).unwrap());

        let updated = store.get(&product.id).unwrap().unwrap();
        assert_eq!(updated.price, 12.50);

        assert!(!store.update(&Uuid::new_v4(), &patch).unwrap());
    }

    #[test]
    fn test_corrupt_stored_id_is_an_error() {
        let (store, temp) = test_store();

        let conn = Connection::open(temp.path()).unwrap();
        conn.execute(
            "INSERT INTO products (id, name, description, price, category, stock, created_at)
             VALUES ('not-a-uuid', 'X', 'd', 1.0, 'c', 1, '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        assert!(store.list().is_err());
    }

    #[test]
    fn test_delete_then_get_is_none() {
        let (store, _temp) = test_store();

        let product = store.create(&sample_payload()).unwrap();
        assert!(store.delete(&product.id).unwrap());
        assert!(store.get(&product.id).unwrap().is_none());
        assert!(!store.delete(&product.id).unwrap());
    }
}
