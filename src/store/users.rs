//! User account storage.
//!
//! Passwords are hashed at account creation and never leave this module
//! in plaintext. A default admin is seeded when no admin exists yet,
//! otherwise a fresh deployment has no way to mint the first token.

use crate::auth::password::hash_password;
use crate::models::{Role, UpdateUserPayload, User};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::{info, warn};
use uuid::Uuid;

pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Open (creating if needed) the user store and seed the default admin.
    pub fn new(db_path: &str, admin_password: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db(admin_password)?;
        Ok(store)
    }

    fn init_db(&self, admin_password: &str) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                address TEXT NOT NULL,
                phonenumber TEXT NOT NULL,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        self.create_default_admin(&conn, admin_password)?;
        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path).context("Failed to open user database")
    }

    fn create_default_admin(&self, conn: &Connection, admin_password: &str) -> Result<()> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if count == 0 {
            let password_hash = hash_password(admin_password)?;
            conn.execute(
                "INSERT INTO users (id, username, password_hash, role, address, phonenumber, email, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    Uuid::new_v4().to_string(),
                    "admin",
                    password_hash,
                    Role::Admin.as_str(),
                    "",
                    "",
                    "admin@localhost",
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("Failed to insert default admin")?;

            info!("Default admin user created (username: admin)");
            if admin_password == "admin123" {
                warn!("Default admin password in use - set ADMIN_PASSWORD in production");
            }
        }

        Ok(())
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let id: String = row.get(0)?;
        // A row whose id no longer parses is corrupt; fail the query
        // rather than hand back a record under the nil id.
        let id = Uuid::parse_str(&id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let role: String = row.get(3)?;
        Ok(User {
            id,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            role: Role::from_str(&role).unwrap_or(Role::User),
            address: row.get(4)?,
            phonenumber: row.get(5)?,
            email: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    const COLUMNS: &'static str =
        "id, username, password_hash, role, address, phonenumber, email, created_at";

    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE username = ?1",
            Self::COLUMNS
        ))?;

        match stmt.query_row(params![username], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE id = ?1",
            Self::COLUMNS
        ))?;

        match stmt.query_row(params![id.to_string()], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list(&self) -> Result<Vec<User>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at",
            Self::COLUMNS
        ))?;

        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Create a user, hashing the password here so plaintext never reaches
    /// the database layer.
    pub fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
        address: &str,
        phonenumber: &str,
        email: &str,
    ) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role,
            address: address.to_string(),
            phonenumber: phonenumber.to_string(),
            email: email.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO users (id, username, password_hash, role, address, phonenumber, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.role.as_str(),
                user.address,
                user.phonenumber,
                user.email,
                user.created_at,
            ],
        )?;

        info!(username = %user.username, role = user.role.as_str(), "Created user");
        Ok(user)
    }

    /// Update a user's mutable fields. Returns false when the id is absent.
    pub fn update(&self, id: &Uuid, payload: &UpdateUserPayload) -> Result<bool> {
        let conn = self.open()?;
        let affected = conn.execute(
            "UPDATE users SET username = ?1, address = ?2, phonenumber = ?3, email = ?4
             WHERE id = ?5",
            params![
                payload.username,
                payload.address,
                payload.phonenumber,
                payload.email,
                id.to_string(),
            ],
        )?;
        Ok(affected > 0)
    }

    /// Delete a user. Returns false when the id is absent.
    pub fn delete(&self, id: &Uuid) -> Result<bool> {
        let conn = self.open()?;
        let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
        if affected > 0 {
            info!(user_id = %id, "Deleted user");
        }
        Ok(affected > 0)
    }
}
