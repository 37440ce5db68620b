use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use crate::errors::ScopeError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed task store and result index. Cloning shares the connection.
pub struct Database {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(path: &str) -> Result<Self, ScopeError> {
        // Ensure parent directory exists
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| ScopeError::StoreUnavailable(format!("Failed to open database: {}", e)))?;

        // WAL lets readers proceed while a writer commits
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| ScopeError::Database(format!("Failed to set pragmas: {}", e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| ScopeError::Database(format!("Failed to set busy timeout: {}", e)))?;

        let db = Self { conn: Arc::new(Mutex::new(conn)) };
        db.initialize()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self, ScopeError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ScopeError::StoreUnavailable(format!("Failed to open in-memory db: {}", e)))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| ScopeError::Database(format!("Failed to set pragmas: {}", e)))?;
        let db = Self { conn: Arc::new(Mutex::new(conn)) };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> Result<(), ScopeError> {
        let conn = self.lock()?;
        conn.execute_batch(super::schema::CREATE_TABLES)
            .map_err(|e| ScopeError::Database(format!("Failed to create tables: {}", e)))?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, ScopeError> {
        self.conn.lock()
            .map_err(|_| ScopeError::StoreUnavailable("Database connection mutex poisoned".into()))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self { conn: self.conn.clone() }
    }
}
