//! Contact persistence over SQLite.
//!
//! The store is a collaborator of the pipeline, not part of it: the core
//! stages never touch persistence, and callers decide what to save. It
//! offers create / read-by-id / substring search / update / delete / count
//! over contact records, paginated and ordered by creation time descending.
//!
//! rusqlite is synchronous, so every operation clones the connection handle
//! and runs on tokio's blocking pool — the same offloading discipline the
//! OCR stage uses for CPU-bound work.

use crate::contact::Contact;
use crate::error::CardScanError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A contact as persisted: the record plus identity and audit timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct StoredContact {
    pub id: i64,
    #[serde(flatten)]
    pub contact: Contact,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed contact store. Cheap to clone; all clones share one
/// connection.
#[derive(Clone)]
pub struct ContactStore {
    conn: Arc<Mutex<Connection>>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT,
    phone      TEXT,
    email      TEXT,
    company    TEXT,
    notes      TEXT,
    confidence REAL,
    extra      TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_contacts_created_at  ON contacts(created_at);
CREATE INDEX IF NOT EXISTS ix_contacts_name_company ON contacts(name, company);
CREATE INDEX IF NOT EXISTS ix_contacts_email_phone  ON contacts(email, phone);
";

impl ContactStore {
    /// Open (and migrate) a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CardScanError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory store, mainly for tests and ephemeral runs.
    pub fn open_in_memory() -> Result<Self, CardScanError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CardScanError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a new contact, returning it with identity and timestamps.
    pub async fn create(&self, contact: Contact) -> Result<StoredContact, CardScanError> {
        self.blocking(move |conn| {
            let now = Utc::now();
            let extra_json = extra_to_sql(&contact)?;
            conn.execute(
                "INSERT INTO contacts (name, phone, email, company, notes, confidence, extra, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    contact.name,
                    contact.phone,
                    contact.email,
                    contact.company,
                    contact.notes,
                    contact.confidence,
                    extra_json,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(id, "contact created");
            Ok(StoredContact {
                id,
                contact,
                created_at: now,
                updated_at: now,
            })
        })
        .await
    }

    /// Fetch one contact by id.
    pub async fn get(&self, id: i64) -> Result<Option<StoredContact>, CardScanError> {
        self.blocking(move |conn| {
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                row_to_stored,
            )
            .optional()
            .map_err(CardScanError::from)
        })
        .await
    }

    /// Substring search over name, email, phone, and company
    /// (case-insensitive), newest first, paginated. A `None` query lists
    /// everything.
    pub async fn search(
        &self,
        query: Option<String>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<StoredContact>, CardScanError> {
        self.blocking(move |conn| {
            let mut out = Vec::new();
            match query.filter(|q| !q.is_empty()) {
                Some(q) => {
                    let pattern = format!("%{q}%");
                    let mut stmt = conn.prepare(&format!(
                        "{SELECT_COLUMNS}
                         WHERE name LIKE ?1 OR email LIKE ?1 OR phone LIKE ?1 OR company LIKE ?1
                         ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
                    ))?;
                    let rows = stmt.query_map(params![pattern, limit, offset], row_to_stored)?;
                    for row in rows {
                        out.push(row?);
                    }
                }
                None => {
                    let mut stmt = stmt_list(conn)?;
                    let rows = stmt.query_map(params![limit, offset], row_to_stored)?;
                    for row in rows {
                        out.push(row?);
                    }
                }
            }
            Ok(out)
        })
        .await
    }

    /// Replace a contact's fields, refreshing `updated_at`.
    ///
    /// Returns the updated record, or `None` when the id does not exist.
    pub async fn update(
        &self,
        id: i64,
        contact: Contact,
    ) -> Result<Option<StoredContact>, CardScanError> {
        self.blocking(move |conn| {
            let now = Utc::now();
            let extra_json = extra_to_sql(&contact)?;
            let changed = conn.execute(
                "UPDATE contacts
                 SET name = ?1, phone = ?2, email = ?3, company = ?4, notes = ?5,
                     confidence = ?6, extra = ?7, updated_at = ?8
                 WHERE id = ?9",
                params![
                    contact.name,
                    contact.phone,
                    contact.email,
                    contact.company,
                    contact.notes,
                    contact.confidence,
                    extra_json,
                    now.to_rfc3339(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                row_to_stored,
            )
            .optional()
            .map_err(CardScanError::from)
        })
        .await
    }

    /// Delete a contact; `true` when something was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, CardScanError> {
        self.blocking(move |conn| {
            let changed = conn.execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
    }

    /// Count contacts matching the search query (all contacts when `None`).
    pub async fn count(&self, query: Option<String>) -> Result<u64, CardScanError> {
        self.blocking(move |conn| {
            let n: i64 = match query.filter(|q| !q.is_empty()) {
                Some(q) => {
                    let pattern = format!("%{q}%");
                    conn.query_row(
                        "SELECT COUNT(id) FROM contacts
                         WHERE name LIKE ?1 OR email LIKE ?1 OR phone LIKE ?1 OR company LIKE ?1",
                        params![pattern],
                        |row| row.get(0),
                    )?
                }
                None => conn.query_row("SELECT COUNT(id) FROM contacts", [], |row| row.get(0))?,
            };
            Ok(n as u64)
        })
        .await
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, CardScanError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, CardScanError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| CardScanError::Internal("store mutex poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| CardScanError::Internal(format!("Store task panicked: {e}")))?
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, phone, email, company, notes, confidence, extra, created_at, updated_at FROM contacts";

fn stmt_list(conn: &Connection) -> Result<rusqlite::Statement<'_>, rusqlite::Error> {
    conn.prepare(&format!(
        "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
    ))
}

fn extra_to_sql(contact: &Contact) -> Result<Option<String>, CardScanError> {
    contact
        .extra
        .as_ref()
        .map(|m| {
            serde_json::to_string(m)
                .map_err(|e| CardScanError::Internal(format!("extra serialization failed: {e}")))
        })
        .transpose()
}

fn row_to_stored(row: &Row<'_>) -> Result<StoredContact, rusqlite::Error> {
    let extra_json: Option<String> = row.get(7)?;
    let extra = extra_json.and_then(|raw| serde_json::from_str(&raw).ok());
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(StoredContact {
        id: row.get(0)?,
        contact: Contact {
            name: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
            company: row.get(4)?,
            notes: row.get(5)?,
            confidence: row.get(6)?,
            extra,
        },
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
