//! SQLite gallery registry.

use crate::StoreError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS gallery (
    id              INTEGER PRIMARY KEY,
    identity        TEXT NOT NULL UNIQUE,
    image_path      TEXT NOT NULL,
    registered_at   TEXT NOT NULL,
    last_matched_at TEXT,
    enabled         INTEGER NOT NULL DEFAULT 1
);
";

/// A registered identity: label, reference image location, and metadata.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub id: i64,
    pub identity: String,
    pub image_path: PathBuf,
    pub registered_at: DateTime<Utc>,
    pub last_matched_at: Option<DateTime<Utc>>,
    pub enabled: bool,
}

/// Handle to the gallery database.
pub struct Registry {
    conn: Connection,
}

/// Column tuple as read from SQLite, before timestamp parsing.
type RawRow = (i64, String, String, String, Option<String>, i64);

impl Registry {
    /// Open (and create if needed) the registry at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %db_path.display(), "registry opened");
        Ok(Self { conn })
    }

    /// In-memory registry, for tests and diagnostics.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert or overwrite the entry for an identity.
    ///
    /// Returns the stored entry plus the image path it replaced, if
    /// any, so the caller can clean up the stale file.
    pub fn upsert(
        &self,
        identity: &str,
        image_path: &Path,
        now: DateTime<Utc>,
    ) -> Result<(GalleryEntry, Option<PathBuf>), StoreError> {
        let previous_path: Option<String> = self
            .conn
            .query_row(
                "SELECT image_path FROM gallery WHERE identity = ?1",
                params![identity],
                |row| row.get(0),
            )
            .optional()?;

        self.conn.execute(
            "INSERT INTO gallery (identity, image_path, registered_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(identity) DO UPDATE SET
                 image_path = excluded.image_path,
                 registered_at = excluded.registered_at",
            params![identity, image_path.to_string_lossy().into_owned(), now.to_rfc3339()],
        )?;

        let entry = self
            .get(identity)?
            .ok_or_else(|| StoreError::IdentityNotFound(identity.to_string()))?;

        Ok((entry, previous_path.map(PathBuf::from)))
    }

    /// Look up a single identity.
    pub fn get(&self, identity: &str) -> Result<Option<GalleryEntry>, StoreError> {
        let raw: Option<RawRow> = self
            .conn
            .query_row(
                "SELECT id, identity, image_path, registered_at, last_matched_at, enabled
                 FROM gallery WHERE identity = ?1",
                params![identity],
                |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
                },
            )
            .optional()?;

        raw.map(to_entry).transpose()
    }

    /// All entries, enabled or not, ordered by identity.
    pub fn list_all(&self) -> Result<Vec<GalleryEntry>, StoreError> {
        self.list_where("1 = 1")
    }

    /// Entries eligible for matching. Disabled identities never enter
    /// the gallery handed to the matcher.
    pub fn list_enabled(&self) -> Result<Vec<GalleryEntry>, StoreError> {
        self.list_where("enabled = 1")
    }

    fn list_where(&self, predicate: &str) -> Result<Vec<GalleryEntry>, StoreError> {
        let sql = format!(
            "SELECT id, identity, image_path, registered_at, last_matched_at, enabled
             FROM gallery WHERE {predicate} ORDER BY identity"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw: Vec<RawRow> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
            })?
            .collect::<Result<_, _>>()?;

        raw.into_iter().map(to_entry).collect()
    }

    /// Record a successful match against an entry.
    pub fn touch_last_matched(&self, id: i64, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE gallery SET last_matched_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Enable or disable an identity without removing it.
    pub fn set_enabled(&self, identity: &str, enabled: bool) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE gallery SET enabled = ?1 WHERE identity = ?2",
            params![enabled as i64, identity],
        )?;
        if changed == 0 {
            return Err(StoreError::IdentityNotFound(identity.to_string()));
        }
        Ok(())
    }

    /// Delete an identity, returning the removed entry so the caller
    /// can remove its reference image.
    pub fn remove(&self, identity: &str) -> Result<GalleryEntry, StoreError> {
        let entry = self
            .get(identity)?
            .ok_or_else(|| StoreError::IdentityNotFound(identity.to_string()))?;
        self.conn
            .execute("DELETE FROM gallery WHERE identity = ?1", params![identity])?;
        Ok(entry)
    }
}

fn to_entry(raw: RawRow) -> Result<GalleryEntry, StoreError> {
    let (id, identity, image_path, registered_at, last_matched_at, enabled) = raw;
    Ok(GalleryEntry {
        id,
        identity,
        image_path: PathBuf::from(image_path),
        registered_at: parse_ts(&registered_at)?,
        last_matched_at: last_matched_at.as_deref().map(parse_ts).transpose()?,
        enabled: enabled != 0,
    })
}

fn parse_ts(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StoreError::BadTimestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_upsert_creates_then_overwrites() {
        let reg = Registry::open_in_memory().unwrap();

        let (first, replaced) = reg.upsert("alice", Path::new("/refs/a1.png"), ts(0)).unwrap();
        assert!(replaced.is_none());
        assert_eq!(first.identity, "alice");
        assert!(first.enabled);

        let (second, replaced) = reg.upsert("alice", Path::new("/refs/a2.png"), ts(60)).unwrap();
        assert_eq!(replaced.as_deref(), Some(Path::new("/refs/a1.png")));
        assert_eq!(second.image_path, PathBuf::from("/refs/a2.png"));
        assert_eq!(second.registered_at, ts(60));

        // Exactly one row for the identity.
        assert_eq!(reg.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_touch_last_matched() {
        let reg = Registry::open_in_memory().unwrap();
        let (entry, _) = reg.upsert("bob", Path::new("/refs/b.png"), ts(0)).unwrap();
        assert!(entry.last_matched_at.is_none());

        reg.touch_last_matched(entry.id, ts(120)).unwrap();
        let entry = reg.get("bob").unwrap().unwrap();
        assert_eq!(entry.last_matched_at, Some(ts(120)));
    }

    #[test]
    fn test_list_enabled_excludes_disabled() {
        let reg = Registry::open_in_memory().unwrap();
        reg.upsert("alice", Path::new("/refs/a.png"), ts(0)).unwrap();
        reg.upsert("bob", Path::new("/refs/b.png"), ts(0)).unwrap();
        reg.set_enabled("bob", false).unwrap();

        let enabled = reg.list_enabled().unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].identity, "alice");
        assert_eq!(reg.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_remove_returns_entry() {
        let reg = Registry::open_in_memory().unwrap();
        reg.upsert("carol", Path::new("/refs/c.png"), ts(0)).unwrap();

        let removed = reg.remove("carol").unwrap();
        assert_eq!(removed.image_path, PathBuf::from("/refs/c.png"));
        assert!(reg.get("carol").unwrap().is_none());

        assert!(matches!(reg.remove("carol"), Err(StoreError::IdentityNotFound(_))));
    }

    #[test]
    fn test_set_enabled_unknown_identity() {
        let reg = Registry::open_in_memory().unwrap();
        assert!(matches!(
            reg.set_enabled("nobody", false),
            Err(StoreError::IdentityNotFound(_))
        ));
    }
}
