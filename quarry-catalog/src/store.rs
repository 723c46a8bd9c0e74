//! SQLite-backed catalog: five tables, batched writes, acuity compaction
//!
//! The catalog is a directory holding `catalog.db` plus SQLite's WAL
//! sidecars. WAL journaling lets searches read a committed snapshot while
//! an import or compaction is writing. All lookups ride on B-tree indexes:
//! token value (unique index), postings (clustered primary key), record id
//! (rowid).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::{Error, Result};

/// File name of the database inside a catalog directory.
pub const CATALOG_DB: &str = "catalog.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS encoding (
    id  INTEGER PRIMARY KEY CHECK (id = 1),
    tag TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS source (
    id          INTEGER PRIMARY KEY CHECK (id = 1),
    path        TEXT NOT NULL,
    encoding_id INTEGER NOT NULL REFERENCES encoding (id)
);
CREATE TABLE IF NOT EXISTS record (
    id    INTEGER PRIMARY KEY,
    start_offset INTEGER NOT NULL,
    end_offset   INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS token (
    id          INTEGER PRIMARY KEY,
    value       TEXT NOT NULL UNIQUE,
    occurrences INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS posting (
    token_id  INTEGER NOT NULL,
    record_id INTEGER NOT NULL,
    PRIMARY KEY (token_id, record_id)
) WITHOUT ROWID;
";

/// Counts reported by [`Catalog::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub records: u64,
    pub tokens: u64,
    pub occurrences: u64,
}

/// Outcome of an acuity compaction pass.
#[derive(Debug, Clone, Copy)]
pub struct AcuityReport {
    pub tokens_before: u64,
    pub tokens_after: u64,
    pub elapsed: Duration,
}

/// Source descriptor stored at import time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub encoding_tag: String,
}

/// Handle to a catalog directory. Single writer, any number of readers.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open an existing catalog and validate its invariants.
    ///
    /// A non-empty record table without an encoding row means a previous
    /// import never ran to the point of describing its source; such a
    /// catalog must be reset before use.
    pub fn open(dir: &Path) -> Result<Self> {
        let catalog = Self::create(dir)?;
        let records = catalog.count("record")?;
        if records > 0 && catalog.encoding_tag()?.is_none() {
            return Err(Error::Corrupt(format!(
                "{records} records but no encoding row; reset and re-import"
            )));
        }
        Ok(catalog)
    }

    /// Open a catalog without invariant checks, creating the directory and
    /// schema as needed. Import uses this, since it resets immediately.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(CATALOG_DB))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(SCHEMA)?;
        debug!("opened catalog at {}", dir.display());
        Ok(Self { conn })
    }

    /// Truncate all five tables.
    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN IMMEDIATE;
             DELETE FROM posting;
             DELETE FROM token;
             DELETE FROM record;
             DELETE FROM source;
             DELETE FROM encoding;
             COMMIT;",
        )?;
        Ok(())
    }

    /// Record the encoding tag for this import. One-shot.
    pub fn put_encoding(&self, tag: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO encoding (id, tag) VALUES (1, ?1)",
            params![tag],
        )?;
        Ok(())
    }

    /// Record the source path for this import. One-shot.
    pub fn put_source(&self, path: &Path) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO source (id, path, encoding_id) VALUES (1, ?1, 1)",
            params![path.to_string_lossy()],
        )?;
        Ok(())
    }

    /// Open a write batch. Appends between `begin_batch` and `commit_batch`
    /// become durable together; an abort (or crash) rolls the whole batch
    /// back, leaving the committed prefix.
    pub fn begin_batch(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    /// Commit the open write batch.
    pub fn commit_batch(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Roll back the open write batch.
    pub fn rollback_batch(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    /// Append a record's decoded byte range, returning its dense id.
    /// Ids are assigned in emission order, starting at 1.
    pub fn append_record(&self, start: u64, end: u64) -> Result<u64> {
        let mut stmt = self
            .conn
            .prepare_cached("INSERT INTO record (start_offset, end_offset) VALUES (?1, ?2)")?;
        stmt.execute(params![start as i64, end as i64])?;
        Ok(self.conn.last_insert_rowid() as u64)
    }

    /// Insert a token with count 1, or bump its occurrence count.
    pub fn upsert_token(&self, value: &str) -> Result<u64> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO token (value, occurrences) VALUES (?1, 1)
             ON CONFLICT (value) DO UPDATE SET occurrences = occurrences + 1
             RETURNING id",
        )?;
        let id: i64 = stmt.query_row(params![value], |row| row.get(0))?;
        Ok(id as u64)
    }

    /// Assert that `token_id` occurs in `record_id`. Idempotent on the pair.
    pub fn add_posting(&self, token_id: u64, record_id: u64) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO posting (token_id, record_id) VALUES (?1, ?2)",
        )?;
        stmt.execute(params![token_id as i64, record_id as i64])?;
        Ok(())
    }

    /// Record ids containing `value`, in ascending id order. Empty on miss.
    pub fn postings_for(&self, value: &str) -> Result<Vec<u64>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT p.record_id FROM token t
             JOIN posting p ON p.token_id = t.id
             WHERE t.value = ?1
             ORDER BY p.record_id",
        )?;
        let rows = stmt.query_map(params![value], |row| row.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row? as u64);
        }
        Ok(ids)
    }

    /// Decoded byte range of a record.
    pub fn record_range(&self, record_id: u64) -> Result<Option<(u64, u64)>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT start_offset, end_offset FROM record WHERE id = ?1")?;
        let range = stmt
            .query_row(params![record_id as i64], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64))
            })
            .optional()?;
        Ok(range)
    }

    /// Encoding tag stored by the last import, if any.
    pub fn encoding_tag(&self) -> Result<Option<String>> {
        let tag = self
            .conn
            .query_row("SELECT tag FROM encoding WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(tag)
    }

    /// Source descriptor stored by the last import, if any.
    pub fn source_info(&self) -> Result<Option<SourceInfo>> {
        let info = self
            .conn
            .query_row(
                "SELECT s.path, e.tag FROM source s
                 JOIN encoding e ON e.id = s.encoding_id
                 WHERE s.id = 1",
                [],
                |row| {
                    Ok(SourceInfo {
                        path: PathBuf::from(row.get::<_, String>(0)?),
                        encoding_tag: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(info)
    }

    /// Delete every token with occurrence count strictly below `threshold`
    /// and its postings, then reclaim space and rebuild indexes.
    pub fn apply_acuity(&self, threshold: u64) -> Result<AcuityReport> {
        let started = Instant::now();
        let tokens_before = self.count("token")?;

        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        let postings = self.conn.execute(
            "DELETE FROM posting WHERE token_id IN
                 (SELECT id FROM token WHERE occurrences < ?1)",
            params![threshold as i64],
        )?;
        let tokens = self.conn.execute(
            "DELETE FROM token WHERE occurrences < ?1",
            params![threshold as i64],
        )?;
        self.conn.execute_batch("COMMIT")?;

        // Deletion leaves free pages and stale index shape behind.
        self.conn.execute_batch("VACUUM; REINDEX;")?;

        let tokens_after = self.count("token")?;
        let report = AcuityReport {
            tokens_before,
            tokens_after,
            elapsed: started.elapsed(),
        };
        info!(
            "acuity {threshold}: dropped {tokens} tokens / {postings} postings in {:?}",
            report.elapsed
        );
        Ok(report)
    }

    /// Current table counts.
    pub fn stats(&self) -> Result<CatalogStats> {
        let occurrences: i64 =
            self.conn
                .query_row("SELECT IFNULL(SUM(occurrences), 0) FROM token", [], |row| {
                    row.get(0)
                })?;
        Ok(CatalogStats {
            records: self.count("record")?,
            tokens: self.count("token")?,
            occurrences: occurrences as u64,
        })
    }

    fn count(&self, table: &str) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(n as u64)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_catalog() -> (tempfile::TempDir, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::create(dir.path()).unwrap();
        (dir, catalog)
    }

    #[test]
    fn test_record_ids_are_dense_and_ordered() {
        let (_dir, catalog) = scratch_catalog();
        catalog.begin_batch().unwrap();
        for i in 0..10u64 {
            let id = catalog.append_record(i * 10, i * 10 + 5).unwrap();
            assert_eq!(id, i + 1);
        }
        catalog.commit_batch().unwrap();
        assert_eq!(catalog.record_range(3).unwrap(), Some((20, 25)));
        assert_eq!(catalog.record_range(99).unwrap(), None);
    }

    #[test]
    fn test_upsert_token_counts_occurrences() {
        let (_dir, catalog) = scratch_catalog();
        let a = catalog.upsert_token("alpha").unwrap();
        let b = catalog.upsert_token("beta").unwrap();
        let a2 = catalog.upsert_token("alpha").unwrap();
        assert_eq!(a, a2);
        assert_ne!(a, b);
        let stats = catalog.stats().unwrap();
        assert_eq!(stats.tokens, 2);
        assert_eq!(stats.occurrences, 3);
    }

    #[test]
    fn test_postings_are_idempotent_and_sorted() {
        let (_dir, catalog) = scratch_catalog();
        let r1 = catalog.append_record(0, 5).unwrap();
        let r2 = catalog.append_record(6, 11).unwrap();
        let t = catalog.upsert_token("alpha").unwrap();
        catalog.add_posting(t, r2).unwrap();
        catalog.add_posting(t, r1).unwrap();
        catalog.add_posting(t, r1).unwrap();
        assert_eq!(catalog.postings_for("alpha").unwrap(), vec![r1, r2]);
        assert!(catalog.postings_for("missing").unwrap().is_empty());
    }

    #[test]
    fn test_acuity_strict_threshold() {
        let (_dir, catalog) = scratch_catalog();
        let r = catalog.append_record(0, 10).unwrap();
        for _ in 0..4 {
            catalog.upsert_token("common").unwrap();
        }
        for _ in 0..4 {
            catalog.upsert_token("rare").unwrap();
        }
        let common = catalog.upsert_token("common").unwrap();
        catalog.add_posting(common, r).unwrap();

        let report = catalog.apply_acuity(5).unwrap();
        assert_eq!(report.tokens_before, 2);
        assert_eq!(report.tokens_after, 1);
        // count == threshold survives; strictly-below does not
        assert!(catalog.postings_for("rare").unwrap().is_empty());
        assert_eq!(catalog.postings_for("common").unwrap(), vec![r]);
    }

    #[test]
    fn test_acuity_cascades_postings() {
        let (_dir, catalog) = scratch_catalog();
        let r = catalog.append_record(0, 4).unwrap();
        let rare = catalog.upsert_token("rare").unwrap();
        catalog.add_posting(rare, r).unwrap();
        catalog.apply_acuity(2).unwrap();
        let stats = catalog.stats().unwrap();
        assert_eq!(stats.tokens, 0);
        assert_eq!(stats.records, 1, "records are untouched by compaction");
        assert!(catalog.postings_for("rare").unwrap().is_empty());
    }

    #[test]
    fn test_reset_truncates_everything() {
        let (_dir, catalog) = scratch_catalog();
        catalog.put_encoding("gzip").unwrap();
        catalog.put_source(Path::new("/data/input.gz")).unwrap();
        let r = catalog.append_record(0, 4).unwrap();
        let t = catalog.upsert_token("x").unwrap();
        catalog.add_posting(t, r).unwrap();

        catalog.reset().unwrap();
        let stats = catalog.stats().unwrap();
        assert_eq!(stats.records, 0);
        assert_eq!(stats.tokens, 0);
        assert!(catalog.encoding_tag().unwrap().is_none());
        assert!(catalog.source_info().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_catalog_detected_on_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let catalog = Catalog::create(dir.path()).unwrap();
            catalog.append_record(0, 4).unwrap();
            // No encoding row: a crash before put_encoding committed.
        }
        let err = Catalog::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)), "{err:?}");
        // A reset makes it usable again.
        let catalog = Catalog::create(dir.path()).unwrap();
        catalog.reset().unwrap();
        drop(catalog);
        assert!(Catalog::open(dir.path()).is_ok());
    }

    #[test]
    fn test_source_info_round_trip() {
        let (_dir, catalog) = scratch_catalog();
        catalog.put_encoding("caesar:3").unwrap();
        catalog.put_source(Path::new("/data/input.enc")).unwrap();
        let info = catalog.source_info().unwrap().unwrap();
        assert_eq!(info.path, PathBuf::from("/data/input.enc"));
        assert_eq!(info.encoding_tag, "caesar:3");
    }
}
