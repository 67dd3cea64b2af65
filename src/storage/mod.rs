use crate::catalog::{SearchType, Track};
use crate::palette::AccentColor;
use anyhow::Context;
use rusqlite::{Connection, params};
use std::path::Path;

pub struct Storage {
    conn: Connection,
    max_age_secs: i64,
}

impl Storage {
    pub fn open(path: &Path, max_age_secs: i64) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn, max_age_secs };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS last_searches (
  query TEXT NOT NULL,
  kind TEXT NOT NULL,
  result_json TEXT NOT NULL,
  updated_at INTEGER NOT NULL,
  PRIMARY KEY (query, kind)
);

CREATE TABLE IF NOT EXISTS palette_cache (
  source TEXT PRIMARY KEY,
  accents_json TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    fn fresh(&self, updated_at: i64, now_unix: i64) -> bool {
        now_unix - updated_at <= self.max_age_secs
    }

    pub fn cache_search(
        &self,
        query: &str,
        kind: SearchType,
        track: &Track,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        let json = serde_json::to_string(track).context("serialize track")?;
        self.conn
            .execute(
                r#"
INSERT INTO last_searches(query, kind, result_json, updated_at)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(query, kind) DO UPDATE SET
  result_json=excluded.result_json,
  updated_at=excluded.updated_at
"#,
                params![normalize(query), kind.entity(), json, now_unix],
            )
            .context("cache search")?;
        Ok(())
    }

    pub fn get_cached_search(
        &self,
        query: &str,
        kind: SearchType,
        now_unix: i64,
    ) -> anyhow::Result<Option<Track>> {
        let mut stmt = self
            .conn
            .prepare("SELECT result_json, updated_at FROM last_searches WHERE query=?1 AND kind=?2")
            .context("prepare cached search")?;
        let mut rows = stmt
            .query(params![normalize(query), kind.entity()])
            .context("query cached search")?;
        if let Some(row) = rows.next().context("read cached search row")? {
            let json: String = row.get(0)?;
            let ts: i64 = row.get(1)?;
            if !self.fresh(ts, now_unix) {
                return Ok(None);
            }
            let track = serde_json::from_str(&json).context("parse cached track")?;
            Ok(Some(track))
        } else {
            Ok(None)
        }
    }

    /// Empty palettes are not stored so a failed extraction is retried.
    pub fn cache_palette(
        &self,
        source: &str,
        accents: &[AccentColor],
        now_unix: i64,
    ) -> anyhow::Result<()> {
        if accents.is_empty() {
            return Ok(());
        }
        let json = serde_json::to_string(accents).context("serialize palette")?;
        self.conn
            .execute(
                r#"
INSERT INTO palette_cache(source, accents_json, updated_at)
VALUES(?1, ?2, ?3)
ON CONFLICT(source) DO UPDATE SET
  accents_json=excluded.accents_json,
  updated_at=excluded.updated_at
"#,
                params![source, json, now_unix],
            )
            .context("cache palette")?;
        Ok(())
    }

    pub fn get_palette(&self, source: &str, now_unix: i64) -> anyhow::Result<Option<Vec<AccentColor>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT accents_json, updated_at FROM palette_cache WHERE source=?1")?;
        let mut rows = stmt.query(params![source])?;
        if let Some(row) = rows.next()? {
            let json: String = row.get(0)?;
            let ts: i64 = row.get(1)?;
            if !self.fresh(ts, now_unix) {
                return Ok(None);
            }
            Ok(Some(serde_json::from_str(&json).context("parse cached palette")?))
        } else {
            Ok(None)
        }
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(name: &str) -> Storage {
        let path = std::env::temp_dir().join(format!(
            "sleevd-storage-{}-{name}.sqlite3",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        Storage::open(&path, 100).unwrap()
    }

    fn track() -> Track {
        Track {
            track_name: "Windowlicker".into(),
            artist_name: "Aphex Twin".into(),
            collection_name: "Windowlicker - EP".into(),
            collection_id: Some(42),
            artwork_url_100: "a/100x100bb.jpg".into(),
            high_res_artwork: "a/800x800bb.jpg".into(),
            preview_url: None,
            primary_genre_name: Some("Electronic".into()),
            release_date: None,
            track_number: Some(1),
            disc_number: Some(1),
        }
    }

    #[test]
    fn test_search_cache_is_keyed_by_query_and_kind() {
        let s = open("search");
        s.cache_search("Windowlicker ", SearchType::Song, &track(), 1_000).unwrap();

        assert_eq!(
            s.get_cached_search("windowlicker", SearchType::Song, 1_050).unwrap(),
            Some(track())
        );
        assert_eq!(s.get_cached_search("windowlicker", SearchType::Album, 1_050).unwrap(), None);
    }

    #[test]
    fn test_stale_entries_are_ignored() {
        let s = open("stale");
        s.cache_search("q", SearchType::Song, &track(), 1_000).unwrap();
        assert_eq!(s.get_cached_search("q", SearchType::Song, 1_101).unwrap(), None);
    }

    #[test]
    fn test_palette_cache() {
        let s = open("palette");
        let accents = vec![AccentColor {
            name: "Sampled 1".into(),
            value: "#f03c00".into(),
        }];
        s.cache_palette("a/800x800bb.jpg", &accents, 10).unwrap();
        s.cache_palette("empty.jpg", &[], 10).unwrap();

        assert_eq!(s.get_palette("a/800x800bb.jpg", 20).unwrap(), Some(accents));
        assert_eq!(s.get_palette("empty.jpg", 20).unwrap(), None);
    }
}
