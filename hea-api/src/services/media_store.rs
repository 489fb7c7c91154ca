//! Content store for uploaded photo evidence
//!
//! Blobs live in the `media` table of the service database, keyed by a
//! generated reference id. Uploaded parts are classified as rgb or thermal
//! imagery by a filename convention: a filename containing `thermal`
//! (case-insensitive) is thermal, everything else is rgb.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use hea_common::Result;

/// Imagery class of an uploaded blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Rgb,
    Thermal,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Rgb => "rgb",
            MediaKind::Thermal => "thermal",
        }
    }

    /// Classify an upload by its filename
    pub fn classify(filename: &str) -> MediaKind {
        if filename.to_ascii_lowercase().contains("thermal") {
            MediaKind::Thermal
        } else {
            MediaKind::Rgb
        }
    }
}

/// A stored blob with its metadata
#[derive(Debug, Clone)]
pub struct MediaBlob {
    pub media_id: String,
    pub filename: String,
    pub content_type: String,
    pub kind: MediaKind,
    pub data: Vec<u8>,
}

/// Database-backed media store
#[derive(Clone)]
pub struct MediaStore {
    pool: SqlitePool,
}

impl MediaStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a blob, returning its generated reference id
    pub async fn put(
        &self,
        filename: &str,
        content_type: &str,
        kind: MediaKind,
        data: &[u8],
    ) -> Result<String> {
        let media_id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO media (media_id, filename, content_type, kind, size, data, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&media_id)
        .bind(filename)
        .bind(content_type)
        .bind(kind.as_str())
        .bind(data.len() as i64)
        .bind(data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            media_id = %media_id,
            filename = %filename,
            kind = kind.as_str(),
            size = data.len(),
            "Stored media blob"
        );

        Ok(media_id)
    }

    /// Fetch a blob by reference id
    pub async fn get(&self, media_id: &str) -> Result<Option<MediaBlob>> {
        let row = sqlx::query(
            r#"
            SELECT media_id, filename, content_type, kind, data
            FROM media
            WHERE media_id = ?
            "#,
        )
        .bind(media_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let kind: String = row.get("kind");
            MediaBlob {
                media_id: row.get("media_id"),
                filename: row.get("filename"),
                content_type: row.get("content_type"),
                kind: if kind == "thermal" {
                    MediaKind::Thermal
                } else {
                    MediaKind::Rgb
                },
                data: row.get("data"),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> MediaStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        crate::db::init_schema(&pool).await.expect("schema");
        MediaStore::new(pool)
    }

    #[test]
    fn classification_by_filename_marker() {
        assert_eq!(MediaKind::classify("kitchen_thermal_01.png"), MediaKind::Thermal);
        assert_eq!(MediaKind::classify("THERMAL.jpg"), MediaKind::Thermal);
        assert_eq!(MediaKind::classify("window.jpg"), MediaKind::Rgb);
        assert_eq!(MediaKind::classify(""), MediaKind::Rgb);
    }

    #[tokio::test]
    async fn put_then_get_returns_same_bytes() {
        let store = test_store().await;
        let bytes = vec![1u8, 2, 3, 4];

        let id = store
            .put("window.jpg", "image/jpeg", MediaKind::Rgb, &bytes)
            .await
            .unwrap();

        let blob = store.get(&id).await.unwrap().unwrap();
        assert_eq!(blob.data, bytes);
        assert_eq!(blob.content_type, "image/jpeg");
        assert_eq!(blob.kind, MediaKind::Rgb);
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let store = test_store().await;
        assert!(store.get("no-such-id").await.unwrap().is_none());
    }
}
