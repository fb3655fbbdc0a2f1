//! SQLite Outline Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::book_repo::{db_error, parse_uuid};
use super::DbPool;
use crate::application::ports::{
    OutlineEntryRecord, OutlineRecord, OutlineRepositoryPort, RepositoryError,
};

/// SQLite Outline Repository
pub struct SqliteOutlineRepository {
    pool: DbPool,
}

impl SqliteOutlineRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OutlineEntryRow {
    id: String,
    book_id: String,
    position: i64,
    full_title: String,
    custom_title: String,
    description: String,
    key_points: String,
}

impl TryFrom<OutlineEntryRow> for OutlineEntryRecord {
    type Error = RepositoryError;

    fn try_from(row: OutlineEntryRow) -> Result<Self, Self::Error> {
        Ok(OutlineEntryRecord {
            id: parse_uuid(&row.id)?,
            book_id: parse_uuid(&row.book_id)?,
            position: row.position as u32,
            full_title: row.full_title,
            custom_title: row.custom_title,
            description: row.description,
            key_points: serde_json::from_str(&row.key_points)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
        })
    }
}

fn encode_key_points(key_points: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(key_points).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

#[async_trait]
impl OutlineRepositoryPort for SqliteOutlineRepository {
    async fn find_by_book(&self, book_id: Uuid) -> Result<OutlineRecord, RepositoryError> {
        let rows: Vec<OutlineEntryRow> = sqlx::query_as(
            "SELECT id, book_id, position, full_title, custom_title, description, key_points FROM outline_entries WHERE book_id = ? ORDER BY position",
        )
        .bind(book_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let suggestions: Vec<(String,)> = sqlx::query_as(
            "SELECT content FROM outline_suggestions WHERE book_id = ? ORDER BY position",
        )
        .bind(book_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(OutlineRecord {
            entries: rows
                .into_iter()
                .map(OutlineEntryRecord::try_from)
                .collect::<Result<_, _>>()?,
            suggestions: suggestions.into_iter().map(|(s,)| s).collect(),
        })
    }

    async fn replace(&self, book_id: Uuid, outline: &OutlineRecord) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM outline_entries WHERE book_id = ?")
            .bind(book_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for entry in &outline.entries {
            sqlx::query(
                r#"
                INSERT INTO outline_entries (id, book_id, position, full_title, custom_title, description, key_points)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(entry.id.to_string())
            .bind(book_id.to_string())
            .bind(entry.position as i64)
            .bind(&entry.full_title)
            .bind(&entry.custom_title)
            .bind(&entry.description)
            .bind(encode_key_points(&entry.key_points)?)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        sqlx::query("DELETE FROM outline_suggestions WHERE book_id = ?")
            .bind(book_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for (position, suggestion) in outline.suggestions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO outline_suggestions (book_id, position, content) VALUES (?, ?, ?)",
            )
            .bind(book_id.to_string())
            .bind(position as i64)
            .bind(suggestion)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;

        Ok(())
    }

    async fn update_entry(&self, entry: &OutlineEntryRecord) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE outline_entries
            SET full_title = ?, custom_title = ?, description = ?, key_points = ?
            WHERE id = ? AND book_id = ?
            "#,
        )
        .bind(&entry.full_title)
        .bind(&entry.custom_title)
        .bind(&entry.description)
        .bind(encode_key_points(&entry.key_points)?)
        .bind(entry.id.to_string())
        .bind(entry.book_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::BookRepositoryPort;
    use crate::domain::book::{Outline, OutlineEntry};
    use crate::infrastructure::persistence::sqlite::book_repo::tests::{book, test_pool};
    use crate::infrastructure::persistence::sqlite::SqliteBookRepository;

    async fn setup() -> (SqliteOutlineRepository, Uuid) {
        let pool = test_pool().await;
        let record = book("Outlined");
        SqliteBookRepository::new(pool.clone())
            .save(&record)
            .await
            .unwrap();
        (SqliteOutlineRepository::new(pool), record.id)
    }

    fn outline() -> Outline {
        Outline::new(
            vec![
                OutlineEntry::new("Setup", "the world", vec!["map".into(), "hero".into()]),
                OutlineEntry::new("Trouble", "", vec![]),
                OutlineEntry::new("Resolution", "", vec!["ending".into()]),
            ],
            vec!["Show, don't tell".into(), "Short chapters".into()],
        )
    }

    #[tokio::test]
    async fn test_replace_and_load_preserves_order() {
        let (repo, book_id) = setup().await;
        let outline = outline();

        repo.replace(book_id, &OutlineRecord::from_outline(book_id, &outline))
            .await
            .unwrap();

        let loaded = repo.find_by_book(book_id).await.unwrap().into_outline();
        assert_eq!(loaded, outline);
    }

    #[tokio::test]
    async fn test_replace_drops_removed_entries() {
        let (repo, book_id) = setup().await;
        let mut outline = outline();
        repo.replace(book_id, &OutlineRecord::from_outline(book_id, &outline))
            .await
            .unwrap();

        outline.entries.remove(1);
        outline.suggestions.clear();
        outline.retitle();
        repo.replace(book_id, &OutlineRecord::from_outline(book_id, &outline))
            .await
            .unwrap();

        let loaded = repo.find_by_book(book_id).await.unwrap().into_outline();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.entries[1].full_title, "Conclusion: Resolution");
        assert!(loaded.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_update_entry() {
        let (repo, book_id) = setup().await;
        let outline = outline();
        let record = OutlineRecord::from_outline(book_id, &outline);
        repo.replace(book_id, &record).await.unwrap();

        let mut entry = record.entries[1].clone();
        entry.custom_title = "Bigger Trouble".into();
        entry.full_title = "Chapter 1: Bigger Trouble".into();
        assert!(repo.update_entry(&entry).await.unwrap());

        let loaded = repo.find_by_book(book_id).await.unwrap();
        assert_eq!(loaded.entries[1].full_title, "Chapter 1: Bigger Trouble");
        assert_eq!(loaded.entries[1].position, 1);
    }
}
