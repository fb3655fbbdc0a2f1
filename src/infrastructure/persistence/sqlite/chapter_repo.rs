//! SQLite Chapter Repository
//!
//! SQLite 在 UPDATE 过程中逐行检查 UNIQUE 约束，所以整体移动 order 时先写入
//! 临时的负数区间，再一次性翻回正数，避免中途出现重复。

use async_trait::async_trait;
use chrono::Utc;
use sqlx::FromRow;
use uuid::Uuid;

use super::book_repo::{db_error, parse_time, parse_uuid};
use super::DbPool;
use crate::application::ports::{
    ChapterRecord, ChapterReorderRecord, ChapterRepositoryPort, RepositoryError,
};

/// SQLite Chapter Repository
pub struct SqliteChapterRepository {
    pool: DbPool,
}

impl SqliteChapterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn write_error(e: sqlx::Error) -> RepositoryError {
    let unique = e
        .as_database_error()
        .map(|d| d.is_unique_violation())
        .unwrap_or(false);
    if unique {
        RepositoryError::Duplicate(format!("chapter order already taken: {}", e))
    } else {
        db_error(e)
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: String,
    book_id: String,
    title: String,
    content: String,
    chapter_order: i64,
    word_count: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ChapterRow> for ChapterRecord {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(ChapterRecord {
            id: parse_uuid(&row.id)?,
            book_id: parse_uuid(&row.book_id)?,
            title: row.title,
            content: row.content,
            order: row.chapter_order as u32,
            word_count: row.word_count as u32,
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, book_id, title, content, chapter_order, word_count, created_at, updated_at FROM chapters";

#[async_trait]
impl ChapterRepositoryPort for SqliteChapterRepository {
    async fn find_by_book(&self, book_id: Uuid) -> Result<Vec<ChapterRecord>, RepositoryError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(&format!(
            "{} WHERE book_id = ? ORDER BY chapter_order",
            SELECT_COLUMNS
        ))
        .bind(book_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ChapterRecord::try_from).collect()
    }

    async fn find_by_id(
        &self,
        book_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(&format!(
            "{} WHERE book_id = ? AND id = ?",
            SELECT_COLUMNS
        ))
        .bind(book_id.to_string())
        .bind(chapter_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn create(&self, chapter: &ChapterRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO chapters (id, book_id, title, content, chapter_order, word_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(chapter.id.to_string())
        .bind(chapter.book_id.to_string())
        .bind(&chapter.title)
        .bind(&chapter.content)
        .bind(chapter.order as i64)
        .bind(chapter.word_count as i64)
        .bind(chapter.created_at.to_rfc3339())
        .bind(chapter.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn next_order(&self, book_id: Uuid) -> Result<u32, RepositoryError> {
        let (max,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(chapter_order), 0) FROM chapters WHERE book_id = ?",
        )
        .bind(book_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(max as u32 + 1)
    }

    async fn reorder_batch(
        &self,
        book_id: Uuid,
        updates: &[ChapterReorderRecord],
    ) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 第一步: 写入负数区间，未提交的事务在 drop 时回滚
        for update in updates {
            let result = sqlx::query(
                "UPDATE chapters SET chapter_order = ?, title = ?, updated_at = ? WHERE book_id = ? AND id = ?",
            )
            .bind(-(update.order as i64))
            .bind(&update.title)
            .bind(&now)
            .bind(book_id.to_string())
            .bind(update.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(format!("chapter {}", update.id)));
            }
        }

        // 第二步: 翻回正数
        sqlx::query(
            "UPDATE chapters SET chapter_order = -chapter_order WHERE book_id = ? AND chapter_order < 0",
        )
        .bind(book_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        tx.commit().await.map_err(db_error)?;

        Ok(())
    }

    async fn update_title(
        &self,
        book_id: Uuid,
        chapter_id: Uuid,
        title: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chapters SET title = ?, updated_at = ? WHERE book_id = ? AND id = ?",
        )
        .bind(title)
        .bind(Utc::now().to_rfc3339())
        .bind(book_id.to_string())
        .bind(chapter_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_content(
        &self,
        book_id: Uuid,
        chapter_id: Uuid,
        content: &str,
        word_count: u32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chapters SET content = ?, word_count = ?, updated_at = ? WHERE book_id = ? AND id = ?",
        )
        .bind(content)
        .bind(word_count as i64)
        .bind(Utc::now().to_rfc3339())
        .bind(book_id.to_string())
        .bind(chapter_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_and_renumber(
        &self,
        book_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let order: Option<(i64,)> =
            sqlx::query_as("SELECT chapter_order FROM chapters WHERE book_id = ? AND id = ?")
                .bind(book_id.to_string())
                .bind(chapter_id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;

        let Some((order,)) = order else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM chapters WHERE book_id = ? AND id = ?")
            .bind(book_id.to_string())
            .bind(chapter_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        // 后续章节前移一位，同样经过负数区间
        sqlx::query(
            "UPDATE chapters SET chapter_order = -(chapter_order - 1) WHERE book_id = ? AND chapter_order > ?",
        )
        .bind(book_id.to_string())
        .bind(order)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        sqlx::query(
            "UPDATE chapters SET chapter_order = -chapter_order WHERE book_id = ? AND chapter_order < 0",
        )
        .bind(book_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        tx.commit().await.map_err(db_error)?;

        Ok(true)
    }
}
