//! Data Transfer Objects
//!
//! 请求体同时用于服务端解析和 HttpBookClient 发送，字段统一使用 camelCase。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::commands::{ChapterOrderUpdate, OutlineEntryInput};
use crate::application::ports::BookRecord;
use crate::application::ResyncReport;
use crate::domain::book::{Chapter, ChapterUpdate, Outline};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub errno: i32,
    #[serde(default)]
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Book DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub genre: Option<String>,
    pub target_audience: Option<String>,
    pub instructions: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BookRecord> for BookResponse {
    fn from(record: BookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            genre: record.genre,
            target_audience: record.target_audience,
            instructions: record.instructions,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// 书籍详情: 基本信息 + 大纲（含建议）+ 按 order 排列的章节
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetailsResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    pub outline: Outline,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub id: Uuid,
}

// ============================================================================
// Chapter DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterOrderPayload {
    pub id: Uuid,
    pub order: u32,
    pub title: String,
}

impl From<&ChapterUpdate> for ChapterOrderPayload {
    fn from(update: &ChapterUpdate) -> Self {
        Self {
            id: *update.id.as_uuid(),
            order: update.order,
            title: update.title.clone(),
        }
    }
}

impl From<ChapterOrderPayload> for ChapterOrderUpdate {
    fn from(payload: ChapterOrderPayload) -> Self {
        Self {
            chapter_id: payload.id,
            order: payload.order,
            title: payload.title,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReorderChaptersRequest {
    pub updates: Vec<ChapterOrderPayload>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReorderChaptersResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChapterRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateChapterContentRequest {
    pub content: String,
}

// ============================================================================
// Outline DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub order: u32,
}

impl From<OutlineEntryPayload> for OutlineEntryInput {
    fn from(payload: OutlineEntryPayload) -> Self {
        Self {
            id: payload.id,
            title: payload.title,
            custom_title: payload.custom_title,
            description: payload.description,
            key_points: payload.key_points,
            order: payload.order,
        }
    }
}

/// 保存大纲请求，`chapters` 即大纲条目列表
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutlineRequest {
    #[serde(default)]
    pub chapters: Vec<OutlineEntryPayload>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub skip_chapter_sync: bool,
}

impl SaveOutlineRequest {
    pub fn from_outline(outline: &Outline, skip_chapter_sync: bool) -> Self {
        Self {
            chapters: outline
                .entries
                .iter()
                .enumerate()
                .map(|(index, entry)| OutlineEntryPayload {
                    id: Some(*entry.id.as_uuid()),
                    title: entry.full_title.clone(),
                    custom_title: Some(entry.custom_title.clone()),
                    description: entry.description.clone(),
                    key_points: entry.key_points.clone(),
                    order: index as u32 + 1,
                })
                .collect(),
            suggestions: outline.suggestions.clone(),
            skip_chapter_sync,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResyncSummary {
    pub updated: usize,
    pub created: usize,
    pub deleted: usize,
    pub skipped: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<ResyncReport> for ResyncSummary {
    fn from(report: ResyncReport) -> Self {
        Self {
            updated: report.updated,
            created: report.created,
            deleted: report.deleted,
            skipped: report.skipped,
            warnings: report.warnings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveOutlineResponse {
    pub outline: Outline,
    pub resync: Option<ResyncSummary>,
}

/// 单条目编辑，`chapterId` 为大纲条目 id
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOutlineEntryRequest {
    #[serde(alias = "entryId")]
    pub chapter_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}
