//! HTTP Book Client - 通过 REST API 访问书籍存储
//!
//! 实现 ChapterSyncPort 和 OutlineSyncPort。
//!
//! 所有响应都是 `{errno, error, data}` 信封，errno = 0 为成功，
//! 其余按 errno 分类（404/409 为瞬时冲突）。

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::application::ports::{
    BookView, ChapterSyncPort, EntryPatch, GatewayError, OutlineSave, OutlineSyncPort,
};
use crate::domain::book::{BookId, Chapter, ChapterId, ChapterUpdate, NewChapter, Outline};
use crate::infrastructure::http::dto::{
    ApiResponse, ChapterOrderPayload, CreateChapterRequest, PatchOutlineEntryRequest,
    ReorderChaptersRequest, SaveOutlineRequest,
};

/// HTTP 客户端配置
#[derive(Debug, Clone)]
pub struct HttpBookClientConfig {
    /// API 基础 URL（不含 /api）
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpBookClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5060".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpBookClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// GET /api/books/:id 中引擎需要的部分
#[derive(Debug, Deserialize)]
struct BookPayload {
    id: Uuid,
    outline: Outline,
    chapters: Vec<Chapter>,
}

/// HTTP 书籍客户端
pub struct HttpBookClient {
    client: Client,
    config: HttpBookClientConfig,
}

impl HttpBookClient {
    pub fn new(config: HttpBookClientConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn book_url(&self, book_id: BookId) -> String {
        format!(
            "{}/api/books/{}",
            self.config.base_url.trim_end_matches('/'),
            book_id
        )
    }

    fn chapters_url(&self, book_id: BookId) -> String {
        format!("{}/chapters", self.book_url(book_id))
    }

    fn outline_url(&self, book_id: BookId) -> String {
        format!("{}/outline", self.book_url(book_id))
    }

    /// 发送请求并拆开信封
    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, GatewayError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Network(format!("Request timed out: {}", e))
            } else if e.is_connect() {
                GatewayError::Network(format!("Cannot connect to book service: {}", e))
            } else {
                GatewayError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_errno(
                i32::from(status.as_u16()),
                format!("HTTP {}: {}", status, error_text),
            ));
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if envelope.errno != 0 {
            return Err(GatewayError::from_errno(envelope.errno, envelope.error));
        }

        Ok(envelope.data)
    }

    /// 只关心成功与否的写请求
    async fn write(&self, request: RequestBuilder) -> Result<(), GatewayError> {
        self.call::<serde_json::Value>(request).await.map(|_| ())
    }
}

#[async_trait]
impl ChapterSyncPort for HttpBookClient {
    async fn fetch_book(&self, book_id: BookId) -> Result<BookView, GatewayError> {
        let payload: BookPayload = self
            .call(self.client.get(self.book_url(book_id)))
            .await?
            .ok_or_else(|| GatewayError::InvalidResponse("Missing book data".to_string()))?;

        if payload.id != *book_id.as_uuid() {
            return Err(GatewayError::InvalidResponse(format!(
                "Requested book {}, received {}",
                book_id, payload.id
            )));
        }

        Ok(BookView {
            book_id,
            outline: payload.outline,
            chapters: payload.chapters,
        })
    }

    async fn reorder_chapters(
        &self,
        book_id: BookId,
        updates: &[ChapterUpdate],
    ) -> Result<(), GatewayError> {
        let body = ReorderChaptersRequest {
            updates: updates.iter().map(ChapterOrderPayload::from).collect(),
        };

        tracing::debug!(
            book_id = %book_id,
            count = body.updates.len(),
            "Sending chapter batch"
        );

        self.write(self.client.patch(self.chapters_url(book_id)).json(&body))
            .await
    }

    async fn create_chapter(
        &self,
        book_id: BookId,
        chapter: &NewChapter,
    ) -> Result<Chapter, GatewayError> {
        let body = CreateChapterRequest {
            title: chapter.title.clone(),
            content: chapter.content.clone(),
            order: chapter.order,
        };

        self.call(self.client.post(self.chapters_url(book_id)).json(&body))
            .await?
            .ok_or_else(|| GatewayError::InvalidResponse("Missing chapter data".to_string()))
    }

    async fn delete_chapter(
        &self,
        book_id: BookId,
        chapter_id: ChapterId,
    ) -> Result<(), GatewayError> {
        let url = format!("{}/{}", self.chapters_url(book_id), chapter_id);
        self.write(self.client.delete(url)).await
    }
}

#[async_trait]
impl OutlineSyncPort for HttpBookClient {
    async fn save_outline(&self, book_id: BookId, save: &OutlineSave) -> Result<(), GatewayError> {
        let body = SaveOutlineRequest::from_outline(&save.outline, save.skip_chapter_sync);
        self.write(self.client.post(self.outline_url(book_id)).json(&body))
            .await
    }

    async fn patch_outline_entry(
        &self,
        book_id: BookId,
        patch: &EntryPatch,
    ) -> Result<(), GatewayError> {
        let body = PatchOutlineEntryRequest {
            chapter_id: *patch.entry_id.as_uuid(),
            title: patch.title.clone(),
            description: patch.description.clone(),
            key_points: patch.key_points.clone(),
        };
        self.write(self.client.patch(self.outline_url(book_id)).json(&body))
            .await
    }
}
