//! Book Command Handlers

use std::sync::Arc;

use crate::application::commands::{CreateBook, DeleteBook};
use crate::application::error::ApplicationError;
use crate::application::ports::{BookRecord, BookRepositoryPort};
use crate::domain::book::{Book, Title};
use crate::infrastructure::events::{BookEvent, EventPublisher};

// ============================================================================
// CreateBook
// ============================================================================

/// CreateBook Handler
pub struct CreateBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    event_publisher: Arc<EventPublisher>,
}

impl CreateBookHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            book_repo,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: CreateBook) -> Result<BookRecord, ApplicationError> {
        let title = Title::new(command.title).map_err(ApplicationError::validation)?;
        let book = Book::new(title).with_details(
            non_empty(command.genre),
            non_empty(command.target_audience),
            non_empty(command.instructions),
        );
        let book = BookRecord::from(&book);

        self.book_repo.save(&book).await?;

        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        self.event_publisher.publish(BookEvent::BookCreated {
            book_id: book.id,
            title: book.title.clone(),
        });

        Ok(book)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// DeleteBook
// ============================================================================

/// DeleteBook Handler
pub struct DeleteBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    event_publisher: Arc<EventPublisher>,
}

impl DeleteBookHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            book_repo,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: DeleteBook) -> Result<(), ApplicationError> {
        let book_id = command.book_id;

        // 检查书籍是否存在
        let book = self
            .book_repo
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", book_id))?;

        self.book_repo.delete(book_id).await?;

        tracing::info!(book_id = %book_id, title = %book.title, "Book deleted");
        self.event_publisher.publish(BookEvent::BookDeleted { book_id });

        Ok(())
    }
}
