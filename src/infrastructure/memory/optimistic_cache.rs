//! In-Memory Optimistic Book Cache Implementation

use dashmap::DashMap;

use crate::application::ports::{BookCachePort, CacheError, MutateFn, MutationState};
use crate::domain::book::{sort_by_order, BookId, BookSnapshot, Chapter, Mutation};

struct CachedBook {
    current: BookSnapshot,
    /// 回退目标，只在服务端确认或重新校验时替换
    confirmed: BookSnapshot,
    state: MutationState,
}

/// 内存乐观缓存
pub struct InMemoryBookCache {
    books: DashMap<BookId, CachedBook>,
}

impl InMemoryBookCache {
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
        }
    }
}

impl Default for InMemoryBookCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BookCachePort for InMemoryBookCache {
    fn seed(&self, mut snapshot: BookSnapshot) {
        let book_id = snapshot.book_id;
        // version 在同一本书内单调递增
        if let Some(existing) = self.books.get(&book_id) {
            snapshot.version = existing.current.version + 1;
        }
        tracing::debug!(book_id = %book_id, version = snapshot.version, "Book cache seeded");
        self.books.insert(
            book_id,
            CachedBook {
                confirmed: snapshot.clone(),
                current: snapshot,
                state: MutationState::Idle,
            },
        );
    }

    fn current(&self, book_id: BookId) -> Option<BookSnapshot> {
        self.books.get(&book_id).map(|b| b.current.clone())
    }

    fn last_confirmed(&self, book_id: BookId) -> Option<BookSnapshot> {
        self.books.get(&book_id).map(|b| b.confirmed.clone())
    }

    fn state(&self, book_id: BookId) -> Option<MutationState> {
        self.books.get(&book_id).map(|b| b.state)
    }

    fn apply(&self, book_id: BookId, mutate: MutateFn<'_>) -> Result<Mutation, CacheError> {
        let mut book = self
            .books
            .get_mut(&book_id)
            .ok_or(CacheError::NotLoaded(book_id))?;

        let mutation = mutate(&book.current)?;
        book.current = mutation.next.clone();
        book.state = MutationState::Pending {
            version: mutation.next.version,
        };

        tracing::debug!(
            book_id = %book_id,
            version = mutation.next.version,
            effects = mutation.effects.len(),
            "Optimistic mutation applied"
        );

        Ok(mutation)
    }

    fn confirm(&self, book_id: BookId, version: u64, chapters: Option<Vec<Chapter>>) -> bool {
        let Some(mut book) = self.books.get_mut(&book_id) else {
            return false;
        };

        if book.current.version != version {
            tracing::debug!(
                book_id = %book_id,
                confirmed = version,
                current = book.current.version,
                "Confirmation superseded by newer local mutation"
            );
            return false;
        }

        if let Some(mut chapters) = chapters {
            sort_by_order(&mut chapters);
            book.current.chapters = chapters;
        }
        book.confirmed = book.current.clone();
        book.state = MutationState::Confirmed { version };
        true
    }

    fn rollback(&self, book_id: BookId, version: u64) -> Option<BookSnapshot> {
        let mut book = self.books.get_mut(&book_id)?;

        let mut restored = book.confirmed.clone();
        restored.version = book.current.version + 1;
        book.current = restored;
        book.state = MutationState::Rejected { version };

        tracing::warn!(
            book_id = %book_id,
            rejected = version,
            restored = book.confirmed.version,
            "Rolled back to last confirmed snapshot"
        );

        Some(book.current.clone())
    }

    fn revalidate(&self, book_id: BookId, version: u64, mut server: BookSnapshot) -> BookSnapshot {
        let mut book = match self.books.get_mut(&book_id) {
            Some(book) => book,
            None => {
                self.seed(server.clone());
                return server;
            }
        };

        server.version = book.current.version + 1;
        book.current = server.clone();
        book.confirmed = server.clone();
        book.state = MutationState::Rejected { version };

        tracing::warn!(
            book_id = %book_id,
            rejected = version,
            "Optimistic view replaced by server state"
        );

        server
    }
}
