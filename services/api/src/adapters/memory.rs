//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the persistence ports. Used by the test suite
//! and when the service is started without a `DATABASE_URL`.

use async_trait::async_trait;
use book_tracker_core::domain::{AuthSession, Book, BookFilter, User, UserCredentials};
use book_tracker_core::ports::{BookStore, PortError, PortResult, SessionStore, UserStore};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserCredentials>>,
    sessions: RwLock<HashMap<String, AuthSession>>,
    books: RwLock<HashMap<Uuid, Book>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored session records, expired ones included.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn book_not_found(book_id: Uuid) -> PortError {
    PortError::NotFound(format!("Book {} not found", book_id))
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User, hashed_password: Option<&str>) -> PortResult<()> {
        let mut users = self.users.write().await;
        let email = user.email.to_lowercase();
        if users.values().any(|c| c.user.email.to_lowercase() == email) {
            return Err(PortError::Conflict("Email already registered".to_string()));
        }
        users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                hashed_password: hashed_password.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .read()
            .await
            .get(&user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let email = email.to_lowercase();
        self.users
            .read()
            .await
            .values()
            .find(|c| c.user.email.to_lowercase() == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        name: &str,
        picture: Option<&str>,
    ) -> PortResult<User> {
        let mut users = self.users.write().await;
        let creds = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        creds.user.name = name.to_string();
        creds.user.picture = picture.map(str::to_string);
        Ok(creds.user.clone())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get_auth_session(&self, token: &str) -> PortResult<Option<AuthSession>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert_book(&self, book: &Book) -> PortResult<()> {
        self.books.write().await.insert(book.id, book.clone());
        Ok(())
    }

    async fn get_book(&self, owner_id: Option<Uuid>, book_id: Uuid) -> PortResult<Book> {
        self.books
            .read()
            .await
            .get(&book_id)
            .filter(|book| book.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| book_not_found(book_id))
    }

    async fn list_books(
        &self,
        owner_id: Option<Uuid>,
        filter: &BookFilter,
        limit: Option<usize>,
    ) -> PortResult<Vec<Book>> {
        let books = self.books.read().await;
        let mut matching: Vec<Book> = books
            .values()
            .filter(|book| book.owner_id == owner_id && filter.matches(book))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        if let Some(limit) = limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn save_book(&self, book: &Book) -> PortResult<()> {
        let mut books = self.books.write().await;
        match books.get_mut(&book.id) {
            Some(stored) if stored.owner_id == book.owner_id => {
                *stored = book.clone();
                Ok(())
            }
            _ => Err(book_not_found(book.id)),
        }
    }

    async fn delete_book(&self, owner_id: Option<Uuid>, book_id: Uuid) -> PortResult<()> {
        let mut books = self.books.write().await;
        match books.get(&book_id) {
            Some(book) if book.owner_id == owner_id => {
                books.remove(&book_id);
                Ok(())
            }
            _ => Err(book_not_found(book_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_tracker_core::domain::{BookStatus, NewBook};
    use chrono::{Duration, Utc};

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Reader".to_string(),
            picture: None,
            created_at: Utc::now(),
        }
    }

    fn book(owner_id: Option<Uuid>, title: &str) -> Book {
        NewBook {
            isbn: "9780000000000".to_string(),
            title: title.to_string(),
            author: "Author".to_string(),
            total_pages: 100,
            ..Default::default()
        }
        .into_book(Uuid::new_v4(), owner_id, Utc::now())
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let store = MemoryStore::new();
        store.create_user(&user("a@example.com"), Some("h")).await.unwrap();
        let err = store
            .create_user(&user("A@Example.com"), Some("h"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn books_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let alice = Some(Uuid::new_v4());
        let bob = Some(Uuid::new_v4());
        let alices = book(alice, "Dune");
        store.insert_book(&alices).await.unwrap();

        assert!(store.get_book(alice, alices.id).await.is_ok());
        assert!(matches!(
            store.get_book(bob, alices.id).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store.get_book(None, alices.id).await,
            Err(PortError::NotFound(_))
        ));
        assert!(store
            .list_books(bob, &BookFilter::default(), None)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            store.delete_book(bob, alices.id).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_capped() {
        let store = MemoryStore::new();
        for i in 0..5 {
            let mut b = book(None, &format!("Book {}", i));
            b.date_added = Utc::now() + Duration::seconds(i);
            store.insert_book(&b).await.unwrap();
        }
        let listed = store
            .list_books(None, &BookFilter::default(), Some(3))
            .await
            .unwrap();
        let titles: Vec<_> = listed.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Book 4", "Book 3", "Book 2"]);
    }

    #[tokio::test]
    async fn filters_by_status() {
        let store = MemoryStore::new();
        let mut reading = book(None, "Reading");
        reading.status = BookStatus::CurrentlyReading;
        store.insert_book(&reading).await.unwrap();
        store.insert_book(&book(None, "Shelved")).await.unwrap();

        let listed = store
            .list_books(None, &BookFilter::status(BookStatus::CurrentlyReading), None)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Reading");
    }
}
