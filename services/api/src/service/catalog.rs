//! services/api/src/service/catalog.rs
//!
//! Ordered fallback over catalog providers. The first provider that returns a
//! match wins; failures, misses and timeouts move on to the next provider, and a
//! total miss yields a placeholder so adding a book is never blocked.

use crate::error::ApiError;
use book_tracker_core::domain::CatalogEntry;
use book_tracker_core::ports::CatalogProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct CatalogLookup {
    providers: Vec<Arc<dyn CatalogProvider>>,
    timeout: Duration,
}

impl CatalogLookup {
    pub fn new(providers: Vec<Arc<dyn CatalogProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub async fn lookup(&self, isbn: &str) -> CatalogEntry {
        for provider in &self.providers {
            let name = provider.name();
            match tokio::time::timeout(self.timeout, provider.lookup(isbn)).await {
                Ok(Ok(Some(entry))) => {
                    info!(provider = name, isbn, "Catalog match");
                    return entry;
                }
                Ok(Ok(None)) => debug!(provider = name, isbn, "No catalog match"),
                Ok(Err(e)) => warn!(provider = name, isbn, error = %e, "Catalog provider failed"),
                Err(_) => warn!(provider = name, isbn, "Catalog provider timed out"),
            }
        }
        warn!(isbn, "All catalog providers missed, returning placeholder");
        CatalogEntry::placeholder(isbn)
    }
}

/// Strips hyphens and whitespace. Accepts digits with an optional trailing
/// check character `X`.
pub fn normalize_isbn(raw: &str) -> Result<String, ApiError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let body = cleaned.strip_suffix('X').unwrap_or(&cleaned);
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::InvalidArgument(format!("Invalid ISBN '{}'", raw)));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use book_tracker_core::ports::{PortError, PortResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Match(&'static str),
        Miss,
        Fail,
        Hang,
    }

    struct StubProvider {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CatalogProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn lookup(&self, isbn: &str) -> PortResult<Option<CatalogEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Match(title) => Ok(Some(CatalogEntry {
                    isbn: isbn.to_string(),
                    title: title.to_string(),
                    author: "Author".to_string(),
                    cover_image: None,
                    total_pages: 100,
                })),
                Behaviour::Miss => Ok(None),
                Behaviour::Fail => Err(PortError::Unexpected("HTTP 403".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }
    }

    fn lookup_over(providers: Vec<Arc<StubProvider>>) -> CatalogLookup {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn CatalogProvider>)
            .collect();
        CatalogLookup::new(providers, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn first_match_wins() {
        let first = StubProvider::new(Behaviour::Fail);
        let second = StubProvider::new(Behaviour::Match("Second"));
        let third = StubProvider::new(Behaviour::Match("Third"));
        let lookup = lookup_over(vec![first.clone(), second.clone(), third.clone()]);

        let entry = lookup.lookup("123").await;
        assert_eq!(entry.title, "Second");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn total_miss_returns_placeholder() {
        let lookup = lookup_over(vec![
            StubProvider::new(Behaviour::Miss),
            StubProvider::new(Behaviour::Fail),
        ]);
        assert_eq!(lookup.lookup("1234567890").await, CatalogEntry::placeholder("1234567890"));
    }

    #[tokio::test]
    async fn slow_provider_is_skipped() {
        let lookup = lookup_over(vec![
            StubProvider::new(Behaviour::Hang),
            StubProvider::new(Behaviour::Match("Fallback")),
        ]);
        assert_eq!(lookup.lookup("123").await.title, "Fallback");
    }

    #[test]
    fn normalizes_isbns() {
        assert_eq!(normalize_isbn("978-0-439-70818-0").unwrap(), "9780439708180");
        assert_eq!(normalize_isbn(" 0 8044 2957 x ").unwrap(), "080442957X");
        assert!(normalize_isbn("").is_err());
        assert!(normalize_isbn("---").is_err());
        assert!(normalize_isbn("97804X39").is_err());
        assert!(normalize_isbn("abc").is_err());
    }
}
