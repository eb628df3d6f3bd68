//! crates/book_tracker_core/src/stats.rs
//!
//! Aggregate reading statistics derived from a snapshot of a user's books.

use crate::domain::{Book, BookStatus};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingStats {
    pub total_books: usize,
    pub want_to_read: usize,
    pub currently_reading: usize,
    pub read: usize,
    /// Sum of `current_page` over books that are read or being read.
    pub total_pages_read: u64,
    pub average_progress: f64,
    /// Finished-book counts keyed by `YYYY-MM` of `date_finished`.
    pub books_by_month: BTreeMap<String, usize>,
}

pub fn compute_stats(books: &[Book]) -> ReadingStats {
    let mut stats = ReadingStats {
        total_books: books.len(),
        ..Default::default()
    };

    let mut progress_sum = 0.0;
    for book in books {
        match book.status {
            BookStatus::WantToRead => stats.want_to_read += 1,
            BookStatus::CurrentlyReading => stats.currently_reading += 1,
            BookStatus::Read => stats.read += 1,
        }
        if matches!(book.status, BookStatus::Read | BookStatus::CurrentlyReading) {
            stats.total_pages_read += u64::from(book.current_page);
        }
        progress_sum += book.progress;

        if let Some(finished) = book.date_finished {
            let month = finished.format("%Y-%m").to_string();
            *stats.books_by_month.entry(month).or_insert(0) += 1;
        }
    }

    if !books.is_empty() {
        stats.average_progress = progress_sum / books.len() as f64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewBook;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn book(status: BookStatus, current_page: u32, progress: f64) -> Book {
        NewBook {
            isbn: "1".to_string(),
            title: "t".to_string(),
            author: "a".to_string(),
            total_pages: 100,
            current_page: Some(current_page),
            status: Some(status),
            progress: Some(progress),
            ..Default::default()
        }
        .into_book(Uuid::new_v4(), None, Utc::now())
    }

    #[test]
    fn empty_set_yields_zeroes() {
        let stats = compute_stats(&[]);
        assert_eq!(stats, ReadingStats::default());
        assert_eq!(stats.average_progress, 0.0);
        assert!(stats.books_by_month.is_empty());
    }

    #[test]
    fn counts_pages_and_progress() {
        let books = vec![
            book(BookStatus::Read, 100, 100.0),
            book(BookStatus::CurrentlyReading, 40, 40.0),
            book(BookStatus::WantToRead, 5, 0.0),
        ];
        let stats = compute_stats(&books);

        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.read, 1);
        assert_eq!(stats.currently_reading, 1);
        assert_eq!(stats.want_to_read, 1);
        // The want_to_read book's page does not count as read.
        assert_eq!(stats.total_pages_read, 140);
        assert!((stats.average_progress - 140.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn groups_finished_books_by_month() {
        let mut a = book(BookStatus::Read, 100, 100.0);
        a.date_finished = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        let mut b = book(BookStatus::Read, 100, 100.0);
        b.date_finished = Some(Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap());
        let mut c = book(BookStatus::CurrentlyReading, 10, 10.0);
        c.date_finished = Some(Utc.with_ymd_and_hms(2023, 12, 5, 0, 0, 0).unwrap());
        let d = book(BookStatus::Read, 100, 100.0);

        let stats = compute_stats(&[a, b, c, d]);
        assert_eq!(stats.books_by_month.len(), 2);
        assert_eq!(stats.books_by_month["2024-03"], 2);
        assert_eq!(stats.books_by_month["2023-12"], 1);
    }
}
