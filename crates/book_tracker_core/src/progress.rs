//! crates/book_tracker_core/src/progress.rs
//!
//! The reading-progress model: how a partial update changes a stored book.
//!
//! Updates are applied in a fixed order:
//! 1. a supplied `current_page` recomputes `progress`,
//! 2. a supplied `status` of `read` forces completion (`current_page`, `progress`,
//!    `date_finished`),
//! 3. explicitly supplied `date_finished`, `notes` and `rating` overwrite last, so a
//!    client-provided value always wins over a derived one.
//!
//! Any status may move to any other status. Leaving `read` does not reset the
//! completion fields.

use crate::domain::{Book, BookStatus, BookUpdate};
use chrono::{DateTime, Utc};

/// Percentage read, capped at 100. Returns `None` when the book has no pages,
/// in which case the caller leaves progress untouched.
pub fn progress_for(current_page: u32, total_pages: u32) -> Option<f64> {
    if total_pages == 0 {
        return None;
    }
    let progress = f64::from(current_page) / f64::from(total_pages) * 100.0;
    Some(progress.min(100.0))
}

/// Applies `update` to `book` in place.
pub fn apply_update(book: &mut Book, update: &BookUpdate, now: DateTime<Utc>) {
    if let Some(page) = update.current_page {
        book.current_page = page;
        if let Some(progress) = progress_for(page, book.total_pages) {
            book.progress = progress;
        }
    }

    if let Some(status) = update.status {
        book.status = status;
        if status == BookStatus::Read {
            book.current_page = book.total_pages;
            book.progress = 100.0;
            if book.date_finished.is_none() {
                book.date_finished = Some(now);
            }
        }
    }

    if let Some(date_finished) = update.date_finished {
        book.date_finished = Some(date_finished);
    }
    if let Some(notes) = &update.notes {
        book.notes = Some(notes.clone());
    }
    if let Some(rating) = update.rating {
        book.rating = Some(rating);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewBook;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn book_with_pages(total_pages: u32) -> Book {
        NewBook {
            isbn: "9780439708180".to_string(),
            title: "Harry Potter and the Sorcerer's Stone".to_string(),
            author: "J.K. Rowling".to_string(),
            total_pages,
            ..Default::default()
        }
        .into_book(Uuid::new_v4(), None, Utc::now())
    }

    fn page(p: u32) -> BookUpdate {
        BookUpdate {
            current_page: Some(p),
            ..Default::default()
        }
    }

    fn status(s: BookStatus) -> BookUpdate {
        BookUpdate {
            status: Some(s),
            ..Default::default()
        }
    }

    #[test]
    fn progress_tracks_page_ratio() {
        for (p, t) in [(0, 10), (1, 3), (50, 309), (309, 309), (400, 309), (7, 1)] {
            let mut book = book_with_pages(t);
            apply_update(&mut book, &page(p), Utc::now());
            let expected = (100.0 * f64::from(p) / f64::from(t)).min(100.0);
            assert!((book.progress - expected).abs() < 1e-9, "p={p} t={t}");
            assert_eq!(book.current_page, p);
        }
    }

    #[test]
    fn zero_page_book_keeps_progress() {
        let mut book = book_with_pages(0);
        apply_update(&mut book, &page(12), Utc::now());
        assert_eq!(book.current_page, 12);
        assert_eq!(book.progress, 0.0);
    }

    #[test]
    fn marking_read_completes_the_book() {
        let now = Utc::now();
        let mut book = book_with_pages(309);
        apply_update(&mut book, &page(50), now);
        apply_update(&mut book, &status(BookStatus::Read), now);

        assert_eq!(book.status, BookStatus::Read);
        assert_eq!(book.current_page, 309);
        assert_eq!(book.progress, 100.0);
        assert_eq!(book.date_finished, Some(now));
    }

    #[test]
    fn read_overrides_page_in_same_update() {
        let mut book = book_with_pages(200);
        let update = BookUpdate {
            current_page: Some(10),
            status: Some(BookStatus::Read),
            ..Default::default()
        };
        apply_update(&mut book, &update, Utc::now());
        assert_eq!(book.current_page, 200);
        assert_eq!(book.progress, 100.0);
    }

    #[test]
    fn explicit_finish_date_wins_over_derived() {
        let explicit = Utc.with_ymd_and_hms(2023, 4, 2, 12, 0, 0).unwrap();
        let mut book = book_with_pages(100);
        let update = BookUpdate {
            status: Some(BookStatus::Read),
            date_finished: Some(explicit),
            ..Default::default()
        };
        apply_update(&mut book, &update, Utc::now());
        assert_eq!(book.date_finished, Some(explicit));
    }

    #[test]
    fn existing_finish_date_is_kept_on_reread() {
        let first = Utc.with_ymd_and_hms(2022, 1, 15, 8, 0, 0).unwrap();
        let mut book = book_with_pages(100);
        apply_update(&mut book, &status(BookStatus::Read), first);
        apply_update(&mut book, &status(BookStatus::Read), Utc::now());
        assert_eq!(book.date_finished, Some(first));
    }

    #[test]
    fn leaving_read_keeps_completion_fields() {
        let now = Utc::now();
        let mut book = book_with_pages(120);
        apply_update(&mut book, &status(BookStatus::Read), now);
        apply_update(&mut book, &status(BookStatus::CurrentlyReading), now);

        assert_eq!(book.status, BookStatus::CurrentlyReading);
        assert_eq!(book.current_page, 120);
        assert_eq!(book.progress, 100.0);
        assert_eq!(book.date_finished, Some(now));
    }

    #[test]
    fn any_status_transition_is_allowed() {
        for from in BookStatus::ALL {
            for to in BookStatus::ALL {
                let mut book = book_with_pages(10);
                apply_update(&mut book, &status(from), Utc::now());
                apply_update(&mut book, &status(to), Utc::now());
                assert_eq!(book.status, to);
            }
        }
    }

    #[test]
    fn notes_and_rating_overwrite() {
        let mut book = book_with_pages(10);
        let update = BookUpdate {
            notes: Some("Loved the ending".to_string()),
            rating: Some(4),
            ..Default::default()
        };
        apply_update(&mut book, &update, Utc::now());
        assert_eq!(book.notes.as_deref(), Some("Loved the ending"));
        assert_eq!(book.rating, Some(4));
        assert_eq!(book.status, BookStatus::WantToRead);
        assert_eq!(book.current_page, 0);
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut book = book_with_pages(10);
        let before = book.clone();
        apply_update(&mut book, &BookUpdate::default(), Utc::now());
        assert_eq!(book, before);
    }
}
