//! In-memory repositories backing service and router tests.
//!
//! Each store keeps its rows behind a `parking_lot` mutex and mirrors the
//! ordering and uniqueness rules of the MySQL schema.

mod assessments;
mod chat;
mod checkins;
mod contents;
mod events;
mod goals;
mod profiles;
mod reports;
mod summaries;
mod users;

pub use assessments::{InMemoryAssessmentRepository, InMemorySubmissionRepository};
pub use chat::InMemoryChatRepository;
pub use checkins::InMemoryCheckinRepository;
pub use contents::InMemoryContentRepository;
pub use events::{InMemoryEventRepository, InMemoryMetricsRepository};
pub use goals::{InMemoryGoalRepository, InMemoryNotificationRepository};
pub use profiles::InMemoryProfileRepository;
pub use reports::InMemoryReportRepository;
pub use summaries::InMemoryWeeklySummaryRepository;
pub use users::InMemoryUserRepository;

use hyu_core::{Page, PageRequest};

/// Cuts one page out of an already ordered list.
fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let content: Vec<T> = items.into_iter().skip(page.offset()).take(page.limit()).collect();
    Page::new(content, page.page, page.size, total)
}

/// Case-insensitive substring match used for `q` filters.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_windows() {
        let page = paginate((1..=5).collect::<Vec<_>>(), PageRequest::new(1, 2));
        assert_eq!(page.content, vec![3, 4]);
        assert_eq!(page.info.total_elements, 5);

        let past_end = paginate(vec![1, 2], PageRequest::new(3, 2));
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_contains_ci() {
        assert!(contains_ci("Sleep Better", "sleep"));
        assert!(!contains_ci("Sleep", "work"));
    }
}
