use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationCounts, StatusFilter};

/// Filters applied to the review queue. Both filters must match for a record to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
}

impl ReviewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Lowercased search term, or `None` when blank.
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    fn admits(&self, needle: Option<&str>, application: &Application) -> bool {
        self.status.matches(application.status)
            && needle.map_or(true, |needle| application.matches_search(needle))
    }
}

/// Project the stored records into the review queue.
///
/// `records` must be in insertion order. The result is newest-first by `created_at`;
/// records created at the same instant list the later insertion first.
pub fn review_queue(records: Vec<Application>, query: &ReviewQuery) -> Vec<Application> {
    let needle = query.needle();
    let mut queue: Vec<(usize, Application)> = records
        .into_iter()
        .enumerate()
        .filter(|(_, application)| query.admits(needle.as_deref(), application))
        .collect();

    queue.sort_by(|(left_seq, left), (right_seq, right)| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right_seq.cmp(left_seq))
    });

    queue.into_iter().map(|(_, application)| application).collect()
}

/// Single pass over all records.
pub fn tally<'a, I>(records: I) -> ApplicationCounts
where
    I: IntoIterator<Item = &'a Application>,
{
    records
        .into_iter()
        .fold(ApplicationCounts::default(), |mut counts, application| {
            counts.record(application.status);
            counts
        })
}
