use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jobs::filters::JobFilterState;

pub const MAX_RECENT_SEARCHES: usize = 5;

/// The user's persisted job-search slice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobPreferences {
    pub filters: JobFilterState,
    /// Most recent first.
    pub recent_searches: Vec<String>,
    pub saved_jobs: Vec<Uuid>,
}

impl JobPreferences {
    /// Applies a search-box submit and remembers the query.
    pub fn search(&mut self, query: &str, location: &str) {
        self.filters.search(query, location);
        self.record_search(query);
    }

    fn record_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.recent_searches
            .retain(|q| !q.eq_ignore_ascii_case(query));
        self.recent_searches.insert(0, query.to_string());
        self.recent_searches.truncate(MAX_RECENT_SEARCHES);
    }

    /// Returns true when the job is saved after the call.
    pub fn toggle_saved(&mut self, job_id: Uuid) -> bool {
        if let Some(pos) = self.saved_jobs.iter().position(|id| *id == job_id) {
            self.saved_jobs.remove(pos);
            false
        } else {
            self.saved_jobs.push(job_id);
            true
        }
    }
}
