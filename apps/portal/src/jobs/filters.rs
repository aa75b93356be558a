//! Job search facets.
//!
//! `JobFilterState` is what the filter sidebar edits; `JobFilters` is the
//! flat record handed to the listing, carrying only the facets that are set.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::job::JobPosting;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Query,
    Location,
    JobType,
    Category,
    Experience,
    Salary,
    Remote,
}

impl FromStr for Facet {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "query" | "search" => Ok(Facet::Query),
            "location" => Ok(Facet::Location),
            "jobtype" | "type" => Ok(Facet::JobType),
            "category" => Ok(Facet::Category),
            "experience" => Ok(Facet::Experience),
            "salary" => Ok(Facet::Salary),
            "remote" => Ok(Facet::Remote),
            _ => Err(AppError::Validation(format!("Unknown filter '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobSort {
    #[default]
    Newest,
    Oldest,
    SalaryHigh,
    SalaryLow,
}

impl FromStr for JobSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "newest" => Ok(JobSort::Newest),
            "oldest" => Ok(JobSort::Oldest),
            "salary_high" => Ok(JobSort::SalaryHigh),
            "salary_low" => Ok(JobSort::SalaryLow),
            other => Err(AppError::Validation(format!("Unknown sort '{other}'"))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Salary brackets
// ────────────────────────────────────────────────────────────────────────────

/// A salary bracket such as `"50000-100000"` or `"150000+"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl SalaryRange {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let invalid = || AppError::Validation(format!("Invalid salary bracket '{raw}'"));
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();
        let number = |s: &str| s.parse::<u32>().map_err(|_| invalid());

        if let Some(min) = cleaned.strip_suffix('+') {
            return Ok(SalaryRange {
                min: number(min)?,
                max: None,
            });
        }
        let (min, max) = cleaned.split_once('-').ok_or_else(invalid)?;
        let (min, max) = (number(min)?, number(max)?);
        if min > max {
            return Err(invalid());
        }
        Ok(SalaryRange {
            min,
            max: Some(max),
        })
    }

    /// True when the posting's salary range intersects this bracket.
    /// Postings without any salary never match.
    pub fn overlaps(&self, job_min: Option<u32>, job_max: Option<u32>) -> bool {
        let (low, high) = match (job_min, job_max) {
            (None, None) => return false,
            (Some(lo), None) => (lo, lo),
            (None, Some(hi)) => (hi, hi),
            (Some(lo), Some(hi)) => (lo, hi),
        };
        high >= self.min && self.max.map_or(true, |max| low <= max)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Filter state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobFilterState {
    pub query: String,
    pub location: String,
    pub job_type: String,
    pub category: String,
    pub experience: String,
    pub salary: String,
    pub remote: String,
    pub page: u32,
    pub sort: JobSort,
}

impl Default for JobFilterState {
    fn default() -> Self {
        JobFilterState {
            query: String::new(),
            location: String::new(),
            job_type: String::new(),
            category: String::new(),
            experience: String::new(),
            salary: String::new(),
            remote: String::new(),
            page: 1,
            sort: JobSort::default(),
        }
    }
}

impl JobFilterState {
    fn facet_mut(&mut self, facet: Facet) -> &mut String {
        match facet {
            Facet::Query => &mut self.query,
            Facet::Location => &mut self.location,
            Facet::JobType => &mut self.job_type,
            Facet::Category => &mut self.category,
            Facet::Experience => &mut self.experience,
            Facet::Salary => &mut self.salary,
            Facet::Remote => &mut self.remote,
        }
    }

    /// Toggle semantics: re-selecting the current value clears the facet.
    /// Any change returns to the first page.
    pub fn set_facet(&mut self, facet: Facet, value: &str) -> Result<(), AppError> {
        let value = value.trim();
        if facet == Facet::Salary && !value.is_empty() {
            SalaryRange::parse(value)?;
        }
        let slot = self.facet_mut(facet);
        if slot == value {
            slot.clear();
        } else {
            *slot = value.to_string();
        }
        self.page = 1;
        Ok(())
    }

    /// Search-box submit: assigns both text facets without toggling.
    pub fn search(&mut self, query: &str, location: &str) {
        self.query = query.trim().to_string();
        self.location = location.trim().to_string();
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_sort(&mut self, sort: JobSort) {
        self.sort = sort;
    }

    /// Empties every facet and returns to page 1. Sort order is kept.
    pub fn clear_all(&mut self) {
        *self = JobFilterState {
            sort: self.sort,
            ..JobFilterState::default()
        };
    }

    pub fn has_active_filters(&self) -> bool {
        [
            &self.query,
            &self.location,
            &self.job_type,
            &self.category,
            &self.experience,
            &self.salary,
            &self.remote,
        ]
        .iter()
        .any(|v| !v.is_empty())
    }

    pub fn get_filters(&self) -> JobFilters {
        let set = |v: &String| (!v.is_empty()).then(|| v.clone());
        JobFilters {
            query: set(&self.query),
            location: set(&self.location),
            job_type: set(&self.job_type),
            category: set(&self.category),
            experience: set(&self.experience),
            salary: set(&self.salary),
            remote: set(&self.remote),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Derived filter record
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

/// Case folding shared by substring and exact facet matches.
fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

fn eq_ci(facet: &Option<String>, value: &str) -> bool {
    facet.as_deref().map_or(true, |wanted| fold(wanted) == fold(value))
}

impl JobFilters {
    pub fn matches(&self, job: &JobPosting) -> bool {
        let query_ok = self.query.as_deref().map_or(true, |q| {
            contains_ci(&job.title, q)
                || contains_ci(&job.company, q)
                || contains_ci(&job.description, q)
                || job.skills.iter().any(|s| contains_ci(s, q))
        });
        let location_ok = self
            .location
            .as_deref()
            .map_or(true, |l| contains_ci(&job.location, l));
        let salary_ok = self.salary.as_deref().map_or(true, |raw| {
            SalaryRange::parse(raw).is_ok_and(|range| range.overlaps(job.salary_min, job.salary_max))
        });

        query_ok
            && location_ok
            && salary_ok
            && eq_ci(&self.job_type, &job.job_type)
            && eq_ci(&self.category, &job.category)
            && eq_ci(&self.experience, &job.experience_level)
            && eq_ci(&self.remote, &job.remote_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn job() -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: "Senior Rust Engineer".into(),
            company: "Ferrous Systems".into(),
            location: "Berlin, Germany".into(),
            job_type: "Full-time".into(),
            category: "Engineering".into(),
            experience_level: "Senior".into(),
            salary_min: Some(90_000),
            salary_max: Some(120_000),
            remote_type: "Hybrid".into(),
            description: "Build embedded tooling".into(),
            skills: vec!["Tokio".into()],
            posted_at: Utc::now(),
        }
    }

    #[test]
    fn test_toggle_off() {
        let mut state = JobFilterState::default();
        state.set_facet(Facet::JobType, "Full-time").unwrap();
        state.set_facet(Facet::Category, "Engineering").unwrap();
        state.set_facet(Facet::JobType, "Full-time").unwrap();
        assert!(state.job_type.is_empty());
        assert_eq!(state.category, "Engineering");
        assert!(state.has_active_filters());

        state.set_facet(Facet::Category, "Engineering").unwrap();
        assert!(!state.has_active_filters());
    }

    #[test]
    fn test_set_facet_resets_page() {
        let mut state = JobFilterState::default();
        state.set_page(4);
        state.set_facet(Facet::Remote, "Remote").unwrap();
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_clear_all() {
        let mut state = JobFilterState::default();
        state.search("rust", "berlin");
        state.set_facet(Facet::Salary, "50000-100000").unwrap();
        state.set_sort(JobSort::SalaryHigh);
        state.set_page(3);
        state.clear_all();
        assert!(!state.has_active_filters());
        assert_eq!(state.page, 1);
        assert_eq!(state.sort, JobSort::SalaryHigh);
    }

    #[test]
    fn test_sort_and_page_are_not_filters() {
        let mut state = JobFilterState::default();
        state.set_sort(JobSort::Oldest);
        state.set_page(2);
        assert!(!state.has_active_filters());
        assert_eq!(state.get_filters(), JobFilters::default());
    }

    #[test]
    fn test_page_never_below_one() {
        let mut state = JobFilterState::default();
        state.set_page(0);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_invalid_salary_rejected() {
        let mut state = JobFilterState::default();
        let err = state.set_facet(Facet::Salary, "lots").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(state.salary.is_empty());
    }

    #[test]
    fn test_get_filters_only_set_facets() {
        let mut state = JobFilterState::default();
        state.set_facet(Facet::Experience, "Senior").unwrap();
        let filters = state.get_filters();
        assert_eq!(filters.experience.as_deref(), Some("Senior"));
        assert_eq!(filters.query, None);
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json, serde_json::json!({"experience": "Senior"}));
    }

    #[test]
    fn test_exact_facets_fold_unicode_case() {
        let mut posting = job();
        posting.category = "Éducation".into();
        posting.location = "Zürich".into();

        let mut state = JobFilterState::default();
        state.set_facet(Facet::Category, "ÉDUCATION").unwrap();
        state.set_facet(Facet::Location, "ZÜRICH").unwrap();
        assert!(state.get_filters().matches(&posting));

        state.set_facet(Facet::Category, "Santé").unwrap();
        assert!(!state.get_filters().matches(&posting));
    }

    #[test]
    fn test_facet_names() {
        assert_eq!("jobType".parse::<Facet>().unwrap(), Facet::JobType);
        assert_eq!("job_type".parse::<Facet>().unwrap(), Facet::JobType);
        assert!("colour".parse::<Facet>().is_err());
    }

    #[test]
    fn test_salary_brackets() {
        let range = SalaryRange::parse("50,000 - 100,000").unwrap();
        assert_eq!(range, SalaryRange { min: 50_000, max: Some(100_000) });
        assert!(range.overlaps(Some(90_000), Some(150_000)));
        assert!(!range.overlaps(Some(110_000), None));
        assert!(!range.overlaps(None, None));

        let open = SalaryRange::parse("150000+").unwrap();
        assert!(open.overlaps(None, Some(160_000)));
        assert!(SalaryRange::parse("9-1").is_err());
    }

    #[test]
    fn test_matches() {
        let job = job();
        assert!(JobFilters::default().matches(&job));

        let mut filters = JobFilters {
            query: Some("tokio".into()),
            location: Some("berlin".into()),
            job_type: Some("full-time".into()),
            remote: Some("hybrid".into()),
            salary: Some("100000+".into()),
            ..Default::default()
        };
        assert!(filters.matches(&job));

        filters.category = Some("Design".into());
        assert!(!filters.matches(&job));
    }

    #[test]
    fn test_query_checks_company() {
        let filters = JobFilters {
            query: Some("FERROUS".into()),
            ..Default::default()
        };
        assert!(filters.matches(&job()));
    }
}
