//! In-memory job board: listing with facet filtering, sorting and paging,
//! recruiter postings, and applications.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::filters::{JobFilters, JobSort};
use crate::models::job::{Application, ApplicationStatus, JobPosting, NewJob};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobPage {
    pub jobs: Vec<JobPosting>,
    pub total: usize,
    pub page: u32,
    pub page_size: usize,
    pub total_pages: usize,
}

/// ceil(total / page_size); zero when there is nothing to show.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

#[derive(Debug, Default)]
pub struct JobBoard {
    jobs: RwLock<Vec<JobPosting>>,
    applications: RwLock<Vec<Application>>,
}

impl JobBoard {
    pub fn new(jobs: Vec<JobPosting>) -> Self {
        JobBoard {
            jobs: RwLock::new(jobs),
            applications: RwLock::new(Vec::new()),
        }
    }

    /// Loads postings from a JSON array file.
    pub async fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job seed file {}", path.display()))?;
        let jobs: Vec<JobPosting> = serde_json::from_str(&raw)
            .with_context(|| format!("Job seed file {} is not a JSON array of postings", path.display()))?;
        info!("Loaded {} job postings from {}", jobs.len(), path.display());
        Ok(Self::new(jobs))
    }

    pub async fn list(
        &self,
        filters: &JobFilters,
        sort: JobSort,
        page: u32,
        page_size: usize,
    ) -> JobPage {
        let mut matching: Vec<JobPosting> = self
            .jobs
            .read()
            .await
            .iter()
            .filter(|job| filters.matches(job))
            .cloned()
            .collect();

        match sort {
            JobSort::Newest => matching.sort_by(|a, b| b.posted_at.cmp(&a.posted_at)),
            JobSort::Oldest => matching.sort_by(|a, b| a.posted_at.cmp(&b.posted_at)),
            // None sorts below Some, so unsalaried postings land last.
            JobSort::SalaryHigh => matching.sort_by(|a, b| {
                b.salary_max
                    .or(b.salary_min)
                    .cmp(&a.salary_max.or(a.salary_min))
            }),
            JobSort::SalaryLow => matching
                .sort_by_key(|job| job.salary_min.or(job.salary_max).unwrap_or(u32::MAX)),
        }

        let total = matching.len();
        let page = page.max(1);
        let offset = (page as usize - 1).saturating_mul(page_size);
        let jobs = matching.into_iter().skip(offset).take(page_size).collect();

        JobPage {
            jobs,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<JobPosting, AppError> {
        self.jobs
            .read()
            .await
            .iter()
            .find(|job| job.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
    }

    pub async fn post(&self, new_job: NewJob) -> Result<JobPosting, AppError> {
        if new_job.title.trim().is_empty() || new_job.company.trim().is_empty() {
            return Err(AppError::Validation(
                "Job title and company are required".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (new_job.salary_min, new_job.salary_max) {
            if min > max {
                return Err(AppError::Validation(
                    "salary_min cannot exceed salary_max".to_string(),
                ));
            }
        }

        let job = JobPosting {
            id: Uuid::new_v4(),
            title: new_job.title.trim().to_string(),
            company: new_job.company.trim().to_string(),
            location: new_job.location,
            job_type: new_job.job_type,
            category: new_job.category,
            experience_level: new_job.experience_level,
            salary_min: new_job.salary_min,
            salary_max: new_job.salary_max,
            remote_type: new_job.remote_type,
            description: new_job.description,
            skills: new_job.skills,
            posted_at: Utc::now(),
        };
        self.jobs.write().await.push(job.clone());
        info!("Posted job {} ({} at {})", job.id, job.title, job.company);
        Ok(job)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|job| job.id != id);
        before != jobs.len()
    }

    pub async fn apply(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        resume_id: Option<Uuid>,
        cover_letter: Option<String>,
    ) -> Result<Application, AppError> {
        self.get(job_id).await?;

        let mut applications = self.applications.write().await;
        if applications
            .iter()
            .any(|a| a.job_id == job_id && a.user_id == user_id)
        {
            return Err(AppError::Conflict(format!(
                "Already applied to job {job_id}"
            )));
        }

        let application = Application {
            id: Uuid::new_v4(),
            job_id,
            user_id,
            resume_id,
            cover_letter: cover_letter.filter(|c| !c.trim().is_empty()),
            status: ApplicationStatus::Submitted,
            applied_at: Utc::now(),
        };
        applications.push(application.clone());
        info!("User {user_id} applied to job {job_id}");
        Ok(application)
    }

    /// Recruiter review. An application moves forward from `submitted`
    /// and is closed once rejected or accepted.
    pub async fn set_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, AppError> {
        if status == ApplicationStatus::Submitted {
            return Err(AppError::Validation(
                "An application cannot be moved back to submitted".to_string(),
            ));
        }

        let mut applications = self.applications.write().await;
        let application = applications
            .iter_mut()
            .find(|a| a.id == application_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Application {application_id} not found"))
            })?;
        if application.status.is_final() {
            return Err(AppError::Conflict(format!(
                "Application {application_id} is already closed"
            )));
        }
        application.status = status;
        info!("Application {application_id} is now {status:?}");
        Ok(application.clone())
    }

    pub async fn applications_for(&self, user_id: Uuid) -> Vec<Application> {
        self.applications
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }
}
