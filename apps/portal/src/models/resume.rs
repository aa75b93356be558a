use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const DEFAULT_RESUME_NAME: &str = "Untitled Resume";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    Classic,
    #[default]
    Modern,
    Creative,
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersonalInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Technical,
    Languages,
    Soft,
    Tools,
}

impl FromStr for SkillCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(SkillCategory::Technical),
            "languages" => Ok(SkillCategory::Languages),
            "soft" => Ok(SkillCategory::Soft),
            "tools" => Ok(SkillCategory::Tools),
            other => Err(AppError::Validation(format!("Unknown skill category '{other}'"))),
        }
    }
}

/// Four free-text skill buckets. Duplicates are allowed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Skills {
    pub technical: Vec<String>,
    pub languages: Vec<String>,
    pub soft: Vec<String>,
    pub tools: Vec<String>,
}

impl Skills {
    pub fn bucket(&self, category: SkillCategory) -> &Vec<String> {
        match category {
            SkillCategory::Technical => &self.technical,
            SkillCategory::Languages => &self.languages,
            SkillCategory::Soft => &self.soft,
            SkillCategory::Tools => &self.tools,
        }
    }

    pub fn bucket_mut(&mut self, category: SkillCategory) -> &mut Vec<String> {
        match category {
            SkillCategory::Technical => &mut self.technical,
            SkillCategory::Languages => &mut self.languages,
            SkillCategory::Soft => &mut self.soft,
            SkillCategory::Tools => &mut self.tools,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.technical.is_empty()
            && self.languages.is_empty()
            && self.soft.is_empty()
            && self.tools.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumeDocument {
    pub id: Uuid,
    pub name: String,
    pub template: Template,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub volunteer: Vec<Volunteer>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub skills: Skills,
}

impl ResumeDocument {
    pub fn new(name: impl Into<String>, template: Template) -> Self {
        ResumeDocument {
            id: Uuid::new_v4(),
            name: name.into(),
            template,
            last_modified: Utc::now(),
            personal_info: PersonalInfo::default(),
            education: Vec::new(),
            experience: Vec::new(),
            projects: Vec::new(),
            certifications: Vec::new(),
            awards: Vec::new(),
            volunteer: Vec::new(),
            references: Vec::new(),
            skills: Skills::default(),
        }
    }

    /// Refreshes `last_modified`. Called after every mutation.
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Repeated sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Education,
    Experience,
    Projects,
    Certifications,
    Awards,
    Volunteer,
    References,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Education,
        Section::Experience,
        Section::Projects,
        Section::Certifications,
        Section::Awards,
        Section::Volunteer,
        Section::References,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Education => "education",
            Section::Experience => "experience",
            Section::Projects => "projects",
            Section::Certifications => "certifications",
            Section::Awards => "awards",
            Section::Volunteer => "volunteer",
            Section::References => "references",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == wanted)
            .ok_or_else(|| AppError::Validation(format!("Unknown resume section '{s}'")))
    }
}

/// Shared behaviour of every repeated-section record.
pub trait SectionEntry: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);

    /// Restores per-record invariants after a mutation.
    fn normalize(&mut self) {}
}

macro_rules! section_entry {
    ($ty:ty) => {
        impl SectionEntry for $ty {
            fn id(&self) -> Uuid {
                self.id
            }

            fn set_id(&mut self, id: Uuid) {
                self.id = id;
            }
        }
    };
    ($ty:ty, current) => {
        impl SectionEntry for $ty {
            fn id(&self) -> Uuid {
                self.id
            }

            fn set_id(&mut self, id: Uuid) {
                self.id = id;
            }

            // An ongoing entry has no end date.
            fn normalize(&mut self) {
                if self.current {
                    self.end_date = None;
                }
            }
        }
    };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Education {
    pub id: Uuid,
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
    pub gpa: Option<String>,
    pub description: Option<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Experience {
    pub id: Uuid,
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: Option<String>,
    pub achievements: Vec<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub url: Option<String>,
    pub github: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Certification {
    pub id: Uuid,
    pub name: String,
    pub issuer: String,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub credential_id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Award {
    pub id: Uuid,
    pub title: String,
    pub issuer: String,
    pub date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Volunteer {
    pub id: Uuid,
    pub organization: String,
    pub role: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Reference {
    pub id: Uuid,
    pub name: String,
    pub position: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub relationship: Option<String>,
}

section_entry!(Education, current);
section_entry!(Experience, current);
section_entry!(Project, current);
section_entry!(Certification);
section_entry!(Award);
section_entry!(Volunteer, current);
section_entry!(Reference);

/// One record of any repeated section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum SectionItem {
    Education(Education),
    Experience(Experience),
    Projects(Project),
    Certifications(Certification),
    Awards(Award),
    Volunteer(Volunteer),
    References(Reference),
}

impl SectionItem {
    /// Blank record for `section` carrying a fresh identity.
    pub fn new_default(section: Section) -> Self {
        let id = Uuid::new_v4();
        match section {
            Section::Education => SectionItem::Education(Education {
                id,
                ..Default::default()
            }),
            Section::Experience => SectionItem::Experience(Experience {
                id,
                ..Default::default()
            }),
            Section::Projects => SectionItem::Projects(Project {
                id,
                ..Default::default()
            }),
            Section::Certifications => SectionItem::Certifications(Certification {
                id,
                ..Default::default()
            }),
            Section::Awards => SectionItem::Awards(Award {
                id,
                ..Default::default()
            }),
            Section::Volunteer => SectionItem::Volunteer(Volunteer {
                id,
                ..Default::default()
            }),
            Section::References => SectionItem::References(Reference {
                id,
                ..Default::default()
            }),
        }
    }

    pub fn section(&self) -> Section {
        match self {
            SectionItem::Education(_) => Section::Education,
            SectionItem::Experience(_) => Section::Experience,
            SectionItem::Projects(_) => Section::Projects,
            SectionItem::Certifications(_) => Section::Certifications,
            SectionItem::Awards(_) => Section::Awards,
            SectionItem::Volunteer(_) => Section::Volunteer,
            SectionItem::References(_) => Section::References,
        }
    }

    /// Parses an untagged JSON record as an item of `section`.
    pub fn from_json(section: Section, value: serde_json::Value) -> Result<Self, AppError> {
        fn parse<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
            serde_json::from_value(value).map_err(|e| AppError::Validation(e.to_string()))
        }

        Ok(match section {
            Section::Education => SectionItem::Education(parse(value)?),
            Section::Experience => SectionItem::Experience(parse(value)?),
            Section::Projects => SectionItem::Projects(parse(value)?),
            Section::Certifications => SectionItem::Certifications(parse(value)?),
            Section::Awards => SectionItem::Awards(parse(value)?),
            Section::Volunteer => SectionItem::Volunteer(parse(value)?),
            Section::References => SectionItem::References(parse(value)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_parse_is_case_insensitive() {
        assert_eq!("Experience".parse::<Section>().unwrap(), Section::Experience);
        assert_eq!(" awards ".parse::<Section>().unwrap(), Section::Awards);
    }

    #[test]
    fn test_unknown_section_is_validation_error() {
        let err = "hobbies".parse::<Section>().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_default_items_have_fresh_ids() {
        let a = SectionItem::new_default(Section::Projects);
        let b = SectionItem::new_default(Section::Projects);
        assert_eq!(a.section(), Section::Projects);
        match (a, b) {
            (SectionItem::Projects(a), SectionItem::Projects(b)) => {
                assert!(!a.id.is_nil());
                assert_ne!(a.id, b.id);
            }
            _ => panic!("expected project items"),
        }
    }

    #[test]
    fn test_current_entry_drops_end_date() {
        let mut exp = Experience {
            current: true,
            end_date: Some("2023-01".into()),
            ..Default::default()
        };
        exp.normalize();
        assert_eq!(exp.end_date, None);
    }

    #[test]
    fn test_item_from_partial_json() {
        let item =
            SectionItem::from_json(Section::Experience, json!({"company": "Acme"})).unwrap();
        match item {
            SectionItem::Experience(exp) => {
                assert_eq!(exp.company, "Acme");
                assert!(exp.id.is_nil());
                assert!(exp.technologies.is_empty());
            }
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[test]
    fn test_item_from_json_rejects_wrong_types() {
        let err = SectionItem::from_json(Section::Awards, json!({"title": 5})).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_skill_bucket_lookup() {
        let mut skills = Skills::default();
        assert!(skills.is_empty());
        skills.bucket_mut(SkillCategory::Tools).push("Docker".into());
        assert_eq!(skills.bucket(SkillCategory::Tools), &vec!["Docker".to_string()]);
        assert!(!skills.is_empty());
    }
}
