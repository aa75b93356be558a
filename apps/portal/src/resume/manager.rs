//! Resume Data Manager: the per-user container for resume documents.
//!
//! Holds the document being edited plus the user's saved collection, and
//! exposes section-scoped mutations so callers never rebuild nested records
//! by hand. Every mutation refreshes `last_modified` on the document it
//! touches. The whole struct serializes as the user's persisted resume slice.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{
    ResumeDocument, Section, SectionEntry, SectionItem, SkillCategory, Template,
    DEFAULT_RESUME_NAME,
};
use crate::models::user::UserProfile;
use crate::resume::completeness::{
    completion_percentage, compute_completion_report, CompletionReport,
};
use crate::resume::import::apply_profile;

/// Fields `set_field` refuses to overwrite.
const PROTECTED_FIELDS: &[&str] = &["id", "last_modified"];

/// Runs `$body` with `$list` bound to the section's item vector.
macro_rules! with_section {
    ($doc:expr, $section:expr, |$list:ident| $body:expr) => {
        match $section {
            Section::Education => {
                let $list = &mut $doc.education;
                $body
            }
            Section::Experience => {
                let $list = &mut $doc.experience;
                $body
            }
            Section::Projects => {
                let $list = &mut $doc.projects;
                $body
            }
            Section::Certifications => {
                let $list = &mut $doc.certifications;
                $body
            }
            Section::Awards => {
                let $list = &mut $doc.awards;
                $body
            }
            Section::Volunteer => {
                let $list = &mut $doc.volunteer;
                $body
            }
            Section::References => {
                let $list = &mut $doc.references;
                $body
            }
        }
    };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeManager {
    current: Option<ResumeDocument>,
    saved: Vec<ResumeDocument>,
    /// Template picked before (or independently of) a document existing.
    selected_template: Template,
    #[serde(skip)]
    unsaved_changes: bool,
}

impl ResumeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ResumeDocument> {
        self.current.as_ref()
    }

    pub fn saved(&self) -> &[ResumeDocument] {
        &self.saved
    }

    pub fn selected_template(&self) -> Template {
        self.selected_template
    }

    /// True when the current document changed since it was last saved or loaded.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes && self.current.is_some()
    }

    fn current_mut(&mut self) -> Result<&mut ResumeDocument, AppError> {
        self.current.as_mut().ok_or(AppError::NoActiveResume)
    }

    fn mark_changed(&mut self) {
        self.unsaved_changes = true;
    }

    // ────────────────────────────────────────────────────────────────────────
    // Document lifecycle
    // ────────────────────────────────────────────────────────────────────────

    pub fn create_new(&mut self, name: Option<&str>) -> &ResumeDocument {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_RESUME_NAME);
        let doc = ResumeDocument::new(name, self.selected_template);
        debug!("Created resume {} ({name})", doc.id);
        self.unsaved_changes = true;
        self.current.insert(doc)
    }

    pub fn load(&mut self, id: Uuid) -> Result<&ResumeDocument, AppError> {
        let doc = self
            .saved
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
        self.selected_template = doc.template;
        self.unsaved_changes = false;
        Ok(&*self.current.insert(doc))
    }

    /// Copies the current document into the saved collection, replacing an
    /// earlier save of the same document. Returns the stored copy.
    pub fn save(&mut self) -> Result<ResumeDocument, AppError> {
        let doc = self.current.as_mut().ok_or(AppError::NoActiveResume)?;
        if doc.id.is_nil() {
            doc.id = Uuid::new_v4();
        }
        doc.touch();
        let snapshot = doc.clone();

        match self.saved.iter_mut().find(|d| d.id == snapshot.id) {
            Some(slot) => *slot = snapshot.clone(),
            None => self.saved.push(snapshot.clone()),
        }
        self.unsaved_changes = false;
        debug!(
            "Saved resume {} ({}% complete)",
            snapshot.id,
            self.completion_percentage()
        );
        Ok(snapshot)
    }

    /// Removes a saved document. Editing state for the same document is
    /// dropped as well. Returns whether a saved copy existed.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.saved.len();
        self.saved.retain(|d| d.id != id);
        if self.current.as_ref().is_some_and(|d| d.id == id) {
            self.current = None;
            self.unsaved_changes = false;
        }
        before != self.saved.len()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Field mutation
    // ────────────────────────────────────────────────────────────────────────

    /// Replaces a top-level field (`name`, `template`, `personal_info`, `skills`).
    pub fn set_field(&mut self, field: &str, value: Value) -> Result<(), AppError> {
        let field = field.trim();
        if PROTECTED_FIELDS.contains(&field) {
            return Err(AppError::Validation(format!(
                "Field '{field}' cannot be set directly"
            )));
        }
        if field.parse::<Section>().is_ok() {
            return Err(AppError::Validation(format!(
                "Section '{field}' is edited through item operations"
            )));
        }

        let doc = self.current_mut()?;
        let mut updated: ResumeDocument = merge_patch(&*doc, &single_field(field, value))?;
        updated.touch();
        let template = updated.template;
        *doc = updated;
        self.selected_template = template;
        self.mark_changed();
        Ok(())
    }

    /// Replaces one field of `personal_info` or `skills`.
    pub fn set_nested_field(
        &mut self,
        parent: &str,
        field: &str,
        value: Value,
    ) -> Result<(), AppError> {
        let patch = single_field(field.trim(), value);
        let doc = self.current_mut()?;
        match parent.trim() {
            "personal_info" => doc.personal_info = merge_patch(&doc.personal_info, &patch)?,
            "skills" => doc.skills = merge_patch(&doc.skills, &patch)?,
            other => {
                return Err(AppError::Validation(format!(
                    "'{other}' has no nested fields"
                )))
            }
        }
        doc.touch();
        self.mark_changed();
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────────
    // Repeated sections
    // ────────────────────────────────────────────────────────────────────────

    /// Appends `item` (or a blank record) to `section`. Returns the item id.
    pub fn add_item(
        &mut self,
        section: Section,
        item: Option<SectionItem>,
    ) -> Result<Uuid, AppError> {
        let item = match item {
            Some(item) if item.section() != section => {
                return Err(AppError::Validation(format!(
                    "A {} item cannot be added to {section}",
                    item.section()
                )))
            }
            Some(item) => item,
            None => SectionItem::new_default(section),
        };

        let doc = self.current_mut()?;
        let id = match item {
            SectionItem::Education(e) => push_entry(&mut doc.education, e),
            SectionItem::Experience(e) => push_entry(&mut doc.experience, e),
            SectionItem::Projects(e) => push_entry(&mut doc.projects, e),
            SectionItem::Certifications(e) => push_entry(&mut doc.certifications, e),
            SectionItem::Awards(e) => push_entry(&mut doc.awards, e),
            SectionItem::Volunteer(e) => push_entry(&mut doc.volunteer, e),
            SectionItem::References(e) => push_entry(&mut doc.references, e),
        };
        doc.touch();
        self.mark_changed();
        debug!("Added {section} item {id}");
        Ok(id)
    }

    /// Merges `patch` into the item `item_id` of `section`.
    pub fn update_item(
        &mut self,
        section: Section,
        item_id: Uuid,
        patch: &Map<String, Value>,
    ) -> Result<(), AppError> {
        if patch.contains_key("id") {
            return Err(AppError::Validation(
                "Item identity cannot be changed".to_string(),
            ));
        }
        let doc = self.current_mut()?;
        let found = with_section!(doc, section, |list| patch_entry(list, item_id, patch))?;
        if !found {
            return Err(AppError::NotFound(format!(
                "No {section} item with id {item_id}"
            )));
        }
        doc.touch();
        self.mark_changed();
        Ok(())
    }

    /// Returns whether an item was removed.
    pub fn remove_item(&mut self, section: Section, item_id: Uuid) -> Result<bool, AppError> {
        let doc = self.current_mut()?;
        let removed = with_section!(doc, section, |list| remove_entry(list, item_id));
        if removed {
            doc.touch();
            self.mark_changed();
        }
        Ok(removed)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Skills, template, import
    // ────────────────────────────────────────────────────────────────────────

    /// Appends the trimmed value. Blank input is ignored and returns false.
    pub fn add_skill(&mut self, category: SkillCategory, value: &str) -> Result<bool, AppError> {
        let doc = self.current_mut()?;
        let value = value.trim();
        if value.is_empty() {
            return Ok(false);
        }
        doc.skills.bucket_mut(category).push(value.to_string());
        doc.touch();
        self.mark_changed();
        Ok(true)
    }

    pub fn remove_skill(
        &mut self,
        category: SkillCategory,
        index: usize,
    ) -> Result<Option<String>, AppError> {
        let doc = self.current_mut()?;
        let bucket = doc.skills.bucket_mut(category);
        if index >= bucket.len() {
            return Ok(None);
        }
        let removed = bucket.remove(index);
        doc.touch();
        self.mark_changed();
        Ok(Some(removed))
    }

    pub fn change_template(&mut self, template: Template) {
        self.selected_template = template;
        if let Some(doc) = self.current.as_mut() {
            doc.template = template;
            doc.touch();
            self.unsaved_changes = true;
        }
    }

    /// Seeds (or overwrites) the current document from profile fields.
    pub fn import_from_profile(&mut self, profile: &UserProfile) -> &ResumeDocument {
        let template = self.selected_template;
        self.unsaved_changes = true;
        let doc = self
            .current
            .get_or_insert_with(|| ResumeDocument::new(DEFAULT_RESUME_NAME, template));
        apply_profile(doc, profile);
        doc
    }

    // ────────────────────────────────────────────────────────────────────────
    // Derived
    // ────────────────────────────────────────────────────────────────────────

    pub fn completion_percentage(&self) -> u8 {
        self.current
            .as_ref()
            .map(completion_percentage)
            .unwrap_or(0)
    }

    pub fn completion_report(&self) -> Option<CompletionReport> {
        self.current.as_ref().map(compute_completion_report)
    }
}

fn single_field(field: &str, value: Value) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert(field.to_string(), value);
    patch
}

/// Overlays `patch` on the JSON form of `target`. Unknown keys and values
/// that do not fit the field type are validation errors.
fn merge_patch<T>(target: &T, patch: &Map<String, Value>) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(target)?;
    let fields = value.as_object_mut().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("record did not serialize to an object"))
    })?;
    for (key, v) in patch {
        if !fields.contains_key(key) {
            return Err(AppError::Validation(format!("Unknown field '{key}'")));
        }
        fields.insert(key.clone(), v.clone());
    }
    serde_json::from_value(value).map_err(|e| AppError::Validation(e.to_string()))
}

fn push_entry<T: SectionEntry>(list: &mut Vec<T>, mut entry: T) -> Uuid {
    let id = entry.id();
    if id.is_nil() || list.iter().any(|e| e.id() == id) {
        entry.set_id(Uuid::new_v4());
    }
    entry.normalize();
    let id = entry.id();
    list.push(entry);
    id
}

fn patch_entry<T: SectionEntry>(
    list: &mut [T],
    id: Uuid,
    patch: &Map<String, Value>,
) -> Result<bool, AppError> {
    let Some(entry) = list.iter_mut().find(|e| e.id() == id) else {
        return Ok(false);
    };
    let mut merged: T = merge_patch(&*entry, patch)?;
    merged.set_id(id);
    merged.normalize();
    *entry = merged;
    Ok(true)
}

fn remove_entry<T: SectionEntry>(list: &mut Vec<T>, id: Uuid) -> bool {
    let before = list.len();
    list.retain(|e| e.id() != id);
    before != list.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::Experience;
    use serde_json::json;

    fn manager_with_doc() -> ResumeManager {
        let mut manager = ResumeManager::new();
        manager.create_new(Some("Main"));
        manager
    }

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_new_is_empty() {
        let mut manager = ResumeManager::new();
        let doc = manager.create_new(None);
        assert_eq!(doc.name, DEFAULT_RESUME_NAME);
        assert!(doc.experience.is_empty() && doc.references.is_empty());
        assert!(doc.skills.is_empty());
        assert_eq!(manager.completion_percentage(), 0);
    }

    #[test]
    fn test_create_new_uses_selected_template() {
        let mut manager = ResumeManager::new();
        manager.change_template(Template::Creative);
        assert_eq!(manager.create_new(None).template, Template::Creative);
    }

    #[test]
    fn test_mutation_without_document() {
        let mut manager = ResumeManager::new();
        assert!(matches!(
            manager.add_item(Section::Experience, None),
            Err(AppError::NoActiveResume)
        ));
        assert!(matches!(manager.save(), Err(AppError::NoActiveResume)));
        assert_eq!(manager.completion_percentage(), 0);
    }

    #[test]
    fn test_save_is_idempotent() {
        let mut manager = manager_with_doc();
        manager
            .set_nested_field("personal_info", "first_name", json!("Ada"))
            .unwrap();
        let a = manager.save().unwrap();
        let mut b = manager.save().unwrap();
        assert_eq!(manager.saved().len(), 1);
        b.last_modified = a.last_modified;
        assert_eq!(a, b);
    }

    #[test]
    fn test_save_replaces_in_place() {
        let mut manager = manager_with_doc();
        let first = manager.save().unwrap();
        manager.create_new(Some("Second"));
        manager.save().unwrap();
        manager.load(first.id).unwrap();
        manager.set_field("name", json!("Renamed")).unwrap();
        manager.save().unwrap();

        let names: Vec<_> = manager.saved().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Renamed", "Second"]);
    }

    #[test]
    fn test_save_assigns_id_to_nil_document() {
        let mut manager: ResumeManager = serde_json::from_value(json!({
            "current": {
                "id": Uuid::nil(),
                "name": "Imported",
                "template": "classic",
                "last_modified": "2024-01-01T00:00:00Z"
            }
        }))
        .unwrap();
        let saved = manager.save().unwrap();
        assert!(!saved.id.is_nil());
        assert_eq!(manager.current().unwrap().id, saved.id);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let mut manager = manager_with_doc();
        let err = manager.load(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(manager.current().unwrap().name, "Main");
    }

    #[test]
    fn test_load_follows_template() {
        let mut manager = manager_with_doc();
        manager.change_template(Template::Classic);
        let saved = manager.save().unwrap();
        manager.change_template(Template::Creative);
        manager.create_new(None);

        let loaded = manager.load(saved.id).unwrap();
        assert_eq!(loaded.template, Template::Classic);
        assert_eq!(manager.selected_template(), Template::Classic);
    }

    #[test]
    fn test_delete() {
        let mut manager = manager_with_doc();
        let saved = manager.save().unwrap();
        assert!(!manager.delete(Uuid::new_v4()));
        assert!(manager.delete(saved.id));
        assert!(manager.saved().is_empty());
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_add_then_remove_restores_section() {
        let mut manager = manager_with_doc();
        manager
            .add_item(
                Section::Experience,
                Some(SectionItem::Experience(Experience {
                    company: "Acme".into(),
                    ..Default::default()
                })),
            )
            .unwrap();
        let before = manager.current().unwrap().experience.clone();

        let id = manager.add_item(Section::Experience, None).unwrap();
        assert_eq!(manager.current().unwrap().experience.len(), 2);
        assert!(manager.remove_item(Section::Experience, id).unwrap());
        assert_eq!(manager.current().unwrap().experience, before);
    }

    #[test]
    fn test_add_item_regenerates_duplicate_ids() {
        let mut manager = manager_with_doc();
        let id = manager.add_item(Section::Experience, None).unwrap();
        let dup = SectionItem::Experience(Experience {
            id,
            ..Default::default()
        });
        let second = manager.add_item(Section::Experience, Some(dup)).unwrap();
        assert_ne!(id, second);
    }

    #[test]
    fn test_add_item_rejects_mismatched_variant() {
        let mut manager = manager_with_doc();
        let item = SectionItem::new_default(Section::Awards);
        let err = manager.add_item(Section::Education, Some(item)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(manager.current().unwrap().education.is_empty());
    }

    #[test]
    fn test_update_item_merges_patch() {
        let mut manager = manager_with_doc();
        let id = manager.add_item(Section::Experience, None).unwrap();
        manager
            .update_item(
                Section::Experience,
                id,
                &patch(json!({"company": "Acme", "technologies": ["Rust"]})),
            )
            .unwrap();
        manager
            .update_item(
                Section::Experience,
                id,
                &patch(json!({"position": "Engineer", "end_date": "2024-01", "current": true})),
            )
            .unwrap();

        let exp = &manager.current().unwrap().experience[0];
        assert_eq!(exp.id, id);
        assert_eq!(exp.company, "Acme");
        assert_eq!(exp.position, "Engineer");
        assert_eq!(exp.technologies, vec!["Rust".to_string()]);
        assert_eq!(exp.end_date, None);
    }

    #[test]
    fn test_update_item_errors() {
        let mut manager = manager_with_doc();
        let id = manager.add_item(Section::Awards, None).unwrap();

        let missing =
            manager.update_item(Section::Awards, Uuid::new_v4(), &patch(json!({"title": "x"})));
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let wrong_section = manager.update_item(Section::Education, id, &patch(json!({})));
        assert!(matches!(wrong_section, Err(AppError::NotFound(_))));

        let id_change =
            manager.update_item(Section::Awards, id, &patch(json!({"id": Uuid::new_v4()})));
        assert!(matches!(id_change, Err(AppError::Validation(_))));

        let unknown =
            manager.update_item(Section::Awards, id, &patch(json!({"colour": "red"})));
        assert!(matches!(unknown, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_remove_missing_item_is_noop() {
        let mut manager = manager_with_doc();
        let before = manager.current().unwrap().last_modified;
        assert!(!manager.remove_item(Section::Projects, Uuid::new_v4()).unwrap());
        assert_eq!(manager.current().unwrap().last_modified, before);
    }

    #[test]
    fn test_add_skill_ignores_blank() {
        let mut manager = manager_with_doc();
        assert!(!manager.add_skill(SkillCategory::Technical, "  ").unwrap());
        assert!(manager.current().unwrap().skills.technical.is_empty());

        assert!(manager.add_skill(SkillCategory::Technical, "Go").unwrap());
        assert_eq!(
            manager.current().unwrap().skills.technical,
            vec!["Go".to_string()]
        );
    }

    #[test]
    fn test_remove_skill() {
        let mut manager = manager_with_doc();
        manager.add_skill(SkillCategory::Languages, "German").unwrap();
        manager.add_skill(SkillCategory::Languages, "French").unwrap();
        assert_eq!(manager.remove_skill(SkillCategory::Languages, 5).unwrap(), None);
        assert_eq!(
            manager.remove_skill(SkillCategory::Languages, 0).unwrap(),
            Some("German".to_string())
        );
        assert_eq!(
            manager.current().unwrap().skills.languages,
            vec!["French".to_string()]
        );
    }

    #[test]
    fn test_set_field_rules() {
        let mut manager = manager_with_doc();
        manager.set_field("template", json!("classic")).unwrap();
        assert_eq!(manager.current().unwrap().template, Template::Classic);
        assert_eq!(manager.selected_template(), Template::Classic);
        assert_eq!(manager.create_new(None).template, Template::Classic);

        for field in ["id", "last_modified", "experience"] {
            let err = manager.set_field(field, json!(null)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{field}");
        }
        let err = manager.set_field("template", json!("gothic")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_set_nested_field() {
        let mut manager = manager_with_doc();
        manager
            .set_nested_field("personal_info", "summary", json!("Analyst"))
            .unwrap();
        manager
            .set_nested_field("skills", "tools", json!(["Vim", "Vim"]))
            .unwrap();
        let doc = manager.current().unwrap();
        assert_eq!(doc.personal_info.summary.as_deref(), Some("Analyst"));
        assert_eq!(doc.skills.tools.len(), 2);

        let err = manager
            .set_nested_field("experience", "company", json!("x"))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_mutations_refresh_last_modified() {
        let mut manager = manager_with_doc();
        let stale = chrono::DateTime::parse_from_rfc3339("2000-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        manager.current.as_mut().unwrap().last_modified = stale;
        manager.add_skill(SkillCategory::Soft, "Listening").unwrap();
        assert!(manager.current().unwrap().last_modified > stale);
    }

    #[test]
    fn test_personal_fields_scenario() {
        let mut manager = manager_with_doc();
        for (field, value) in [
            ("first_name", "Ada"),
            ("last_name", "Lovelace"),
            ("email", "ada@x.com"),
            ("phone", "555-0100"),
        ] {
            manager
                .set_nested_field("personal_info", field, json!(value))
                .unwrap();
        }
        assert_eq!(manager.completion_percentage(), 20);
    }

    #[test]
    fn test_import_from_profile_without_document() {
        let mut manager = ResumeManager::new();
        let profile = UserProfile {
            name: Some("Jane Doe".into()),
            email: Some("j@x.com".into()),
            skills: vec!["SQL".into()],
            ..Default::default()
        };
        let doc = manager.import_from_profile(&profile);
        assert_eq!(doc.personal_info.first_name.as_deref(), Some("Jane"));
        assert_eq!(doc.skills.technical, vec!["SQL".to_string()]);
        assert!(manager.has_unsaved_changes());
    }

    #[test]
    fn test_unsaved_changes_tracking() {
        let mut manager = manager_with_doc();
        assert!(manager.has_unsaved_changes());
        manager.save().unwrap();
        assert!(!manager.has_unsaved_changes());
        manager.add_skill(SkillCategory::Tools, "Git").unwrap();
        assert!(manager.has_unsaved_changes());
    }

    #[test]
    fn test_slice_round_trip_keeps_collection() {
        let mut manager = manager_with_doc();
        manager.add_item(Section::References, None).unwrap();
        manager.save().unwrap();
        let json = serde_json::to_string(&manager).unwrap();
        let restored: ResumeManager = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.saved(), manager.saved());
        assert_eq!(restored.current(), manager.current());
    }
}
