use crate::models::resume::ResumeDocument;
use crate::models::user::UserProfile;

/// Splits a display name at the first run of whitespace.
/// `"Jane van Doe"` → (`"Jane"`, `"van Doe"`).
pub fn split_name(name: &str) -> (Option<String>, Option<String>) {
    let name = name.trim();
    if name.is_empty() {
        return (None, None);
    }
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => {
            let rest = rest.trim();
            (
                Some(first.to_string()),
                (!rest.is_empty()).then(|| rest.to_string()),
            )
        }
        None => (Some(name.to_string()), None),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Destructive copy of the flat profile fields into `doc`.
///
/// The imported fields are overwritten even when the profile leaves them
/// empty; the `technical` bucket is replaced wholesale. Fields the profile
/// does not carry (links, other skill buckets, sections) are untouched.
pub fn apply_profile(doc: &mut ResumeDocument, profile: &UserProfile) {
    let (first_name, last_name) = profile
        .name
        .as_deref()
        .map(split_name)
        .unwrap_or((None, None));

    let info = &mut doc.personal_info;
    info.first_name = first_name;
    info.last_name = last_name;
    info.email = non_blank(&profile.email);
    info.phone = non_blank(&profile.phone);
    info.address = non_blank(&profile.location);
    info.summary = non_blank(&profile.bio);

    doc.skills.technical = profile
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    doc.touch();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::Template;

    #[test]
    fn test_split_name_variants() {
        assert_eq!(
            split_name("Jane Doe"),
            (Some("Jane".into()), Some("Doe".into()))
        );
        assert_eq!(
            split_name("  Jane   van Doe "),
            (Some("Jane".into()), Some("van Doe".into()))
        );
        assert_eq!(split_name("Cher"), (Some("Cher".into()), None));
        assert_eq!(split_name("   "), (None, None));
    }

    #[test]
    fn test_import_overwrites_and_replaces_technical() {
        let mut doc = ResumeDocument::new("R", Template::Classic);
        doc.personal_info.first_name = Some("Old".into());
        doc.personal_info.phone = Some("111".into());
        doc.personal_info.linkedin = Some("in/old".into());
        doc.skills.technical = vec!["Rust".into(), "Go".into()];
        doc.skills.soft = vec!["Empathy".into()];

        let profile = UserProfile {
            name: Some("Jane Doe".into()),
            email: Some("j@x.com".into()),
            skills: vec!["SQL".into()],
            ..Default::default()
        };
        apply_profile(&mut doc, &profile);

        let info = &doc.personal_info;
        assert_eq!(info.first_name.as_deref(), Some("Jane"));
        assert_eq!(info.last_name.as_deref(), Some("Doe"));
        assert_eq!(info.email.as_deref(), Some("j@x.com"));
        assert_eq!(info.phone, None);
        assert_eq!(info.linkedin.as_deref(), Some("in/old"));
        assert_eq!(doc.skills.technical, vec!["SQL".to_string()]);
        assert_eq!(doc.skills.soft, vec!["Empathy".to_string()]);
    }

    #[test]
    fn test_import_maps_location_and_bio() {
        let mut doc = ResumeDocument::new("R", Template::Classic);
        let profile = UserProfile {
            location: Some("Berlin".into()),
            bio: Some("Backend engineer".into()),
            ..Default::default()
        };
        apply_profile(&mut doc, &profile);
        assert_eq!(doc.personal_info.address.as_deref(), Some("Berlin"));
        assert_eq!(doc.personal_info.summary.as_deref(), Some("Backend engineer"));
    }
}
