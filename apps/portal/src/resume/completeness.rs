use serde::{Deserialize, Serialize};

use crate::models::resume::ResumeDocument;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionCheck {
    pub check: String,
    pub satisfied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionReport {
    pub percentage: u8,
    pub satisfied: usize,
    pub total: usize,
    pub checks: Vec<CompletionCheck>,
    pub missing: Vec<String>,
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Evaluates the five completion checks against `doc`, in a fixed order.
/// The four required personal fields form a single check.
fn evaluate(doc: &ResumeDocument) -> Vec<CompletionCheck> {
    let info = &doc.personal_info;
    let check = |name: &str, satisfied: bool| CompletionCheck {
        check: name.to_string(),
        satisfied,
    };

    vec![
        check(
            "personal_info",
            [&info.first_name, &info.last_name, &info.email, &info.phone]
                .into_iter()
                .all(is_filled),
        ),
        check("summary", is_filled(&info.summary)),
        check("experience", !doc.experience.is_empty()),
        check("education", !doc.education.is_empty()),
        check("skills", !doc.skills.is_empty()),
    ]
}

/// round(satisfied / total × 100), always within 0..=100.
pub fn completion_percentage(doc: &ResumeDocument) -> u8 {
    compute_completion_report(doc).percentage
}

pub fn compute_completion_report(doc: &ResumeDocument) -> CompletionReport {
    let checks = evaluate(doc);
    let total = checks.len();
    let satisfied = checks.iter().filter(|c| c.satisfied).count();
    let percentage = if total == 0 {
        0
    } else {
        ((satisfied as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
    };
    let missing = checks
        .iter()
        .filter(|c| !c.satisfied)
        .map(|c| c.check.clone())
        .collect();

    CompletionReport {
        percentage,
        satisfied,
        total,
        checks,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{Education, Experience, Template};

    fn empty_doc() -> ResumeDocument {
        ResumeDocument::new("Test", Template::Modern)
    }

    fn with_contact(mut doc: ResumeDocument) -> ResumeDocument {
        doc.personal_info.first_name = Some("Ada".into());
        doc.personal_info.last_name = Some("Lovelace".into());
        doc.personal_info.email = Some("ada@x.com".into());
        doc.personal_info.phone = Some("555-0100".into());
        doc
    }

    #[test]
    fn test_empty_document_is_zero() {
        let report = compute_completion_report(&empty_doc());
        assert_eq!(report.percentage, 0);
        assert_eq!(report.satisfied, 0);
        assert_eq!(report.total, 5);
        assert_eq!(report.missing.len(), 5);
    }

    #[test]
    fn test_personal_fields_count_as_one_check() {
        let doc = with_contact(empty_doc());
        let report = compute_completion_report(&doc);
        assert_eq!(report.satisfied, 1);
        assert_eq!(report.percentage, 20);
    }

    #[test]
    fn test_partial_personal_info_does_not_count() {
        let mut doc = empty_doc();
        doc.personal_info.first_name = Some("Ada".into());
        doc.personal_info.email = Some("a@b.c".into());
        assert_eq!(completion_percentage(&doc), 0);

        doc.personal_info.last_name = Some("Lovelace".into());
        doc.personal_info.phone = Some("   ".into());
        assert_eq!(completion_percentage(&doc), 0);
    }

    #[test]
    fn test_blank_values_do_not_count() {
        let mut doc = empty_doc();
        doc.personal_info.summary = Some(String::new());
        assert_eq!(completion_percentage(&doc), 0);
    }

    #[test]
    fn test_three_of_five() {
        let mut doc = with_contact(empty_doc());
        doc.experience.push(Experience::default());
        doc.skills.tools.push("Git".into());
        assert_eq!(completion_percentage(&doc), 60);
    }

    #[test]
    fn test_full_document_is_hundred() {
        let mut doc = with_contact(empty_doc());
        doc.personal_info.summary = Some("Analyst".into());
        doc.experience.push(Experience::default());
        doc.education.push(Education::default());
        doc.skills.soft.push("Writing".into());

        let report = compute_completion_report(&doc);
        assert_eq!(report.percentage, 100);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_missing_lists_unsatisfied_checks_in_order() {
        let mut doc = empty_doc();
        doc.skills.technical.push("Rust".into());
        doc.education.push(Education::default());
        let report = compute_completion_report(&doc);
        assert_eq!(report.missing, vec!["personal_info", "summary", "experience"]);
    }
}
