// ABOUTME: JobRecord, the structured output for one job posting.
// ABOUTME: Tracks which required fields are present so incomplete records can be rejected.

use serde::{Deserialize, Serialize};

/// One job posting extracted from a detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    /// Stable identifier derived from the source URL.
    pub job_id: String,
    /// Detail-page URL the record was extracted from.
    pub url: String,
    pub company: String,
    /// Locality string, geocode-enriched when possible.
    pub location: String,
    pub description: String,
    /// Alternate application URL, only set when it differs from `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_hours: Option<String>,
}

impl JobRecord {
    /// Names of required fields that are empty, in schema order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("job_id", &self.job_id),
            ("url", &self.url),
            ("company", &self.company),
            ("location", &self.location),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// True when every required field is populated.
    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn complete() -> JobRecord {
        JobRecord {
            title: "Paralegal".into(),
            job_id: "101".into(),
            url: "http://www.simplylawjobs.com/job/101".into(),
            company: "Acme LLP".into(),
            location: "Leeds".into(),
            description: "Great role.".into(),
            ..Default::default()
        }
    }

    #[test]
    fn complete_record_has_no_missing_fields() {
        assert!(complete().is_complete());
    }

    #[test]
    fn reports_missing_fields_in_order() {
        let record = JobRecord {
            title: String::new(),
            description: "  ".into(),
            ..complete()
        };
        assert_eq!(record.missing_required(), vec!["title", "description"]);
        assert!(!record.is_complete());
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let json = serde_json::to_value(complete()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("job_id"));
        assert!(!obj.contains_key("apply_url"));
        assert!(!obj.contains_key("skills"));

        let with_skills = JobRecord {
            skills: Some("Conveyancing".into()),
            ..complete()
        };
        let json = serde_json::to_string(&with_skills).unwrap();
        let back: JobRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, with_skills);
    }
}
