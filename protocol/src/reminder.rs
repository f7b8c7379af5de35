//! Canonical reminder model shared by the fetcher, the normalizer and the
//! reconciler.

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::ReminderDomain;

/// Identifier of one reminder attempt-series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(String);

impl ReminderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReminderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ReminderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    pub domain: ReminderDomain,
    pub entity_ref: Option<String>,
    pub daily_count: u32,
    /// Non-decreasing while the underlying entity stays unresolved.
    pub reminder_count: u32,
    pub sent_at: Option<DateTime<Utc>>,
    pub detail: Option<ReminderDetail>,
}

impl Reminder {
    /// A reminder is active when the server signals any pending action on it.
    pub fn is_active(&self) -> bool {
        self.daily_count > 0 || self.sent_at.is_some() || self.reminder_count > 0
    }

    pub fn has_detail(&self) -> bool {
        self.detail.is_some()
    }
}

/// Sorts newest-sent first; reminders without `sent_at` keep server order at the end.
pub fn sort_by_recency(reminders: &mut [Reminder]) {
    reminders.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
}

/// Entity snapshot attached to a reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReminderDetail {
    Candidate(CandidateSnapshot),
    Processing(ProcessingSnapshot),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateSnapshot {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(alias = "phone", alias = "contact")]
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

impl CandidateSnapshot {
    pub fn display_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() { None } else { Some(name) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSnapshot {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingSnapshot {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(alias = "stepName", alias = "name")]
    pub step: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub project: Option<ProjectSnapshot>,
    pub candidate: Option<CandidateSnapshot>,
}

/// Accepts ids sent as JSON strings or numbers.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(crate::wire::id_from_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn reminder(id: &str, daily: u32, count: u32, sent_at: Option<DateTime<Utc>>) -> Reminder {
        Reminder {
            id: ReminderId::new(id),
            domain: ReminderDomain::Rnr,
            entity_ref: None,
            daily_count: daily,
            reminder_count: count,
            sent_at,
            detail: None,
        }
    }

    #[test]
    fn activity_requires_any_signal() {
        assert!(!reminder("a", 0, 0, None).is_active());
        assert!(reminder("b", 1, 0, None).is_active());
        assert!(reminder("c", 0, 1, None).is_active());
        assert!(reminder("d", 0, 0, Some(Utc::now())).is_active());
    }

    #[test]
    fn recency_puts_unsent_last_in_server_order() {
        let early = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
        let mut list = vec![
            reminder("unsent-1", 1, 0, None),
            reminder("early", 1, 0, Some(early)),
            reminder("unsent-2", 1, 0, None),
            reminder("late", 1, 0, Some(late)),
        ];

        sort_by_recency(&mut list);

        let ids: Vec<&str> = list.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "early", "unsent-1", "unsent-2"]);
    }

    #[test]
    fn candidate_display_name_skips_blank_parts() {
        let candidate = CandidateSnapshot {
            first_name: Some("Asha".to_string()),
            last_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(candidate.display_name().as_deref(), Some("Asha"));
        assert_eq!(CandidateSnapshot::default().display_name(), None);
    }

    #[test]
    fn snapshot_accepts_numeric_ids() {
        let snapshot: ProcessingSnapshot = serde_json::from_value(serde_json::json!({
            "id": 42,
            "stepName": "Degree attestation",
            "project": { "id": "p-7", "title": "Riyadh ICU" },
        }))
        .unwrap();
        assert_eq!(snapshot.id.as_deref(), Some("42"));
        assert_eq!(snapshot.step.as_deref(), Some("Degree attestation"));
        assert_eq!(
            snapshot.project.and_then(|p| p.title).as_deref(),
            Some("Riyadh ICU")
        );
    }
}
