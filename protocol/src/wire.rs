//! Lenient decoding of reminders from the shapes the server emits.
//!
//! Reminder payloads arrive from two places (list responses and push
//! events) and neither is strictly typed: ids may be strings or numbers,
//! counts may be missing, and the entity snapshot lives under a
//! domain-specific key. Everything here works on `serde_json::Value` so the
//! same rules apply to both sources.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

use crate::CandidateSnapshot;
use crate::ProcessingSnapshot;
use crate::Reminder;
use crate::ReminderDetail;
use crate::ReminderDomain;
use crate::ReminderId;

/// Keys that may carry the reminder id.
pub const ID_KEYS: &[&str] = &["id", "reminderId"];

/// Body of `GET /reminders/{domain}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReminderListResponse {
    Data {
        data: Vec<Value>,
    },
    Page {
        items: Vec<Value>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u64>,
        #[serde(default)]
        limit: Option<u64>,
    },
    Bare(Vec<Value>),
}

/// Pagination metadata from the `{ items, total, page, limit }` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub total: Option<u64>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ReminderListResponse {
    pub fn page_info(&self) -> Option<PageInfo> {
        match self {
            Self::Page {
                total, page, limit, ..
            } => Some(PageInfo {
                total: *total,
                page: *page,
                limit: *limit,
            }),
            Self::Data { .. } | Self::Bare(_) => None,
        }
    }

    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Data { data } => data,
            Self::Page { items, .. } => items,
            Self::Bare(items) => items,
        }
    }

    /// Decodes every item, skipping the ones without a usable id.
    pub fn into_reminders(self, domain: ReminderDomain) -> Vec<Reminder> {
        let items = self.into_items();
        let total = items.len();
        let reminders: Vec<Reminder> = items
            .iter()
            .filter_map(|item| parse_reminder(domain, item))
            .collect();
        if reminders.len() < total {
            tracing::debug!(
                %domain,
                skipped = total - reminders.len(),
                "skipped reminder items without an id"
            );
        }
        reminders
    }
}

pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn first_id(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(id_from_value)
}

/// Reads a non-negative counter; strings holding digits are tolerated.
pub fn count_field(object: &Map<String, Value>, key: &str) -> u32 {
    match object.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// True when `key` exists and is not `null` / empty string.
pub fn is_present(object: &Map<String, Value>, key: &str) -> bool {
    match object.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

pub fn timestamp_field(object: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    match object.get(key)? {
        Value::String(s) => match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(err) => {
                tracing::debug!(key, value = %s, error = %err, "unparseable timestamp");
                None
            }
        },
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

pub fn flag(object: &Map<String, Value>, key: &str) -> bool {
    matches!(object.get(key), Some(Value::Bool(true)))
}

/// The nested entity snapshot object, if the payload carries one.
pub fn detail_object(
    domain: ReminderDomain,
    object: &Map<String, Value>,
) -> Option<&Map<String, Value>> {
    domain
        .detail_keys()
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_object))
}

fn parse_detail(domain: ReminderDomain, object: &Map<String, Value>) -> Option<ReminderDetail> {
    let raw = Value::Object(object.clone());
    let parsed = match domain {
        ReminderDomain::Rnr => {
            serde_json::from_value::<CandidateSnapshot>(raw).map(ReminderDetail::Candidate)
        }
        ReminderDomain::Hrd | ReminderDomain::DataFlow => {
            serde_json::from_value::<ProcessingSnapshot>(raw).map(ReminderDetail::Processing)
        }
    };
    match parsed {
        Ok(detail) => Some(detail),
        Err(err) => {
            tracing::debug!(%domain, error = %err, "discarding malformed reminder detail");
            None
        }
    }
}

/// Decodes one reminder object. Returns `None` when no id can be extracted.
pub fn parse_reminder(domain: ReminderDomain, value: &Value) -> Option<Reminder> {
    let object = value.as_object()?;
    parse_reminder_object(domain, object)
}

pub fn parse_reminder_object(
    domain: ReminderDomain,
    object: &Map<String, Value>,
) -> Option<Reminder> {
    let id = first_id(object, ID_KEYS)?;
    let detail = detail_object(domain, object).and_then(|d| parse_detail(domain, d));
    let entity_ref = first_id(object, domain.entity_ref_keys()).or_else(|| match &detail {
        Some(ReminderDetail::Candidate(c)) => c.id.clone(),
        Some(ReminderDetail::Processing(p)) => p.id.clone(),
        None => None,
    });

    Some(Reminder {
        id: ReminderId::new(id),
        domain,
        entity_ref,
        daily_count: count_field(object, "dailyCount"),
        reminder_count: count_field(object, "reminderCount"),
        sent_at: timestamp_field(object, "sentAt"),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn accepts_data_wrapper() {
        let body = json!({ "data": [
            { "id": "r1", "candidateId": 9, "dailyCount": 1, "reminderCount": 2,
              "candidate": { "id": 9, "firstName": "Ravi", "phone": "+91 98" } },
        ]});
        let response: ReminderListResponse = serde_json::from_value(body).unwrap();
        let reminders = response.into_reminders(ReminderDomain::Rnr);

        assert_eq!(reminders.len(), 1);
        let r = &reminders[0];
        assert_eq!(r.id.as_str(), "r1");
        assert_eq!(r.entity_ref.as_deref(), Some("9"));
        assert_eq!(r.reminder_count, 2);
        match &r.detail {
            Some(ReminderDetail::Candidate(c)) => {
                assert_eq!(c.first_name.as_deref(), Some("Ravi"));
                assert_eq!(c.phone_number.as_deref(), Some("+91 98"));
            }
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    #[test]
    fn accepts_paginated_wrapper_and_skips_items_without_id() {
        let body = json!({
            "items": [
                { "reminderId": 17, "processingStepId": "s-1", "reminderCount": 1 },
                { "dailyCount": 3 },
            ],
            "total": 2, "page": 1, "limit": 20,
        });
        let response: ReminderListResponse = serde_json::from_value(body).unwrap();
        let reminders = response.into_reminders(ReminderDomain::DataFlow);

        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].id.as_str(), "17");
        assert_eq!(reminders[0].entity_ref.as_deref(), Some("s-1"));
        assert!(reminders[0].detail.is_none());
    }

    #[test]
    fn entity_ref_falls_back_to_detail_id() {
        let value = json!({
            "id": "h1",
            "processing": { "id": "step-4", "step": "HRD pickup" },
            "sentAt": "2024-05-01T10:00:00Z",
        });
        let reminder = parse_reminder(ReminderDomain::Hrd, &value).unwrap();
        assert_eq!(reminder.entity_ref.as_deref(), Some("step-4"));
        assert!(reminder.sent_at.is_some());
        assert!(reminder.is_active());
    }

    #[test]
    fn counters_tolerate_strings_and_garbage() {
        let value = json!({ "id": "x", "dailyCount": "2", "reminderCount": "lots" });
        let reminder = parse_reminder(ReminderDomain::Rnr, &value).unwrap();
        assert_eq!(reminder.daily_count, 2);
        assert_eq!(reminder.reminder_count, 0);
    }

    #[test]
    fn blank_string_id_is_not_an_id() {
        assert_eq!(parse_reminder(ReminderDomain::Rnr, &json!({ "id": "  " })), None);
        assert_eq!(parse_reminder(ReminderDomain::Rnr, &json!("r1")), None);
    }
}
