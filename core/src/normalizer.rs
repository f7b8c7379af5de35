//! Turns heterogeneous real-time payloads into something the reconciler can
//! act on.
//!
//! Servers have shipped at least three envelope shapes over time:
//!
//! ```text
//! { "id": .., "dailyCount": .., "candidate": {..} }
//! { "reminder": { .. }, "assignedTo": .. }
//! { "reminderId": .., "payload": { .. } }            // also payload.reminder / payload.payload
//! ```
//!
//! A push may also arrive before the server has attached the entity
//! snapshot; such events become [`Normalized::Pending`] and are completed by
//! the next authoritative fetch.

use nudge_protocol::Reminder;
use nudge_protocol::ReminderId;
use nudge_protocol::wire::ID_KEYS;
use nudge_protocol::wire::count_field;
use nudge_protocol::wire::first_id;
use nudge_protocol::wire::flag;
use nudge_protocol::wire::id_from_value;
use nudge_protocol::wire::is_present;
use nudge_protocol::wire::parse_reminder_object;
use serde_json::Map;
use serde_json::Value;

use crate::BusEvent;
use crate::DomainProfile;

const ENVELOPE_ID_KEY: &str = "reminderId";
const ASSIGNEE_KEY: &str = "assignedTo";
const IMMEDIATE_FLAGS: &[&str] = &["show", "immediate", "showImmediately"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not an object, or no id could be extracted.
    Malformed,
    NotActionable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Reminder {
        reminder: Reminder,
        assigned_to: Option<String>,
    },
    /// Actionable, but the entity snapshot has not arrived yet.
    Pending {
        id: ReminderId,
        assigned_to: Option<String>,
    },
    Ignore(IgnoreReason),
}

impl Normalized {
    pub fn assigned_to(&self) -> Option<&str> {
        match self {
            Self::Reminder { assigned_to, .. } | Self::Pending { assigned_to, .. } => {
                assigned_to.as_deref()
            }
            Self::Ignore(_) => None,
        }
    }
}

pub fn normalize(profile: &DomainProfile, event: &BusEvent) -> Normalized {
    let Some(envelope) = event.payload.as_object() else {
        tracing::debug!(domain = %profile.domain, event = %event.name, "non-object push payload");
        return Normalized::Ignore(IgnoreReason::Malformed);
    };
    let payload = envelope.get("payload").and_then(Value::as_object);
    let object = locate_reminder(envelope, payload);

    let id = first_id(object, ID_KEYS)
        .or_else(|| payload.and_then(|p| first_id(p, &[ENVELOPE_ID_KEY])))
        .or_else(|| first_id(envelope, &[ENVELOPE_ID_KEY]));
    let Some(id) = id else {
        tracing::debug!(domain = %profile.domain, event = %event.name, "push payload without id");
        return Normalized::Ignore(IgnoreReason::Malformed);
    };

    if !is_actionable(profile, &event.name, envelope, object) {
        tracing::debug!(domain = %profile.domain, reminder_id = %id, "push is not actionable");
        return Normalized::Ignore(IgnoreReason::NotActionable);
    }

    let assigned_to = object
        .get(ASSIGNEE_KEY)
        .or_else(|| envelope.get(ASSIGNEE_KEY))
        .and_then(id_from_value);

    let mut object = object.clone();
    object.insert("id".to_string(), Value::String(id.clone()));
    match parse_reminder_object(profile.domain, &object) {
        Some(reminder) if reminder.has_detail() => Normalized::Reminder {
            reminder,
            assigned_to,
        },
        _ => Normalized::Pending {
            id: ReminderId::new(id),
            assigned_to,
        },
    }
}

fn locate_reminder<'a>(
    envelope: &'a Map<String, Value>,
    payload: Option<&'a Map<String, Value>>,
) -> &'a Map<String, Value> {
    let nested = |parent: Option<&'a Map<String, Value>>, key: &str| {
        parent.and_then(|p| p.get(key)).and_then(Value::as_object)
    };
    nested(Some(envelope), "reminder")
        .or_else(|| nested(payload, "reminder"))
        .or_else(|| nested(payload, "payload"))
        .or(payload)
        .unwrap_or(envelope)
}

fn is_actionable(
    profile: &DomainProfile,
    event_name: &str,
    envelope: &Map<String, Value>,
    object: &Map<String, Value>,
) -> bool {
    if count_field(object, "dailyCount") > 0 || is_present(object, "sentAt") {
        return true;
    }
    let tagged = event_name == profile.sent_tag
        || [envelope, object]
            .iter()
            .any(|o| o.get("type").and_then(Value::as_str) == Some(profile.sent_tag));
    tagged
        || IMMEDIATE_FLAGS
            .iter()
            .any(|key| flag(object, key) || flag(envelope, key))
}
