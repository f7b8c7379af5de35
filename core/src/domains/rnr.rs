use nudge_protocol::Reminder;
use nudge_protocol::ReminderDetail;
use nudge_protocol::ReminderDomain;

use super::DomainProfile;
use super::attempts;
use super::entity_ref;
use crate::presentation::NavigationTarget;
use crate::presentation::ReminderSummary;

pub(super) fn profile() -> DomainProfile {
    DomainProfile {
        domain: ReminderDomain::Rnr,
        path: "/reminders/rnr".to_string(),
        due_only: None,
        storage_key: "rnr_shown_reminders",
        event_names: &["rnr:reminder", "rnrReminder.sent"],
        sent_tag: "rnrReminder.sent",
        role_marker: "recruiter",
        describe,
        navigate,
    }
}

fn describe(reminder: &Reminder) -> ReminderSummary {
    let candidate = match &reminder.detail {
        Some(ReminderDetail::Candidate(candidate)) => Some(candidate),
        _ => None,
    };
    let name = candidate
        .and_then(|c| c.display_name())
        .unwrap_or_else(|| "A candidate".to_string());
    let mut body = format!(
        "{name} has not answered outreach ({}).",
        attempts(reminder.reminder_count)
    );
    if let Some(phone) = candidate.and_then(|c| c.phone_number.as_deref()) {
        body.push_str(&format!(" Call {phone}."));
    }
    ReminderSummary {
        title: "Candidate not responding".to_string(),
        body,
    }
}

fn navigate(reminder: &Reminder) -> NavigationTarget {
    NavigationTarget::new(format!("/candidates/{}", entity_ref(reminder)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nudge_protocol::CandidateSnapshot;
    use nudge_protocol::ReminderId;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_names_the_candidate_and_phone() {
        let reminder = Reminder {
            id: ReminderId::new("r1"),
            domain: ReminderDomain::Rnr,
            entity_ref: Some("c-42".to_string()),
            daily_count: 1,
            reminder_count: 3,
            sent_at: None,
            detail: Some(ReminderDetail::Candidate(CandidateSnapshot {
                id: Some("c-42".to_string()),
                first_name: Some("Ravi".to_string()),
                last_name: Some("Menon".to_string()),
                phone_number: Some("+91 98470".to_string()),
                email: None,
            })),
        };

        let content = profile().modal_content(reminder);
        assert_eq!(content.summary.title, "Candidate not responding");
        assert_eq!(
            content.summary.body,
            "Ravi Menon has not answered outreach (3 reminders sent). Call +91 98470."
        );
        assert_eq!(content.target.path, "/candidates/c-42");
    }

    #[test]
    fn navigation_falls_back_to_reminder_id() {
        let reminder = Reminder {
            id: ReminderId::new("r9"),
            domain: ReminderDomain::Rnr,
            entity_ref: None,
            daily_count: 1,
            reminder_count: 1,
            sent_at: None,
            detail: None,
        };
        assert_eq!(navigate(&reminder).path, "/candidates/r9");
        assert_eq!(
            describe(&reminder).body,
            "A candidate has not answered outreach (1 reminder sent)."
        );
    }
}
