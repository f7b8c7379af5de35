use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumString;

/// The three reminder families the platform raises.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReminderDomain {
    /// Candidate did not answer recruiter outreach ("ring no response").
    Rnr,
    /// Hard-copy document pickup is overdue.
    Hrd,
    /// Credential verification step is overdue.
    DataFlow,
}

impl ReminderDomain {
    pub const ALL: [ReminderDomain; 3] = [Self::Rnr, Self::Hrd, Self::DataFlow];

    /// Path segment used by the reminders API and as a storage-key prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rnr => "rnr",
            Self::Hrd => "hrd",
            Self::DataFlow => "dataflow",
        }
    }

    /// Field names that may carry the entity reference on the wire.
    pub fn entity_ref_keys(self) -> &'static [&'static str] {
        match self {
            Self::Rnr => &["candidateId", "entityRef"],
            Self::Hrd | Self::DataFlow => &["processingStepId", "processingId", "entityRef"],
        }
    }

    /// Field names that may carry the nested entity snapshot on the wire.
    pub fn detail_keys(self) -> &'static [&'static str] {
        match self {
            Self::Rnr => &["candidate", "detail"],
            Self::Hrd | Self::DataFlow => &["processingStep", "processing", "detail"],
        }
    }
}
