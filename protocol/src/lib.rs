pub mod domain;
pub mod reminder;
pub mod session;
pub mod wire;

pub use domain::ReminderDomain;
pub use reminder::CandidateSnapshot;
pub use reminder::ProcessingSnapshot;
pub use reminder::ProjectSnapshot;
pub use reminder::Reminder;
pub use reminder::ReminderDetail;
pub use reminder::ReminderId;
pub use reminder::sort_by_recency;
pub use session::Session;
