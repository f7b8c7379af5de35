mod client;
mod error;
mod events;

pub use client::BackendClient;
pub use client::ReminderQuery;
pub use error::FetchError;
pub use events::RealtimeMessage;
pub use events::RealtimeStream;
