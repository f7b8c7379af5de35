//! Durable record of which reminder attempts have already been surfaced.
//!
//! Each domain keeps one map of `reminder id -> last shown count` under its
//! own storage key. The map is read once at startup and written through on
//! every mutation; there is no batching.
//!
//! ## Storage Layout
//!
//! ```text
//! {storage_dir}/
//!   rnr_shown_reminders.json        [{ "id": "...", "count": N }, ...]
//!   hrd_shown_reminders.json
//!   dataflow_shown_reminders.json
//! ```

mod backend;
mod error;
mod shown;

pub use backend::FileBackend;
pub use backend::KeyValueBackend;
pub use backend::MemoryBackend;
pub use error::StoreError;
pub use shown::ShownEntry;
pub use shown::ShownStateStore;
