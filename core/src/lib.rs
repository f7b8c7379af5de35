//! Root of the `nudge-core` library: the reminder reconciliation engine.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through a `ModalPresenter` or the tracing
// stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod access;
pub mod bus;
pub mod config;
pub mod domains;
pub mod engine;
pub mod normalizer;
pub mod presentation;
pub mod reconciler;
pub mod source;

pub use access::SessionHandle;
pub use bus::BusEvent;
pub use bus::EventBus;
pub use bus::FOREGROUND_EVENT;
pub use bus::LocalEventBus;
pub use domains::DomainProfile;
pub use engine::EngineContext;
pub use engine::EngineHandle;
pub use engine::EngineSettings;
pub use engine::ReminderEngine;
pub use presentation::ModalPresenter;
pub use presentation::ModalSlot;
pub use presentation::ReminderBadge;
pub use source::HttpReminderFetcher;
pub use source::ReminderFetcher;

#[cfg(test)]
mod test_support;
