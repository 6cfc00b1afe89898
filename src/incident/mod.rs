//! Slack `/incident` slash command.
//!
//! # Data Flow
//! ```text
//! POST /api/slack/incident
//!     → handler.rs (signature check, form decode)
//!     → command.rs (subcommand parse)
//!     → service.rs (apply to store, build reply)
//!     → store.rs (IncidentStore)
//! ```
//!
//! Outbound notifications (Slack channels, paging, trackers) are not sent
//! from here. `Incident::page_on_call` records whether paging is due.

pub mod command;
pub mod handler;
pub mod model;
pub mod service;
pub mod store;

pub use command::{IncidentCommand, SlackReply, SlashCommand};
pub use model::{Incident, Severity, Status};
pub use service::IncidentService;
pub use store::{InMemoryIncidentStore, IncidentError, IncidentStore};
