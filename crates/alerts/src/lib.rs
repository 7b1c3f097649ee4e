//! `kitwatch-alerts`
//!
//! **Responsibility:** decide which kits need an expiry notification today and
//! turn them into one email per study.
//!
//! This crate is pure:
//! - It never reads the store or talks to the mail provider.
//! - "Today" is always passed in, never read from the clock.
//! - Collaborators are described by the traits in [`ports`].

pub mod aggregator;
pub mod error;
pub mod evaluator;
pub mod job;
pub mod ports;
pub mod render;

pub use aggregator::{AlertGroup, aggregate, resolve_recipient};
pub use error::{DispatchError, ReadError, RenderError};
pub use evaluator::{Alert, MILESTONES, Skip, UrgencyLabel, days_left, evaluate, evaluate_detailed};
pub use job::{ExpiryCheck, ExpiryCheckOutcome};
pub use ports::{NotificationDispatcher, OutgoingEmail, Sender, SnapshotReader};
pub use render::{NotificationRenderer, RenderedEmail};
