//! Infrastructure layer: configuration, the hosted store, the mail provider,
//! and the run/schedule plumbing around the pure expiry check.

pub mod config;
pub mod firebase;
pub mod memory;
pub mod runner;
pub mod schedule;
pub mod sendgrid;

pub use config::{ConfigError, DataSourceSettings, MailSettings, ServiceAccount};
pub use firebase::FirebaseSnapshotReader;
pub use memory::{DryRunDispatcher, InMemorySnapshotReader, RecordingDispatcher};
pub use runner::{Delivery, ExpiryCheckRunner, RunError, RunReport};
pub use schedule::{DailySchedule, ScheduleHandle};
pub use sendgrid::SendGridDispatcher;
