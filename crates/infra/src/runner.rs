//! One invocation of the daily expiry check.
//!
//! Pipeline: read both snapshots (concurrently, both must succeed) -> evaluate
//! and group -> render one email per resolved study -> send all emails
//! concurrently and capture every outcome.
//!
//! Failures:
//! - a snapshot read failure aborts the run before anything is evaluated
//! - a study without a contact is skipped with a warning
//! - a failed send is logged and reported, never fatal for the run

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use kitwatch_alerts::{
    DispatchError, ExpiryCheck, NotificationDispatcher, NotificationRenderer, OutgoingEmail,
    ReadError, RenderError, Sender, SnapshotReader,
};
use kitwatch_core::StudyName;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("snapshot read failed: {0}")]
    SourceRead(#[from] ReadError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Delivery outcome for one study.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub study: StudyName,
    pub recipient: String,
    pub alerts: usize,
    pub outcome: Result<(), DispatchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub today: NaiveDate,
    pub items_scanned: usize,
    pub alerts: usize,
    pub groups: usize,
    /// In group order.
    pub deliveries: Vec<Delivery>,
    pub unresolved: Vec<StudyName>,
    /// Dispatch tasks that ended without an outcome (panicked or cancelled).
    pub lost_tasks: usize,
}

impl RunReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.delivered()
    }
}

pub struct ExpiryCheckRunner<R, D> {
    reader: Arc<R>,
    dispatcher: Arc<D>,
    renderer: NotificationRenderer,
    sender: Sender,
}

impl<R, D> ExpiryCheckRunner<R, D>
where
    R: SnapshotReader,
    D: NotificationDispatcher,
{
    pub fn new(reader: Arc<R>, dispatcher: Arc<D>, sender: Sender) -> Result<Self, RunError> {
        Ok(Self {
            reader,
            dispatcher,
            renderer: NotificationRenderer::new()?,
            sender,
        })
    }

    pub fn dispatcher(&self) -> &Arc<D> {
        &self.dispatcher
    }

    /// Run the check once for `today`.
    pub async fn run_once(&self, today: NaiveDate) -> Result<RunReport, RunError> {
        let run_id = Uuid::now_v7();
        let span = info_span!("expiry_check", run_id = %run_id, %today);
        self.run_inner(run_id, today).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, today: NaiveDate) -> Result<RunReport, RunError> {
        info!("running daily expiry check");

        let (inventory, contacts) =
            tokio::try_join!(self.reader.inventory(), self.reader.contacts())?;

        for rejected in inventory.rejected.iter().chain(&contacts.rejected) {
            warn!(key = %rejected.key, reason = %rejected.reason, "skipping undecodable record");
        }

        let outcome = ExpiryCheck::new(today, &inventory, &contacts).run();

        for (barcode, e) in &outcome.bad_expiries {
            debug!(barcode = %barcode, error = %e, "available item has unreadable expiry");
        }

        let mut unresolved = Vec::new();
        for group in outcome.unresolved() {
            warn!(
                study = %group.study,
                alerts = group.alerts.len(),
                "no contact for study; skipping notification"
            );
            unresolved.push(group.study.clone());
        }

        let mut emails = Vec::new();
        for (group, recipient) in outcome.resolved() {
            if group.is_ambiguous() {
                warn!(
                    study = %group.study,
                    matches = group.matching_contacts,
                    recipient = %recipient,
                    "several contacts match study; using the last one"
                );
            }
            let rendered = self.renderer.render(&group.study, &group.alerts)?;
            emails.push((
                group.study.clone(),
                group.alerts.len(),
                OutgoingEmail {
                    to: recipient.to_string(),
                    from: self.sender.clone(),
                    subject: rendered.subject,
                    html: rendered.html,
                },
            ));
        }

        let (deliveries, lost_tasks) = self.dispatch_all(emails).await;

        let report = RunReport {
            run_id,
            today,
            items_scanned: outcome.items_scanned,
            alerts: outcome.alert_count(),
            groups: outcome.groups.len(),
            deliveries,
            unresolved,
            lost_tasks,
        };

        info!(
            items = report.items_scanned,
            alerts = report.alerts,
            groups = report.groups,
            delivered = report.delivered(),
            failed = report.failed(),
            unresolved = report.unresolved.len(),
            "daily expiry check complete"
        );

        Ok(report)
    }

    /// Send every email concurrently and wait for all of them to settle.
    async fn dispatch_all(
        &self,
        emails: Vec<(StudyName, usize, OutgoingEmail)>,
    ) -> (Vec<Delivery>, usize) {
        let mut set = JoinSet::new();

        for (index, (study, alerts, email)) in emails.into_iter().enumerate() {
            let dispatcher = Arc::clone(&self.dispatcher);
            info!(study = %study, recipient = %email.to, alerts, "sending expiry alert");
            set.spawn(
                async move {
                    let outcome = dispatcher.send(&email).await;
                    (
                        index,
                        Delivery {
                            study,
                            recipient: email.to,
                            alerts,
                            outcome,
                        },
                    )
                }
                .in_current_span(),
            );
        }

        let mut deliveries = Vec::with_capacity(set.len());
        let mut lost_tasks = 0;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, delivery)) => {
                    if let Err(e) = &delivery.outcome {
                        error!(
                            study = %delivery.study,
                            recipient = %delivery.recipient,
                            error = %e,
                            "failed to send expiry alert"
                        );
                    }
                    deliveries.push((index, delivery));
                }
                Err(e) => {
                    error!(error = %e, "dispatch task ended without an outcome");
                    lost_tasks += 1;
                }
            }
        }

        deliveries.sort_by_key(|(index, _)| *index);
        (deliveries.into_iter().map(|(_, d)| d).collect(), lost_tasks)
    }
}
