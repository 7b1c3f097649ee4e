//! Email rendering for one study's alerts.
//!
//! The body is a handlebars template with HTML escaping on, so barcodes and
//! visit labels coming from the store cannot inject markup. The subject is
//! plain text and built directly.

use handlebars::Handlebars;
use serde::Serialize;

use kitwatch_core::StudyName;

use crate::error::RenderError;
use crate::evaluator::Alert;

const BODY_TEMPLATE: &str = "expiry-alert-body";

const BODY: &str = r#"<h3>Action Required</h3>
<p>The following kits for <strong>{{study}}</strong> are expiring soon or have expired:</p>
<ul>
{{#each alerts}}  <li>[{{label}}] <strong>{{barcode}}</strong> ({{visit}}): Expires {{expiry}} ({{remaining}})</li>
{{/each}}</ul>
<p>Please log in to the LIMS Inventory to process or discard them.</p>
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
struct BodyData<'a> {
    study: &'a str,
    alerts: Vec<AlertLine<'a>>,
}

#[derive(Serialize)]
struct AlertLine<'a> {
    label: &'static str,
    barcode: &'a str,
    visit: &'a str,
    expiry: String,
    remaining: String,
}

pub struct NotificationRenderer {
    reg: Handlebars<'static>,
}

impl NotificationRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut reg = Handlebars::new();
        reg.set_strict_mode(true);
        reg.register_template_string(BODY_TEMPLATE, BODY)
            .map_err(|e| RenderError::Template {
                name: BODY_TEMPLATE,
                message: e.to_string(),
            })?;
        Ok(Self { reg })
    }

    pub fn subject(study: &StudyName) -> String {
        format!("⚠️ LIMS Alert: Expiring Kits for {study}")
    }

    /// Render the email for `study`. Entries keep the order of `alerts`.
    pub fn render(&self, study: &StudyName, alerts: &[Alert]) -> Result<RenderedEmail, RenderError> {
        let data = BodyData {
            study: study.as_str(),
            alerts: alerts
                .iter()
                .map(|a| AlertLine {
                    label: a.label.as_str(),
                    barcode: &a.barcode,
                    visit: &a.visit,
                    expiry: a.expiry.format("%Y-%m-%d").to_string(),
                    remaining: remaining_phrase(a.days_left),
                })
                .collect(),
        };

        let html = self
            .reg
            .render(BODY_TEMPLATE, &data)
            .map_err(|e| RenderError::Render {
                name: BODY_TEMPLATE,
                message: e.to_string(),
            })?;

        Ok(RenderedEmail {
            subject: Self::subject(study),
            html,
        })
    }
}

fn remaining_phrase(days_left: i64) -> String {
    match days_left {
        0 => "expires today".to_string(),
        1 => "1 day left".to_string(),
        -1 => "1 day overdue".to_string(),
        n if n > 0 => format!("{n} days left"),
        n => format!("{} days overdue", -n),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::evaluator::UrgencyLabel;

    fn alert(barcode: &str, days_left: i64, label: UrgencyLabel) -> Alert {
        Alert {
            barcode: barcode.to_string(),
            visit: "Week 4".to_string(),
            expiry: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(days_left),
            days_left,
            label,
        }
    }

    #[test]
    fn subject_names_the_study() {
        let subject = NotificationRenderer::subject(&StudyName::new("StudyX"));
        assert!(subject.contains("StudyX"));
        assert!(subject.contains("Alert"));
    }

    #[test]
    fn body_lists_every_alert_in_order() {
        let renderer = NotificationRenderer::new().unwrap();
        let email = renderer
            .render(
                &StudyName::new("StudyX"),
                &[
                    alert("KIT-A", 30, UrgencyLabel::Warning),
                    alert("KIT-B", 15, UrgencyLabel::Reminder),
                ],
            )
            .unwrap();

        assert_eq!(email.html.matches("<li>").count(), 2);
        let a = email.html.find("KIT-A").unwrap();
        let b = email.html.find("KIT-B").unwrap();
        assert!(a < b);
        assert!(email.html.contains("[WARNING] <strong>KIT-A</strong> (Week 4): Expires 2024-01-31 (30 days left)"));
        assert!(email.html.contains("[REMINDER] <strong>KIT-B</strong>"));
        assert!(email.html.contains("Action Required"));
    }

    #[test]
    fn expired_entry_reads_naturally() {
        let renderer = NotificationRenderer::new().unwrap();
        let email = renderer
            .render(&StudyName::new("StudyX"), &[alert("KIT-Z", 0, UrgencyLabel::Expired)])
            .unwrap();
        assert!(email.html.contains("[EXPIRED]"));
        assert!(email.html.contains("(expires today)"));
    }

    #[test]
    fn store_values_are_escaped() {
        let renderer = NotificationRenderer::new().unwrap();
        let email = renderer
            .render(
                &StudyName::new("R&D <1>"),
                &[alert("<b>KIT</b>", 5, UrgencyLabel::Urgent)],
            )
            .unwrap();
        assert!(!email.html.contains("<b>KIT</b>"));
        assert!(email.html.contains("&lt;b&gt;KIT&lt;/b&gt;"));
        assert!(email.html.contains("R&amp;D &lt;1&gt;"));
        assert_eq!(email.subject, "⚠️ LIMS Alert: Expiring Kits for R&D <1>");
    }

    #[test]
    fn remaining_phrases() {
        assert_eq!(remaining_phrase(30), "30 days left");
        assert_eq!(remaining_phrase(1), "1 day left");
        assert_eq!(remaining_phrase(0), "expires today");
        assert_eq!(remaining_phrase(-2), "2 days overdue");
    }
}
