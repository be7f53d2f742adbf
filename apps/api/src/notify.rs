//! Outbound-mail hook.
//!
//! Delivery is external to this service; `Mailer` is the seam. The default
//! `LogMailer` records each message through `tracing` instead of sending it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutboundMail) -> Result<(), AppError>;
}

/// Mailer that only logs. Used until a delivery integration is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutboundMail) -> Result<(), AppError> {
        info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            body_len = mail.body.len(),
            "outbound mail not delivered; no transport configured"
        );
        Ok(())
    }
}

/// Who runs an interview, and where to reach them if known.
#[derive(Debug, Clone, Copy)]
pub struct Interviewer<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
}

/// Builds the interview notices: always one for the applicant, and one for the
/// interviewer when their address is known.
pub fn interview_notices(
    from: &str,
    applicant_email: &str,
    applicant_name: &str,
    interviewer: Interviewer<'_>,
    job_title: &str,
    time: DateTime<Utc>,
) -> Vec<OutboundMail> {
    let when = time.format("%Y-%m-%d %H:%M UTC");
    let name = interviewer.name;
    let mut notices = vec![OutboundMail {
        from: from.to_string(),
        to: applicant_email.to_string(),
        subject: format!("Interview scheduled: {job_title}"),
        body: format!(
            "Hi {applicant_name},\n\nYour interview for {job_title} is scheduled for {when} with {name}.\n"
        ),
    }];
    if let Some(address) = interviewer.email {
        notices.push(OutboundMail {
            from: from.to_string(),
            to: address.to_string(),
            subject: format!("Interview assigned: {job_title}"),
            body: format!(
                "Hi {name},\n\nYou are interviewing {applicant_name} ({applicant_email}) for {job_title} at {when}.\n"
            ),
        });
    }
    notices
}
