//! Email service for payment reminders.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Without
//! SMTP settings reminders are only logged.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use summer_camp_core::{Registration, format_eur};

use crate::config::EmailConfig;

/// Values shared by both reminder bodies.
struct ReminderContext {
    parent_name: String,
    camper_name: String,
    package: &'static str,
    total: String,
    paid: String,
    due: String,
    contact_url: String,
}

impl ReminderContext {
    fn new(registration: &Registration, site_url: &str) -> Self {
        Self {
            parent_name: registration.parent_name(),
            camper_name: registration.camper_name(),
            package: registration.package.label(),
            total: format_eur(registration.total_price()),
            paid: format_eur(registration.amount_paid),
            due: format_eur(registration.amount_due()),
            contact_url: format!("{site_url}/contact"),
        }
    }
}

/// HTML template for the payment reminder.
#[derive(Template)]
#[template(path = "email/payment_reminder.html")]
struct PaymentReminderHtml<'a> {
    ctx: &'a ReminderContext,
}

/// Plain text template for the payment reminder.
#[derive(Template)]
#[template(path = "email/payment_reminder.txt")]
struct PaymentReminderText<'a> {
    ctx: &'a ReminderContext,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// What happened to a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderOutcome {
    Sent,
    /// SMTP is not configured; the reminder was written to the log.
    Logged,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a balance reminder to the parent of a registration.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_payment_reminder(
        &self,
        registration: &Registration,
        site_url: &str,
    ) -> Result<(), EmailError> {
        let ctx = ReminderContext::new(registration, site_url);
        let html = PaymentReminderHtml { ctx: &ctx }.render()?;
        let text = PaymentReminderText { ctx: &ctx }.render()?;

        self.send_multipart_email(
            registration.parent_email.as_str(),
            &reminder_subject(registration),
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn reminder_subject(registration: &Registration) -> String {
    format!(
        "Summer Camp: balance due for {}",
        registration.camper_name()
    )
}

/// Send a reminder through `mailer`, or log it when e-mail is not configured.
///
/// # Errors
///
/// Returns error if sending fails.
pub async fn deliver_payment_reminder(
    mailer: Option<&EmailService>,
    registration: &Registration,
    site_url: &str,
) -> Result<ReminderOutcome, EmailError> {
    match mailer {
        Some(mailer) => {
            mailer.send_payment_reminder(registration, site_url).await?;
            Ok(ReminderOutcome::Sent)
        }
        None => {
            tracing::info!(
                registration_id = %registration.id,
                to = %registration.parent_email,
                amount_due = %registration.amount_due(),
                "SMTP not configured, payment reminder logged only"
            );
            Ok(ReminderOutcome::Logged)
        }
    }
}
