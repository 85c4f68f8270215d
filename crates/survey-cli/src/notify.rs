use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use std::env;
use std::time::Duration;
use survey_store::config::NotificationSettings;
use survey_store::outbox::OutboxNotifier;
use survey_store::port::{Notifier, NotifyError};
use survey_store::repository::Repository;

use crate::commands::ENV_ADMIN_NAME;

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends mail through an SMTP relay.
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn from_settings(settings: &NotificationSettings) -> Result<Self> {
        let mut builder = SmtpTransport::relay(&settings.smtp_host)
            .with_context(|| format!("invalid SMTP host '{}'", settings.smtp_host))?
            .port(settings.smtp_port)
            .timeout(Some(SMTP_TIMEOUT));
        if !settings.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.smtp_username.to_owned(),
                settings.smtp_password.to_owned(),
            ));
        }
        let address: Address = settings
            .from_address
            .parse()
            .with_context(|| format!("invalid from address '{}'", settings.from_address))?;
        Ok(Self {
            mailer: builder.build(),
            from: Mailbox::new(env::var(ENV_ADMIN_NAME).ok(), address),
        })
    }
}

impl Notifier for SmtpNotifier {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let to: Mailbox = to
            .parse()
            .map_err(|_| NotifyError::InvalidAddress(to.to_string()))?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        let response = self
            .mailer
            .send(&email)
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        log::debug!("SMTP response: {:?}", response);
        Ok(())
    }
}

/// SMTP when the repository enables it, otherwise the repository outbox.
pub fn for_repo(repo: &Repository) -> Result<Box<dyn Notifier>> {
    let settings = &repo.config().notifications;
    if settings.uses_smtp() {
        Ok(Box::new(SmtpNotifier::from_settings(settings)?))
    } else {
        Ok(Box::new(OutboxNotifier::new(repo.outbox_path())))
    }
}
