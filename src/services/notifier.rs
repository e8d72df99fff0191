use crate::config::AppConfig;
use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use tracing::info;

/// Outbound email. Every call is best-effort: callers dispatch sends with
/// `tokio::spawn` after the state transition commits, and a failed send is
/// logged but never rolls the transition back.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_verification(&self, to: &str, name: &str, token: &str) -> Result<()>;
    async fn send_welcome(&self, to: &str, name: &str) -> Result<()>;
    async fn send_claim_submitted(&self, to: &str, name: &str, item_title: &str) -> Result<()>;
    async fn send_claim_approved(
        &self,
        to: &str,
        name: &str,
        item_title: &str,
        notes: Option<&str>,
    ) -> Result<()>;
    async fn send_claim_rejected(
        &self,
        to: &str,
        name: &str,
        item_title: &str,
        notes: Option<&str>,
    ) -> Result<()>;
    async fn send_listing_claimed(
        &self,
        to: &str,
        name: &str,
        item_title: &str,
        pickup_location: Option<&str>,
    ) -> Result<()>;
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    frontend_url: String,
}

impl SmtpNotifier {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.smtp_from.parse()?,
            frontend_url: config.frontend_url.clone(),
        })
    }

    async fn send_html(&self, to: &str, subject: &str, html: String) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        self.transport.send(message).await?;
        info!("📧 Email '{}' sent to {}", subject, to);
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_verification(&self, to: &str, name: &str, token: &str) -> Result<()> {
        let url = format!("{}/verify-email?token={}", self.frontend_url, token);
        let html = format!(
            "<h2>Hi {name},</h2>\
             <p>Thank you for registering with Campus Lost &amp; Found!</p>\
             <p>Please verify your email address: <a href=\"{url}\">Verify Email Address</a></p>\
             <p><strong>This link will expire in 24 hours.</strong></p>\
             <p>If you didn't create an account, please ignore this email.</p>"
        );
        self.send_html(to, "Verify Your Lost & Found Account", html)
            .await
    }

    async fn send_welcome(&self, to: &str, name: &str) -> Result<()> {
        let html = format!(
            "<h2>Hi {name},</h2>\
             <p>Your email has been verified successfully!</p>\
             <p>You can now report lost items, report found items, browse and \
             search items, and claim items that belong to you.</p>\
             <p><a href=\"{}/login\">Login to get started</a></p>",
            self.frontend_url
        );
        self.send_html(to, "Welcome to Campus Lost & Found!", html)
            .await
    }

    async fn send_claim_submitted(&self, to: &str, name: &str, item_title: &str) -> Result<()> {
        let html = format!(
            "<h2>Hi {name},</h2>\
             <p>Someone submitted an ownership claim on your found item \
             <strong>{item_title}</strong>. An administrator will review it.</p>"
        );
        self.send_html(to, "New claim on your found item", html).await
    }

    async fn send_claim_approved(
        &self,
        to: &str,
        name: &str,
        item_title: &str,
        notes: Option<&str>,
    ) -> Result<()> {
        let notes_html = notes
            .map(|n| format!("<p>Reviewer notes: {n}</p>"))
            .unwrap_or_default();
        let html = format!(
            "<h2>Hi {name},</h2>\
             <p>Your claim on <strong>{item_title}</strong> has been approved.</p>\
             {notes_html}\
             <p>Please contact the finder to arrange pickup.</p>"
        );
        self.send_html(to, "Your claim was approved", html).await
    }

    async fn send_claim_rejected(
        &self,
        to: &str,
        name: &str,
        item_title: &str,
        notes: Option<&str>,
    ) -> Result<()> {
        let notes_html = notes
            .map(|n| format!("<p>Reviewer notes: {n}</p>"))
            .unwrap_or_default();
        let html = format!(
            "<h2>Hi {name},</h2>\
             <p>Your claim on <strong>{item_title}</strong> was not approved.</p>\
             {notes_html}"
        );
        self.send_html(to, "Your claim was rejected", html).await
    }

    async fn send_listing_claimed(
        &self,
        to: &str,
        name: &str,
        item_title: &str,
        pickup_location: Option<&str>,
    ) -> Result<()> {
        let pickup_html = pickup_location
            .map(|p| format!("<p>Pickup location: <strong>{p}</strong></p>"))
            .unwrap_or_default();
        let html = format!(
            "<h2>Hi {name},</h2>\
             <p>You claimed <strong>{item_title}</strong> from the marketplace.</p>\
             {pickup_html}"
        );
        self.send_html(to, "Marketplace item claimed", html).await
    }
}

/// Logs instead of sending. Used in development and tests.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification(&self, to: &str, _name: &str, token: &str) -> Result<()> {
        info!("📧 [log notifier] verification email to {} token={}", to, token);
        Ok(())
    }

    async fn send_welcome(&self, to: &str, _name: &str) -> Result<()> {
        info!("📧 [log notifier] welcome email to {}", to);
        Ok(())
    }

    async fn send_claim_submitted(&self, to: &str, _name: &str, item_title: &str) -> Result<()> {
        info!("📧 [log notifier] claim-submitted email to {} for '{}'", to, item_title);
        Ok(())
    }

    async fn send_claim_approved(
        &self,
        to: &str,
        _name: &str,
        item_title: &str,
        _notes: Option<&str>,
    ) -> Result<()> {
        info!("📧 [log notifier] approval email to {} for '{}'", to, item_title);
        Ok(())
    }

    async fn send_claim_rejected(
        &self,
        to: &str,
        _name: &str,
        item_title: &str,
        _notes: Option<&str>,
    ) -> Result<()> {
        info!("📧 [log notifier] rejection email to {} for '{}'", to, item_title);
        Ok(())
    }

    async fn send_listing_claimed(
        &self,
        to: &str,
        _name: &str,
        item_title: &str,
        _pickup_location: Option<&str>,
    ) -> Result<()> {
        info!("📧 [log notifier] listing-claimed email to {} for '{}'", to, item_title);
        Ok(())
    }
}

pub fn create_notifier(config: &AppConfig) -> Arc<dyn Notifier> {
    match config.notifier_type.as_str() {
        "smtp" => match SmtpNotifier::new(config) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                tracing::warn!("⚠️  SMTP notifier setup failed ({}), falling back to log", e);
                Arc::new(LogNotifier)
            }
        },
        _ => Arc::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier;
        assert!(
            notifier
                .send_verification("a@illinois.edu", "A", "tok")
                .await
                .is_ok()
        );
        assert!(
            notifier
                .send_claim_approved("a@illinois.edu", "A", "Wallet", Some("ok"))
                .await
                .is_ok()
        );
    }

    #[test]
    fn test_create_notifier_defaults_to_log() {
        let config = AppConfig::development();
        // Just checks construction succeeds; the concrete type is opaque.
        let _ = create_notifier(&config);
    }
}
