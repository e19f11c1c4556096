use crate::{config::Config, error::{AppError, Result}};
use lettre::{
    message::Mailbox,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, error, info};

/// 邮件发送服务
///
/// Renders a plain-text subject/body and hands off to the SMTP transport.
/// Send failures propagate to the caller; there is no retry here.
#[derive(Clone)]
pub struct EmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailSender {
    pub fn new(config: &Config) -> Result<Self> {
        let transport = Self::build_transport(config)?;
        let from = format!("{} <{}>", config.smtp_from_name, config.smtp_from_email)
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid from address: {}", e)))?;

        Ok(Self { transport, from })
    }

    fn build_transport(config: &Config) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = if config.smtp_use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| AppError::Email(format!("Failed to create SMTP relay: {}", e)))?
                .port(config.smtp_port)
        } else {
            // 本地开发服务器（Mailpit等）无TLS
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
        };

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(builder.build())
    }

    fn build_message(&self, subject: &str, body: &str, recipients: &[String]) -> Result<Message> {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);

        for recipient in recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| AppError::Email(format!("Invalid recipient '{}': {}", recipient, e)))?;
            builder = builder.to(to);
        }

        builder
            .body(body.to_string())
            .map_err(|e| AppError::Email(format!("Failed to build email message: {}", e)))
    }

    pub async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()> {
        debug!("Sending email '{}' to {} recipient(s)", subject, recipients.len());

        let message = self.build_message(subject, body, recipients)?;

        self.transport.send(message).await.map_err(|e| {
            error!("Failed to send email '{}': {}", subject, e);
            AppError::Email(format!("SMTP send failed: {}", e))
        })?;

        info!("Email '{}' sent successfully", subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> EmailSender {
        EmailSender::new(&Config::default()).unwrap()
    }

    // 构建SMTP传输需要Tokio运行时
    #[tokio::test]
    async fn test_build_message_with_valid_recipient() {
        let message = sender().build_message(
            "Password reset.",
            "Complete password reset via the link:\n\nhttp://localhost/reset",
            &["sample@gmail.com".to_string()],
        );
        assert!(message.is_ok());
    }

    #[tokio::test]
    async fn test_build_message_rejects_invalid_recipient() {
        let message = sender().build_message("Subject", "Body", &["not-an-address".to_string()]);
        assert!(message.is_err());
    }
}
