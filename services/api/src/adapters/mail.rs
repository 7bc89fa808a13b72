//! services/api/src/adapters/mail.rs
//!
//! The SMTP adapter implementing the `EmailService` port with `lettre`.
//! Templates are rendered to HTML here; the core only names them.

use async_trait::async_trait;
use coursehub_core::ports::{EmailMessage, EmailService, EmailTemplate, PortError, PortResult};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> PortResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| PortError::Unexpected(format!("smtp relay: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config.username.clone(),
        })
    }
}

/// Renders the HTML body of `template`.
pub fn render(template: &EmailTemplate) -> String {
    match template {
        EmailTemplate::Activation {
            name,
            activation_code,
        } => format!(
            "<html><body>\
             <h2>Welcome to CourseHub</h2>\
             <p>Hello {name},</p>\
             <p>Thank you for registering. Use the code below to activate your account:</p>\
             <h1 style=\"letter-spacing:6px\">{activation_code}</h1>\
             <p>This code expires in 5 minutes.</p>\
             </body></html>"
        ),
        EmailTemplate::QuestionReply { name, title } => format!(
            "<html><body>\
             <p>Hello {name},</p>\
             <p>A new reply has been added to your question in the video <b>{title}</b>.</p>\
             <p>Log in to see the answer.</p>\
             </body></html>"
        ),
    }
}

#[async_trait]
impl EmailService for SmtpMailer {
    async fn send_email(&self, message: &EmailMessage) -> PortResult<()> {
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| PortError::Unexpected(format!("sender address: {e}")))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|e| PortError::Unexpected(format!("recipient address: {e}")))?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(render(&message.template))
            .map_err(|e| PortError::Unexpected(format!("build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| PortError::Unexpected(format!("smtp send: {e}")))?;
        tracing::info!("Sent {} email to {}", message.template.name(), message.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_mail_contains_the_code() {
        let html = render(&EmailTemplate::Activation {
            name: "Ada".into(),
            activation_code: "4821".into(),
        });
        assert!(html.contains("Ada"));
        assert!(html.contains("4821"));
    }

    #[test]
    fn reply_mail_names_the_video() {
        let html = render(&EmailTemplate::QuestionReply {
            name: "Ada".into(),
            title: "Ownership".into(),
        });
        assert!(html.contains("Ownership"));
    }
}
