use super::NotificationTemplates;
use sendgrid::SGClient;
use sendgrid::{Destination, Mail};
use std::env;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct EmailNotifier {
    sendgrid_client: Option<SGClient>,
    email_from: String,
}

impl EmailNotifier {
    pub fn new() -> Self {
        let sendgrid_api_key = env::var("SENDGRID_API_KEY").ok();
        let email_from = env::var("AUTH_EMAIL_FROM")
            .unwrap_or_else(|_| "no-reply@soriai.app".to_string());

        let sendgrid_client = sendgrid_api_key.map(SGClient::new);
        if sendgrid_client.is_none() {
            warn!("SendGrid API key not found. Auth code emails will be mocked.");
        }

        Self {
            sendgrid_client,
            email_from,
        }
    }

    /// Sends the 6-digit sign-in code. Failure here means the guardian
    /// never receives a code, so the caller surfaces it as a 500.
    pub async fn send_auth_code(&self, to_email: &str, code: &str) -> Result<(), String> {
        let subject = format!("[소리ai] 인증 코드: {}", code);
        let body = NotificationTemplates::auth_code_email(code);
        self.send_email(to_email, &subject, &body).await
    }

    pub async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), String> {
        if let Some(client) = &self.sendgrid_client {
            // Must own data to move into the blocking task
            let to_email = to_email.to_string();
            let subject = subject.to_string();
            let body = body.to_string();
            let email_from = self.email_from.clone();
            let client = client.clone();
            let to_email_log = to_email.clone();

            match tokio::task::spawn_blocking(move || {
                let mail_info = Mail::new()
                    .add_to(Destination {
                        address: &to_email,
                        name: "소리ai 보호자",
                    })
                    .add_from(&email_from)
                    .add_subject(&subject)
                    .add_html(&body);

                client.send(mail_info)
            })
            .await
            {
                Ok(result) => match result {
                    Ok(_) => {
                        info!("Auth email sent to {}", to_email_log);
                        crate::metrics::increment_auth_emails("ok");
                        Ok(())
                    }
                    Err(e) => {
                        error!("Failed to send email to {}: {}", to_email_log, e);
                        crate::metrics::increment_auth_emails("failed");
                        Err(format!("SendGrid Error: {}", e))
                    }
                },
                Err(e) => Err(format!("Task Join Error: {}", e)),
            }
        } else {
            // Mock mode
            info!("(Mock) Would send email to: {}", to_email);
            info!("(Mock) Subject: {}", subject);
            info!("(Mock) Body length: {} chars", body.len());
            crate::metrics::increment_auth_emails("ok");
            Ok(())
        }
    }
}

impl Default for EmailNotifier {
    fn default() -> Self {
        Self::new()
    }
}
