use lettre::{
    message::{header::ContentType, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};

use crate::config::SmtpConfig;

#[derive(Clone)]
pub struct Mailer {
    host: String,
    username: Option<String>,
    password: Option<String>,
    from: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            from: config.from.clone(),
        }
    }

    pub fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let email = Message::builder()
            .from(self
                .from
                .parse()
                .map_err(|e| format!("Invalid from address: {e}"))?)
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        let mailer = if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            let creds = Credentials::new(user.clone(), pass.clone());
            SmtpTransport::relay(&self.host)
                .map_err(|e| format!("SMTP relay error: {e}"))?
                .credentials(creds)
                .build()
        } else {
            SmtpTransport::builder_dangerous(&self.host).build()
        };

        mailer
            .send(&email)
            .map_err(|e| format!("Failed to send email: {e}"))?;
        Ok(())
    }
}
