use crate::{
    env_flag, env_list, env_optional, env_or_default, env_parse, env_required, ConfigError,
    FromEnv,
};

/// Mail account and delivery settings.
#[derive(Clone, Debug)]
pub struct MailSettings {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    /// Authenticate against the SMTP server with username/password
    pub smtp_auth: bool,
    /// Upgrade the connection with STARTTLS
    pub starttls: bool,
    /// When false nothing is sent, messages are only logged (dry-run)
    pub enabled: bool,
    /// Addresses blind-copied on every outgoing message
    pub bcc_all: Vec<String>,
    pub sender_name: Option<String>,
    pub sender_address: Option<String>,
}

impl MailSettings {
    pub fn new(username: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: String::new(),
            host: host.into(),
            port: 587,
            smtp_auth: true,
            starttls: true,
            enabled: true,
            bcc_all: Vec::new(),
            sender_name: None,
            sender_address: None,
        }
    }

    /// Sender/reply-to address, falling back to the account username.
    pub fn sender_address(&self) -> &str {
        self.sender_address.as_deref().unwrap_or(&self.username)
    }

    /// Sender display name, falling back to the account username.
    pub fn sender_name(&self) -> &str {
        self.sender_name.as_deref().unwrap_or(&self.username)
    }
}

impl FromEnv for MailSettings {
    /// Reads from environment variables:
    /// - MAIL_USERNAME, MAIL_HOST: required
    /// - MAIL_PASSWORD: defaults to empty
    /// - MAIL_PORT: defaults to 587
    /// - MAIL_SMTP_AUTH, MAIL_SMTP_STARTTLS, MAIL_ENABLE: default to true
    /// - MAIL_BCC_ALL: comma-separated, optional
    /// - MAIL_SENDER_NAME, MAIL_SENDER_ADDRESS: optional, fall back to MAIL_USERNAME
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            username: env_required("MAIL_USERNAME")?,
            password: env_or_default("MAIL_PASSWORD", ""),
            host: env_required("MAIL_HOST")?,
            port: env_parse("MAIL_PORT", 587)?,
            smtp_auth: env_flag("MAIL_SMTP_AUTH", true)?,
            starttls: env_flag("MAIL_SMTP_STARTTLS", true)?,
            enabled: env_flag("MAIL_ENABLE", true)?,
            bcc_all: env_list("MAIL_BCC_ALL"),
            sender_name: env_optional("MAIL_SENDER_NAME"),
            sender_address: env_optional("MAIL_SENDER_ADDRESS"),
        })
    }
}
