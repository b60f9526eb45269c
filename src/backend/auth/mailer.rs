/**
 * OTP Delivery
 *
 * Codes leave the server through an `OtpSender`. The server picks a sender
 * per channel at startup:
 *
 * - `SmtpSender` relays email codes through a configured SMTP server,
 * - `LogSender` writes codes to the server log (development, and the phone
 *   channel until an SMS gateway is wired in).
 */

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::backend::auth::otp::OtpChannel;
use crate::shared::{AppConfig, SmtpConfig};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("channel {0:?} is not supported by this sender")]
    UnsupportedChannel(OtpChannel),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Delivers one-time codes to users
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn deliver(&self, channel: OtpChannel, destination: &str, code: &str) -> Result<(), DeliveryError>;
}

/// Writes codes to the log instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogSender;

#[async_trait]
impl OtpSender for LogSender {
    async fn deliver(&self, channel: OtpChannel, destination: &str, code: &str) -> Result<(), DeliveryError> {
        tracing::info!("OTP for {} {}: {}", channel.as_str(), destination, code);
        Ok(())
    }
}

/// Sends email codes through an SMTP relay
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::Address(e.to_string()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl OtpSender for SmtpSender {
    async fn deliver(&self, channel: OtpChannel, destination: &str, code: &str) -> Result<(), DeliveryError> {
        if channel != OtpChannel::Email {
            return Err(DeliveryError::UnsupportedChannel(channel));
        }
        let to = destination
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::Address(e.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Your verification code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Your verification code is {}. It expires shortly; do not share it with anyone.",
                code
            ))
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        tracing::info!("Sent email OTP to {}", destination);
        Ok(())
    }
}

/// Dispatches each channel to its own sender
pub struct ChannelRouter {
    email: Arc<dyn OtpSender>,
    phone: Arc<dyn OtpSender>,
}

impl ChannelRouter {
    pub fn new(email: Arc<dyn OtpSender>, phone: Arc<dyn OtpSender>) -> Self {
        Self { email, phone }
    }
}

#[async_trait]
impl OtpSender for ChannelRouter {
    async fn deliver(&self, channel: OtpChannel, destination: &str, code: &str) -> Result<(), DeliveryError> {
        match channel {
            OtpChannel::Email => self.email.deliver(channel, destination, code).await,
            OtpChannel::Phone => self.phone.deliver(channel, destination, code).await,
        }
    }
}

/// Build the sender described by the configuration
pub fn sender_from_config(config: &AppConfig) -> Result<Arc<dyn OtpSender>, DeliveryError> {
    let log: Arc<dyn OtpSender> = Arc::new(LogSender);
    let email = match &config.smtp {
        Some(smtp) => Arc::new(SmtpSender::new(smtp)?) as Arc<dyn OtpSender>,
        None => {
            tracing::warn!("SMTP not configured; email OTPs will only be logged");
            log.clone()
        }
    };
    Ok(Arc::new(ChannelRouter::new(email, log)))
}
