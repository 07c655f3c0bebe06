//! Log-only notification channel for development mode.
//!
//! Stands in for a real transport when no messaging gateway is
//! configured: every send is logged and reported as delivered.

use crate::logging;
use crate::model::{ChannelKind, Recipient};
use crate::notify::{NotificationChannel, NotifyError};

pub struct ConsoleChannel {
    kind: ChannelKind,
}

impl ConsoleChannel {
    pub fn new(kind: ChannelKind) -> Self {
        ConsoleChannel { kind }
    }
}

impl NotificationChannel for ConsoleChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn send(&self, recipient: &Recipient, subject: &str, _body: &str) -> Result<(), NotifyError> {
        let address = recipient
            .address_for(self.kind)
            .ok_or_else(|| NotifyError::NoAddress {
                recipient_id: recipient.id.clone(),
                kind: self.kind,
            })?;

        logging::info(
            logging::Component::Notify,
            None,
            &format!("[dev {}] to {} <{}>: {}", self.kind, recipient.name, address, subject),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn recipient_with_email_only() -> Recipient {
        Recipient {
            id: "R100".to_string(),
            name: "Test Recipient".to_string(),
            email: Some("test@kandavara.gov.in".to_string()),
            phone: None,
            whatsapp: None,
            groups: vec![],
            active: true,
            created_at: Utc::now(),
            last_notified: None,
        }
    }

    #[test]
    fn test_send_succeeds_when_address_present() {
        let channel = ConsoleChannel::new(ChannelKind::Email);
        let result = channel.send(&recipient_with_email_only(), "subject", "body");
        assert!(result.is_ok());
    }

    #[test]
    fn test_send_reports_missing_address() {
        let channel = ConsoleChannel::new(ChannelKind::Sms);
        let err = channel
            .send(&recipient_with_email_only(), "subject", "body")
            .unwrap_err();
        assert!(matches!(err, NotifyError::NoAddress { .. }));
    }
}
