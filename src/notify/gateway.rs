//! Messaging-gateway notification channel.
//!
//! The utility's email/SMS/WhatsApp traffic all goes through one hosted
//! messaging gateway with a per-transport route: `POST {base}/v1/send/{kind}`
//! with a JSON body of `{to, subject, body}` and a bearer key. One struct
//! per configured transport; the service holds up to three of these.

use serde::Serialize;

use crate::model::{ChannelKind, Recipient};
use crate::notify::{NotificationChannel, NotifyError};

#[derive(Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

pub struct MessagingGatewayChannel {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    kind: ChannelKind,
}

impl MessagingGatewayChannel {
    pub fn new(base_url: &str, api_key: Option<String>, kind: ChannelKind) -> Self {
        MessagingGatewayChannel {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            kind,
        }
    }

    fn send_url(&self) -> String {
        format!("{}/v1/send/{}", self.base_url, self.kind)
    }
}

impl NotificationChannel for MessagingGatewayChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn send(&self, recipient: &Recipient, subject: &str, body: &str) -> Result<(), NotifyError> {
        let to = recipient
            .address_for(self.kind)
            .ok_or_else(|| NotifyError::NoAddress {
                recipient_id: recipient.id.clone(),
                kind: self.kind,
            })?;

        let mut request = self.client.post(self.send_url()).json(&SendRequest {
            to,
            subject,
            body,
        });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::HttpError(response.status().as_u16()));
        }
        Ok(())
    }
}
