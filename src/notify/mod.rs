/// Notification transports for alerts and broadcasts.
///
/// Channels are polymorphic capabilities behind [`NotificationChannel`],
/// so the alerting and broadcast logic can be exercised with in-memory
/// fakes and production can route through whatever messaging gateway the
/// utility contracts with. No vendor SDK leaks past this boundary.
///
/// Submodules:
/// - `console` — log-only channel for dev mode.
/// - `gateway` — HTTP messaging-gateway channel (email/SMS/WhatsApp).
/// - `dispatch` — alert fan-out across rules, recipients, and channels.

pub mod console;
pub mod dispatch;
pub mod gateway;

use crate::model::{ChannelKind, Recipient};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from a single delivery attempt. Always non-fatal to the
/// pipeline: dispatch logs these and carries on with the next recipient.
#[derive(Debug)]
pub enum NotifyError {
    /// Non-2xx from the messaging gateway.
    HttpError(u16),
    /// Transport-level failure (connect, timeout, serialisation).
    Transport(String),
    /// The recipient has no address for this channel.
    NoAddress { recipient_id: String, kind: ChannelKind },
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::HttpError(code) => write!(f, "HTTP error: {}", code),
            NotifyError::Transport(msg) => write!(f, "transport error: {}", msg),
            NotifyError::NoAddress { recipient_id, kind } => {
                write!(f, "recipient {} has no {} address", recipient_id, kind)
            }
        }
    }
}

impl std::error::Error for NotifyError {}

// ---------------------------------------------------------------------------
// Channel capability
// ---------------------------------------------------------------------------

/// One notification transport. Implementations are synchronous and must
/// not panic on delivery failure; they report it.
pub trait NotificationChannel {
    /// Which transport this channel carries.
    fn kind(&self) -> ChannelKind;

    /// Delivers one message to one recipient.
    fn send(&self, recipient: &Recipient, subject: &str, body: &str) -> Result<(), NotifyError>;
}
