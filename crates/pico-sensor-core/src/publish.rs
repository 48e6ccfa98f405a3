//! Minimal publish interface between the agent and an MQTT client crate.

use thiserror_no_std::Error;

/// Longest broker reason text kept in a [`PublishError`].
pub const REASON_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("not connected to broker")]
    NotConnected,
    #[error("network transport failed")]
    Transport,
    #[error("broker refused packet: {0}")]
    Rejected(heapless::String<REASON_LEN>),
}

/// Publish a payload to a topic with the client's default QoS.
pub trait Publisher {
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> impl Future<Output = Result<(), PublishError>>;
}
