//! Message-bus contract (spec.md §6.4): publish is fire-and-forget, safe
//! for concurrent calls.

use crate::error::PubError;
use async_trait::async_trait;
use log::info;
use std::sync::Mutex;

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), PubError>;
}

/// No-op publisher used when no message bus is configured.
pub struct NullPublisher;

#[async_trait]
impl Publisher for NullPublisher {
    async fn publish(&self, _subject: &str, _payload: &[u8]) -> Result<(), PubError> {
        Ok(())
    }
}

/// Logs every publish instead of discarding it, so a standalone run without
/// a configured message bus still surfaces what would have been sent.
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), PubError> {
        info!("publish subject={subject} payload_bytes={}", payload.len());
        Ok(())
    }
}

/// Records every call for test assertions.
#[derive(Default)]
pub struct InMemoryPublisher {
    pub messages: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), PubError> {
        self.messages.lock().unwrap().push((subject.to_owned(), payload.to_vec()));
        Ok(())
    }
}

pub fn last_point_subject(imei: &str) -> String {
    format!("device.lastpoint.{imei}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_publisher_never_fails() {
        let pub_ = LogPublisher;
        assert!(pub_.publish("device.lastpoint.123", b"payload").await.is_ok());
    }

    #[test]
    fn last_point_subject_is_namespaced_by_imei() {
        assert_eq!(last_point_subject("123456789012345"), "device.lastpoint.123456789012345");
    }
}
