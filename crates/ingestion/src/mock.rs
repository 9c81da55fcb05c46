//! Scripted transport for tests
//!
//! Plays back a fixed script of poll results, one step per `next_batch` call.
//! Supports failure injection for the handshake and conflict signals, so the
//! session manager's recovery paths can be exercised without an upstream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use contracts::{
    ChannelId, Identity, MembershipRole, MessageTransport, RawMessage, TransportError,
};

/// One scripted result of a `next_batch` call.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Deliver these messages
    Batch(Vec<RawMessage>),
    /// Long-poll timeout with nothing new
    Empty,
    /// Duplicate-session conflict
    Conflict,
    /// Transport-level failure that is not a conflict
    Unreachable,
}

/// Transport double driven by a [`ScriptStep`] queue.
///
/// An exhausted script behaves like a quiet upstream: short pause, empty
/// batch. That keeps the poll loop alive until the test stops the session.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptStep>>,
    fail_identify: AtomicBool,
    clear_calls: AtomicU32,
    role: Mutex<MembershipRole>,
    sent: Mutex<Vec<(ChannelId, String)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fail_identify: AtomicBool::new(false),
            clear_calls: AtomicU32::new(0),
            role: Mutex::new(MembershipRole::Administrator),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Make the next `identify` call fail.
    pub fn fail_identify(&self) {
        self.fail_identify.store(true, Ordering::SeqCst);
    }

    pub fn set_role(&self, role: MembershipRole) {
        *self.role.lock().unwrap_or_else(|e| e.into_inner()) = role;
    }

    /// How many times `clear_stale_session` was called.
    pub fn clear_calls(&self) -> u32 {
        self.clear_calls.load(Ordering::SeqCst)
    }

    /// Messages sent through `send_message`, in order.
    pub fn sent_messages(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn pop_step(&self) -> Option<ScriptStep> {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }
}

impl MessageTransport for ScriptedTransport {
    async fn identify(&self) -> Result<Identity, TransportError> {
        if self.fail_identify.swap(false, Ordering::SeqCst) {
            return Err(TransportError::unreachable("scripted identify failure"));
        }
        Ok(Identity {
            id: 42,
            username: "scripted_bot".to_string(),
            display_name: "Scripted".to_string(),
        })
    }

    async fn clear_stale_session(&self) -> Result<(), TransportError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_batch(
        &self,
        _cursor: u64,
        _max_items: usize,
        _timeout: Duration,
    ) -> Result<Vec<RawMessage>, TransportError> {
        match self.pop_step() {
            Some(ScriptStep::Batch(messages)) => Ok(messages),
            Some(ScriptStep::Empty) => {
                // pace like a real long-poll timeout would
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(Vec::new())
            }
            Some(ScriptStep::Conflict) => Err(TransportError::duplicate_session(
                "another poller holds this credential",
            )),
            Some(ScriptStep::Unreachable) => {
                Err(TransportError::unreachable("scripted outage"))
            }
            None => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn membership_role(
        &self,
        _channel: &ChannelId,
        _identity_id: i64,
    ) -> Result<MembershipRole, TransportError> {
        Ok(self.role.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn send_message(&self, channel: &ChannelId, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((channel.clone(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_plays_in_order() {
        let transport = ScriptedTransport::new(vec![
            ScriptStep::Empty,
            ScriptStep::Conflict,
        ]);

        let first = transport
            .next_batch(0, 10, Duration::from_millis(10))
            .await
            .unwrap();
        assert!(first.is_empty());

        let second = transport
            .next_batch(0, 10, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(second.is_conflict());
    }

    #[tokio::test]
    async fn test_identify_failure_is_one_shot() {
        let transport = ScriptedTransport::new(vec![]);
        transport.fail_identify();
        assert!(transport.identify().await.is_err());
        assert!(transport.identify().await.is_ok());
    }
}
