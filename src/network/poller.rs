use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::common::{ChatError, MessagePage, SessionId};

use super::transport::ChatTransport;

/// Result of one poll tick. `Err` carries the reason from an `{"error": ...}`
/// response; transport failures never reach the callback.
#[derive(Debug, Clone, PartialEq)]
pub struct PollTick {
    pub session_id: SessionId,
    pub outcome: Result<MessagePage, String>,
}

/// Running poll task. Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct PollHandle {
    session_id: SessionId,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Fetches the message list of one session on a fixed interval. At most one
/// timer is alive per poller: `start` replaces, it never stacks.
pub struct SessionPoller {
    transport: Arc<dyn ChatTransport>,
    interval: Duration,
    handle: Option<PollHandle>,
}

impl SessionPoller {
    pub fn new(transport: Arc<dyn ChatTransport>, interval: Duration) -> Self {
        Self {
            transport,
            interval,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.handle.as_ref().map(PollHandle::session_id)
    }

    /// Starts polling `session_id`, stopping any previous timer first. The
    /// first fetch happens one interval from now. Must be called from inside
    /// a tokio runtime.
    pub fn start<F>(&mut self, session_id: SessionId, on_tick: F)
    where
        F: Fn(PollTick) + Send + Sync + 'static,
    {
        self.stop();

        let transport = Arc::clone(&self.transport);
        let interval = self.interval;
        let id = session_id.clone();
        let first_tick = Instant::now() + interval;
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match transport.fetch_messages(&id).await {
                    Ok(page) => on_tick(PollTick {
                        session_id: id.clone(),
                        outcome: Ok(page),
                    }),
                    Err(ChatError::Server(reason)) => on_tick(PollTick {
                        session_id: id.clone(),
                        outcome: Err(reason),
                    }),
                    Err(err) => {
                        log::warn!("Poll for chat session {id} failed: {err}");
                    }
                }
            }
        });

        log::debug!(
            "Polling chat session {session_id} every {}ms",
            interval.as_millis()
        );
        self.handle = Some(PollHandle { session_id, task });
    }

    /// Cancels the timer. Calling it on a stopped poller does nothing.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("Stopped polling chat session {}", handle.session_id());
            handle.cancel();
        }
    }
}

impl Drop for SessionPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
