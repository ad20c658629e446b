#![allow(dead_code)]

use parking_lot::Mutex;
use rask_remote_logger::sender::{ConnectionFactory, OutboundRequest, Payload, TransportError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use url::Url;

/// What the scripted collector does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Reject the first `n` requests with 503, accept the rest.
    FailFirst(usize),
    /// Never answer.
    Stall,
    /// Accept every request after holding it for the given time.
    Delay(Duration),
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub attempts: Mutex<Vec<Instant>>,
    pub delivered: Mutex<Vec<String>>,
    pub bodies: Mutex<Vec<serde_json::Value>>,
    pub failures: AtomicUsize,
}

/// In-memory collector that records every delivery attempt.
pub struct ScriptedFactory {
    behaviour: Behaviour,
    remaining_failures: Arc<AtomicUsize>,
    pub recorded: Arc<Recorded>,
}

impl ScriptedFactory {
    pub fn new(behaviour: Behaviour) -> Self {
        let failures = match behaviour {
            Behaviour::FailFirst(n) => n,
            Behaviour::Stall | Behaviour::Delay(_) => 0,
        };
        Self {
            behaviour,
            remaining_failures: Arc::new(AtomicUsize::new(failures)),
            recorded: Arc::new(Recorded::default()),
        }
    }

    pub fn accept_all() -> Self {
        Self::new(Behaviour::FailFirst(0))
    }
}

pub struct ScriptedRequest {
    behaviour: Behaviour,
    remaining_failures: Arc<AtomicUsize>,
    recorded: Arc<Recorded>,
}

impl OutboundRequest for ScriptedRequest {
    async fn send(self, payload: Payload) -> Result<u16, TransportError> {
        self.recorded.attempts.lock().push(Instant::now());

        match self.behaviour {
            Behaviour::Stall => return std::future::pending().await,
            Behaviour::Delay(delay) => tokio::time::sleep(delay).await,
            Behaviour::FailFirst(_) => {}
        }

        let should_fail = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            self.recorded.failures.fetch_add(1, Ordering::SeqCst);
            return Ok(503);
        }

        let body: serde_json::Value = serde_json::from_slice(&payload.body)?;
        let message = body["message"].as_str().unwrap_or_default().to_string();
        self.recorded.delivered.lock().push(message);
        self.recorded.bodies.lock().push(body);
        Ok(200)
    }
}

impl ConnectionFactory for ScriptedFactory {
    type Request = ScriptedRequest;

    fn create(&self, _endpoint: &Url) -> Result<ScriptedRequest, TransportError> {
        Ok(ScriptedRequest {
            behaviour: self.behaviour,
            remaining_failures: self.remaining_failures.clone(),
            recorded: self.recorded.clone(),
        })
    }
}

/// Poll `condition` every 5ms until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
