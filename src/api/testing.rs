//! Scripted transport for exercising request policy without a network.

use super::transport::{RawResponse, Transport, TransportError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// What the transport does on one call.
#[derive(Debug, Clone)]
pub enum Step {
    Respond(RawResponse),
    Fail(TransportError),
    /// Never completes; only a timeout or cancellation ends the call.
    Hang,
}

/// Plays back `steps` in order; the last step repeats forever.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    log: Mutex<Vec<(Instant, String)>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        assert!(!steps.is_empty(), "a script needs at least one step");
        Self {
            steps: Mutex::new(steps.into()),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.log.lock().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.log.lock().iter().map(|(_, url)| url.clone()).collect()
    }

    pub fn last_url(&self) -> Option<String> {
        self.log.lock().last().map(|(_, url)| url.clone())
    }

    /// Time between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.log
            .lock()
            .windows(2)
            .map(|pair| pair[1].0 - pair[0].0)
            .collect()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock();
        if steps.len() > 1 {
            steps.pop_front().unwrap_or(Step::Hang)
        } else {
            steps.front().cloned().unwrap_or(Step::Hang)
        }
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        self.log.lock().push((Instant::now(), url.to_string()));
        match self.next_step() {
            Step::Respond(raw) => Ok(raw),
            Step::Fail(err) => Err(err),
            Step::Hang => std::future::pending().await,
        }
    }
}
