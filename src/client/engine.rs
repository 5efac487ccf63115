//! Client engine
//!
//! `MessageQueue` is the application's handle on a broker session. It owns
//! the outgoing and incoming queues and runs two worker threads:
//! - the pusher drains outgoing requests and sends each one on its own connection
//! - the puller long-polls the client's mailbox and stages delivered messages
//!
//! Lifecycle: `Created -> Running -> Stopping -> Stopped`. Stopping sets the
//! shutdown flag, pushes the sentinel request onto the outgoing queue and
//! closes it, which releases a pusher parked in `pop`. The sentinel is a
//! publish to the reserved topic the client auto-subscribes to, so the broker
//! echoes it into the client's own mailbox and releases the puller's long
//! poll as well. If the puller is still blocked after the grace period its
//! connection is aborted.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};

use crate::client::backoff::Backoff;
use crate::client::shutdown::ShutdownSignal;
use crate::client::signal::{self, Readiness};
use crate::client::worker::{self, InFlight, Shared};
use crate::config::EngineSettings;
use crate::queue::Queue;
use crate::request::{Method, Request};
use crate::transport;
use crate::utils::{MqError, Result};

/// Reserved topic used for shutdown, and the exact payload of the sentinel.
pub const SENTINEL: &str = "SHUTDOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Created,
    Running,
    Stopping,
    Stopped,
}

struct Workers {
    pusher: JoinHandle<()>,
    puller: JoinHandle<()>,
    puller_done: Receiver<()>,
}

pub struct MessageQueue {
    host: String,
    port: u16,
    shared: Arc<Shared>,
    sentinel: Request,
    readiness: Readiness,
    state: Mutex<State>,
    stopped: Condvar,
    workers: Mutex<Option<Workers>>,
}

/// Names and topics end up as path segments in the request line.
fn is_valid_segment(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c == '/' || c.is_whitespace() || c.is_control())
}

fn check_topic(topic: &str) -> Result<()> {
    if is_valid_segment(topic) {
        Ok(())
    } else {
        Err(MqError::InvalidTopic(topic.to_string()))
    }
}

impl MessageQueue {
    /// Creates an engine with default engine settings. See [`with_settings`](Self::with_settings).
    pub fn create(name: &str, host: &str, port: u16) -> Result<Self> {
        Self::with_settings(name, host, port, EngineSettings::default())
    }

    /// Creates an engine for client `name` talking to the broker at `host:port`.
    ///
    /// The broker address is resolved here so a bad host or port is reported
    /// synchronously. The subscription to the reserved shutdown topic is
    /// queued before any application request.
    pub fn with_settings(
        name: &str,
        host: &str,
        port: u16,
        settings: EngineSettings,
    ) -> Result<Self> {
        if !is_valid_segment(name) {
            return Err(MqError::InvalidName(name.to_string()));
        }
        if port == 0 {
            return Err(MqError::InvalidAddress {
                address: format!("{host}:{port}"),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "port 0"),
            });
        }
        let addrs = transport::resolve(host, port)?;
        let (notifier, readiness) = signal::channel()?;
        let sentinel = Request::new(
            Method::Put,
            format!("/topic/{SENTINEL}"),
            Some(SENTINEL.to_string()),
        )?;

        let shared = Arc::new(Shared {
            name: name.to_string(),
            addrs,
            backoff: Backoff::from_settings(&settings.backoff),
            settings,
            outgoing: Queue::new(),
            incoming: Queue::new(),
            shutdown: ShutdownSignal::new(),
            notifier,
            in_flight: InFlight::default(),
        });

        let mq = Self {
            host: host.to_string(),
            port,
            shared,
            sentinel,
            readiness,
            state: Mutex::new(State::Created),
            stopped: Condvar::new(),
            workers: Mutex::new(None),
        };
        mq.subscribe(SENTINEL)?;
        info!(name, host, port, "message queue created");
        Ok(mq)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> State {
        *self.state.lock()
    }

    /// Handle that becomes readable once per delivered message.
    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Spawns the pusher and puller threads.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != State::Created {
            return Err(MqError::InvalidState {
                operation: "start",
                state: *state,
            });
        }

        let shared = self.shared.clone();
        let pusher = thread::Builder::new()
            .name("mq-pusher".into())
            .spawn(move || worker::run_pusher(shared))
            .map_err(MqError::Spawn)?;

        let (done_tx, puller_done) = mpsc::channel();
        let shared = self.shared.clone();
        let puller = match thread::Builder::new()
            .name("mq-puller".into())
            .spawn(move || worker::run_puller(shared, done_tx))
        {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.shutdown.trigger();
                self.shared.outgoing.close();
                let _ = pusher.join();
                *state = State::Stopped;
                return Err(MqError::Spawn(e));
            }
        };

        *self.workers.lock() = Some(Workers {
            pusher,
            puller,
            puller_done,
        });
        *state = State::Running;
        info!(name = %self.shared.name, "message queue started");
        Ok(())
    }

    /// Queues a publish of `body` to `topic`. No broker confirmation is awaited.
    pub fn publish(&self, topic: &str, body: &str) -> Result<()> {
        check_topic(topic)?;
        let request = Request::publish(&self.shared.name, topic, body)?;
        self.shared.outgoing.push(request);
        Ok(())
    }

    /// Queues a subscription. Repeated calls queue repeated requests.
    pub fn subscribe(&self, topic: &str) -> Result<()> {
        check_topic(topic)?;
        let request = Request::subscribe(&self.shared.name, topic)?;
        self.shared.outgoing.push(request);
        Ok(())
    }

    pub fn unsubscribe(&self, topic: &str) -> Result<()> {
        check_topic(topic)?;
        let request = Request::unsubscribe(&self.shared.name, topic)?;
        self.shared.outgoing.push(request);
        Ok(())
    }

    /// Blocks for the next delivered message.
    ///
    /// Returns `None` for the shutdown sentinel, which is absorbed, and once
    /// the engine has stopped and every staged message has been drained.
    pub fn retrieve(&self) -> Option<String> {
        self.shared.incoming.pop().and_then(Self::message_body)
    }

    /// Non-blocking form of [`retrieve`](Self::retrieve).
    pub fn try_retrieve(&self) -> Option<String> {
        self.shared.incoming.try_pop().and_then(Self::message_body)
    }

    /// Waits at most `timeout` for the next message.
    pub fn retrieve_timeout(&self, timeout: Duration) -> Option<String> {
        self.shared
            .incoming
            .pop_timeout(timeout)
            .and_then(Self::message_body)
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    fn message_body(request: Request) -> Option<String> {
        request.into_body().filter(|body| body != SENTINEL)
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.is_triggered()
    }

    /// Stops both workers and waits for them to exit.
    ///
    /// Stopping an engine that never started only closes its queues; stopping
    /// a stopped engine does nothing. A call that arrives while another stop is
    /// in progress waits for that one to finish.
    pub fn stop(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            match *state {
                State::Stopped => return Ok(()),
                State::Stopping => {
                    while *state != State::Stopped {
                        self.stopped.wait(&mut state);
                    }
                    return Ok(());
                }
                State::Created => {
                    *state = State::Stopped;
                    self.shared.shutdown.trigger();
                    self.shared.outgoing.close();
                    self.shared.incoming.close();
                    return Ok(());
                }
                State::Running => *state = State::Stopping,
            }
        }
        info!(name = %self.shared.name, "stopping message queue");

        self.shared.shutdown.trigger();
        self.shared.outgoing.push(self.sentinel.clone());
        self.shared.outgoing.close();

        let mut result = Ok(());
        if let Some(workers) = self.workers.lock().take() {
            if workers.pusher.join().is_err() {
                result = Err(MqError::WorkerPanicked("pusher"));
            }

            let grace = self.shared.settings.shutdown_grace();
            if let Err(RecvTimeoutError::Timeout) = workers.puller_done.recv_timeout(grace) {
                warn!(?grace, "puller still blocked after grace period, aborting poll");
                self.shared.in_flight.abort();
            }
            if workers.puller.join().is_err() && result.is_ok() {
                result = Err(MqError::WorkerPanicked("puller"));
            }
        }

        self.shared.incoming.close();
        *self.state.lock() = State::Stopped;
        self.stopped.notify_all();
        info!(name = %self.shared.name, "message queue stopped");
        result
    }
}

impl fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("name", &self.shared.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        if self.state() == State::Running {
            if let Err(e) = self.stop() {
                warn!(error = %e, "failed to stop message queue on drop");
            }
        }
    }
}
