//! The pusher and puller loops.
//!
//! Both loops open a fresh connection per exchange. Connection failures are
//! retried with backoff and never reach the application; a failed exchange is
//! logged and discarded.

use std::io::{self, BufReader};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::Sender;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::backoff::Backoff;
use crate::client::shutdown::ShutdownSignal;
use crate::client::signal::Notifier;
use crate::config::EngineSettings;
use crate::queue::Queue;
use crate::request::{Request, parse_response};
use crate::transport;
use crate::utils::Result;

/// State shared between the engine handle and its two workers.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) name: String,
    pub(crate) addrs: Vec<SocketAddr>,
    pub(crate) settings: EngineSettings,
    pub(crate) backoff: Backoff,
    pub(crate) outgoing: Queue<Request>,
    pub(crate) incoming: Queue<Request>,
    pub(crate) shutdown: ShutdownSignal,
    pub(crate) notifier: Notifier,
    pub(crate) in_flight: InFlight,
}

/// The puller's current connection, kept so `stop` can abort a poll the
/// broker never answers.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    slot: Mutex<InFlightSlot>,
}

#[derive(Debug, Default)]
struct InFlightSlot {
    stream: Option<TcpStream>,
    aborted: bool,
}

impl InFlight {
    fn register(&self, stream: &TcpStream) -> io::Result<()> {
        let handle = stream.try_clone()?;
        let mut slot = self.slot.lock();
        if slot.aborted {
            let _ = handle.shutdown(Shutdown::Both);
        } else {
            slot.stream = Some(handle);
        }
        Ok(())
    }

    fn clear(&self) {
        self.slot.lock().stream = None;
    }

    /// Shuts down the registered connection and any connection registered later.
    pub(crate) fn abort(&self) {
        let mut slot = self.slot.lock();
        slot.aborted = true;
        if let Some(stream) = slot.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// Connects to the broker, backing off between failures.
///
/// Once shutdown has been requested a single failed attempt gives up, so a
/// stopping engine cannot spin forever against an unreachable broker.
fn connect_with_backoff(shared: &Shared, role: &'static str) -> Option<TcpStream> {
    let mut failures: u32 = 0;
    loop {
        match transport::connect(&shared.addrs, shared.settings.connect_timeout()) {
            Ok(stream) => {
                if failures > 0 {
                    debug!(role, failures, "reconnected to broker");
                }
                return Some(stream);
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                if shared.shutdown.is_triggered() {
                    debug!(role, error = %e, "connect failed during shutdown, giving up");
                    return None;
                }
                if shared.backoff.should_warn(failures) {
                    warn!(role, failures, error = %e, "broker unreachable, still retrying");
                } else {
                    debug!(role, failures, error = %e, "connect failed");
                }
                shared.shutdown.wait_timeout(shared.backoff.delay(failures - 1));
            }
        }
    }
}

/// Drains the outgoing queue until it is closed and empty.
pub(crate) fn run_pusher(shared: Arc<Shared>) {
    info!(name = %shared.name, "pusher started");
    while let Some(request) = shared.outgoing.pop() {
        let Some(stream) = connect_with_backoff(&shared, "pusher") else {
            warn!(
                method = %request.method(),
                resource = request.resource(),
                "dropping request, broker unreachable during shutdown"
            );
            continue;
        };
        match transmit(&shared, stream, &request) {
            Ok(()) => debug!(method = %request.method(), resource = request.resource(), "request sent"),
            Err(e) => debug!(
                method = %request.method(),
                resource = request.resource(),
                error = %e,
                "push exchange failed"
            ),
        }
    }
    info!(name = %shared.name, "pusher stopped");
}

/// Sends one request and discards whatever the broker answers.
fn transmit(shared: &Shared, mut stream: TcpStream, request: &Request) -> io::Result<()> {
    stream.set_read_timeout(shared.settings.response_timeout())?;
    request.write_to(&mut stream)?;
    io::copy(&mut stream, &mut io::sink())?;
    Ok(())
}

/// Polls the mailbox until shutdown is observed.
///
/// `_done` is dropped on exit, which is how `stop` learns the puller is gone.
pub(crate) fn run_puller(shared: Arc<Shared>, _done: Sender<()>) {
    let poll = match Request::poll(&shared.name) {
        Ok(poll) => poll,
        Err(e) => {
            error!(error = %e, "cannot build mailbox poll");
            return;
        }
    };
    info!(name = %shared.name, resource = poll.resource(), "puller started");

    while !shared.shutdown.is_triggered() {
        let Some(stream) = connect_with_backoff(&shared, "puller") else {
            break;
        };
        match poll_once(&shared, stream, &poll) {
            Ok(Some(body)) => deliver(&shared, &poll, body),
            Ok(None) => {
                shared.shutdown.wait_timeout(shared.settings.idle_delay());
            }
            Err(e) => {
                debug!(error = %e, "poll exchange failed");
                shared.shutdown.wait_timeout(shared.settings.idle_delay());
            }
        }
    }
    info!(name = %shared.name, "puller stopped");
}

fn poll_once(shared: &Shared, stream: TcpStream, poll: &Request) -> Result<Option<String>> {
    shared.in_flight.register(&stream)?;
    let result = exchange(shared, stream, poll);
    shared.in_flight.clear();
    result
}

fn exchange(shared: &Shared, mut stream: TcpStream, poll: &Request) -> Result<Option<String>> {
    stream.set_read_timeout(shared.settings.poll_timeout())?;
    poll.write_to(&mut stream)?;
    let mut reader = BufReader::new(stream);
    let response = parse_response(&mut reader)?;
    if !response.is_ok() {
        debug!(status = %response.status_line, "poll returned no message");
    }
    Ok(response.into_message())
}

/// Stages a delivered message and emits its single readiness signal.
fn deliver(shared: &Shared, poll: &Request, body: String) {
    let mut message = poll.clone();
    message.set_body(body);
    shared.incoming.push(message);
    if let Err(e) = shared.notifier.notify() {
        warn!(error = %e, "failed to signal readiness");
    }
}
