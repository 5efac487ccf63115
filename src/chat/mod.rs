//! The `chat` module is a line-oriented chat front-end over a [`PubSub`] session.
//!
//! It keeps the list of joined channels with a short history each, turns
//! input lines into publish/subscribe calls and renders inbound messages.
//! Messages for channels other than the current one are stored and shown on
//! `/switch`.

pub mod channels;
pub mod command;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::client::PubSub;
use crate::request::Envelope;
use crate::utils::Result;

pub use channels::{ChannelError, Channels, MAX_MESSAGES, MAX_SUBS};
pub use command::{Command, MENU};

pub struct Chat<'a, P: PubSub> {
    client: &'a P,
    name: String,
    channels: Channels,
    current: String,
    closed: bool,
}

fn render(at: &DateTime<Local>, me: &str, envelope: &Envelope) -> String {
    let time = at.format("%H:%M:%S");
    if envelope.sender == me {
        format!("[{time}] {}> {}", envelope.sender, envelope.text)
    } else {
        format!(
            "[{time}] {} on {}> {}",
            envelope.sender, envelope.topic, envelope.text
        )
    }
}

impl<'a, P: PubSub> Chat<'a, P> {
    /// Starts a session for `name`, subscribed to `topic`.
    pub fn new(client: &'a P, name: &str, topic: &str) -> Result<Self> {
        client.subscribe(topic)?;
        let mut channels = Channels::new();
        // A fresh list always has room and no duplicates.
        let _ = channels.join(topic);
        Ok(Self {
            client,
            name: name.to_string(),
            channels,
            current: topic.to_string(),
            closed: false,
        })
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    /// Whether the user asked to leave.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Applies one line of input and returns what to print.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        match Command::parse(line) {
            Command::Empty => Vec::new(),
            Command::Exit => {
                self.closed = true;
                vec!["bye".to_string()]
            }
            Command::Topic => vec![format!("Current topic: {}", self.current)],
            Command::Menu => MENU.iter().map(|s| s.to_string()).collect(),
            Command::Channels => self
                .channels
                .topics()
                .map(|t| {
                    if t == self.current {
                        format!("* {t}")
                    } else {
                        format!("  {t}")
                    }
                })
                .collect(),
            Command::Usage(usage) => vec![format!("Correct usage: {usage}")],
            Command::Subscribe(topic) => self.subscribe(&topic),
            Command::Unsubscribe(topic) => self.unsubscribe(&topic),
            Command::Switch(topic) => self.switch(&topic),
            Command::Say(text) => self.say(&text),
        }
    }

    fn subscribe(&mut self, topic: &str) -> Vec<String> {
        if let Err(e) = self.channels.join(topic) {
            return vec![e.to_string()];
        }
        if let Err(e) = self.client.subscribe(topic) {
            let _ = self.channels.leave(topic);
            return vec![format!("error: {e}")];
        }
        vec![format!("SUBSCRIBED TO TOPIC: {topic}")]
    }

    fn unsubscribe(&mut self, topic: &str) -> Vec<String> {
        if topic == self.current {
            return vec!["Switch to another channel before leaving this one".to_string()];
        }
        if let Err(e) = self.channels.leave(topic) {
            return vec![e.to_string()];
        }
        if let Err(e) = self.client.unsubscribe(topic) {
            return vec![format!("error: {e}")];
        }
        vec![format!("UNSUBSCRIBED FROM TOPIC: {topic}")]
    }

    fn switch(&mut self, topic: &str) -> Vec<String> {
        let Some(channel) = self.channels.get(topic) else {
            return vec![ChannelError::NotSubscribed(topic.to_string()).to_string()];
        };
        self.current = topic.to_string();
        let mut out = vec![format!("--- {topic} ---")];
        out.extend(
            channel
                .history()
                .map(|entry| render(&entry.at, &self.name, &entry.envelope)),
        );
        out
    }

    fn say(&mut self, text: &str) -> Vec<String> {
        if let Err(e) = self.client.publish(&self.current, text) {
            return vec![format!("error: {e}")];
        }
        let envelope = Envelope::new(self.name.as_str(), self.current.as_str(), text);
        let line = render(&Local::now(), &self.name, &envelope);
        if let Some(channel) = self.channels.get_mut(&self.current) {
            channel.record(envelope);
        }
        vec![line]
    }

    /// Handles one retrieved message body and returns what to print.
    ///
    /// Echoes of our own messages are dropped since they were shown on send.
    pub fn receive(&mut self, body: &str) -> Vec<String> {
        let Some(envelope) = Envelope::parse(body) else {
            debug!(body, "ignoring malformed message");
            return Vec::new();
        };
        if envelope.sender == self.name {
            return Vec::new();
        }
        let is_current = envelope.topic == self.current;
        let Some(channel) = self.channels.get_mut(&envelope.topic) else {
            debug!(topic = %envelope.topic, "message for a channel we left");
            return Vec::new();
        };
        let line = render(&Local::now(), &self.name, &envelope);
        channel.record(envelope);
        if is_current { vec![line] } else { Vec::new() }
    }
}
