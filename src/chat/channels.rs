use std::collections::VecDeque;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::request::Envelope;

/// Most channels a session may join.
pub const MAX_SUBS: usize = 10;
/// Messages kept per channel; older ones are dropped first.
pub const MAX_MESSAGES: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("already subscribed to {0}")]
    AlreadySubscribed(String),
    #[error("cannot subscribe to more than {0} channels")]
    TooManyChannels(usize),
    #[error("not subscribed to {0}")]
    NotSubscribed(String),
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub at: DateTime<Local>,
    pub envelope: Envelope,
}

#[derive(Debug)]
pub struct Channel {
    topic: String,
    history: VecDeque<Entry>,
}

impl Channel {
    fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            history: VecDeque::with_capacity(MAX_MESSAGES),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn record(&mut self, envelope: Envelope) {
        if self.history.len() == MAX_MESSAGES {
            self.history.pop_front();
        }
        self.history.push_back(Entry {
            at: Local::now(),
            envelope,
        });
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Entry> {
        self.history.iter()
    }
}

/// The channels a chat session has joined, in join order.
#[derive(Debug, Default)]
pub struct Channels {
    channels: Vec<Channel>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, topic: &str) -> Result<(), ChannelError> {
        if self.get(topic).is_some() {
            return Err(ChannelError::AlreadySubscribed(topic.to_string()));
        }
        if self.channels.len() >= MAX_SUBS {
            return Err(ChannelError::TooManyChannels(MAX_SUBS));
        }
        self.channels.push(Channel::new(topic));
        Ok(())
    }

    pub fn leave(&mut self, topic: &str) -> Result<Channel, ChannelError> {
        let index = self
            .channels
            .iter()
            .position(|c| c.topic == topic)
            .ok_or_else(|| ChannelError::NotSubscribed(topic.to_string()))?;
        Ok(self.channels.remove(index))
    }

    pub fn get(&self, topic: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.topic == topic)
    }

    pub fn get_mut(&mut self, topic: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.topic == topic)
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.topic.as_str())
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
