use crate::client::MessageQueue;
use crate::utils::Result;

/// The operations a front-end needs from a broker session.
pub trait PubSub {
    fn publish(&self, topic: &str, body: &str) -> Result<()>;
    fn subscribe(&self, topic: &str) -> Result<()>;
    fn unsubscribe(&self, topic: &str) -> Result<()>;
    fn retrieve(&self) -> Option<String>;
}

impl PubSub for MessageQueue {
    fn publish(&self, topic: &str, body: &str) -> Result<()> {
        MessageQueue::publish(self, topic, body)
    }

    fn subscribe(&self, topic: &str) -> Result<()> {
        MessageQueue::subscribe(self, topic)
    }

    fn unsubscribe(&self, topic: &str) -> Result<()> {
        MessageQueue::unsubscribe(self, topic)
    }

    fn retrieve(&self) -> Option<String> {
        MessageQueue::retrieve(self)
    }
}
