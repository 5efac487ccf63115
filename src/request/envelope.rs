use std::fmt;

/// The message layout inside publish and mailbox bodies:
/// `"<sender> <topic> <text>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender: String,
    pub topic: String,
    pub text: String,
}

impl Envelope {
    pub fn new(sender: impl Into<String>, topic: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            topic: topic.into(),
            text: text.into(),
        }
    }

    /// Splits a body on the first two spaces. The text may itself contain
    /// spaces, and may be empty. Returns `None` when sender or topic is missing.
    pub fn parse(body: &str) -> Option<Self> {
        let mut parts = body.splitn(3, ' ');
        let sender = parts.next().filter(|s| !s.is_empty())?;
        let topic = parts.next().filter(|s| !s.is_empty())?;
        let text = parts.next().unwrap_or("");
        Some(Self::new(sender, topic, text))
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.sender, self.topic, self.text)
    }
}
