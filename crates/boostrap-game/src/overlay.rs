/// Debug text rendered on top of the game by the framework.
///
/// This is a side channel: nothing written here is part of the
/// [`ControlCommand`](crate::ControlCommand) returned for the tick.
pub trait DebugOverlay {
    /// Appends a line of text to the overlay.
    fn add_message(&mut self, message: &str);

    /// Removes every message currently displayed.
    fn clear(&mut self);
}

/// In-memory overlay that keeps the currently displayed messages.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DebugMessages {
    messages: Vec<String>,
}

impl DebugMessages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }
}

impl DebugOverlay for DebugMessages {
    fn add_message(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}
