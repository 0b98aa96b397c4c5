use std::fmt;

/// What the apply step does with a [`MergeEvent`](super::MergeEvent).
///
/// Matched events need no action and never reach the output, so there is no
/// variant for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Add,
    Delete,
}

impl EventAction {
    pub fn symbol(&self) -> &'static str {
        match self {
            EventAction::Add => "+",
            EventAction::Delete => "-",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
