use crate::ast::ast::Node;

use super::{phase::Phase, traversal::Visitor};

/// Visitor that writes down every callback it receives as a `(tag, phase)`
/// pair. Used for `--dump-events` and for asserting traversal order.
#[derive(Debug, Default)]
pub struct EventRecorder {
    pub events: Vec<(&'static str, Phase)>,
}

impl EventRecorder {
    pub fn new() -> Self {
        EventRecorder::default()
    }

    /// Events rendered as `Tag` or `Tag(Phase)`.
    pub fn lines(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|(tag, phase)| match phase {
                Phase::None => tag.to_string(),
                _ => format!("{}({})", tag, phase),
            })
            .collect()
    }
}

impl<'ast> Visitor<'ast> for EventRecorder {
    fn visit(&mut self, node: &'ast Node, phase: Phase) {
        self.events.push((node.tag(), phase));
    }
}
