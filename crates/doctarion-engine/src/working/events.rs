use serde::Serialize;

use super::ids::{AnchorId, InteractorId, NodeId};

/// A change made to a working document.
///
/// The document queues these as it is mutated; the editor drains and
/// dispatches them once a command has been committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum DocumentEvent {
    NodeCreated { node: NodeId },
    NodeUpdated { node: NodeId },
    NodeDeleted { node: NodeId },
    NodesJoined { destination: NodeId, source: NodeId },
    AnchorAdded { anchor: AnchorId },
    AnchorUpdated { anchor: AnchorId },
    AnchorOrphaned { anchor: AnchorId },
    AnchorDeleted { anchor: AnchorId },
    InteractorAdded { interactor: InteractorId },
    InteractorUpdated { interactor: InteractorId },
    InteractorDeleted { interactor: InteractorId },
}
