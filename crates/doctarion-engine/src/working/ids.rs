use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a working node, assigned once and never reused.
    NodeId,
    "n"
);
id_type!(AnchorId, "a");
id_type!(InteractorId, "i");

/// Hands out ids from one counter shared by every id kind of a document.
#[derive(Debug, Clone, Default)]
pub(crate) struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    fn next(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    pub(crate) fn node(&mut self) -> NodeId {
        NodeId(self.next())
    }

    pub(crate) fn anchor(&mut self) -> AnchorId {
        AnchorId(self.next())
    }

    pub(crate) fn interactor(&mut self) -> InteractorId {
        InteractorId(self.next())
    }
}
