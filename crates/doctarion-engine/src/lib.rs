pub mod commands;
pub mod cursor;
pub mod debug;
pub mod editor;
pub mod error;
pub mod layout;
pub mod model;
pub mod text;
pub mod traversal;
pub mod working;

// Re-export key types for easier usage
pub use commands::{Cmd, Command, CommandHandler, CommandServices, Target};
pub use cursor::{CursorNavigator, CursorOrientation, CursorPath};
pub use editor::{BoundaryPolicy, Editor, EditorEvent, EditorOptions, SubscriptionId};
pub use error::{EditorError, Result};
pub use layout::{HorizontalDistance, LayoutService, Side};
pub use model::{Node, NodeKind};
pub use traversal::{Path, PathPart};
pub use working::{FlowDirection, InteractorId, WorkingDocument};
