/*!
 * # Commands
 *
 * Every edit a user can make is a command: an id plus a JSON payload that is
 * parsed into one of the typed [`Cmd`] variants and applied to a
 * [`WorkingDocument`] draft by the editor.
 *
 * ## Module Structure
 * - **`targets`**: resolving a [`Target`] to a sorted list of interactors.
 * - **`caret`**: shared helpers for reading and placing carets.
 * - **`cursor`**: horizontal, vertical and jump caret movement.
 * - **`interactor`**: adding, updating, focusing and removing interactors.
 * - **`delete`**, **`insert`**, **`join`**, **`split`**, **`style`**: the
 *   document edits.
 *
 * Edits walk their targets back to front so index shifts made for a later
 * interactor never invalidate an earlier one's position. Every edit ends by
 * settling interactor anchors onto canonical positions and collapsing
 * carets that ended up on the same spot.
 */

pub(crate) mod caret;
pub mod cursor;
pub mod delete;
pub mod insert;
pub mod interactor;
pub mod join;
pub mod split;
pub mod style;
pub mod targets;

use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use cursor::{JumpToPayload, MovePayload};
pub use delete::DeletePayload;
pub use insert::{InsertContent, InsertPayload};
pub use interactor::{
    AddInteractorPayload, FocusInteractorPayload, InteractorIdPayload, SelectPayload,
    UpdateInteractorPayload,
};
pub use join::{JoinKind, JoinPayload};
pub use split::SplitPayload;
pub use style::StylePayload;
pub use targets::Target;

use crate::editor::EditorOptions;
use crate::error::{EditorError, Result};
use crate::layout::LayoutService;
use crate::working::{FlowDirection, WorkingDocument};

/// A command as it arrives from outside: a registered id and its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    #[serde(default)]
    pub payload: Value,
}

impl Command {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Command {
            id: id.into(),
            payload,
        }
    }
}

/// What a command can use besides the document.
#[derive(Clone, Copy)]
pub struct CommandServices<'a> {
    pub layout: Option<&'a dyn LayoutService>,
    pub options: &'a EditorOptions,
}

impl fmt::Debug for CommandServices<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandServices")
            .field("layout", &self.layout.is_some())
            .field("options", self.options)
            .finish()
    }
}

/// The built-in commands
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    MoveBack(MovePayload),
    MoveForward(MovePayload),
    MoveVisualUp(MovePayload),
    MoveVisualDown(MovePayload),
    JumpTo(JumpToPayload),
    AddInteractor(AddInteractorPayload),
    UpdateInteractor(UpdateInteractorPayload),
    DeleteInteractor(InteractorIdPayload),
    FocusInteractor(FocusInteractorPayload),
    Select(SelectPayload),
    Delete(DeletePayload),
    Insert(InsertPayload),
    Join(JoinPayload),
    Split(SplitPayload),
    SetStyle(StylePayload),
}

impl Cmd {
    pub const IDS: &'static [&'static str] = &[
        "cursor/moveBack",
        "cursor/moveForward",
        "cursor/moveVisualUp",
        "cursor/moveVisualDown",
        "cursor/jumpTo",
        "interactor/add",
        "interactor/update",
        "interactor/delete",
        "interactor/focus",
        "interactor/select",
        "delete",
        "insert",
        "join",
        "split",
        "style/set",
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Cmd::MoveBack(_) => "cursor/moveBack",
            Cmd::MoveForward(_) => "cursor/moveForward",
            Cmd::MoveVisualUp(_) => "cursor/moveVisualUp",
            Cmd::MoveVisualDown(_) => "cursor/moveVisualDown",
            Cmd::JumpTo(_) => "cursor/jumpTo",
            Cmd::AddInteractor(_) => "interactor/add",
            Cmd::UpdateInteractor(_) => "interactor/update",
            Cmd::DeleteInteractor(_) => "interactor/delete",
            Cmd::FocusInteractor(_) => "interactor/focus",
            Cmd::Select(_) => "interactor/select",
            Cmd::Delete(_) => "delete",
            Cmd::Insert(_) => "insert",
            Cmd::Join(_) => "join",
            Cmd::Split(_) => "split",
            Cmd::SetStyle(_) => "style/set",
        }
    }

    /// Parses a raw command. A `null` payload reads as `{}`.
    pub fn from_command(command: &Command) -> Result<Cmd> {
        let id = command.id.as_str();
        let value = &command.payload;
        Ok(match id {
            "cursor/moveBack" => Cmd::MoveBack(parse_payload(id, value)?),
            "cursor/moveForward" => Cmd::MoveForward(parse_payload(id, value)?),
            "cursor/moveVisualUp" => Cmd::MoveVisualUp(parse_payload(id, value)?),
            "cursor/moveVisualDown" => Cmd::MoveVisualDown(parse_payload(id, value)?),
            "cursor/jumpTo" => Cmd::JumpTo(parse_payload(id, value)?),
            "interactor/add" => Cmd::AddInteractor(parse_payload(id, value)?),
            "interactor/update" => Cmd::UpdateInteractor(parse_payload(id, value)?),
            "interactor/delete" => Cmd::DeleteInteractor(parse_payload(id, value)?),
            "interactor/focus" => Cmd::FocusInteractor(parse_payload(id, value)?),
            "interactor/select" => Cmd::Select(parse_payload(id, value)?),
            "delete" => Cmd::Delete(parse_payload(id, value)?),
            "insert" => Cmd::Insert(parse_payload(id, value)?),
            "join" => Cmd::Join(parse_payload(id, value)?),
            "split" => Cmd::Split(parse_payload(id, value)?),
            "style/set" => Cmd::SetStyle(parse_payload(id, value)?),
            _ => return Err(EditorError::UnknownCommand(id.to_string())),
        })
    }

    pub fn apply(&self, doc: &mut WorkingDocument, services: &CommandServices<'_>) -> Result<()> {
        debug!("Applying command {}", self.id());
        match self {
            Cmd::MoveBack(p) => cursor::move_horizontally(doc, p, FlowDirection::Backward),
            Cmd::MoveForward(p) => cursor::move_horizontally(doc, p, FlowDirection::Forward),
            Cmd::MoveVisualUp(p) => {
                cursor::move_visually(doc, services, p, FlowDirection::Backward)
            }
            Cmd::MoveVisualDown(p) => {
                cursor::move_visually(doc, services, p, FlowDirection::Forward)
            }
            Cmd::JumpTo(p) => cursor::jump_to(doc, p),
            Cmd::AddInteractor(p) => interactor::add(doc, p),
            Cmd::UpdateInteractor(p) => interactor::update(doc, p),
            Cmd::DeleteInteractor(p) => interactor::delete(doc, p),
            Cmd::FocusInteractor(p) => interactor::focus(doc, p),
            Cmd::Select(p) => interactor::select(doc, p),
            Cmd::Delete(p) => delete::delete(doc, services.options, p),
            Cmd::Insert(p) => insert::insert(doc, p),
            Cmd::Join(p) => join::join(doc, services.options, p),
            Cmd::Split(p) => split::split(doc, p),
            Cmd::SetStyle(p) => style::set_style(doc, p),
        }
    }
}

fn parse_payload<P: DeserializeOwned>(id: &str, value: &Value) -> Result<P> {
    let value = match value {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| EditorError::InvalidPayload {
        command: id.to_string(),
        message: e.to_string(),
    })
}

/// A handler for a command registered at runtime.
pub type CommandHandler =
    Box<dyn Fn(&mut WorkingDocument, &CommandServices<'_>, &Value) -> Result<()>>;

/// Commands registered on top of the built-in ones. A registered id takes
/// precedence over a built-in with the same id.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.handlers.keys().collect();
        ids.sort();
        f.debug_struct("CommandRegistry").field("ids", &ids).finish()
    }
}

impl CommandRegistry {
    pub fn register(&mut self, id: impl Into<String>, handler: CommandHandler) {
        let id = id.into();
        if Cmd::IDS.contains(&id.as_str()) {
            debug!("Command {id} overrides the built-in command");
        }
        self.handlers.insert(id, handler);
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        self.handlers.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id) || Cmd::IDS.contains(&id)
    }

    /// Runs `command` against `doc`.
    pub fn run(
        &self,
        doc: &mut WorkingDocument,
        services: &CommandServices<'_>,
        command: &Command,
    ) -> Result<()> {
        match self.handlers.get(&command.id) {
            Some(handler) => {
                debug!("Applying registered command {}", command.id);
                handler(doc, services, &command.payload)
            }
            None => Cmd::from_command(command)?.apply(doc, services),
        }
    }
}
