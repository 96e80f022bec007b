/*!
 * # Editor
 *
 * Owns the current [`WorkingDocument`] and runs commands against it.
 *
 * Every command works on a draft copy of the document. The draft replaces
 * the current state only when the command succeeds and actually changed
 * something; the replaced state goes onto the undo stack. A failing command
 * leaves the current state exactly as it was.
 *
 * ## Module Structure
 * - **`options`**: policies that shape command behavior (boundary deletes,
 *   span merging, history length).
 * - **`history`**: the undo and redo stacks.
 *
 * Listeners subscribed with [`Editor::subscribe`] receive an
 * [`EditorEvent::UpdateStart`] and [`EditorEvent::UpdateDone`] around every
 * command, and the document events of committed commands in between.
 */

mod history;
mod options;

pub use options::{BoundaryPolicy, EditorOptions};

use log::{debug, trace};

use self::history::History;
use crate::commands::{Cmd, Command, CommandHandler, CommandRegistry, CommandServices};
use crate::cursor::CursorNavigator;
use crate::error::Result;
use crate::layout::LayoutService;
use crate::model::Node;
use crate::working::{DocumentEvent, InteractorParameters, WorkingDocument};

/// Something that happened while the editor ran a command.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    UpdateStart { command: String },
    /// A change made by a committed command.
    Document(DocumentEvent),
    /// The current state was replaced, by a command, undo or redo.
    DocumentUpdated { version: u64 },
    UpdateDone { command: String },
}

pub type Listener = Box<dyn FnMut(&EditorEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Editor {
    state: WorkingDocument,
    history: History,
    options: EditorOptions,
    registry: CommandRegistry,
    layout: Option<Box<dyn LayoutService>>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("version", &self.state.version())
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Editor {
    /// Loads `document`. With `create_default_interactor`, a document
    /// without interactors gets a focused caret at its first position.
    pub fn new(document: Node, options: EditorOptions) -> Result<Self> {
        let mut state = WorkingDocument::new(document)?;
        if options.create_default_interactor && state.interactors().next().is_none() {
            let start = {
                let cursor = CursorNavigator::new(&state);
                WorkingDocument::get_anchor_parameters_from_cursor_navigator(&cursor)?
            };
            let id = state.add_interactor(InteractorParameters::caret(start))?;
            state.set_focused_interactor(Some(id))?;
            state.take_events();
        }
        Ok(Editor {
            state,
            history: History::new(options.history_limit),
            options,
            registry: CommandRegistry::default(),
            layout: None,
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn document(&self) -> &WorkingDocument {
        &self.state
    }

    pub fn to_node(&self) -> Result<Node> {
        self.state.to_node()
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: EditorOptions) {
        self.history.set_limit(options.history_limit);
        self.options = options;
    }

    pub fn set_layout_service(&mut self, layout: Option<Box<dyn LayoutService>>) {
        self.layout = layout;
    }

    /// Adds a command under `id`, replacing any earlier registration.
    pub fn register_command(&mut self, id: impl Into<String>, handler: CommandHandler) {
        self.registry.register(id, handler);
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != id);
        self.listeners.len() != before
    }

    /// Runs a command by id: a registered one, or a built-in.
    pub fn update(&mut self, command: &Command) -> Result<()> {
        self.emit(&EditorEvent::UpdateStart {
            command: command.id.clone(),
        });
        let mut draft = self.state.clone();
        draft.set_orphan_direction(self.options.orphan_direction);
        let result = self.registry.run(&mut draft, &self.services(), command);
        self.finish(&command.id, draft, result)
    }

    /// Runs a built-in command.
    pub fn execute(&mut self, cmd: &Cmd) -> Result<()> {
        self.emit(&EditorEvent::UpdateStart {
            command: cmd.id().to_string(),
        });
        let mut draft = self.state.clone();
        draft.set_orphan_direction(self.options.orphan_direction);
        let result = cmd.apply(&mut draft, &self.services());
        self.finish(cmd.id(), draft, result)
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.state);
        if undone {
            debug!("Undo to version {}", self.state.version());
            self.emit(&EditorEvent::DocumentUpdated {
                version: self.state.version(),
            });
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.state);
        if redone {
            debug!("Redo to version {}", self.state.version());
            self.emit(&EditorEvent::DocumentUpdated {
                version: self.state.version(),
            });
        }
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    fn services(&self) -> CommandServices<'_> {
        CommandServices {
            layout: self.layout.as_deref(),
            options: &self.options,
        }
    }

    fn finish(&mut self, id: &str, mut draft: WorkingDocument, result: Result<()>) -> Result<()> {
        if let Err(e) = result {
            debug!("Command {id} failed: {e}");
            self.emit(&EditorEvent::UpdateDone {
                command: id.to_string(),
            });
            return Err(e);
        }

        let events = draft.take_events();
        if draft.version() == self.state.version() {
            trace!("Command {id} changed nothing");
        } else {
            debug!("Command {id} committed version {}", draft.version());
            let previous = std::mem::replace(&mut self.state, draft);
            self.history.record(previous);
            for event in events {
                self.emit(&EditorEvent::Document(event));
            }
            self.emit(&EditorEvent::DocumentUpdated {
                version: self.state.version(),
            });
        }
        self.emit(&EditorEvent::UpdateDone {
            command: id.to_string(),
        });
        Ok(())
    }

    fn emit(&mut self, event: &EditorEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::commands::testing::{basic_doc, caret, export, main_of};
    use crate::commands::{InsertContent, InsertPayload, Target};
    use crate::cursor::CursorOrientation::*;
    use crate::error::EditorError;
    use crate::model::builders::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn editor() -> Editor {
        Editor::new(basic_doc(), EditorOptions::default()).expect("Should load")
    }

    fn type_text(editor: &mut Editor, text: &str) {
        editor
            .execute(&Cmd::Insert(InsertPayload {
                target: Target::Focused,
                content: InsertContent::Text(text.to_string()),
            }))
            .expect("Should insert");
    }

    fn focused_caret(editor: &Editor) -> crate::cursor::CursorPath {
        let id = editor
            .document()
            .focused_interactor_id()
            .expect("Should have focus");
        main_of(editor.document(), id)
    }

    // ============ Loading tests ============

    #[test]
    fn test_new_editor_has_a_focused_caret_at_the_start() {
        let editor = editor();
        assert_eq!(focused_caret(&editor), caret("0/0/0", Before));
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_default_interactor_can_be_turned_off() {
        let options = EditorOptions {
            create_default_interactor: false,
            ..Default::default()
        };
        let editor = Editor::new(basic_doc(), options).expect("Should load");
        assert_eq!(editor.document().interactors().count(), 0);
    }

    // ============ History tests ============

    #[test]
    fn test_undo_and_redo() {
        let mut editor = editor();
        let original = export(editor.document());
        type_text(&mut editor, "X");
        let edited = export(editor.document());
        assert!(edited.starts_with("<h level=ONE> <s>XHeader1</s> </h>"));

        assert!(editor.undo());
        assert_eq!(export(editor.document()), original);
        assert_eq!(focused_caret(&editor), caret("0/0/0", Before));
        assert!(editor.can_redo());

        assert!(editor.redo());
        assert_eq!(export(editor.document()), edited);
        assert_eq!(focused_caret(&editor), caret("0/0/0", After));
    }

    #[test]
    fn test_no_op_command_keeps_history() {
        let mut editor = editor();
        type_text(&mut editor, "X");
        assert!(editor.undo());
        let version = editor.document().version();

        // Already at the start of the document.
        editor
            .update(&Command::new("cursor/moveBack", Value::Null))
            .expect("Should run");
        assert_eq!(editor.document().version(), version);
        assert!(!editor.can_undo());
        assert!(editor.can_redo());
    }

    #[test]
    fn test_new_edit_after_undo_drops_redo() {
        let mut editor = editor();
        type_text(&mut editor, "X");
        assert!(editor.undo());
        type_text(&mut editor, "Y");
        assert!(!editor.can_redo());
        assert!(!editor.redo());
    }

    #[test]
    fn test_history_limit_drops_oldest() {
        let options = EditorOptions {
            history_limit: 2,
            ..Default::default()
        };
        let mut editor = Editor::new(basic_doc(), options).expect("Should load");
        for text in ["A", "B", "C"] {
            type_text(&mut editor, text);
        }
        assert!(editor.undo());
        assert!(editor.undo());
        assert!(!editor.undo());
        assert!(export(editor.document()).starts_with("<h level=ONE> <s>AHeader1</s> </h>"));
    }

    #[test]
    fn test_reset_history() {
        let mut editor = editor();
        type_text(&mut editor, "X");
        editor.reset_history();
        assert!(!editor.can_undo());
    }

    // ============ Failure tests ============

    #[test]
    fn test_unknown_command_changes_nothing() {
        let mut editor = editor();
        let before = export(editor.document());
        let result = editor.update(&Command::new("frobnicate", json!({})));
        assert_eq!(result, Err(EditorError::UnknownCommand("frobnicate".to_string())));
        assert_eq!(export(editor.document()), before);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_failed_command_is_discarded() {
        let mut editor = editor();
        let before = export(editor.document());
        let result = editor.execute(&Cmd::Insert(InsertPayload {
            target: Target::Focused,
            content: InsertContent::Inline(paragraph(vec![])),
        }));
        assert!(result.is_err());
        assert_eq!(export(editor.document()), before);
    }

    #[test]
    fn test_registered_command() {
        let mut editor = editor();
        editor.register_command(
            "test/shout",
            Box::new(|doc, _, payload| {
                let text = payload["text"].as_str().unwrap_or_default().to_uppercase();
                crate::commands::Cmd::Insert(InsertPayload {
                    target: Target::Focused,
                    content: InsertContent::Text(text),
                })
                .apply(doc, &CommandServices {
                    layout: None,
                    options: &EditorOptions::default(),
                })
            }),
        );
        editor
            .update(&Command::new("test/shout", json!({"text": "hey"})))
            .expect("Should run");
        assert!(export(editor.document()).starts_with("<h level=ONE> <s>HEYHeader1</s> </h>"));
    }

    // ============ Event tests ============

    #[test]
    fn test_events_bracket_each_command() {
        let mut editor = editor();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscription = editor.subscribe(Box::new(move |e| sink.borrow_mut().push(e.clone())));

        type_text(&mut editor, "X");
        {
            let seen = seen.borrow();
            assert_eq!(
                seen.first(),
                Some(&EditorEvent::UpdateStart {
                    command: "insert".to_string()
                })
            );
            assert_eq!(
                seen.last(),
                Some(&EditorEvent::UpdateDone {
                    command: "insert".to_string()
                })
            );
            assert!(seen.iter().any(|e| matches!(e, EditorEvent::DocumentUpdated { .. })));
            assert!(seen.iter().any(|e| matches!(
                e,
                EditorEvent::Document(DocumentEvent::NodeUpdated { .. })
            )));
        }

        assert!(editor.unsubscribe(subscription));
        let count = seen.borrow().len();
        type_text(&mut editor, "Y");
        assert_eq!(seen.borrow().len(), count);
        assert!(!editor.unsubscribe(subscription));
    }
}
