use serde::{Deserialize, Serialize};

use super::anchor::AnchorParameters;
use super::ids::{AnchorId, InteractorId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractorStatus {
    #[default]
    Active,
    Inactive,
}

/// A user-visible caret, or a selection when it has a selection anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Interactor {
    pub(crate) id: InteractorId,
    pub(crate) main_anchor: AnchorId,
    pub(crate) selection_anchor: Option<AnchorId>,
    pub(crate) status: InteractorStatus,
    /// Column a run of vertical moves tries to keep to.
    pub(crate) line_movement_horizontal_visual_position: Option<f64>,
    pub(crate) name: Option<String>,
}

impl Interactor {
    pub fn id(&self) -> InteractorId {
        self.id
    }

    pub fn main_anchor(&self) -> AnchorId {
        self.main_anchor
    }

    pub fn selection_anchor(&self) -> Option<AnchorId> {
        self.selection_anchor
    }

    pub fn status(&self) -> InteractorStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == InteractorStatus::Active
    }

    pub fn is_selection(&self) -> bool {
        self.selection_anchor.is_some()
    }

    pub fn line_movement_horizontal_visual_position(&self) -> Option<f64> {
        self.line_movement_horizontal_visual_position
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn anchor_ids(&self) -> impl Iterator<Item = AnchorId> {
        std::iter::once(self.main_anchor).chain(self.selection_anchor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractorParameters {
    pub main_anchor: AnchorParameters,
    pub selection_anchor: Option<AnchorParameters>,
    pub status: InteractorStatus,
    pub line_movement_horizontal_visual_position: Option<f64>,
    pub name: Option<String>,
}

impl InteractorParameters {
    /// An active caret at `main_anchor`.
    pub fn caret(main_anchor: AnchorParameters) -> Self {
        InteractorParameters {
            main_anchor,
            selection_anchor: None,
            status: InteractorStatus::Active,
            line_movement_horizontal_visual_position: None,
            name: None,
        }
    }
}

/// Partial update of an interactor.
///
/// `selection_anchor: Some(None)` ends the selection and deletes its anchor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractorUpdate {
    pub main_anchor: Option<AnchorParameters>,
    pub selection_anchor: Option<Option<AnchorParameters>>,
    pub status: Option<InteractorStatus>,
    pub line_movement_horizontal_visual_position: Option<Option<f64>>,
    pub name: Option<Option<String>>,
}
