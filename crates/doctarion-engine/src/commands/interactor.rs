use serde::{Deserialize, Serialize};

use super::targets::{Target, resolve_targets};
use crate::cursor::CursorPath;
use crate::error::Result;
use crate::text::style::present_or_null;
use crate::working::{
    InteractorId, InteractorParameters, InteractorStatus, InteractorUpdate, WorkingDocument,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddInteractorPayload {
    pub at: CursorPath,
    #[serde(default)]
    pub selection: Option<CursorPath>,
    #[serde(default)]
    pub status: InteractorStatus,
    #[serde(default)]
    pub name: Option<String>,
    /// Give the new interactor focus.
    #[serde(default)]
    pub focus: bool,
}

/// Fields left out are not changed; `"selection": null` ends a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInteractorPayload {
    pub id: InteractorId,
    #[serde(default)]
    pub at: Option<CursorPath>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub selection: Option<Option<CursorPath>>,
    #[serde(default)]
    pub status: Option<InteractorStatus>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub name: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractorIdPayload {
    pub id: InteractorId,
}

/// `id: null` clears the focus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusInteractorPayload {
    pub id: Option<InteractorId>,
}

/// Sets (or with `anchor: null` clears) where the targets' selections start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectPayload {
    pub target: Target,
    pub anchor: Option<CursorPath>,
}

pub(crate) fn add(doc: &mut WorkingDocument, payload: &AddInteractorPayload) -> Result<()> {
    let main_anchor = doc.anchor_parameters_for_cursor_path(&payload.at)?;
    let selection_anchor = payload
        .selection
        .as_ref()
        .map(|s| doc.anchor_parameters_for_cursor_path(s))
        .transpose()?;
    let id = doc.add_interactor(InteractorParameters {
        main_anchor,
        selection_anchor,
        status: payload.status,
        line_movement_horizontal_visual_position: None,
        name: payload.name.clone(),
    })?;
    if payload.focus {
        doc.set_focused_interactor(Some(id))?;
    }
    Ok(())
}

pub(crate) fn update(doc: &mut WorkingDocument, payload: &UpdateInteractorPayload) -> Result<()> {
    let main_anchor = payload
        .at
        .as_ref()
        .map(|at| doc.anchor_parameters_for_cursor_path(at))
        .transpose()?;
    let selection_anchor = match &payload.selection {
        Some(Some(s)) => Some(Some(doc.anchor_parameters_for_cursor_path(s)?)),
        Some(None) => Some(None),
        None => None,
    };
    let moved = main_anchor.is_some();
    doc.update_interactor(
        payload.id,
        InteractorUpdate {
            main_anchor,
            selection_anchor,
            status: payload.status,
            line_movement_horizontal_visual_position: moved.then_some(None),
            name: payload.name.clone(),
        },
    )?;
    doc.dedupe_interactors();
    Ok(())
}

pub(crate) fn delete(doc: &mut WorkingDocument, payload: &InteractorIdPayload) -> Result<()> {
    doc.delete_interactor(payload.id)
}

pub(crate) fn focus(doc: &mut WorkingDocument, payload: &FocusInteractorPayload) -> Result<()> {
    doc.set_focused_interactor(payload.id)
}

pub(crate) fn select(doc: &mut WorkingDocument, payload: &SelectPayload) -> Result<()> {
    let selection = payload
        .anchor
        .as_ref()
        .map(|at| doc.anchor_parameters_for_cursor_path(at))
        .transpose()?;
    for id in resolve_targets(doc, &payload.target)? {
        if selection.is_none() && !doc.interactor(id)?.is_selection() {
            continue;
        }
        doc.update_interactor(
            id,
            InteractorUpdate {
                selection_anchor: Some(selection.clone()),
                ..Default::default()
            },
        )?;
    }
    Ok(())
}
