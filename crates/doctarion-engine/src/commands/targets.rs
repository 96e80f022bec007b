use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cursor::CursorPath;
use crate::error::Result;
use crate::working::{InteractorId, WorkingDocument};

/// Which interactors a command acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    #[default]
    Focused,
    All,
    AllActive,
    Interactor(InteractorId),
    Interactors(Vec<InteractorId>),
}

/// The interactors `target` names, without duplicates, sorted by where they
/// start in the document (the earlier of main and selection anchor).
///
/// Commands that shift indices walk the result back to front so earlier
/// positions are still valid when their turn comes.
pub(crate) fn resolve_targets(doc: &WorkingDocument, target: &Target) -> Result<Vec<InteractorId>> {
    let mut ids: Vec<InteractorId> = match target {
        Target::Focused => doc.focused_interactor_id().into_iter().collect(),
        Target::All => doc.interactors().map(|i| i.id()).collect(),
        Target::AllActive => doc
            .interactors()
            .filter(|i| i.is_active())
            .map(|i| i.id())
            .collect(),
        Target::Interactor(id) => vec![doc.interactor(*id)?.id()],
        Target::Interactors(ids) => ids
            .iter()
            .map(|id| doc.interactor(*id).map(|i| i.id()))
            .collect::<Result<_>>()?,
    };
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        debug!("Target {target:?} matches no interactor");
        return Ok(ids);
    }

    let mut keyed = ids
        .into_iter()
        .map(|id| {
            let interactor = doc.interactor(id)?;
            let mut first = doc.cursor_path_for_anchor(interactor.main_anchor())?;
            if let Some(selection) = interactor.selection_anchor() {
                let selection = doc.cursor_path_for_anchor(selection)?;
                if selection.compare_to(&first).is_lt() {
                    first = selection;
                }
            }
            Ok((first, id))
        })
        .collect::<Result<Vec<(CursorPath, InteractorId)>>>()?;
    keyed.sort_by(|(a, a_id), (b, b_id)| match a.compare_to(b) {
        Ordering::Equal => a_id.cmp(b_id),
        other => other,
    });
    Ok(keyed.into_iter().map(|(_, id)| id).collect())
}
