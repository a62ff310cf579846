/**
 * journal.rs
 * Undo/redo journal for direct quad edits
 *
 * Each recorded change carries only the quad and its scope; undo performs
 * the inverse against the index and moves the inverse onto the redo stack,
 * redo does the mirror. A new edit clears the redo stack. Every edit is
 * recorded, including ones that did not change the index (adding a present
 * quad, removing an absent one); those carry `changed = false` and undo/redo
 * leave the index alone for them, so a quad the caller did not add is never
 * removed and undo counts always match apply counts.
 */

use oxigraph::model::Quad;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::store::{QuadIndex, ScopeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadAction {
    Add,
    Remove,
}

impl QuadAction {
    pub fn inverse(self) -> Self {
        match self {
            QuadAction::Add => QuadAction::Remove,
            QuadAction::Remove => QuadAction::Add,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadChange {
    pub action: QuadAction,
    pub quad: Quad,
    pub scope: ScopeId,
    /// Whether performing the change altered the index
    pub changed: bool,
}

impl QuadChange {
    pub fn new(action: QuadAction, quad: Quad, scope: ScopeId) -> Self {
        Self {
            action,
            quad,
            scope,
            changed: true,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            action: self.action.inverse(),
            quad: self.quad.clone(),
            scope: self.scope.clone(),
            changed: self.changed,
        }
    }

    /// Run against the index. Returns whether the index changed.
    fn perform(&self, index: &QuadIndex) -> Result<bool> {
        if !self.changed {
            return Ok(false);
        }
        match self.action {
            QuadAction::Add => index.put(&self.quad),
            QuadAction::Remove => index.delete(&self.quad),
        }
    }
}

#[derive(Debug, Default)]
pub struct MutationJournal {
    undo: Vec<QuadChange>,
    redo: Vec<QuadChange>,
}

impl MutationJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Perform and record one edit. Returns whether the index changed.
    pub fn apply(&mut self, index: &QuadIndex, action: QuadAction, quad: Quad, scope: &ScopeId) -> Result<bool> {
        let mut change = QuadChange::new(action, quad, scope.clone());
        change.changed = change.perform(index)?;
        self.redo.clear();
        debug!(action = ?change.action, quad = %change.quad, changed = change.changed, "journal apply");
        let changed = change.changed;
        self.undo.push(change);
        Ok(changed)
    }

    /// Replace `old` with `new`, recorded as a removal followed by an addition
    pub fn edit(&mut self, index: &QuadIndex, old: Quad, new: Quad, scope: &ScopeId) -> Result<()> {
        self.apply(index, QuadAction::Remove, old, scope)?;
        self.apply(index, QuadAction::Add, new, scope)?;
        Ok(())
    }

    /// Revert the latest change. Returns the inverse that was performed.
    pub fn undo(&mut self, index: &QuadIndex) -> Result<Option<QuadChange>> {
        let Some(change) = self.undo.pop() else {
            return Ok(None);
        };
        let inverse = change.inverse();
        if let Err(e) = inverse.perform(index) {
            self.undo.push(change);
            return Err(e);
        }
        debug!(action = ?inverse.action, quad = %inverse.quad, "journal undo");
        self.redo.push(inverse.clone());
        Ok(Some(inverse))
    }

    /// Re-apply the latest undone change. Returns the change that was performed.
    pub fn redo(&mut self, index: &QuadIndex) -> Result<Option<QuadChange>> {
        let Some(undone) = self.redo.pop() else {
            return Ok(None);
        };
        let change = undone.inverse();
        if let Err(e) = change.perform(index) {
            self.redo.push(undone);
            return Err(e);
        }
        debug!(action = ?change.action, quad = %change.quad, "journal redo");
        self.undo.push(change.clone());
        Ok(Some(change))
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}
