//! Mutation Journal Contract Tests
//!
//! These tests verify the undo/redo INVARIANTS that MUST NEVER BREAK.
//!
//! **Problem**: undo that drifts from the store state loses user edits
//! **Solution**: contract tests comparing full index snapshots

use oxigraph::model::{GraphName, Literal, NamedNode, Quad};
use ontoview_core::{MutationJournal, QuadAction, QuadIndex, QuadPattern, ScopeId};
use std::collections::BTreeSet;

fn open() -> QuadIndex {
    let mut index = QuadIndex::in_memory();
    index.open().unwrap();
    index
}

fn quad(subject: &str, value: &str) -> Quad {
    Quad::new(
        NamedNode::new_unchecked(format!("http://ex.org/o#{}", subject)),
        NamedNode::new_unchecked("http://www.w3.org/2000/01/rdf-schema#label"),
        Literal::new_simple_literal(value),
        GraphName::NamedNode(NamedNode::new_unchecked("http://ex.org/o")),
    )
}

fn snapshot(index: &QuadIndex) -> BTreeSet<String> {
    index
        .match_quads(&QuadPattern::any())
        .unwrap()
        .iter()
        .map(|q| q.to_string())
        .collect()
}

/// WHY: N applies followed by N undos restore the starting state
/// REASON: Users rely on undo to back out of any sequence of edits
/// BREAKS: Data loss on undo
#[test]
fn undo_sequence_restores_initial_state() {
    let index = open();
    let scope = ScopeId::generate();
    index.put(&quad("A", "a")).unwrap();
    index.put(&quad("B", "b")).unwrap();
    let initial = snapshot(&index);

    let mut journal = MutationJournal::new();
    journal.apply(&index, QuadAction::Add, quad("C", "c"), &scope).unwrap();
    journal.apply(&index, QuadAction::Remove, quad("A", "a"), &scope).unwrap();
    journal.edit(&index, quad("B", "b"), quad("B", "beta"), &scope).unwrap();
    let after = snapshot(&index);

    while journal.can_undo() {
        journal.undo(&index).unwrap();
    }
    assert_eq!(snapshot(&index), initial);

    while journal.can_redo() {
        journal.redo(&index).unwrap();
    }
    assert_eq!(snapshot(&index), after);
}

/// WHY: A new edit clears the redo stack
/// REASON: Redoing a change recorded against an older state is undefined
/// BREAKS: Redo would resurrect quads the user replaced
#[test]
fn new_edit_clears_redo() {
    let index = open();
    let scope = ScopeId::generate();
    let mut journal = MutationJournal::new();

    journal.apply(&index, QuadAction::Add, quad("A", "a"), &scope).unwrap();
    journal.undo(&index).unwrap();
    assert!(journal.can_redo());

    journal.apply(&index, QuadAction::Add, quad("B", "b"), &scope).unwrap();
    assert!(!journal.can_redo());
}

/// WHY: An edit is two journal entries, remove then add
/// REASON: Undo granularity follows the store operations
/// BREAKS: A single undo after an edit would leave both or neither quad
#[test]
fn edit_records_two_changes() {
    let index = open();
    let scope = ScopeId::generate();
    index.put(&quad("A", "a")).unwrap();
    let mut journal = MutationJournal::new();

    journal.edit(&index, quad("A", "a"), quad("A", "alpha"), &scope).unwrap();
    assert_eq!(journal.undo_len(), 2);

    let reverted = journal.undo(&index).unwrap().unwrap();
    assert_eq!(reverted.action, QuadAction::Remove);
    assert!(!index.contains(&quad("A", "alpha")).unwrap());
    assert!(!index.contains(&quad("A", "a")).unwrap());
}

/// WHY: Undo on an empty journal is a no-op
/// REASON: UI buttons may fire with nothing to undo
/// BREAKS: Spurious errors in the host
#[test]
fn empty_journal_undo_is_noop() {
    let index = open();
    let mut journal = MutationJournal::new();
    assert!(journal.undo(&index).unwrap().is_none());
    assert!(journal.redo(&index).unwrap().is_none());
}

/// WHY: An ineffective apply still counts as one undo step
/// REASON: N applies then N undos must land exactly on the starting state
/// BREAKS: Undoing a redundant add would revert an older, unrelated edit
#[test]
fn noop_apply_consumes_its_own_undo() {
    let index = open();
    let scope = ScopeId::generate();
    index.put(&quad("Q", "q")).unwrap();
    let mut journal = MutationJournal::new();
    journal.apply(&index, QuadAction::Add, quad("X", "x"), &scope).unwrap();
    let before = snapshot(&index);

    assert!(!journal.apply(&index, QuadAction::Add, quad("Q", "q"), &scope).unwrap());
    journal.undo(&index).unwrap();

    assert_eq!(snapshot(&index), before);
    assert!(index.contains(&quad("X", "x")).unwrap());
    assert!(index.contains(&quad("Q", "q")).unwrap());

    journal.redo(&index).unwrap();
    assert_eq!(snapshot(&index), before);
}

/// WHY: An edit whose old quad is absent still records remove and add
/// REASON: Undo granularity must not depend on what the store held
/// BREAKS: One undo would suffice, so a second undo reverts an unrelated edit
#[test]
fn edit_with_absent_old_quad_records_two_changes() {
    let index = open();
    let scope = ScopeId::generate();
    let before = snapshot(&index);
    let mut journal = MutationJournal::new();

    journal.edit(&index, quad("A", "missing"), quad("A", "alpha"), &scope).unwrap();
    assert_eq!(journal.undo_len(), 2);
    assert!(index.contains(&quad("A", "alpha")).unwrap());

    journal.undo(&index).unwrap();
    journal.undo(&index).unwrap();
    assert_eq!(snapshot(&index), before);
    assert!(!index.contains(&quad("A", "missing")).unwrap());
}
