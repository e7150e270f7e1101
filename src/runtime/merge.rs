//! Definition merging
//!
//! Folds document batches into one [`DefinitionTable`] with last-write-wins
//! semantics. The fold order encodes source precedence:
//!
//! 1. File batches in **reverse** discovery order, so the first-discovered
//!    file is written last and wins.
//! 2. Record batches in the order given, overriding any file definition.
//!
//! A batch that does not parse as a JSON object is skipped as a whole.

use serde_json::{Map, Value};

use super::source::{DocumentBatch, SourceError, SourceKind};
use crate::core::definition::{BlockDefinition, DefinitionTable};

/// What happened to each batch during a merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Labels of batches folded into the table, in fold order
    pub merged: Vec<String>,
    /// Labels of batches dropped because they failed to parse
    pub skipped: Vec<String>,
    /// Keys defined by more than one batch, once per override
    pub overridden: Vec<String>,
}

/// Merge batches into a definition table
pub fn merge(batches: &[DocumentBatch]) -> DefinitionTable {
    merge_with_report(batches).0
}

/// Merge batches and report per-batch outcomes
pub fn merge_with_report(batches: &[DocumentBatch]) -> (DefinitionTable, MergeReport) {
    let mut table = DefinitionTable::new();
    let mut report = MergeReport::default();

    for batch in fold_order(batches) {
        let documents = match parse_batch(batch) {
            Ok(documents) => documents,
            Err(err) => {
                tracing::warn!(error = %err, "skipping definitions batch");
                report.skipped.push(batch.label.clone());
                continue;
            }
        };

        for (key, payload) in &documents {
            if table
                .insert(BlockDefinition::from_value(key, payload))
                .is_some()
            {
                tracing::debug!(key = %key, batch = %batch.label, "block definition overridden");
                report.overridden.push(key.clone());
            }
        }
        report.merged.push(batch.label.clone());
    }

    (table, report)
}

/// Batches in the order they are folded
pub fn fold_order(batches: &[DocumentBatch]) -> impl Iterator<Item = &DocumentBatch> {
    let files = batches
        .iter()
        .rev()
        .filter(|batch| batch.origin == SourceKind::File);
    let records = batches
        .iter()
        .filter(|batch| batch.origin == SourceKind::Record);
    files.chain(records)
}

fn parse_batch(batch: &DocumentBatch) -> Result<Map<String, Value>, SourceError> {
    let value: Value = serde_json::from_str(&batch.payload).map_err(|source| SourceError::Parse {
        label: batch.label.clone(),
        source,
    })?;

    match value {
        Value::Object(documents) => Ok(documents),
        _ => Err(SourceError::NotAnObject {
            label: batch.label.clone(),
        }),
    }
}
