//! Trait for evidence table access.
//!
//! Provides an abstraction over the upstream collaborators (expression
//! analysis, metabolite databases, target prediction, the bioactivity
//! classifier) so the engine only ever sees fully materialised tables.

use std::collections::BTreeMap;

use crate::error::{RankError, Result};
use crate::table::{EvidenceTable, EvidenceTables, TableKind};

/// A source of one evidence table.
///
/// Implementations can use:
/// - CSV/TSV exports of the upstream pipeline stages (local)
/// - Remote services wrapped by their own retry/backoff (remote)
/// - Mock data (testing)
pub trait EvidenceProvider: Send + Sync {
    /// Which of the four evidence tables this provider supplies.
    fn kind(&self) -> TableKind;

    /// Produce the complete table. Partial or streamed tables are not allowed.
    fn fetch(&self) -> anyhow::Result<EvidenceTable>;
}

/// Fetch every provider's table into one bundle.
///
/// Two providers for the same table kind are a schema error: there would be
/// no way to tell which one the ranking used.
pub fn collect_tables(providers: &[&dyn EvidenceProvider]) -> Result<EvidenceTables> {
    let mut fetched: BTreeMap<TableKind, EvidenceTable> = BTreeMap::new();
    for provider in providers {
        let kind = provider.kind();
        if fetched.contains_key(&kind) {
            return Err(RankError::Schema {
                table: kind.name().to_string(),
                message: "supplied by more than one provider".to_string(),
            });
        }
        let table = provider.fetch().map_err(|e| RankError::Provider {
            table: kind.name().to_string(),
            message: format!("{e:#}"),
        })?;
        tracing::debug!(table = kind.name(), rows = table.len(), "evidence table fetched");
        fetched.insert(kind, table);
    }

    Ok(fetched
        .into_iter()
        .fold(EvidenceTables::new(), |tables, (kind, table)| tables.with(kind, table)))
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Mock provider with hardcoded rows for unit tests.
pub struct MockEvidenceProvider {
    kind: TableKind,
    table: EvidenceTable,
    fail: Option<String>,
}

impl MockEvidenceProvider {
    pub fn new<S: AsRef<str>>(kind: TableKind, headers: &[S]) -> Self {
        Self {
            kind,
            table: EvidenceTable::new(headers),
            fail: None,
        }
    }

    /// Add a row of cells.
    pub fn with<S: AsRef<str>>(mut self, cells: &[S]) -> Self {
        self.table = self.table.with_row(cells);
        self
    }

    /// Make `fetch` fail with the given message.
    pub fn failing(kind: TableKind, message: &str) -> Self {
        Self {
            kind,
            table: EvidenceTable::default(),
            fail: Some(message.to_string()),
        }
    }
}

impl EvidenceProvider for MockEvidenceProvider {
    fn kind(&self) -> TableKind {
        self.kind
    }

    fn fetch(&self) -> anyhow::Result<EvidenceTable> {
        match &self.fail {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(self.table.clone()),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
