use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::warn;

use crate::dataset::{Dataset, Record};
use crate::error::{ReportError, Result};
use crate::normalize::{CanonicalKey, KeyNormalizer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Unique(usize),
    Ambiguous(Vec<usize>),
}

/// Canonical key -> record lookup over one fetched dataset.
///
/// Both the long and the short label of every record are registered. A key
/// claimed by two different records is kept but marked ambiguous, so that
/// only rows actually using it fail. Registration order never decides a
/// collision: a later record does not silently replace an earlier one, and
/// resolving the shared key returns [`ReportError::AmbiguousEntity`] instead.
#[derive(Debug)]
pub struct EntityIndex<'a> {
    dataset: &'a Dataset,
    normalizer: &'a KeyNormalizer,
    keys: HashMap<CanonicalKey, Slot>,
}

impl<'a> EntityIndex<'a> {
    /// Index every record, then register `aliases` (report label -> feed label).
    pub fn build(
        dataset: &'a Dataset,
        normalizer: &'a KeyNormalizer,
        aliases: &IndexMap<String, String>,
    ) -> Self {
        let mut index = Self {
            dataset,
            normalizer,
            keys: HashMap::new(),
        };

        for (position, record) in dataset.records().iter().enumerate() {
            for label in [&record.name, &record.short_name] {
                match normalizer.canonical(label) {
                    Ok(key) => index.register(key, position),
                    Err(err) => warn!(record = %record.id, %err, "label skipped"),
                }
            }
        }

        for (alias, target) in aliases {
            let resolved = normalizer
                .canonical(target)
                .ok()
                .and_then(|key| match index.keys.get(&key) {
                    Some(Slot::Unique(position)) => Some(*position),
                    _ => None,
                });
            match (normalizer.canonical(alias), resolved) {
                (Ok(key), Some(position)) => index.register(key, position),
                _ => warn!(%alias, %target, "alias does not resolve to a single record"),
            }
        }

        tracing::debug!(keys = index.keys.len(), "built entity index");
        index
    }

    fn register(&mut self, key: CanonicalKey, position: usize) {
        match self.keys.get_mut(&key) {
            None => {
                self.keys.insert(key, Slot::Unique(position));
            }
            Some(Slot::Unique(existing)) if *existing == position => {}
            Some(slot) => {
                let mut claimants = match slot {
                    Slot::Unique(existing) => vec![*existing],
                    Slot::Ambiguous(existing) => existing.clone(),
                };
                if !claimants.contains(&position) {
                    claimants.push(position);
                }
                warn!(%key, records = claimants.len(), "key collision between records");
                *slot = Slot::Ambiguous(claimants);
            }
        }
    }

    /// Number of distinct keys (ambiguous ones included).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Resolve a report row label to its record.
    pub fn resolve(&self, label: &str) -> Result<&'a Record> {
        let key = self
            .normalizer
            .canonical(label)
            .map_err(|_| ReportError::UnresolvedEntity {
                label: label.to_string(),
                key: String::new(),
            })?;
        let records = self.dataset.records();
        match self.keys.get(&key) {
            Some(Slot::Unique(position)) => Ok(&records[*position]),
            Some(Slot::Ambiguous(positions)) => Err(ReportError::AmbiguousEntity {
                label: label.to_string(),
                key: key.to_string(),
                records: positions.iter().map(|&p| records[p].id.clone()).collect(),
            }),
            None => Err(ReportError::UnresolvedEntity {
                label: label.to_string(),
                key: key.to_string(),
            }),
        }
    }
}
