//! Image reference extraction from catalog items in probe order

use crate::catalog::item::CatalogItem;
use crate::imagery::filter::ReferenceFilter;
use crate::io::configuration::{
    ARRAY_FIELD_PRIORITY_STRIDE, DEFAULT_ARRAY_FIELDS, DEFAULT_SINGLE_FIELDS,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

/// Where in the item a candidate came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    /// A single-valued field
    Single,
    /// One element of an array-valued field
    ArrayElement,
}

/// A possible image reference, not yet confirmed loadable
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    /// Reference as found in the item, trimmed
    pub url: String,
    /// Provenance label, the field name or `field[index]`
    pub source: String,
    /// Probe order, lower is tried first
    pub priority: u32,
    /// Single field or array element
    pub kind: CandidateKind,
}

/// Ordered image field names with their priorities
///
/// Single fields get base priorities `0, 1, 2, ...` in order. Array field `k`
/// nominally starts at `single_fields.len() + k * ARRAY_FIELD_PRIORITY_STRIDE`
/// and its element `i` gets `base + i`, so all singles beat all array
/// elements. During extraction an array longer than the stride pushes the
/// bases of later arrays up so one array never interleaves with the next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPriorityTable {
    /// Single-valued field names, highest priority first
    pub single_fields: Vec<String>,
    /// Array-valued field names, highest priority first
    pub array_fields: Vec<String>,
}

impl Default for FieldPriorityTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_SINGLE_FIELDS.iter().copied(),
            DEFAULT_ARRAY_FIELDS.iter().copied(),
        )
    }
}

impl FieldPriorityTable {
    /// Build a table from single and array field names
    pub fn new<S, A>(single_fields: S, array_fields: A) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            single_fields: single_fields.into_iter().map(Into::into).collect(),
            array_fields: array_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Base priority of the single field at `index`
    pub fn single_base_priority(&self, index: usize) -> u32 {
        to_priority(index)
    }

    /// Nominal base priority of the array field at `index`, before longer
    /// earlier arrays shift it
    pub fn array_base_priority(&self, index: usize) -> u32 {
        to_priority(self.single_fields.len())
            .saturating_add(to_priority(index).saturating_mul(ARRAY_FIELD_PRIORITY_STRIDE))
    }
}

fn to_priority(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Collect every acceptable image reference of `item` in probe order
///
/// Values rejected by `filter` are skipped. When the same URL appears more
/// than once only its lowest-priority occurrence is kept.
pub fn extract_candidates(
    item: &CatalogItem,
    table: &FieldPriorityTable,
    filter: &ReferenceFilter,
) -> Vec<ImageCandidate> {
    let mut candidates: Vec<ImageCandidate> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    let mut offer = |candidate: ImageCandidate| match seen.entry(candidate.url.clone()) {
        Entry::Occupied(entry) => {
            if let Some(existing) = candidates.get_mut(*entry.get()) {
                if candidate.priority < existing.priority {
                    *existing = candidate;
                }
            }
        }
        Entry::Vacant(entry) => {
            entry.insert(candidates.len());
            candidates.push(candidate);
        }
    };

    for (index, field) in table.single_fields.iter().enumerate() {
        let Some(value) = item.field(field) else {
            continue;
        };
        if !filter.is_valid_reference(value) {
            continue;
        }
        if let Some(url) = value.as_str() {
            offer(ImageCandidate {
                url: url.trim().to_owned(),
                source: field.clone(),
                priority: table.single_base_priority(index),
                kind: CandidateKind::Single,
            });
        }
    }

    let mut next_free = table.array_base_priority(0);
    for (index, field) in table.array_fields.iter().enumerate() {
        let elements: &[Value] = match item.field(field) {
            Some(Value::Array(elements)) => elements.as_slice(),
            Some(value) if value.is_string() => std::slice::from_ref(value),
            _ => continue,
        };
        let base = table.array_base_priority(index).max(next_free);
        next_free = base.saturating_add(to_priority(elements.len()));

        for (position, value) in elements.iter().enumerate() {
            if !filter.is_valid_reference(value) {
                continue;
            }
            if let Some(url) = value.as_str() {
                offer(ImageCandidate {
                    url: url.trim().to_owned(),
                    source: format!("{field}[{position}]"),
                    priority: base.saturating_add(to_priority(position)),
                    kind: CandidateKind::ArrayElement,
                });
            }
        }
    }

    candidates.sort_by_key(|candidate| candidate.priority);

    let item_id = item.id().unwrap_or_default();
    debug!(
        item = %item_id,
        count = candidates.len(),
        "extracted image candidates"
    );

    candidates
}
