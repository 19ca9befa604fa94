//! Visit progress per prefecture
//!
//! Progress records come from the surrounding application. They are joined to
//! GeoJSON features by `properties.id` before ingestion so the engine only
//! sees a ratio.

use geojson::{FeatureCollection, JsonValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::geojson::property_i64;

/// Visited and total place counts for one prefecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefectureProgress {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub visited: u32,
    pub total: u32,
}

impl PrefectureProgress {
    /// visited / total, 0 when there is nothing to visit
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.visited as f64 / self.total as f64
        }
    }
}

/// Progress records keyed by prefecture id, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressTable {
    records: IndexMap<i64, PrefectureProgress>,
}

impl ProgressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `record.id`
    pub fn insert(&mut self, record: PrefectureProgress) -> Option<PrefectureProgress> {
        self.records.insert(record.id, record)
    }

    pub fn get(&self, id: i64) -> Option<&PrefectureProgress> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrefectureProgress> {
        self.records.values()
    }
}

impl FromIterator<PrefectureProgress> for ProgressTable {
    fn from_iter<I: IntoIterator<Item = PrefectureProgress>>(iter: I) -> Self {
        let mut table = ProgressTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

/// Write `visited`, `total` and `progress` into every feature's properties
///
/// Features without a matching record (or without an id) get zeros, so every
/// feature ends up with a progress value and a defined fill color.
pub fn merge_progress(collection: &mut FeatureCollection, table: &ProgressTable) {
    let mut matched = 0usize;

    for feature in &mut collection.features {
        let record = property_i64(feature.properties.as_ref(), "id").and_then(|id| table.get(id));
        let (visited, total, progress) = match record {
            Some(r) => {
                matched += 1;
                (r.visited, r.total, r.ratio())
            }
            None => (0, 0, 0.0),
        };

        let properties = feature.properties.get_or_insert_with(Default::default);
        properties.insert("visited".to_string(), JsonValue::from(visited));
        properties.insert("total".to_string(), JsonValue::from(total));
        properties.insert("progress".to_string(), JsonValue::from(progress));
    }

    log::debug!(
        "Merged progress into {} of {} features",
        matched,
        collection.features.len()
    );
}
