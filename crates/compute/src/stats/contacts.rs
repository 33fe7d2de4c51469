use indexmap::IndexMap;

use callscope_core::CallRecord;

/// Call counts per contact identity (`"{number} {name}"`).
#[derive(Debug, Clone, Default)]
pub struct ContactTally {
    counts: IndexMap<String, u64>,
}

impl ContactTally {
    pub fn observe(&mut self, rec: &CallRecord) {
        if let Some(key) = contact_key(rec) {
            *self.counts.entry(key).or_insert(0) += 1;
        }
    }

    /// All contacts, most frequent first; ties keep first-seen order.
    pub fn finish(mut self) -> IndexMap<String, u64> {
        self.counts.sort_by(|_, a, _, b| b.cmp(a));
        self.counts
    }
}

/// Composite identity key. Records without a number have no identity.
pub fn contact_key(rec: &CallRecord) -> Option<String> {
    let number = rec.number()?;
    Some(match rec.name.as_deref() {
        Some(name) => format!("{} {}", number, name),
        None => number.to_string(),
    })
}
