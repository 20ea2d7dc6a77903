use crate::scraper::models::EnrichedRecord;
use std::collections::HashSet;

/// Records whose permalink is absent from the `existing` snapshot, in
/// extraction order. A permalink seen twice in one run is kept once.
pub fn reconcile(records: Vec<EnrichedRecord>, existing: &HashSet<String>) -> Vec<EnrichedRecord> {
    let mut seen: HashSet<String> = HashSet::new();

    records
        .into_iter()
        .filter(|r| !existing.contains(r.permalink()) && seen.insert(r.permalink().to_string()))
        .collect()
}

/// First occurrence of every permalink, in order.
pub fn dedupe(records: Vec<EnrichedRecord>) -> Vec<EnrichedRecord> {
    reconcile(records, &HashSet::new())
}
