use crate::dto::Record;
use std::collections::BTreeMap;

/// Splits records by group key. Groups come out in key order; records keep
/// their input order inside each group.
pub fn partition(records: &[Record]) -> BTreeMap<&str, Vec<&Record>> {
    let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for record in records {
        groups.entry(record.group.as_str()).or_default().push(record);
    }
    groups
}
