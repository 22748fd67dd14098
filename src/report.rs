use crate::detect::{ClusterMap, DuplicateCluster};
use crate::dto::Record;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Duplicate clusters of every group plus the totals derived from them.
#[derive(Clone, Debug, Default)]
pub struct Report<'a> {
    /// Every scanned group, including those without clusters.
    pub groups: BTreeMap<String, ClusterMap<'a>>,
    /// Occurrences beyond the first, summed over all clusters.
    pub total_duplicates: usize,
    /// Records found in any cluster, once each, in order of first appearance.
    pub flagged: Vec<&'a Record>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub groups: usize,
    pub groups_with_duplicates: usize,
    pub clusters: usize,
    pub total_duplicates: usize,
    pub flagged_records: usize,
}

///
/// Merges per-group cluster maps into a [`Report`].
///
/// Group keys are unique across the input, so merging never has to reconcile
/// two maps for the same group.
///
pub fn aggregate<'a, I>(per_group: I) -> Report<'a>
where
    I: IntoIterator<Item = (String, ClusterMap<'a>)>,
{
    let groups: BTreeMap<String, ClusterMap<'a>> = per_group.into_iter().collect();
    let mut flagged: Vec<&'a Record> = Vec::new();
    let mut total_duplicates = 0;
    for cluster in groups.values().flat_map(|c| c.iter()) {
        total_duplicates += cluster.count.saturating_sub(1);
        for &member in &cluster.members {
            if !flagged.iter().any(|&seen| std::ptr::eq(seen, member)) {
                flagged.push(member);
            }
        }
    }
    Report {
        groups,
        total_duplicates,
        flagged,
    }
}

impl<'a> Report<'a> {
    pub fn clusters(&self) -> impl Iterator<Item = (&str, &DuplicateCluster<'a>)> {
        self.groups
            .iter()
            .flat_map(|(group, clusters)| clusters.iter().map(move |c| (group.as_str(), c)))
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            groups: self.groups.len(),
            groups_with_duplicates: self.groups.values().filter(|c| !c.is_empty()).count(),
            clusters: self.groups.values().map(ClusterMap::len).sum(),
            total_duplicates: self.total_duplicates,
            flagged_records: self.flagged.len(),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (group, clusters) in self.groups.iter().filter(|(_, c)| !c.is_empty()) {
            writeln!(f, "Group {group}: {} duplicate cluster(s)", clusters.len())?;
            for cluster in clusters.iter() {
                writeln!(
                    f,
                    "  \"{}\" unit {} x{}",
                    cluster.key.normalized_address, cluster.key.unit, cluster.count
                )?;
                for member in &cluster.members {
                    writeln!(f, "    - [{}] {}", member.id, member.address)?;
                }
            }
        }
        write!(f, "Total duplicates: {}", self.total_duplicates)
    }
}
