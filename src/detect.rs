use crate::candidates::CandidateStrategy;
use crate::config::MatchConfig;
use crate::dto::Record;
use crate::score::{score, ScoreWeights};
use serde::Serialize;
use std::collections::HashMap;

/// Identity a cluster is filed under: the anchoring record's normalized
/// address and unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DuplicateKey {
    pub normalized_address: String,
    pub unit: String,
}

impl DuplicateKey {
    fn of(record: &Record) -> Self {
        DuplicateKey {
            normalized_address: record.normalized_address.clone(),
            unit: record.unit.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DuplicateCluster<'a> {
    pub key: DuplicateKey,
    pub members: Vec<&'a Record>,
    /// Occurrences filed under this key; a record matched through several
    /// pairs is counted once per pair.
    pub count: usize,
}

///
/// Clusters of one group in the order their keys were first seen.
///
/// Wraps the cluster list and a key lookup so appends stay O(1) while
/// iteration keeps discovery order.
///
#[derive(Clone, Debug, Default)]
pub struct ClusterMap<'a> {
    clusters: Vec<DuplicateCluster<'a>>,
    lookup: HashMap<DuplicateKey, usize>,
}

impl<'a> ClusterMap<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn get(&self, key: &DuplicateKey) -> Option<&DuplicateCluster<'a>> {
        self.lookup.get(key).map(|&idx| &self.clusters[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &DuplicateCluster<'a>> {
        self.clusters.iter()
    }

    /// Files a cluster as-is, or folds it into the one already under its key.
    pub fn insert(&mut self, cluster: DuplicateCluster<'a>) {
        match self.lookup.get(&cluster.key) {
            Some(&idx) => {
                let existing = &mut self.clusters[idx];
                existing.members.extend(cluster.members);
                existing.count += cluster.count;
            }
            None => {
                self.lookup.insert(cluster.key.clone(), self.clusters.len());
                self.clusters.push(cluster);
            }
        }
    }

    /// First match under a key seeds the cluster with both records; every
    /// later match appends only the partner.
    fn record_match(&mut self, anchor: &'a Record, partner: &'a Record) {
        let key = DuplicateKey::of(anchor);
        match self.lookup.get(&key) {
            Some(&idx) => {
                let cluster = &mut self.clusters[idx];
                cluster.members.push(partner);
                cluster.count += 1;
            }
            None => self.insert(DuplicateCluster {
                key,
                members: vec![anchor, partner],
                count: 2,
            }),
        }
    }
}

///
/// Finds duplicate clusters inside one group.
///
/// A pair `(r1, r2)` with `r1` earlier in the group matches when its score
/// is strictly above the threshold and the units are equal. In the default
/// mode the cluster key is taken from `r1`, so a chain `r1~r2`, `r2~r3`
/// with `r1` and `r3` apart yields two clusters that both contain `r2`.
/// Setting `transitive` merges such chains into one cluster per connected
/// component instead.
///
pub struct DuplicateDetector<'c> {
    threshold: f64,
    weights: ScoreWeights,
    candidates: &'c CandidateStrategy,
    transitive: bool,
}

impl<'c> DuplicateDetector<'c> {
    pub fn new(config: &'c MatchConfig) -> Self {
        DuplicateDetector {
            threshold: config.threshold,
            weights: config.weights(),
            candidates: &config.candidates,
            transitive: config.transitive,
        }
    }

    pub fn detect<'a>(&self, group: &[&'a Record]) -> ClusterMap<'a> {
        self.detect_with(group, |a, b| a == b)
    }

    ///
    /// Same as [`DuplicateDetector::detect`] with a custom unit comparison.
    ///
    /// ## Arguments
    ///
    /// * `group` - Records sharing one group key, in input order.
    /// * `unit_eq` - Gate applied to the two units of every scored pair.
    ///
    pub fn detect_with<'a, F>(&self, group: &[&'a Record], unit_eq: F) -> ClusterMap<'a>
    where
        F: Fn(&str, &str) -> bool,
    {
        if group.len() < 2 {
            return ClusterMap::new();
        }
        let addresses: Vec<&str> = group
            .iter()
            .map(|r| r.normalized_address.as_str())
            .collect();
        let matches = self
            .candidates
            .pairs(&addresses)
            .into_iter()
            .filter(|&(i, j)| {
                let (r1, r2) = (group[i], group[j]);
                unit_eq(&r1.unit, &r2.unit)
                    && score(&r1.normalized_address, &r2.normalized_address, self.weights)
                        > self.threshold
            });
        if self.transitive {
            components(group, matches)
        } else {
            let mut clusters = ClusterMap::new();
            for (i, j) in matches {
                clusters.record_match(group[i], group[j]);
            }
            clusters
        }
    }
}

/// One cluster per connected component, keyed by its earliest record.
fn components<'a>(
    group: &[&'a Record],
    matches: impl Iterator<Item = (usize, usize)>,
) -> ClusterMap<'a> {
    let mut uf = UnionFind::new(group.len());
    for (i, j) in matches {
        uf.union(i, j);
    }
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); group.len()];
    for i in 0..group.len() {
        members[uf.find(i)].push(i);
    }
    let mut components: Vec<Vec<usize>> = members.into_iter().filter(|m| m.len() > 1).collect();
    components.sort_by_key(|m| m[0]);
    let mut clusters = ClusterMap::new();
    for component in components {
        clusters.insert(DuplicateCluster {
            key: DuplicateKey::of(group[component[0]]),
            count: component.len(),
            members: component.into_iter().map(|i| group[i]).collect(),
        });
    }
    clusters
}

/// Disjoint sets with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let (rx, ry) = (self.find(x), self.find(y));
        if rx == ry {
            return;
        }
        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::RawRecord;
    use crate::normalize::Normalizer;

    fn records(rows: &[(&str, &str)]) -> Vec<Record> {
        let normalizer = Normalizer::default();
        rows.iter()
            .enumerate()
            .map(|(i, &(address, unit))| {
                Record::new(
                    RawRecord {
                        id: (i + 1).to_string(),
                        address: address.to_string(),
                        unit: unit.to_string(),
                        group: String::from("4040"),
                        fields: vec![],
                    },
                    &normalizer,
                )
            })
            .collect()
    }

    fn detect<'a>(config: &MatchConfig, group: &'a [Record]) -> ClusterMap<'a> {
        let refs: Vec<&Record> = group.iter().collect();
        DuplicateDetector::new(config).detect(&refs)
    }

    fn ids(cluster: &DuplicateCluster) -> Vec<String> {
        cluster.members.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_small_groups_have_no_clusters() {
        let config = MatchConfig::default();
        assert!(detect(&config, &[]).is_empty());
        assert!(detect(&config, &records(&[("1 Lapithou", "1")])).is_empty());
    }

    #[test]
    fn test_different_street_names_stay_apart() {
        let group = records(&[("9 Alkinoou, Germasogeia", "1"), ("9 Attikis, Germasogeia", "1")]);
        assert!(detect(&MatchConfig::default(), &group).is_empty());
    }

    #[test]
    fn test_greek_script_variant_matches() {
        let group = records(&[("Lapithou 1, Germasogeia", "1"), ("Λαπίθου Αρ. 1, Γερμασόγεια", "1")]);
        let clusters = detect(&MatchConfig::default(), &group);
        assert_eq!(clusters.len(), 1);
        let cluster = clusters.iter().next().unwrap();
        assert_eq!(cluster.count, 2);
        assert_eq!(ids(cluster), vec!["1", "2"]);
        assert_eq!(cluster.key.normalized_address, "lapithou 1 germasogeia");
        assert_eq!(cluster.key.unit, "1");
    }

    #[test]
    fn test_unit_must_match_exactly() {
        let group = records(&[("Lapithou 1, Germasogeia", "1"), ("Lapithou 1, Germasogeia", "2")]);
        assert!(detect(&MatchConfig::default(), &group).is_empty());
    }

    #[test]
    fn test_custom_unit_comparison() {
        let group = records(&[("Lapithou 1, Germasogeia", "1A"), ("Lapithou 1, Germasogeia", "1a")]);
        let refs: Vec<&Record> = group.iter().collect();
        let config = MatchConfig::default();
        let detector = DuplicateDetector::new(&config);
        assert!(detector.detect(&refs).is_empty());
        let clusters = detector.detect_with(&refs, |a, b| a.eq_ignore_ascii_case(b));
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        // Scores exactly 90.8.
        let group = records(&[("9 Alkinoou, Germasogeia", "1"), ("9 Attikis, Germasogeia", "1")]);
        let at = MatchConfig {
            threshold: 90.8,
            ..MatchConfig::default()
        };
        assert!(detect(&at, &group).is_empty());
        let below = MatchConfig {
            threshold: 90.0,
            ..MatchConfig::default()
        };
        assert_eq!(detect(&below, &group).len(), 1);
    }

    #[test]
    fn test_repeat_matches_append_to_anchor_cluster() {
        let group = records(&[
            ("Lapithou 1, Germasogeia", "3"),
            ("Lapithou 1 Germasogeia", "3"),
            ("LAPITHOU 1, GERMASOGEIA", "3"),
        ]);
        let clusters = detect(&MatchConfig::default(), &group);
        // All three normalize identically: (1,2) seeds, (1,3) and (2,3) append.
        assert_eq!(clusters.len(), 1);
        let cluster = clusters.iter().next().unwrap();
        assert_eq!(ids(cluster), vec!["1", "2", "3", "3"]);
        assert_eq!(cluster.count, 4);
    }

    // Sharp edge: anchor-based clustering is not transitive.
    // Neighbours score 96.8 and 93.6, the two ends only 90.8.
    fn chain() -> Vec<Record> {
        records(&[
            ("Lapithou 1, Germasogeia", "1"),
            ("Lapithoy 1, Germasogia", "1"),
            ("Lapytoy 1, Gerrnasogia", "1"),
        ])
    }

    #[test]
    fn test_non_transitive_chain_yields_overlapping_clusters() {
        let group = chain();
        let weights = ScoreWeights::default();
        let n: Vec<&str> = group.iter().map(|r| r.normalized_address.as_str()).collect();
        assert!(score(n[0], n[1], weights) > 92.0);
        assert!(score(n[1], n[2], weights) > 92.0);
        assert!(score(n[0], n[2], weights) <= 92.0);

        let clusters = detect(&MatchConfig::default(), &group);
        assert_eq!(clusters.len(), 2);
        let all: Vec<_> = clusters.iter().collect();
        assert_eq!(ids(all[0]), vec!["1", "2"]);
        assert_eq!(all[0].key.normalized_address, "lapithou 1 germasogeia");
        assert_eq!(ids(all[1]), vec!["2", "3"]);
        assert_eq!(all[1].key.normalized_address, "lapithoy 1 germasogia");
    }

    #[test]
    fn test_transitive_mode_merges_chain() {
        let group = chain();
        let config = MatchConfig {
            transitive: true,
            ..MatchConfig::default()
        };
        let clusters = detect(&config, &group);
        assert_eq!(clusters.len(), 1);
        let cluster = clusters.iter().next().unwrap();
        assert_eq!(ids(cluster), vec!["1", "2", "3"]);
        assert_eq!(cluster.count, 3);
        assert_eq!(cluster.key.normalized_address, "lapithou 1 germasogeia");
    }

    #[test]
    fn test_minhash_candidates_find_identical_pairs() {
        let group = records(&[
            ("Lapithou 1, Germasogeia", "1"),
            ("14 Makariou Avenue, Limassol", "1"),
            ("Lapithou 1 Germasogeia", "1"),
        ]);
        let config = MatchConfig {
            candidates: CandidateStrategy::MinHash {
                num_perm: 64,
                num_bands: 32,
                ngram: 3,
                seed: 11,
            },
            ..MatchConfig::default()
        };
        let clusters = detect(&config, &group);
        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(clusters.iter().next().unwrap()), vec!["1", "3"]);
    }

    #[test]
    fn test_unvalidated_minhash_layout_does_not_panic() {
        let group = records(&[("Lapithou 1, Germasogeia", "1"), ("Lapithou 1 Germasogeia", "1")]);
        let config = MatchConfig {
            candidates: CandidateStrategy::MinHash {
                num_perm: 64,
                num_bands: 0,
                ngram: 3,
                seed: 11,
            },
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(detect(&config, &group).len(), 1);
    }

    #[test]
    fn test_insert_folds_clusters_with_same_key() {
        let group = records(&[("Lapithou 1", "1"), ("Lapithou 1", "1"), ("Lapithou 1", "1")]);
        let key = DuplicateKey::of(&group[0]);
        let mut clusters = ClusterMap::new();
        clusters.insert(DuplicateCluster {
            key: key.clone(),
            members: vec![&group[0], &group[1]],
            count: 2,
        });
        clusters.insert(DuplicateCluster {
            key: key.clone(),
            members: vec![&group[2]],
            count: 1,
        });
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.get(&key).unwrap().count, 3);
        assert_eq!(clusters.get(&key).unwrap().members.len(), 3);
    }
}
