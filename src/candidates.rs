use crate::config::ConfigError;
use rand::prelude::*;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

///
/// Decides which record pairs of a group reach the scorer.
///
/// Every strategy yields pairs `(i, j)` with `i < j`, sorted
/// lexicographically, so the detector sees them in input order whichever
/// strategy produced them.
///
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CandidateStrategy {
    /// Every unordered pair, O(n^2).
    #[default]
    AllPairs,
    /// Only pairs whose character shingles share a MinHash LSH band.
    #[serde(rename_all = "camelCase")]
    MinHash {
        num_perm: usize,
        num_bands: usize,
        ngram: usize,
        seed: u64,
    },
}

impl CandidateStrategy {
    pub fn pairs(&self, addresses: &[&str]) -> Vec<(usize, usize)> {
        match self {
            CandidateStrategy::AllPairs => all_pairs(addresses.len()),
            CandidateStrategy::MinHash {
                num_perm,
                num_bands,
                ngram,
                seed,
            } => MinHashLsh::new(addresses, *num_perm, *num_bands, *ngram, *seed).candidate_pairs(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let CandidateStrategy::MinHash {
            num_perm,
            num_bands,
            ngram,
            ..
        } = self
        {
            if *ngram == 0 {
                return Err(invalid("candidates.ngram", "must be > 0".to_string()));
            }
            if *num_bands == 0 || *num_perm == 0 || num_perm % num_bands != 0 {
                return Err(invalid(
                    "candidates.numBands",
                    format!("{num_bands} bands must evenly divide {num_perm} permutations"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}

fn all_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

#[derive(Clone, Debug)]
struct MinHash {
    hash_values: Vec<u32>,
}

impl MinHash {
    fn new<'a>(items: impl Iterator<Item = &'a str>, permutations: &[(u64, u64)]) -> Self {
        let mut hash_values = vec![u32::MAX; permutations.len()];
        for item in items {
            let item_hash = calculate_hash(&item);
            for (i, &(a, b)) in permutations.iter().enumerate() {
                let hash = permute_hash(item_hash, a, b);
                hash_values[i] = hash_values[i].min(hash);
            }
        }
        MinHash { hash_values }
    }
}

/// Banded MinHash index over the positions of one group's addresses.
struct MinHashLsh {
    /// One bucket table per band; buckets hold record positions
    hash_tables: Vec<FxHashMap<u64, Vec<usize>>>,
}

impl MinHashLsh {
    /// Layouts `validate` would reject are clamped to at least one band of at
    /// least one permutation over shingles of at least one char.
    fn new(addresses: &[&str], num_perm: usize, num_bands: usize, ngram: usize, seed: u64) -> Self {
        let num_perm = num_perm.max(1);
        let num_bands = num_bands.clamp(1, num_perm);
        let ngram = ngram.max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let permutations: Vec<(u64, u64)> = (0..num_perm).map(|_| (rng.gen(), rng.gen())).collect();
        let band_size = num_perm / num_bands;
        let signatures: Vec<MinHash> = addresses
            .par_iter()
            .map(|address| {
                let chars: Vec<(usize, char)> = address.char_indices().collect();
                MinHash::new(shingles(address, &chars, ngram), &permutations)
            })
            .collect();
        let mut hash_tables: Vec<FxHashMap<u64, Vec<usize>>> = vec![FxHashMap::default(); num_bands];
        for (position, minhash) in signatures.iter().enumerate() {
            for (i, table) in hash_tables.iter_mut().enumerate() {
                let start = i * band_size;
                let band_hash = calculate_band_hash(&minhash.hash_values[start..start + band_size]);
                table.entry(band_hash).or_default().push(position);
            }
        }
        MinHashLsh { hash_tables }
    }

    fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        for table in &self.hash_tables {
            for bucket in table.values().filter(|b| b.len() > 1) {
                for (k, &i) in bucket.iter().enumerate() {
                    for &j in &bucket[k + 1..] {
                        pairs.insert((i.min(j), i.max(j)));
                    }
                }
            }
        }
        pairs.into_iter().collect()
    }
}

/// Character n-grams; an address shorter than `ngram` is its own shingle.
fn shingles<'a>(
    address: &'a str,
    chars: &'a [(usize, char)],
    ngram: usize,
) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    if chars.len() <= ngram {
        return Box::new(std::iter::once(address).filter(|a| !a.is_empty()));
    }
    Box::new((0..=chars.len() - ngram).map(move |start| {
        let from = chars[start].0;
        let to = chars
            .get(start + ngram)
            .map_or(address.len(), |&(offset, _)| offset);
        &address[from..to]
    }))
}

#[inline]
fn calculate_hash<T: Hash>(t: &T) -> u64 {
    let mut s = FxHasher::default();
    t.hash(&mut s);
    s.finish()
}

#[inline]
fn permute_hash(hash: u64, a: u64, b: u64) -> u32 {
    ((a.wrapping_mul(hash).wrapping_add(b)) >> 32) as u32
}

#[inline]
fn calculate_band_hash(band: &[u32]) -> u64 {
    let mut hasher = FxHasher::default();
    for &value in band {
        hasher.write_u32(value);
    }
    hasher.finish()
}
