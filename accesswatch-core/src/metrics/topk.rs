use crate::metrics::error::MetricsError;
use ahash::RandomState;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopKEntry {
    pub key: String,
    pub score: i64,
}

impl fmt::Display for TopKEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key:{}, score:{}", self.key, self.score)
    }
}

/// Bounded scoreboard over string keys.
///
/// Invariants:
/// - at most one entry per key
/// - every stored score is > 0
/// - `scores` and `ranking` always describe the same set of entries
///
/// Ordering is descending by score; equal scores are ordered by ascending key.
#[derive(Debug, Clone)]
pub struct RankedTopK {
    k: usize,
    scores: HashMap<String, i64, RandomState>,
    ranking: BTreeSet<(Reverse<i64>, String)>,
}

impl RankedTopK {
    pub fn new(k: usize) -> Result<Self, MetricsError> {
        if k == 0 {
            return Err(MetricsError::InvalidTopK { k });
        }
        Ok(Self {
            k,
            scores: HashMap::default(),
            ranking: BTreeSet::new(),
        })
    }

    /// Adds `incr` to the running score of `key`, creating the key if absent.
    /// Works like Redis `ZINCRBY`, except non-positive increments are rejected
    /// and leave the structure untouched.
    pub fn incr_by(&mut self, key: &str, incr: i64) -> bool {
        if incr <= 0 {
            return false;
        }

        let score = match self.scores.get_mut(key) {
            Some(score) => {
                self.ranking.remove(&(Reverse(*score), key.to_string()));
                *score = score.saturating_add(incr);
                *score
            }
            None => {
                self.scores.insert(key.to_string(), incr);
                incr
            }
        };

        self.ranking.insert((Reverse(score), key.to_string()));
        true
    }

    /// Up to `k` entries, highest score first. Does not modify the structure,
    /// so repeated calls return the same answer.
    pub fn top_k(&self) -> Vec<TopKEntry> {
        self.ranking
            .iter()
            .take(self.k)
            .map(|(Reverse(score), key)| TopKEntry {
                key: key.clone(),
                score: *score,
            })
            .collect()
    }

    /// Pops the maximum entry `k` times. Entries beyond the first `k` stay, so
    /// a second call before [`RankedTopK::reset`] yields the *next* `k`.
    pub fn pop_top_k(&mut self) -> Vec<TopKEntry> {
        let mut out = Vec::with_capacity(self.k.min(self.ranking.len()));

        for _ in 0..self.k {
            let Some((Reverse(score), key)) = self.ranking.pop_first() else {
                break;
            };
            self.scores.remove(&key);
            out.push(TopKEntry { key, score });
        }

        out
    }

    pub fn reset(&mut self) {
        self.scores = HashMap::default();
        self.ranking = BTreeSet::new();
    }

    pub fn count(&self) -> usize {
        self.scores.len()
    }

    pub fn k(&self) -> usize {
        self.k
    }
}
