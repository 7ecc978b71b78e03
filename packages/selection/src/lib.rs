#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Reviewer selection for PR Reviewer.
//!
//! Selection is a pure function of the candidate pool and a caller-supplied
//! random number generator: the only nondeterminism is the random draw.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use reviewer_models::{PullRequest, User};

/// Reviewers assigned to a pull request when it is created.
pub const MAX_REVIEWERS: usize = 2;

/// Pick up to `k` distinct candidates uniformly at random.
///
/// Pools no larger than `k` are returned whole, in their original order.
/// Larger pools go through a partial Fisher-Yates shuffle and the `k`
/// shuffled elements are returned, so every candidate has the same chance
/// of being picked and none is picked twice.
#[must_use]
pub fn select_random<T: Clone, R: Rng + ?Sized>(candidates: &[T], k: usize, rng: &mut R) -> Vec<T> {
    if candidates.is_empty() || k == 0 {
        return vec![];
    }
    if candidates.len() <= k {
        return candidates.to_vec();
    }

    let mut pool = candidates.to_vec();
    let (selected, _) = pool.partial_shuffle(rng, k);
    selected.to_vec()
}

/// Drop every candidate that may not review `pr`: its author, its currently
/// assigned reviewers and `exclude_id` (usually the reviewer being replaced).
#[must_use]
pub fn filter_candidates(candidates: Vec<User>, pr: &PullRequest, exclude_id: &str) -> Vec<User> {
    let mut excluded: HashSet<&str> = HashSet::with_capacity(pr.assigned_reviewers.len() + 2);
    excluded.insert(pr.author_id.as_str());
    excluded.insert(exclude_id);
    excluded.extend(pr.assigned_reviewers.iter().map(String::as_str));

    candidates
        .into_iter()
        .filter(|candidate| !excluded.contains(candidate.id.as_str()))
        .collect()
}
