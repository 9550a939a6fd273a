//! Classification metrics computed on predicted vs. true label vectors.
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fraction of positions where `predicted` equals `truth`.
///
/// Returns 0.0 for empty input. Panics if the lengths differ.
pub fn accuracy<T: PartialEq>(predicted: &[T], truth: &[T]) -> f64 {
    assert_eq!(predicted.len(), truth.len(), "predictions and labels must have equal length");
    if truth.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    hits as f64 / truth.len() as f64
}

/// Macro-averaged F1 over the union of true and predicted labels.
///
/// A class that is never predicted (or never present) contributes an F1 of
/// 0.0, matching scikit-learn's `zero_division=0`.
pub fn macro_f1<T: Ord>(predicted: &[T], truth: &[T]) -> f64 {
    assert_eq!(predicted.len(), truth.len(), "predictions and labels must have equal length");
    let classes: BTreeSet<&T> = predicted.iter().chain(truth.iter()).collect();
    if classes.is_empty() {
        return 0.0;
    }

    let mut tp: BTreeMap<&T, usize> = BTreeMap::new();
    let mut fp: BTreeMap<&T, usize> = BTreeMap::new();
    let mut fn_: BTreeMap<&T, usize> = BTreeMap::new();
    for (p, t) in predicted.iter().zip(truth) {
        if p == t {
            *tp.entry(t).or_default() += 1;
        } else {
            *fp.entry(p).or_default() += 1;
            *fn_.entry(t).or_default() += 1;
        }
    }

    let total: f64 = classes
        .iter()
        .map(|c| {
            let tp = *tp.get(c).unwrap_or(&0) as f64;
            let fp = *fp.get(c).unwrap_or(&0) as f64;
            let fn_ = *fn_.get(c).unwrap_or(&0) as f64;
            let denom = 2.0 * tp + fp + fn_;
            if denom == 0.0 {
                0.0
            } else {
                2.0 * tp / denom
            }
        })
        .sum();
    total / classes.len() as f64
}

/// Accuracy of always predicting the most frequent class.
pub fn majority_baseline<T: Eq + std::hash::Hash>(truth: &[T]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<&T, usize> = HashMap::new();
    for t in truth {
        *counts.entry(t).or_default() += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    max as f64 / truth.len() as f64
}
