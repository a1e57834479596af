//! Sample selection: seed draws and misclassification-driven draws.

use std::collections::BTreeMap;

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ClassifierKind;
use crate::error::SelectionError;
use crate::models::{build_classifier, LinearClassifier};

/// Samples picked by `select_samples` together with the model that was fitted
/// to find them.
pub struct SampleSelection {
    /// Row indices into the matrix passed to `select_samples`, ascending.
    pub indices: Vec<usize>,
    pub model: Box<dyn LinearClassifier>,
}

/// Fit a classifier on `(x, y)` and draw up to `target_count` of the rows it
/// misclassifies.
///
/// Without `balance` the misclassified rows are sampled uniformly. With
/// `balance` they are drawn per true class by `balanced_quota_draw`, every
/// class in `y` taking part even when none of its rows is misclassified.
pub fn select_samples<R: Rng + ?Sized>(
    x: &Array2<f64>,
    y: &[usize],
    target_count: usize,
    balance: bool,
    kind: &ClassifierKind,
    rng: &mut R,
) -> Result<SampleSelection, SelectionError> {
    let mut model = build_classifier(kind);
    model.fit(x, y)?;
    let predicted = model.predict(x)?;

    let misclassified: Vec<usize> = (0..y.len()).filter(|&i| predicted[i] != y[i]).collect();
    log::debug!(
        "{} of {} training rows misclassified by the {} model",
        misclassified.len(),
        y.len(),
        model.name()
    );

    let mut indices = if balance {
        let mut groups: BTreeMap<usize, Vec<usize>> =
            y.iter().map(|&label| (label, Vec::new())).collect();
        for &i in &misclassified {
            groups.entry(y[i]).or_default().push(i);
        }
        balanced_quota_draw(groups.into_values().collect(), target_count, rng)
    } else if misclassified.len() <= target_count {
        misclassified
    } else {
        misclassified
            .choose_multiple(rng, target_count)
            .cloned()
            .collect()
    };
    indices.sort_unstable();

    Ok(SampleSelection { indices, model })
}

/// Draw at most `target` members across `groups`, smallest group first.
///
/// Each group is offered `(target - chosen) / groups_remaining` slots (floor
/// division); a group no larger than its quota is taken whole, otherwise the
/// quota is sampled without replacement. Serving small groups first hands
/// their unused slots on to the larger ones.
pub fn balanced_quota_draw<R: Rng + ?Sized>(
    mut groups: Vec<Vec<usize>>,
    target: usize,
    rng: &mut R,
) -> Vec<usize> {
    groups.sort_by_key(|g| g.len());

    let mut chosen = Vec::with_capacity(target);
    let mut remaining = groups.len();
    for group in groups {
        let quota = target.saturating_sub(chosen.len()) / remaining;
        if group.len() <= quota {
            chosen.extend(group);
        } else {
            chosen.extend(group.choose_multiple(rng, quota).cloned());
        }
        remaining -= 1;
    }
    chosen
}

/// Draw the seed subset: positions into `labels`, uniformly or class-balanced.
pub fn draw_seed_samples<R: Rng + ?Sized>(
    labels: &[usize],
    target: usize,
    balance: bool,
    rng: &mut R,
) -> Vec<usize> {
    let mut indices = if balance {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            groups.entry(label).or_default().push(i);
        }
        balanced_quota_draw(groups.into_values().collect(), target, rng)
    } else {
        let all: Vec<usize> = (0..labels.len()).collect();
        if target >= all.len() {
            all
        } else {
            all.choose_multiple(rng, target).cloned().collect()
        }
    };
    indices.sort_unstable();
    indices
}
