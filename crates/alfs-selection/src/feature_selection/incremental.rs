use ndarray::{s, Array2, Axis};

use crate::config::ClassifierKind;
use crate::error::SelectionError;
use crate::models::build_classifier;
use crate::parallel::{argmax_first, evaluate_candidates};

/// Append the zero "candidate" column to a baseline weight matrix.
pub fn pad_weights(weights: &Array2<f64>) -> Array2<f64> {
    let mut padded = Array2::<f64>::zeros((weights.nrows(), weights.ncols() + 1));
    padded.slice_mut(s![.., ..weights.ncols()]).assign(weights);
    padded
}

/// Sum over class rows of the angle between matching rows of `padded` and
/// `candidate`.
///
/// A row with zero norm has cosine similarity 0, i.e. contributes a right angle.
pub fn angle_score(padded: &Array2<f64>, candidate: &Array2<f64>) -> f64 {
    padded
        .rows()
        .into_iter()
        .zip(candidate.rows())
        .map(|(a, b)| {
            let norm = a.dot(&a).sqrt() * b.dot(&b).sqrt();
            let cosine = if norm > 0.0 { a.dot(&b) / norm } else { 0.0 };
            cosine.clamp(-1.0, 1.0).acos()
        })
        .sum()
}

/// Rotation score of every unselected column of `x`, in column order,
/// paired with its column index.
///
/// `selected` holds column indices of `x` in selection order. A candidate
/// column that is zero in every row scores exactly 0 and is never fitted.
pub fn candidate_scores(
    x: &Array2<f64>,
    y: &[usize],
    selected: &[usize],
    kind: &ClassifierKind,
    num_threads: Option<usize>,
) -> Result<(Vec<usize>, Vec<f64>), SelectionError> {
    if selected.is_empty() {
        return Err(SelectionError::InvalidConfig(
            "incremental selection needs at least one selected feature".to_string(),
        ));
    }
    let candidates: Vec<usize> = (0..x.ncols()).filter(|c| !selected.contains(c)).collect();
    if candidates.is_empty() {
        return Err(SelectionError::InvalidConfig(
            "no candidate features remain".to_string(),
        ));
    }

    let mut baseline = build_classifier(kind);
    baseline.fit(&x.select(Axis(1), selected), y)?;
    let padded = pad_weights(&baseline.weights()?);

    let scores = evaluate_candidates(&candidates, num_threads, |candidate| -> Result<f64, SelectionError> {
        if x.column(candidate).iter().all(|&v| v == 0.0) {
            log::trace!("Candidate {} is all zero, score 0", candidate);
            return Ok(0.0);
        }
        let mut columns = selected.to_vec();
        columns.push(candidate);

        let mut model = build_classifier(kind);
        model.fit(&x.select(Axis(1), &columns), y)?;
        let score = angle_score(&padded, &model.weights()?);
        log::trace!("Candidate {} rotation {:.6}", candidate, score);
        Ok(score)
    })?;
    Ok((candidates, scores))
}

/// Pick the unselected column of `x` whose addition rotates the decision
/// boundary of the `selected` model the most. Ties go to the lowest column
/// index.
pub fn select_feature(
    x: &Array2<f64>,
    y: &[usize],
    selected: &[usize],
    kind: &ClassifierKind,
    num_threads: Option<usize>,
) -> Result<usize, SelectionError> {
    let (candidates, scores) = candidate_scores(x, y, selected, kind, num_threads)?;
    let best = argmax_first(&scores).ok_or(SelectionError::EmptyInput)?;
    log::debug!(
        "Selected feature {} with rotation {:.6} out of {} candidates",
        candidates[best],
        scores[best],
        candidates.len()
    );
    Ok(candidates[best])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaxMarginParams;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn angle_of_identical_rows_is_zero() {
        let a = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 0.0, -1.0, 0.5, 0.0]).unwrap();
        assert!(angle_score(&a, &a).abs() < 1e-6);
    }

    #[test]
    fn angle_sums_over_class_rows() {
        let a = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let b = Array2::from_shape_vec((2, 2), vec![0.0, 1.0, 0.0, 0.0]).unwrap();
        // Orthogonal first row, zero-norm second row: two right angles.
        assert!((angle_score(&a, &b) - 2.0 * FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn pad_appends_zero_column() {
        let w = Array2::from_shape_vec((1, 2), vec![0.5, -0.5]).unwrap();
        let padded = pad_weights(&w);
        assert_eq!(padded.shape(), &[1, 3]);
        assert_eq!(padded[(0, 2)], 0.0);
    }

    #[test]
    fn all_zero_candidate_never_wins_over_informative_one() {
        // Column 0 is selected, column 1 is all zero, column 2 is informative.
        let x = Array2::from_shape_vec(
            (8, 3),
            vec![
                1.0, 0.0, 0.2, //
                0.8, 0.0, 1.5, //
                -0.3, 0.0, 1.1, //
                0.2, 0.0, 0.9, //
                -1.0, 0.0, -0.4, //
                -0.7, 0.0, -1.2, //
                0.4, 0.0, -1.0, //
                -0.2, 0.0, -0.8,
            ],
        )
        .unwrap();
        let y = vec![1, 1, 1, 1, 0, 0, 0, 0];
        let kind = ClassifierKind::MaxMarginLinear(MaxMarginParams::default());

        let best = select_feature(&x, &y, &[0], &kind, Some(2)).unwrap();
        assert_eq!(best, 2);
    }

    #[test]
    fn all_zero_candidate_scores_exactly_zero() {
        // Column 1 is all zero, column 2 is informative.
        let x = Array2::from_shape_vec(
            (6, 3),
            vec![
                1.0, 0.0, 0.5, //
                0.7, 0.0, -0.2, //
                1.3, 0.0, 0.9, //
                -1.0, 0.0, 0.1, //
                -0.6, 0.0, -0.8, //
                -1.4, 0.0, 0.3,
            ],
        )
        .unwrap();
        let y = vec![1, 1, 1, 0, 0, 0];
        let kind = ClassifierKind::MaxMarginLinear(MaxMarginParams::default());

        let (candidates, scores) = candidate_scores(&x, &y, &[0], &kind, Some(2)).unwrap();
        assert_eq!(candidates, vec![1, 2]);
        assert_eq!(scores[0].to_bits(), 0.0f64.to_bits());
        assert!(scores[1] > 0.0);
    }

    #[test]
    fn only_non_zero_candidates_reach_the_classifier() {
        // Fitting a candidate with a NaN in it fails, so the error shows
        // which candidates reach the classifier.
        let x = Array2::from_shape_vec(
            (4, 3),
            vec![
                1.0, 0.0, f64::NAN, //
                0.8, 0.0, 0.4, //
                -1.0, 0.0, -0.3, //
                -0.9, 0.0, 0.2,
            ],
        )
        .unwrap();
        let y = vec![1, 1, 0, 0];
        let kind = ClassifierKind::MaxMarginLinear(MaxMarginParams::default());

        assert!(matches!(
            candidate_scores(&x, &y, &[0], &kind, None),
            Err(SelectionError::FitFailed(_))
        ));

        let mut zeroed = x.clone();
        zeroed.column_mut(2).fill(0.0);
        let (candidates, scores) = candidate_scores(&zeroed, &y, &[0], &kind, None).unwrap();
        assert_eq!(candidates, vec![1, 2]);
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn selected_columns_are_never_candidates() {
        let x = Array2::from_shape_vec((4, 2), vec![1.0, 0.5, 2.0, 0.1, -1.0, -0.3, -2.0, -0.9])
            .unwrap();
        let y = vec![1, 1, 0, 0];
        let kind = ClassifierKind::MaxMarginLinear(MaxMarginParams::default());
        assert_eq!(select_feature(&x, &y, &[0], &kind, None).unwrap(), 1);
        assert!(select_feature(&x, &y, &[0, 1], &kind, None).is_err());
    }
}
