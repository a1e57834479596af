//! Fan-out/fan-in evaluation of candidate features.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

/// Score every candidate with `score` in parallel and return the scores in
/// candidate order.
///
/// When `num_threads` is set a dedicated pool is built for this call and
/// dropped when it returns; otherwise the global rayon pool is used. The
/// first error short-circuits the evaluation.
pub fn evaluate_candidates<F, E>(
    candidates: &[usize],
    num_threads: Option<usize>,
    score: F,
) -> Result<Vec<f64>, E>
where
    F: Fn(usize) -> Result<f64, E> + Send + Sync,
    E: Send,
{
    let run = || {
        candidates
            .par_iter()
            .map(|&candidate| score(candidate))
            .collect::<Result<Vec<f64>, E>>()
    };

    match num_threads {
        Some(threads) => match ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log::warn!(
                    "Failed to build a {}-thread pool ({}); using the global pool",
                    threads,
                    e
                );
                run()
            }
        },
        None => run(),
    }
}

/// Index of the maximum score, the lowest index winning ties. NaN never wins.
pub fn argmax_first(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &s) in scores.iter().enumerate() {
        if s.is_nan() {
            continue;
        }
        match best {
            Some(b) if s <= scores[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_keep_candidate_order() {
        let candidates: Vec<usize> = (0..200).rev().collect();
        let scores =
            evaluate_candidates::<_, ()>(&candidates, Some(4), |c| Ok(c as f64 * 2.0)).unwrap();
        assert_eq!(scores.len(), 200);
        assert_eq!(scores[0], 398.0);
        assert_eq!(scores[199], 0.0);
    }

    #[test]
    fn errors_propagate() {
        let result = evaluate_candidates(&[1, 2, 3], None, |c| {
            if c == 2 {
                Err("boom")
            } else {
                Ok(1.0)
            }
        });
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax_first(&[0.5, 2.0, 2.0, 1.0]), Some(1));
        assert_eq!(argmax_first(&[f64::NAN, 0.0, 0.0]), Some(1));
        assert_eq!(argmax_first(&[]), None);
        assert_eq!(argmax_first(&[f64::NAN]), None);
    }
}
