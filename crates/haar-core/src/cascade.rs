//! Attentional cascade over an ordered bank of decision stumps.
//!
//! Stumps are evaluated strictly in training order while a running score of
//! weighted votes accumulates. At each checkpoint in [`CHECKPOINTS`] the
//! window is dropped unless the score is positive, so most background windows
//! cost one or ten stump evaluations.
use crate::integral::IntegralImages;
use crate::stump::Stump;

/// Cumulative stump counts at which the running score is checked.
pub const CHECKPOINTS: [usize; 7] = [1, 10, 100, 500, 2000, 4000, 6000];

/// Stumps past this count are never evaluated.
pub const MAX_STUMPS: usize = CHECKPOINTS[CHECKPOINTS.len() - 1];

/// Result of running the cascade on one window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CascadeOutcome {
    /// Every checkpoint passed; `score` is the final running score.
    Accepted { score: f64 },
    /// The running score was not positive at checkpoint `stage` (index into
    /// [`CHECKPOINTS`]) after `evaluated` stumps.
    Rejected { stage: usize, evaluated: usize },
}

impl CascadeOutcome {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, CascadeOutcome::Accepted { .. })
    }
}

/// Immutable, ordered stump bank.
///
/// Built once from training data. To change the model, build a new
/// `Cascade` and swap it in; a search in progress keeps the one it borrowed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cascade {
    stumps: Vec<Stump>,
}

impl Cascade {
    pub fn new(stumps: Vec<Stump>) -> Self {
        Self { stumps }
    }

    #[inline]
    pub fn stumps(&self) -> &[Stump] {
        &self.stumps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stumps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stumps.is_empty()
    }

    /// Run the cascade on the window at `(x, y)` and `scale`.
    #[inline]
    pub fn evaluate(&self, ii: &IntegralImages, x: u32, y: u32, scale: f64) -> CascadeOutcome {
        self.run(|stump| stump.evaluate(ii, x, y, scale))
    }

    /// Drive the checkpoint state machine with a caller-supplied weighted
    /// vote per stump.
    ///
    /// Running out of stumps before [`MAX_STUMPS`] counts as reaching the
    /// pending checkpoint, so the same `score <= 0` test is applied once more
    /// (an empty bank therefore rejects everything).
    pub fn run(&self, mut weighted_vote: impl FnMut(&Stump) -> f64) -> CascadeOutcome {
        let mut score = 0.0f64;
        let mut stage = 0usize;
        let mut evaluated = 0usize;

        for stump in self.stumps.iter().take(MAX_STUMPS) {
            score += weighted_vote(stump);
            evaluated += 1;

            if evaluated == CHECKPOINTS[stage] {
                if score <= 0.0 {
                    return CascadeOutcome::Rejected { stage, evaluated };
                }
                stage += 1;
            }
        }

        if stage < CHECKPOINTS.len() && score <= 0.0 {
            return CascadeOutcome::Rejected { stage, evaluated };
        }

        CascadeOutcome::Accepted { score }
    }
}

impl FromIterator<Stump> for Cascade {
    fn from_iter<I: IntoIterator<Item = Stump>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureShape, HaarFeature};
    use crate::stump::Polarity;

    fn stump(weight: f64) -> Stump {
        Stump {
            feature: HaarFeature::new(FeatureShape::EdgeHorizontal, 2, 2, 0, 0),
            threshold: 0.0,
            polarity: Polarity::Positive,
            weight,
            error: 0.0,
        }
    }

    /// Cascade whose stumps "vote" their own weight.
    fn scripted(weights: &[f64]) -> Cascade {
        weights.iter().copied().map(stump).collect()
    }

    fn run_scripted(c: &Cascade) -> CascadeOutcome {
        c.run(|s| s.weight)
    }

    #[test]
    fn empty_bank_rejects_at_first_checkpoint() {
        let c = Cascade::default();
        assert_eq!(run_scripted(&c), CascadeOutcome::Rejected { stage: 0, evaluated: 0 });
    }

    #[test]
    fn negative_first_vote_rejects_after_one_stump() {
        let ii = IntegralImages::from_gray(&[0.5; 16], 4, 4);
        // flat patch: response 0 <= threshold 0, vote +1, weight -1
        let c = Cascade::new(vec![stump(-1.0), stump(100.0)]);
        assert_eq!(
            c.evaluate(&ii, 0, 0, 1.0),
            CascadeOutcome::Rejected { stage: 0, evaluated: 1 }
        );
    }

    #[test]
    fn rejects_at_second_checkpoint() {
        let mut w = vec![1.0];
        w.extend(std::iter::repeat(-1.0).take(9));
        w.extend(std::iter::repeat(5.0).take(20));
        let c = scripted(&w);
        assert_eq!(run_scripted(&c), CascadeOutcome::Rejected { stage: 1, evaluated: 10 });
    }

    #[test]
    fn score_may_dip_between_checkpoints() {
        let mut w = vec![5.0];
        w.extend(std::iter::repeat(-2.0).take(4));
        w.extend(std::iter::repeat(1.0).take(5));
        let c = scripted(&w);
        assert_eq!(run_scripted(&c), CascadeOutcome::Accepted { score: 2.0 });
    }

    #[test]
    fn exhaustion_applies_pending_checkpoint() {
        let c = scripted(&[1.0, -1.0, -1.0, -1.0, -1.0]);
        assert_eq!(run_scripted(&c), CascadeOutcome::Rejected { stage: 1, evaluated: 5 });

        let c = scripted(&[1.0, 1.0, -0.5]);
        assert_eq!(run_scripted(&c), CascadeOutcome::Accepted { score: 1.5 });
    }

    #[test]
    fn stumps_past_the_last_checkpoint_are_ignored() {
        let mut w = vec![1.0; MAX_STUMPS];
        w.push(-1.0e9);
        let c = scripted(&w);
        let mut calls = 0;
        let out = c.run(|s| {
            calls += 1;
            s.weight
        });
        assert_eq!(calls, MAX_STUMPS);
        assert_eq!(out, CascadeOutcome::Accepted { score: MAX_STUMPS as f64 });
    }
}
