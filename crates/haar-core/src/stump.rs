//! Decision stumps: one Haar feature, one threshold, one vote.
use crate::feature::HaarFeature;
use crate::integral::IntegralImages;

/// Direction of a stump's threshold comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    /// Votes positive when the response is at or below the threshold.
    Positive,
    /// Votes positive when the response is at or above the threshold.
    Negative,
}

impl Polarity {
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }
}

impl TryFrom<f64> for Polarity {
    type Error = String;

    fn try_from(v: f64) -> Result<Self, Self::Error> {
        if v == 1.0 {
            Ok(Polarity::Positive)
        } else if v == -1.0 {
            Ok(Polarity::Negative)
        } else {
            Err(format!("invalid polarity {v}, expected 1 or -1"))
        }
    }
}

/// A trained weak classifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stump {
    pub feature: HaarFeature,
    /// Decision threshold at scale 1.
    pub threshold: f64,
    pub polarity: Polarity,
    /// Boosting weight ("amount of say").
    pub weight: f64,
    /// Training error; not used for inference.
    pub error: f64,
}

impl Stump {
    /// Binary vote (`+1.0` or `-1.0`) for a feature response observed at
    /// `scale`.
    ///
    /// Responses grow with the evaluated area, so the threshold is scaled by
    /// `scale^2`.
    #[inline]
    pub fn vote(&self, response: f64, scale: f64) -> f64 {
        let p = self.polarity.sign();
        if p * response <= p * (self.threshold * scale * scale) {
            1.0
        } else {
            -1.0
        }
    }

    /// Weighted vote of this stump for the window at `(x, y)`.
    #[inline]
    pub fn evaluate(&self, ii: &IntegralImages, x: u32, y: u32, scale: f64) -> f64 {
        let response = self.feature.apply(ii, x, y, scale);
        self.weight * self.vote(response, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureShape;

    fn stump(threshold: f64, polarity: Polarity) -> Stump {
        Stump {
            feature: HaarFeature::new(FeatureShape::EdgeHorizontal, 2, 2, 0, 0),
            threshold,
            polarity,
            weight: 1.0,
            error: 0.0,
        }
    }

    #[test]
    fn positive_polarity_votes_for_low_responses() {
        let s = stump(2.0, Polarity::Positive);
        assert_eq!(s.vote(1.0, 1.0), 1.0);
        assert_eq!(s.vote(2.0, 1.0), 1.0);
        assert_eq!(s.vote(2.5, 1.0), -1.0);
    }

    #[test]
    fn negative_polarity_votes_for_high_responses() {
        let s = stump(2.0, Polarity::Negative);
        assert_eq!(s.vote(2.5, 1.0), 1.0);
        assert_eq!(s.vote(2.0, 1.0), 1.0);
        assert_eq!(s.vote(1.0, 1.0), -1.0);
    }

    #[test]
    fn threshold_scales_with_square_of_scale() {
        let s = stump(3.0, Polarity::Positive);
        // effective threshold at scale 2 is 12, not 6
        assert_eq!(s.vote(11.9, 2.0), 1.0);
        assert_eq!(s.vote(12.0, 2.0), 1.0);
        assert_eq!(s.vote(12.1, 2.0), -1.0);
        assert_eq!(s.vote(7.0, 2.0), 1.0);
    }

    #[test]
    fn polarity_from_training_values() {
        assert_eq!(Polarity::try_from(1.0), Ok(Polarity::Positive));
        assert_eq!(Polarity::try_from(-1.0), Ok(Polarity::Negative));
        assert!(Polarity::try_from(0.0).is_err());
    }
}
