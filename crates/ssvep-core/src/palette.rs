#![forbid(unsafe_code)]

//! Flicker periods and the palette they are drawn from.
//!
//! A [`Period`] is the CSS animation duration of one half of a bright/dark
//! cycle: with `animation-direction: alternate` a full cycle takes two
//! periods, so the nominal flicker rate is `1 / period`.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Animation period in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(f64);

impl Period {
    /// 10 Hz nominal.
    pub const HZ_10: Self = Self(0.1);
    /// 30 Hz nominal.
    pub const HZ_30: Self = Self(0.0333);
    /// 50 Hz nominal.
    pub const HZ_50: Self = Self(0.02);

    /// Create a period from seconds.
    #[must_use]
    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Period in seconds.
    #[must_use]
    pub const fn as_secs(self) -> f64 {
        self.0
    }

    /// Nominal flicker rate in hertz.
    #[must_use]
    pub fn nominal_hz(self) -> f64 {
        1.0 / self.0
    }

    /// Whether this period can drive an animation.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    /// Value for the CSS `animation-duration` property.
    #[must_use]
    pub fn css_duration(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Ordered set of periods a stimulus may be assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    periods: Vec<Period>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(vec![Period::HZ_10, Period::HZ_30, Period::HZ_50])
    }
}

impl Palette {
    /// Create a palette from an ordered list of periods.
    #[must_use]
    pub fn new(periods: Vec<Period>) -> Self {
        Self { periods }
    }

    /// The periods, in palette order.
    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Whether `period` is one of the palette entries.
    #[must_use]
    pub fn contains(&self, period: Period) -> bool {
        self.periods.contains(&period)
    }

    /// Draw one period uniformly at random.
    ///
    /// Draws are independent; several stimuli may share a period. Returns
    /// `None` only for an empty palette.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Period> {
        if self.periods.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.periods.len());
        Some(self.periods[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn default_palette_matches_nominal_rates() {
        let palette = Palette::default();
        let hz: Vec<f64> = palette
            .periods()
            .iter()
            .map(|p| p.nominal_hz().round())
            .collect();
        assert_eq!(hz, vec![10.0, 30.0, 50.0]);
    }

    #[test]
    fn css_duration_uses_seconds() {
        assert_eq!(Period::HZ_10.css_duration(), "0.1s");
        assert_eq!(Period::HZ_30.css_duration(), "0.0333s");
        assert_eq!(Period::HZ_50.css_duration(), "0.02s");
    }

    #[test]
    fn draws_stay_in_palette_and_cover_it() {
        let palette = Palette::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut seen = [false; 3];
        for _ in 0..300 {
            let p = palette.draw(&mut rng).unwrap();
            let idx = palette.periods().iter().position(|&q| q == p).unwrap();
            seen[idx] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn empty_palette_draws_nothing() {
        let palette = Palette::new(Vec::new());
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(palette.draw(&mut rng).is_none());
    }

    #[test]
    fn invalid_periods() {
        assert!(!Period::from_secs(0.0).is_valid());
        assert!(!Period::from_secs(-0.1).is_valid());
        assert!(!Period::from_secs(f64::INFINITY).is_valid());
        assert!(Period::HZ_50.is_valid());
    }
}
