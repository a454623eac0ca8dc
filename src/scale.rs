//! Log-power scaling of commit counts onto bounded visual ranges.
//!
//! Commit counts are long-tailed: a handful of repositories carry thousands of
//! commits while most carry a few. Mapping them linearly would collapse almost
//! every node onto the minimum radius, so values are compressed with
//! `ln(x)^p` before being rescaled against the compressed population maximum.

/// Exponent applied to the natural log of each magnitude.
pub const LOG_POWER_EXPONENT: f64 = 3.15;

const TUKEY_FENCE_FACTOR: f64 = 1.5;

fn compress(value: f64) -> f64 {
    if value.is_nan() || value <= 1.0 {
        return 0.0;
    }
    value.ln().powf(LOG_POWER_EXPONENT)
}

fn usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Scaling reference for one population, reusable across many lookups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogPowerScale {
    reference: f64,
    cap: Option<f64>,
}

impl LogPowerScale {
    pub fn new(population: &[f64]) -> Self {
        let reference = population
            .iter()
            .copied()
            .filter(|value| usable(*value))
            .map(compress)
            .fold(0.0, f64::max);

        Self {
            reference,
            cap: None,
        }
    }

    /// Like [`LogPowerScale::new`], but values above the upper quartile fence
    /// are treated as if they sat on the fence, so a single outlier cannot
    /// shrink everything else.
    pub fn with_stray_suppression(population: &[f64]) -> Self {
        let Some(fences) = QuartileFences::from_population(population) else {
            return Self::new(population);
        };

        let reference = population
            .iter()
            .copied()
            .filter(|value| usable(*value))
            .map(|value| compress(value.min(fences.upper)))
            .fold(0.0, f64::max);

        Self {
            reference,
            cap: Some(fences.upper),
        }
    }

    pub fn map(&self, value: f64, max: f64, min: f64) -> f64 {
        if self.reference <= 0.0 {
            return min;
        }

        let value = match self.cap {
            Some(cap) => value.min(cap),
            None => value,
        };

        let compressed = compress(value);
        if compressed >= self.reference {
            return max;
        }

        let scaled = (max - min) * (compressed / self.reference) + min;
        if max >= min {
            scaled.clamp(min, max)
        } else {
            scaled
        }
    }
}

/// Maps `value` into `[min, max]` relative to `population`.
///
/// The population maximum maps to exactly `max`. A population whose
/// compressed maximum is zero (all ones, or no positive values) maps every
/// value to `min`.
pub fn scale(population: &[f64], value: f64, max: f64, min: f64) -> f64 {
    LogPowerScale::new(population).map(value, max, min)
}

/// Tukey fences over a population, used to flag stray magnitudes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuartileFences {
    pub first_quartile: f64,
    pub third_quartile: f64,
    pub lower: f64,
    pub upper: f64,
}

impl QuartileFences {
    pub fn from_population(population: &[f64]) -> Option<Self> {
        let mut sorted = population
            .iter()
            .copied()
            .filter(|value| value.is_finite())
            .collect::<Vec<_>>();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let first_quartile = quantile(&sorted, 0.25);
        let third_quartile = quantile(&sorted, 0.75);
        let spread = (third_quartile - first_quartile) * TUKEY_FENCE_FACTOR;

        Some(Self {
            first_quartile,
            third_quartile,
            lower: first_quartile - spread,
            upper: third_quartile + spread,
        })
    }

    pub fn is_stray(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn population_maximum_maps_to_max_exactly() {
        let population = [1.0, 3.0, 7.0, 120.0, 4000.0];
        assert_eq!(scale(&population, 4000.0, 15.0, 4.0), 15.0);
        assert_eq!(scale(&population, 4000.0, 1.0, 0.3), 1.0);
    }

    #[test]
    fn single_element_population_maps_to_max() {
        assert_eq!(scale(&[5.0], 5.0, 6.0, 3.0), 6.0);
    }

    #[test]
    fn all_ones_population_maps_to_min() {
        assert_eq!(scale(&[1.0, 1.0, 1.0], 1.0, 4.0, 2.0), 2.0);
        assert_eq!(scale(&[], 10.0, 4.0, 2.0), 2.0);
    }

    #[test]
    fn values_above_population_saturate() {
        assert_eq!(scale(&[2.0, 10.0], 5000.0, 15.0, 4.0), 15.0);
    }

    #[test]
    fn sub_unit_values_map_to_min_without_nan() {
        let population = [0.5, 2.0, 30.0];
        let scaled = scale(&population, 0.5, 10.0, 1.0);
        assert_eq!(scaled, 1.0);
        assert!(!scale(&population, f64::NAN, 10.0, 1.0).is_nan());
    }

    #[test]
    fn compression_flattens_long_tail() {
        let population = [2.0, 10.0, 10_000.0];
        let linear = 10.0 / 10_000.0;
        let scaled = scale(&population, 10.0, 1.0, 0.0);
        assert!(scaled > linear * 5.0, "scaled {scaled} should exceed linear {linear}");
    }

    #[test]
    fn quartile_fences_flag_outliers() {
        let population = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let fences = QuartileFences::from_population(&population).expect("non-empty");
        assert_eq!(fences.first_quartile, 3.0);
        assert_eq!(fences.third_quartile, 7.0);
        assert_eq!(fences.upper, 13.0);
        assert!(fences.is_stray(100.0));
        assert!(!fences.is_stray(8.0));
        assert!(QuartileFences::from_population(&[]).is_none());
    }

    #[test]
    fn stray_suppression_keeps_outlier_from_shrinking_the_rest() {
        let population = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100_000.0];
        let plain = LogPowerScale::new(&population);
        let suppressed = LogPowerScale::with_stray_suppression(&population);

        assert!(suppressed.map(8.0, 1.0, 0.0) > plain.map(8.0, 1.0, 0.0));
        assert_eq!(suppressed.map(100_000.0, 1.0, 0.0), 1.0);
    }

    fn population_strategy() -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(1.5f64..100_000.0, 1..40)
    }

    proptest! {
        #[test]
        fn prop_members_stay_within_bounds(
            population in population_strategy(),
            pick in any::<prop::sample::Index>(),
            min in 0.0f64..10.0,
            extra in 0.0f64..10.0,
        ) {
            let max = min + extra;
            let value = population[pick.index(population.len())];
            let scaled = scale(&population, value, max, min);
            prop_assert!(scaled >= min && scaled <= max, "{scaled} not in [{min}, {max}]");

            let top = population.iter().copied().fold(f64::MIN, f64::max);
            prop_assert_eq!(scale(&population, top, max, min), max);
        }

        #[test]
        fn prop_monotonic_in_value(
            population in population_strategy(),
            a in 1.0f64..100_000.0,
            b in 1.0f64..100_000.0,
        ) {
            let scale = LogPowerScale::new(&population);
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scale.map(low, 15.0, 4.0) <= scale.map(high, 15.0, 4.0));
        }
    }
}
