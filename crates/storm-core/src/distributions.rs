//! Truncated parametric distributions fitted to the Walnut Gulch station
//! record, plus the discrete helpers (categorical curve choice, intensity
//! fuzz) the storm sampler draws from.
//!
//! Truncation policy: REJECTION. Out-of-interval draws are redrawn, never
//! clipped, so the realized density inside [lo, hi] keeps the family's tail
//! shape. A draw that cannot land inside the interval within
//! `MAX_REJECTION_ATTEMPTS` is an error.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StormError};

/// Redraw budget before a truncation interval is declared unreachable.
const MAX_REJECTION_ATTEMPTS: u32 = 1000;

/// Parametric family of a fitted distribution.
///
/// GEV shape follows the scipy `genextreme` sign convention: positive shape
/// gives a bounded upper tail, shape 0 degenerates to Gumbel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    Normal,
    GeneralizedExtremeValue,
}

/// One fitted, truncated distribution: family + (location, scale, shape)
/// + the closed truncation interval every realized value must lie in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TruncatedDist {
    pub family: Family,
    pub location: f64,
    pub scale: f64,
    /// 0 for the normal family.
    pub shape: f64,
    /// [lo, hi] interval the realized value must fall in.
    pub truncation: (f64, f64),
}

impl TruncatedDist {
    pub fn normal(location: f64, scale: f64, lo: f64, hi: f64) -> Self {
        Self { family: Family::Normal, location, scale, shape: 0.0, truncation: (lo, hi) }
    }

    pub fn gev(shape: f64, scale: f64, location: f64, lo: f64, hi: f64) -> Self {
        Self { family: Family::GeneralizedExtremeValue, location, scale, shape, truncation: (lo, hi) }
    }

    pub fn validate(&self, name: &'static str) -> Result<()> {
        if !(self.scale > 0.0) || !self.scale.is_finite() {
            return Err(StormError::InvalidDistribution {
                name,
                reason: format!("scale must be positive and finite (got {})", self.scale),
            });
        }
        if !self.location.is_finite() || !self.shape.is_finite() {
            return Err(StormError::InvalidDistribution {
                name,
                reason: "location and shape must be finite".into(),
            });
        }
        if self.family == Family::Normal && self.shape != 0.0 {
            return Err(StormError::InvalidDistribution {
                name,
                reason: format!("normal family requires shape 0 (got {})", self.shape),
            });
        }
        let (lo, hi) = self.truncation;
        if !(lo < hi) {
            return Err(StormError::InvalidDistribution {
                name,
                reason: format!("truncation interval is inverted or empty: [{lo}, {hi}]"),
            });
        }
        Ok(())
    }

    /// One draw, rejected back into the truncation interval.
    pub fn sample(&self, name: &'static str, rng: &mut StdRng) -> Result<f64> {
        let (lo, hi) = self.truncation;
        for _ in 0..MAX_REJECTION_ATTEMPTS {
            let v = self.draw_untruncated(rng);
            if v >= lo && v <= hi {
                return Ok(v);
            }
        }
        Err(StormError::TruncationExhausted { name, attempts: MAX_REJECTION_ATTEMPTS, lo, hi })
    }

    fn draw_untruncated(&self, rng: &mut StdRng) -> f64 {
        match self.family {
            Family::Normal => {
                // Scale is validated positive, so construction cannot fail.
                let normal = Normal::new(self.location, self.scale)
                    .expect("validated normal parameters");
                normal.sample(rng)
            }
            Family::GeneralizedExtremeValue => {
                // Inverse-CDF transform. p is in (0, 1].
                let p: f64 = 1.0 - rng.gen::<f64>();
                let neg_ln_p = -p.ln();
                if self.shape == 0.0 {
                    // Gumbel limit.
                    self.location - self.scale * neg_ln_p.ln()
                } else {
                    self.location + self.scale * (1.0 - neg_ln_p.powf(self.shape)) / self.shape
                }
            }
        }
    }
}

/// A validated discrete probability mass over `len()` outcomes.
///
/// Weight validation happens here, once, so samplers can draw without
/// re-checking on the hot path.
#[derive(Debug, Clone)]
pub struct Categorical {
    index: WeightedIndex<f64>,
    len: usize,
}

impl Categorical {
    /// Weights must be non-negative and sum to 1 within `tol` = 1e-3.
    pub fn new(weights: &[f64]) -> Result<Self> {
        let sum: f64 = weights.iter().sum();
        if weights.iter().any(|&w| w < 0.0) || (sum - 1.0).abs() > 1e-3 {
            return Err(StormError::InvalidWeights { sum });
        }
        let index = WeightedIndex::new(weights)
            .map_err(|_| StormError::InvalidWeights { sum })?;
        Ok(Self { index, len: weights.len() })
    }

    /// Draw an index in `0..len()` with the configured mass.
    pub fn sample(&self, rng: &mut StdRng) -> usize {
        self.index.sample(rng)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The five fitted distributions plus the discrete fuzz-offset table.
///
/// Defaults are the Walnut Gulch, AZ monsoon calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionCatalog {
    /// Total annual precipitation, mm.
    pub ptot_mm: TruncatedDist,
    /// Storm duration, minutes.
    pub duration_min: TruncatedDist,
    /// Storm footprint area, m².
    pub area_m2: TruncatedDist,
    /// Inter-arrival time between storms, hours.
    pub interarrival_hr: TruncatedDist,
    /// Spatial recession coefficient (Morin et al., 2005).
    pub recession: TruncatedDist,
    /// Discrete offsets added to the curve intensity, mm/h.
    pub fuzz_mmhr: Vec<f64>,
}

impl Default for DistributionCatalog {
    fn default() -> Self {
        Self {
            ptot_mm: TruncatedDist::normal(207.489, 63.9894, 1.0, 460.0),
            duration_min: TruncatedDist::gev(0.570252, 35.7389, 34.1409, 1.0, 1040.0),
            area_m2: TruncatedDist::gev(0.0, 2.83876e7, 1.22419e8, 5.0e6, 3.0e8),
            interarrival_hr: TruncatedDist::gev(0.807971, 9.49574, 10.6108, 0.0, 120.0),
            recession: TruncatedDist::normal(0.25, 0.08, 0.15, 0.67),
            fuzz_mmhr: (-5..=5).map(f64::from).collect(),
        }
    }
}

impl DistributionCatalog {
    pub fn validate(&self) -> Result<()> {
        self.ptot_mm.validate("ptot_mm")?;
        self.duration_min.validate("duration_min")?;
        self.area_m2.validate("area_m2")?;
        self.interarrival_hr.validate("interarrival_hr")?;
        self.recession.validate("recession")?;
        if self.fuzz_mmhr.is_empty() {
            return Err(StormError::InvalidConfig("fuzz table must be non-empty".into()));
        }
        Ok(())
    }

    /// Uniform draw (with replacement) from the fuzz-offset table.
    pub fn sample_fuzz(&self, rng: &mut StdRng) -> f64 {
        self.fuzz_mmhr[rng.gen_range(0..self.fuzz_mmhr.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Every realized value must lie inside the truncation interval, for
    /// every catalog member, across many seeds.
    #[test]
    fn all_samples_respect_truncation_interval() {
        let cat = DistributionCatalog::default();
        let members: [(&str, &TruncatedDist); 5] = [
            ("ptot_mm", &cat.ptot_mm),
            ("duration_min", &cat.duration_min),
            ("area_m2", &cat.area_m2),
            ("interarrival_hr", &cat.interarrival_hr),
            ("recession", &cat.recession),
        ];
        for seed in 0..50u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            for (name, dist) in members {
                let (lo, hi) = dist.truncation;
                for _ in 0..100 {
                    let v = dist.sample("test", &mut rng).expect("sampling must succeed");
                    assert!(
                        v >= lo && v <= hi,
                        "{name} seed {seed}: {v} outside [{lo}, {hi}]"
                    );
                }
            }
        }
    }

    #[test]
    fn nonpositive_scale_rejected() {
        let d = TruncatedDist::normal(10.0, 0.0, 0.0, 20.0);
        assert!(d.validate("d").is_err());
        let d = TruncatedDist::normal(10.0, -1.0, 0.0, 20.0);
        assert!(d.validate("d").is_err());
    }

    #[test]
    fn inverted_truncation_rejected() {
        let d = TruncatedDist::normal(10.0, 1.0, 20.0, 0.0);
        assert!(d.validate("d").is_err());
    }

    #[test]
    fn gumbel_median_near_analytic_value() {
        // Shape 0 GEV median = mu - sigma * ln(ln 2).
        let d = TruncatedDist::gev(0.0, 10.0, 100.0, f64::MIN, f64::MAX);
        let mut rng = StdRng::seed_from_u64(7);
        let mut vals: Vec<f64> =
            (0..20_000).map(|_| d.sample("gumbel", &mut rng).unwrap()).collect();
        vals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = vals[vals.len() / 2];
        let expected = 100.0 - 10.0 * std::f64::consts::LN_2.ln();
        assert!(
            (median - expected).abs() < 0.5,
            "empirical median {median:.3} vs analytic {expected:.3}"
        );
    }

    #[test]
    fn bounded_gev_never_exceeds_upper_endpoint() {
        // Positive shape bounds the upper tail at mu + sigma/shape.
        let d = TruncatedDist::gev(0.5, 10.0, 50.0, f64::MIN, f64::MAX);
        let endpoint = 50.0 + 10.0 / 0.5;
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10_000 {
            let v = d.sample("gev", &mut rng).unwrap();
            assert!(v <= endpoint + 1e-9, "{v} exceeds upper endpoint {endpoint}");
        }
    }

    #[test]
    fn unreachable_truncation_interval_errors() {
        // Interval ~60 sigma out in the tail: rejection must give up loudly.
        let d = TruncatedDist::normal(0.0, 1.0, 60.0, 61.0);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            d.sample("far_tail", &mut rng),
            Err(StormError::TruncationExhausted { .. })
        ));
    }

    #[test]
    fn categorical_rejects_bad_mass() {
        assert!(Categorical::new(&[0.5, 0.4]).is_err(), "sum 0.9 must fail");
        assert!(Categorical::new(&[1.5, -0.5]).is_err(), "negative weight must fail");
        assert!(Categorical::new(&[0.25; 4]).is_ok());
    }

    #[test]
    fn categorical_draws_cover_support() {
        let c = Categorical::new(&[0.5, 0.5]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = [false; 2];
        for _ in 0..100 {
            seen[c.sample(&mut rng)] = true;
        }
        assert!(seen[0] && seen[1], "both outcomes should appear in 100 draws");
    }

    #[test]
    fn fuzz_draws_come_from_table() {
        let cat = DistributionCatalog::default();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let f = cat.sample_fuzz(&mut rng);
            assert!(cat.fuzz_mmhr.contains(&f), "fuzz {f} not in table");
        }
    }
}
