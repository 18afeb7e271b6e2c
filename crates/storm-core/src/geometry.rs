//! Target-location geometry: the points rainfall is recorded at, their
//! orographic bands, and the discretized storm-center lattice.
//!
//! Coordinates are planar (UTM-style) metres; all coordinate math uses f64.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::curves::OroBand;
use crate::error::{Result, StormError};
use crate::grid::GridSource;

/// A location rainfall is recorded at: a real gauge (validation mode) or a
/// target-area grid node (simulation mode). Immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetLocation {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    /// Absent in validation mode, where bands come from group membership.
    pub elevation_m: Option<f64>,
    pub band: OroBand,
}

/// Classify an elevation into a band given the two cut elevations.
///
/// Intervals are half-open: [.., cut1) low, [cut1, cut2) mid, [cut2, ..)
/// high, so a boundary elevation lands deterministically in the upper band.
pub fn band_from_elevation(elevation_m: f64, cuts: (f64, f64)) -> OroBand {
    if elevation_m < cuts.0 {
        OroBand::Low
    } else if elevation_m < cuts.1 {
        OroBand::Mid
    } else {
        OroBand::High
    }
}

/// Gauge-id membership lists for the three bands (validation mode).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BandMembership {
    pub low: Vec<u32>,
    pub mid: Vec<u32>,
    pub high: Vec<u32>,
}

impl BandMembership {
    pub fn band_of(&self, gauge_id: u32) -> Option<OroBand> {
        if self.low.contains(&gauge_id) {
            Some(OroBand::Low)
        } else if self.mid.contains(&gauge_id) {
            Some(OroBand::Mid)
        } else if self.high.contains(&gauge_id) {
            Some(OroBand::High)
        } else {
            None
        }
    }
}

/// The immutable set of target locations for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSet {
    locations: Vec<TargetLocation>,
}

impl TargetSet {
    /// Validation mode: real gauges with an explicit band membership map.
    /// A gauge matching no group is a configuration mismatch, not a default.
    pub fn from_gauges(
        ids: &[u32],
        eastings: &[f64],
        northings: &[f64],
        membership: &BandMembership,
    ) -> Result<Self> {
        if ids.len() != eastings.len() || ids.len() != northings.len() {
            return Err(StormError::InvalidConfig(format!(
                "gauge table lengths differ: {} ids, {} eastings, {} northings",
                ids.len(),
                eastings.len(),
                northings.len()
            )));
        }
        let mut locations = Vec::with_capacity(ids.len());
        for (i, &id) in ids.iter().enumerate() {
            let band = membership.band_of(id).ok_or(StormError::UngroupedGauge(id))?;
            locations.push(TargetLocation {
                id,
                x: eastings[i],
                y: northings[i],
                elevation_m: None,
                band,
            });
        }
        Self::from_locations(locations)
    }

    /// Simulation mode: every open node plus every node within
    /// `buffer_width_m` of a catchment-perimeter node, banded by elevation.
    pub fn from_grid(
        source: &dyn GridSource,
        buffer_width_m: f64,
        band_cuts: (f64, f64),
    ) -> Result<Self> {
        let n = source.node_count();
        let mut in_target = vec![false; n];
        for node in source.perimeter_nodes() {
            let (px, py) = source.node_xy(node);
            for hit in source.nodes_within(px, py, buffer_width_m) {
                in_target[hit] = true;
            }
        }
        // Core nodes stamp over the buffered ring.
        for node in 0..n {
            if source.is_open(node) {
                in_target[node] = true;
            }
        }

        let mut locations = Vec::new();
        for node in 0..n {
            if !in_target[node] {
                continue;
            }
            let (x, y) = source.node_xy(node);
            let z = source.elevation(node);
            locations.push(TargetLocation {
                id: node as u32,
                x,
                y,
                elevation_m: Some(z),
                band: band_from_elevation(z, band_cuts),
            });
        }
        Self::from_locations(locations)
    }

    pub fn from_locations(locations: Vec<TargetLocation>) -> Result<Self> {
        if locations.is_empty() {
            return Err(StormError::EmptyTargetSet);
        }
        Ok(Self { locations })
    }

    pub fn locations(&self) -> &[TargetLocation] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Axis-aligned bounds (min_x, max_x, min_y, max_y) of the target set.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for loc in &self.locations {
            min_x = min_x.min(loc.x);
            max_x = max_x.max(loc.x);
            min_y = min_y.min(loc.y);
            max_y = max_y.max(loc.y);
        }
        (min_x, max_x, min_y, max_y)
    }
}

/// Discretized coordinate lattice storm centers are drawn from.
///
/// Centers are sampled from fixed axis tick sets, not from the continuous
/// plane; the resolution is a configuration input.
#[derive(Debug, Clone)]
pub struct CenterLattice {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl CenterLattice {
    /// Build a lattice spanning the target bounds at `spacing_m` resolution.
    /// Both axes always include their start tick, so a degenerate
    /// (single-point) extent still yields a sample.
    pub fn spanning(bounds: (f64, f64, f64, f64), spacing_m: f64) -> Self {
        let (min_x, max_x, min_y, max_y) = bounds;
        Self {
            xs: Self::ticks(min_x, max_x, spacing_m),
            ys: Self::ticks(min_y, max_y, spacing_m),
        }
    }

    fn ticks(lo: f64, hi: f64, spacing: f64) -> Vec<f64> {
        let n = ((hi - lo) / spacing).floor() as usize + 1;
        (0..n).map(|i| lo + i as f64 * spacing).collect()
    }

    /// Uniform draw of a lattice point: one x tick, then one y tick.
    pub fn sample(&self, rng: &mut StdRng) -> (f64, f64) {
        let x = self.xs[rng.gen_range(0..self.xs.len())];
        let y = self.ys[rng.gen_range(0..self.ys.len())];
        (x, y)
    }

    pub fn num_ticks(&self) -> (usize, usize) {
        (self.xs.len(), self.ys.len())
    }
}
