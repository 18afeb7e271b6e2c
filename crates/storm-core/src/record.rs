//! Flat output records: the per-storm table, per-year summaries, and the
//! assembled run output handed to downstream consumers.

use serde::{Deserialize, Serialize};

/// One realized storm. Append-only row; one per storm across the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormRecord {
    /// Id across all years of the run, 0-based.
    pub storm_id: usize,
    /// Simulated year, 0-based.
    pub year: usize,
    pub area_m2: f64,
    pub duration_min: f64,
    /// 1-based intensity-duration curve id.
    pub curve_id: usize,
    /// Storm-center peak intensity, mm/h.
    pub intensity_mmhr: f64,
    pub recession: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub locations_hit: usize,
    /// intensity · duration / 60, mm.
    pub center_total_mm: f64,
}

/// Per-year diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: usize,
    /// Sampled annual target Ptot, mm.
    pub target_mm: f64,
    pub storm_count: usize,
    /// Stopping statistic at year end (median under the default rule), mm.
    pub realized_mm: f64,
    /// The year hit the storm-count ceiling without satisfying the
    /// termination test: degraded but completed.
    pub budget_exhausted: bool,
}

/// Everything a run produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub records: Vec<StormRecord>,
    /// Per-location count of storms that hit it, aligned with the target set.
    pub hit_counts: Vec<u32>,
    /// Concatenated per-hit series, one entry per (storm, hit location).
    pub intensities_mmhr: Vec<f64>,
    pub durations_min: Vec<f64>,
    pub storm_totals_mm: Vec<f64>,
    /// Per-storm inter-arrival times, hours; drives water-balance consumers.
    pub interarrivals_hr: Vec<f64>,
    /// Sampled annual target per year, mm.
    pub annual_targets_mm: Vec<f64>,
    pub years: Vec<YearSummary>,
    /// Final per-location annual totals, indexed [year][location], mm.
    pub final_totals_mm: Vec<Vec<f64>>,
}
