//! External geometry provider interface and a raster reference
//! implementation.
//!
//! The generator never owns topography; it queries a read-only source once
//! at setup to build its target set and then works purely on coordinates.

use serde::{Deserialize, Serialize};

/// Read-only geometry and elevation source for a bounding study area.
///
/// Node ids are dense `0..node_count()`. Closed nodes sit outside the
/// catchment but may still become rainfall targets through the perimeter
/// buffer.
pub trait GridSource {
    fn node_count(&self) -> usize;
    /// Planar (x, y) of a node, metres.
    fn node_xy(&self, node: usize) -> (f64, f64);
    /// Open (inside the catchment) vs closed classification.
    fn is_open(&self, node: usize) -> bool;
    /// Elevation of a node, metres.
    fn elevation(&self, node: usize) -> f64;
    /// Nodes on the catchment perimeter: open nodes adjacent to the closed
    /// exterior.
    fn perimeter_nodes(&self) -> Vec<usize>;

    /// All nodes within `radius` metres of (x, y). The default scans every
    /// node; implementations with spatial indexes may override.
    fn nodes_within(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let r2 = radius * radius;
        (0..self.node_count())
            .filter(|&n| {
                let (nx, ny) = self.node_xy(n);
                let dx = nx - x;
                let dy = ny - y;
                dx * dx + dy * dy <= r2
            })
            .collect()
    }
}

/// Regular raster grid: row-major nodes at fixed spacing, with open/closed
/// status and an elevation field. Serves tests and the CLI driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    /// Node spacing in metres.
    pub spacing_m: f64,
    /// (x, y) of node 0 (row 0, col 0).
    pub origin: (f64, f64),
    /// Row-major open/closed flags, length `width * height`.
    pub open: Vec<bool>,
    /// Row-major elevations in metres, length `width * height`.
    pub elevation_m: Vec<f64>,
}

impl RasterGrid {
    /// Uniform grid, all nodes open, flat at `elevation_m`.
    pub fn flat(width: usize, height: usize, spacing_m: f64, elevation_m: f64) -> Self {
        Self {
            width,
            height,
            spacing_m,
            origin: (0.0, 0.0),
            open: vec![true; width * height],
            elevation_m: vec![elevation_m; width * height],
        }
    }

    fn node_rc(&self, node: usize) -> (usize, usize) {
        (node / self.width, node % self.width)
    }
}

impl GridSource for RasterGrid {
    fn node_count(&self) -> usize {
        self.width * self.height
    }

    fn node_xy(&self, node: usize) -> (f64, f64) {
        let (r, c) = self.node_rc(node);
        (self.origin.0 + c as f64 * self.spacing_m, self.origin.1 + r as f64 * self.spacing_m)
    }

    fn is_open(&self, node: usize) -> bool {
        self.open[node]
    }

    fn elevation(&self, node: usize) -> f64 {
        self.elevation_m[node]
    }

    fn perimeter_nodes(&self) -> Vec<usize> {
        // An open node is on the perimeter when a 4-neighbour is closed or
        // falls off the grid edge.
        let mut out = Vec::new();
        for node in 0..self.node_count() {
            if !self.open[node] {
                continue;
            }
            let (r, c) = self.node_rc(node);
            let on_edge = r == 0 || c == 0 || r == self.height - 1 || c == self.width - 1;
            let closed_neighbour = [
                (r > 0).then(|| node - self.width),
                (r + 1 < self.height).then(|| node + self.width),
                (c > 0).then(|| node - 1),
                (c + 1 < self.width).then(|| node + 1),
            ]
            .into_iter()
            .flatten()
            .any(|n| !self.open[n]);
            if on_edge || closed_neighbour {
                out.push(node);
            }
        }
        out
    }
}
