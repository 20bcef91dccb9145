//! Topology - the fixed connectivity of the network.
//!
//! Each node owns an ordered list of neighbor slots. Weights live in a
//! parallel structure indexed by the same (node, slot) pairs, so the slot
//! order produced here is part of the contract.
//!
//! All variants except the square grid have a fixed degree. The square grid
//! uses a local window around each node's 2-D coordinate, which can shrink
//! when the grid is narrower than the window; lists are therefore ragged and
//! every consumer must use the actual list length.
//!
//! Small-world rewiring replaces slots independently per node, so a rewired
//! topology is in general no longer symmetric.

use crate::error::{ConfigError, Result, SparsenetError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Graph family used to wire the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopologyKind {
    /// K/2 nearest neighbors on each side of a cyclic index space.
    #[serde(alias = "r")]
    Ring,
    /// Like the ring but with K neighbors per side, i.e. degree 2K.
    #[serde(alias = "s", alias = "er-sym")]
    SymmetricRandom,
    /// Torus diagonals with strides `width ± 1`, K/4 per direction.
    #[serde(alias = "x")]
    XGrid,
    /// Torus axes: K/4 horizontal per side plus K/4 vertical (stride `width`) per side.
    #[serde(alias = "c")]
    CrossGrid,
    /// `(2·l+1)² − 1` window on a `width × height` grid, clamped at the border.
    #[serde(alias = "l")]
    SquareGrid,
}

impl TopologyKind {
    pub const ALL: [TopologyKind; 5] = [
        TopologyKind::Ring,
        TopologyKind::SymmetricRandom,
        TopologyKind::XGrid,
        TopologyKind::CrossGrid,
        TopologyKind::SquareGrid,
    ];

    /// Single-letter code used in output file names.
    pub fn code(&self) -> char {
        match self {
            TopologyKind::Ring => 'r',
            TopologyKind::SymmetricRandom => 's',
            TopologyKind::XGrid => 'x',
            TopologyKind::CrossGrid => 'c',
            TopologyKind::SquareGrid => 'l',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TopologyKind::Ring => "ring",
            TopologyKind::SymmetricRandom => "symmetric-random",
            TopologyKind::XGrid => "x-grid",
            TopologyKind::CrossGrid => "cross-grid",
            TopologyKind::SquareGrid => "square-grid",
        }
    }

    /// Whether the variant needs `width`/`height` to match N.
    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            TopologyKind::XGrid | TopologyKind::CrossGrid | TopologyKind::SquareGrid
        )
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TopologyKind {
    type Err = SparsenetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "r" | "ring" => Ok(TopologyKind::Ring),
            "s" | "er-sym" | "symmetric-random" => Ok(TopologyKind::SymmetricRandom),
            "x" | "x-grid" => Ok(TopologyKind::XGrid),
            "c" | "cross-grid" => Ok(TopologyKind::CrossGrid),
            "l" | "square-grid" => Ok(TopologyKind::SquareGrid),
            other => Err(ConfigError::UnsupportedTopology(other.to_string()).into()),
        }
    }
}

/// Construction parameters for a network topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Number of neurons N.
    pub neurons: usize,
    /// Nominal degree K.
    pub degree: usize,
    /// Small-world rewiring probability ω.
    pub rewiring: f64,
    /// Grid width (spatial topologies).
    pub width: usize,
    /// Grid height (spatial topologies).
    pub height: usize,
    pub topology: TopologyKind,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            neurons: 100,
            degree: 10,
            rewiring: 0.0,
            width: 10,
            height: 10,
            topology: TopologyKind::Ring,
        }
    }
}

impl NetworkConfig {
    /// Check that the parameters describe a buildable topology.
    pub fn validate(&self) -> Result<()> {
        let n = self.neurons;
        let k = self.degree;
        if n == 0 {
            return Err(SparsenetError::invalid_config(
                "neurons",
                n,
                "network needs at least one neuron",
            ));
        }
        if !(0.0..=1.0).contains(&self.rewiring) {
            return Err(SparsenetError::out_of_range("rewiring", 0.0, 1.0, self.rewiring));
        }

        let mismatch = |reason: &str| -> SparsenetError {
            ConfigError::DegreeMismatch {
                topology: self.topology.name().to_string(),
                degree: k,
                neurons: n,
                reason: reason.to_string(),
            }
            .into()
        };

        if self.topology.is_spatial() && self.width * self.height != n {
            return Err(ConfigError::GridMismatch {
                width: self.width,
                height: self.height,
                neurons: n,
            }
            .into());
        }

        match self.topology {
            TopologyKind::Ring => {
                if k == 0 || k % 2 != 0 {
                    return Err(mismatch("ring degree must be a positive even number"));
                }
                if k >= n {
                    return Err(mismatch("ring degree must be smaller than the network"));
                }
            }
            TopologyKind::SymmetricRandom => {
                if k == 0 {
                    return Err(mismatch("degree must be positive"));
                }
                if 2 * k >= n {
                    return Err(mismatch("symmetric-random needs 2K smaller than the network"));
                }
            }
            TopologyKind::XGrid | TopologyKind::CrossGrid => {
                if k == 0 || k % 4 != 0 {
                    return Err(mismatch("grid degree must be a positive multiple of 4"));
                }
                if k >= n {
                    return Err(mismatch("grid degree must be smaller than the network"));
                }
            }
            TopologyKind::SquareGrid => {
                if square_grid_side(k) == 0 {
                    return Err(mismatch("square grid needs K >= 8 so that the window side l >= 1"));
                }
            }
        }
        Ok(())
    }
}

/// Half-width `l` of the square-grid window for nominal degree K:
/// `floor((sqrt(K + 1) - 1) / 2)`.
pub fn square_grid_side(degree: usize) -> usize {
    (((degree as f64 + 1.0).sqrt() - 1.0) / 2.0).floor() as usize
}

/// Immutable adjacency structure of one simulated network.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkTopology {
    neurons: usize,
    degree: usize,
    rewiring: f64,
    kind: TopologyKind,
    adjacency: Vec<Vec<usize>>,
}

impl NetworkTopology {
    /// Build a topology, rewiring every slot with probability ω.
    pub fn build<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let n = config.neurons;

        let mut adjacency: Vec<Vec<usize>> = match config.topology {
            TopologyKind::Ring => (0..n).map(|i| ring_neighbors(i, n, config.degree / 2)).collect(),
            TopologyKind::SymmetricRandom => {
                (0..n).map(|i| ring_neighbors(i, n, config.degree)).collect()
            }
            TopologyKind::XGrid => (0..n)
                .map(|i| x_grid_neighbors(i, n, config.width, config.degree / 4))
                .collect(),
            TopologyKind::CrossGrid => (0..n)
                .map(|i| cross_grid_neighbors(i, n, config.width, config.degree / 4))
                .collect(),
            TopologyKind::SquareGrid => {
                let side = square_grid_side(config.degree);
                (0..n)
                    .map(|i| square_grid_neighbors(i, config.width, config.height, side))
                    .collect()
            }
        };

        for (node, list) in adjacency.iter().enumerate() {
            if list.contains(&node) {
                return Err(ConfigError::SelfLoop { node }.into());
            }
        }

        let mut rewired = 0usize;
        if config.rewiring > 0.0 {
            for (node, list) in adjacency.iter_mut().enumerate() {
                rewired += rewire(node, list, n, config.rewiring, rng)?;
            }
        }

        tracing::debug!(
            topology = %config.topology,
            neurons = n,
            degree = config.degree,
            slots = adjacency.iter().map(Vec::len).sum::<usize>(),
            rewired,
            "built topology"
        );

        Ok(Self {
            neurons: n,
            degree: config.degree,
            rewiring: config.rewiring,
            kind: config.topology,
            adjacency,
        })
    }

    /// Wrap an explicit adjacency list, checking ranges and self-loops.
    pub fn from_adjacency(kind: TopologyKind, adjacency: Vec<Vec<usize>>) -> Result<Self> {
        let n = adjacency.len();
        for (node, list) in adjacency.iter().enumerate() {
            if let Some(&bad) = list.iter().find(|&&j| j >= n) {
                return Err(SparsenetError::invalid_config(
                    format!("adjacency[{node}]"),
                    bad,
                    format!("neighbor index must be below {n}"),
                ));
            }
            if list.contains(&node) {
                return Err(ConfigError::SelfLoop { node }.into());
            }
        }
        let degree = adjacency.iter().map(Vec::len).max().unwrap_or(0);
        Ok(Self {
            neurons: n,
            degree,
            rewiring: 0.0,
            kind,
            adjacency,
        })
    }

    pub fn neurons(&self) -> usize {
        self.neurons
    }

    /// Nominal degree K requested at construction.
    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn rewiring(&self) -> f64 {
        self.rewiring
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    /// Neighbor slots of `node`.
    #[inline]
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    pub fn adjacency(&self) -> &[Vec<usize>] {
        &self.adjacency
    }

    /// Total number of (node, slot) pairs.
    pub fn slot_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn is_neighbor(&self, node: usize, other: usize) -> bool {
        self.adjacency[node].contains(&other)
    }
}

fn wrap(node: usize, offset: i64, n: usize) -> usize {
    (node as i64 + offset).rem_euclid(n as i64) as usize
}

/// `per_side` right neighbors interleaved with `per_side` left neighbors.
fn ring_neighbors(i: usize, n: usize, per_side: usize) -> Vec<usize> {
    let mut list = Vec::with_capacity(2 * per_side);
    for j in 1..=per_side as i64 {
        list.push(wrap(i, j, n));
        list.push(wrap(i, -j, n));
    }
    list
}

fn x_grid_neighbors(i: usize, n: usize, width: usize, per_direction: usize) -> Vec<usize> {
    let w = width as i64;
    let mut list = Vec::with_capacity(4 * per_direction);
    for j in 1..=per_direction as i64 {
        list.push(wrap(i, (w + 1) * j, n)); // right-down
        list.push(wrap(i, (w - 1) * j, n)); // left-down
        list.push(wrap(i, -(w - 1) * j, n)); // right-up
        list.push(wrap(i, -(w + 1) * j, n)); // left-up
    }
    list
}

fn cross_grid_neighbors(i: usize, n: usize, width: usize, per_direction: usize) -> Vec<usize> {
    let w = width as i64;
    let mut list = Vec::with_capacity(4 * per_direction);
    for j in 1..=per_direction as i64 {
        list.push(wrap(i, j, n));
        list.push(wrap(i, -j, n));
    }
    for j in 1..=per_direction as i64 {
        list.push(wrap(i, j * w, n));
        list.push(wrap(i, -j * w, n));
    }
    list
}

/// Inclusive window `[lo, hi]` of half-width `side` around `center`.
///
/// Near the border the window slides inward to keep its size; a grid narrower
/// than the window is covered entirely.
fn window(center: usize, side: usize, extent: usize) -> (usize, usize) {
    let span = 2 * side;
    if extent <= span {
        return (0, extent - 1);
    }
    let lo = center.saturating_sub(side).min(extent - 1 - span);
    (lo, lo + span)
}

fn square_grid_neighbors(i: usize, width: usize, height: usize, side: usize) -> Vec<usize> {
    let (row, col) = (i / width, i % width);
    let (row_lo, row_hi) = window(row, side, height);
    let (col_lo, col_hi) = window(col, side, width);

    let mut list = Vec::with_capacity((row_hi - row_lo + 1) * (col_hi - col_lo + 1) - 1);
    for r in row_lo..=row_hi {
        for c in col_lo..=col_hi {
            let j = r * width + c;
            if j != i {
                list.push(j);
            }
        }
    }
    list
}

/// Slot-wise rewiring of one node. Returns the number of replaced slots.
fn rewire<R: Rng + ?Sized>(
    node: usize,
    list: &mut [usize],
    n: usize,
    probability: f64,
    rng: &mut R,
) -> Result<usize> {
    let mut rewired = 0;
    for slot in 0..list.len() {
        if rng.gen::<f64>() >= probability {
            continue;
        }
        let distinct: HashSet<usize> = list.iter().copied().collect();
        if distinct.len() + 1 >= n {
            return Err(ConfigError::RewiringExhausted {
                node,
                degree: list.len(),
                neurons: n,
            }
            .into());
        }
        loop {
            let candidate = rng.gen_range(0..n);
            if candidate != node && !distinct.contains(&candidate) {
                list[slot] = candidate;
                rewired += 1;
                break;
            }
        }
    }
    Ok(rewired)
}
