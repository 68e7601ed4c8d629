// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Random 3-colorings and the conflicting-edge scan run once per
// generator iteration.

use std::fmt;

use rand::Rng;

use crate::config::CAP;
use crate::graph::Graph;

pub const NUM_COLORS: u8 = 3;

// ---------------------------------------------------------------------------
// EncodedEdge
// ---------------------------------------------------------------------------

/// An edge `(u, v)` packed as `(u << 16) | v`.
///
/// Both halves are full 16-bit fields; decoding never masks narrower than
/// the encoder wrote.
#[repr(transparent)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedEdge(u32);

impl EncodedEdge {
    #[inline]
    pub const fn encode(u: u16, v: u16) -> Self {
        Self(((u as u32) << 16) | v as u32)
    }

    #[inline]
    pub const fn u(self) -> u16 {
        (self.0 >> 16) as u16
    }

    #[inline]
    pub const fn v(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EncodedEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.u(), self.v())
    }
}

// ---------------------------------------------------------------------------
// ResultSet
// ---------------------------------------------------------------------------

/// A candidate solution: the conflicting edges under one coloring.
///
/// This is the exact slot layout of the shared ring buffer, so it is
/// `repr(C)` and `Copy`; it always crosses the process boundary by value.
/// `edge_count` saturates at [`CAP`]; `truncated` records that more
/// conflicts existed than were stored.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSet {
    edge_count: u32,
    truncated: u32,
    edges: [EncodedEdge; CAP],
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSet {
    pub const fn new() -> Self {
        Self {
            edge_count: 0,
            truncated: 0,
            edges: [EncodedEdge(0); CAP],
        }
    }

    /// Build from an edge list, truncating past [`CAP`].
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (u16, u16)>,
    {
        let mut rs = Self::new();
        for (u, v) in edges {
            rs.push(u, v);
        }
        rs
    }

    /// Append an edge. Returns `false` (and marks the set truncated) when full.
    pub fn push(&mut self, u: u16, v: u16) -> bool {
        let n = self.edge_count as usize;
        if n >= CAP {
            self.truncated = 1;
            return false;
        }
        self.edges[n] = EncodedEdge::encode(u, v);
        self.edge_count += 1;
        true
    }

    /// Number of recorded edges (a lower bound when truncated).
    pub fn len(&self) -> usize {
        (self.edge_count as usize).min(CAP)
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated != 0
    }

    /// A complete, exact solution with no conflicts: the coloring is proper.
    pub fn is_proper_coloring(&self) -> bool {
        self.is_empty() && !self.is_truncated()
    }

    pub fn edges(&self) -> &[EncodedEdge] {
        &self.edges[..self.len()]
    }
}

/// `u1-v1 u2-v2 ...`
impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.edges().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Coloring
// ---------------------------------------------------------------------------

/// One color in `0..NUM_COLORS` per vertex; resampled in place each pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coloring {
    colors: Vec<u8>,
}

impl Coloring {
    /// All vertices colored 0.
    pub fn new(vertex_count: usize) -> Self {
        Self {
            colors: vec![0; vertex_count],
        }
    }

    /// Use a fixed assignment. Colors are reduced modulo [`NUM_COLORS`].
    pub fn from_colors(colors: Vec<u8>) -> Self {
        Self {
            colors: colors.into_iter().map(|c| c % NUM_COLORS).collect(),
        }
    }

    /// Draw a fresh uniform color for every vertex.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for c in &mut self.colors {
            *c = rng.gen_range(0..NUM_COLORS);
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Conflict scan
// ---------------------------------------------------------------------------

/// Collect every edge whose endpoints share a color.
///
/// The scan is row-major over the full matrix and always runs to completion;
/// only insertion stops once [`CAP`] edges are stored.
///
/// # Panics
/// If `coloring` has fewer entries than the graph has vertices.
pub fn find_conflicts(graph: &Graph, coloring: &Coloring) -> ResultSet {
    let colors = coloring.as_slice();
    assert!(
        colors.len() >= graph.vertex_count(),
        "coloring covers {} of {} vertices",
        colors.len(),
        graph.vertex_count()
    );

    let mut rs = ResultSet::new();
    for i in 0..graph.vertex_count() {
        let ci = colors[i];
        for (j, &adjacent) in graph.row(i).iter().enumerate() {
            if adjacent && colors[j] == ci {
                rs.push(i as u16, j as u16);
            }
        }
    }
    rs
}
