// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Directed graph parsed from "u v" edge tokens, stored as a dense
// adjacency matrix for O(1) edge tests during the conflict scan.

use std::fmt;

use crate::config::MAX_VERTICES;
use crate::error::{Error, Result};

/// Immutable graph built once per generator process.
///
/// The matrix is directed-as-given: the token `"0 1"` sets only the
/// `0 -> 1` cell. Self-loops are kept and always conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    vertex_count: usize,
    edges: Vec<(u16, u16)>,
    adjacency: Vec<bool>,
}

impl Graph {
    /// Parse edge tokens of the form `"<u> <v>"`.
    ///
    /// `vertex_count` is one plus the largest index seen. Duplicate tokens
    /// collapse into a single matrix cell.
    pub fn parse<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut edges = Vec::new();
        for token in tokens {
            edges.push(parse_edge(token.as_ref())?);
        }
        if edges.is_empty() {
            return Err(Error::Parse {
                token: String::new(),
                reason: "at least one edge is required".into(),
            });
        }
        Ok(Self::from_edges(edges))
    }

    fn from_edges(mut edges: Vec<(u16, u16)>) -> Self {
        let vertex_count = edges
            .iter()
            .map(|&(u, v)| u.max(v) as usize + 1)
            .max()
            .unwrap_or(1);

        let mut adjacency = vec![false; vertex_count * vertex_count];
        edges.retain(|&(u, v)| {
            let cell = &mut adjacency[u as usize * vertex_count + v as usize];
            let fresh = !*cell;
            *cell = true;
            fresh
        });

        Self {
            vertex_count,
            edges,
            adjacency,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Distinct edges in input order.
    pub fn edges(&self) -> &[(u16, u16)] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_adjacent(&self, u: usize, v: usize) -> bool {
        self.adjacency[u * self.vertex_count + v]
    }

    /// Row `u` of the adjacency matrix.
    #[inline]
    pub fn row(&self, u: usize) -> &[bool] {
        let start = u * self.vertex_count;
        &self.adjacency[start..start + self.vertex_count]
    }
}

fn parse_edge(token: &str) -> Result<(u16, u16)> {
    let bad = |reason: String| Error::Parse {
        token: token.to_owned(),
        reason,
    };

    let mut parts = token.split_whitespace();
    let (u, v) = match (parts.next(), parts.next(), parts.next()) {
        (Some(u), Some(v), None) => (u, v),
        _ => return Err(bad("expected two vertex indices \"<u> <v>\"".into())),
    };
    Ok((parse_vertex(u).map_err(&bad)?, parse_vertex(v).map_err(&bad)?))
}

fn parse_vertex(s: &str) -> std::result::Result<u16, String> {
    let idx: usize = s
        .parse()
        .map_err(|e| format!("`{s}` is not a non-negative integer ({e})"))?;
    if idx >= MAX_VERTICES {
        return Err(format!("vertex index {idx} exceeds {}", MAX_VERTICES - 1));
    }
    Ok(idx as u16)
}

/// Adjacency matrix dump, one row per line: `[0] [1] [0] `.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for u in 0..self.vertex_count {
            for &cell in self.row(u) {
                write!(f, "[{}] ", cell as u8)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
