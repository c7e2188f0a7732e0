//! Dense adjacency view of the topology.
//!
//! Rebuilt from scratch on every snapshot; the id ↔ index mapping is a
//! bijection over the nodes of that snapshot only.

use std::collections::HashMap;

use crate::graph::topology::EdgeData;

/// N×N composite-weight matrix with `+∞` for missing edges and `0` on the
/// diagonal. Symmetric, since the graph is undirected.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyMatrix {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    weights: Vec<Vec<f64>>,
}

impl AdjacencyMatrix {
    pub(crate) fn build(
        node_order: &[String],
        edges: &HashMap<(String, String), EdgeData>,
    ) -> Self {
        let n = node_order.len();
        let ids = node_order.to_vec();
        let index: HashMap<String, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut weights = vec![vec![f64::INFINITY; n]; n];
        for (i, row) in weights.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        for ((a, b), edge) in edges {
            if let (Some(&i), Some(&j)) = (index.get(a), index.get(b)) {
                weights[i][j] = edge.weight;
                weights[j][i] = edge.weight;
            }
        }

        Self { ids, index, weights }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn id_at(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    /// Row-major weight matrix.
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }
}
