//! Branching-program construction: a shared DAG whose weighted Start→End path
//! products sum to each input polynomial.
//!
//! Each term `c * x_{j1} * ... * x_{jk}` (variables sorted ascending) becomes
//! a walk `[c, x_{j1}, ..., x_{jk}]` from the Start node to the polynomial's
//! End node. Middle nodes are shared between terms of the same polynomial via
//! a lookup keyed by the tuple of not-yet-consumed walk values, so terms with
//! a common trailing monomial suffix reuse the same downstream structure.

use crate::{
  matrix::Entry,
  poly::{Polynomial, Variable},
};
use num_bigint::BigInt;
use std::collections::HashMap;

/// A node of the branching program.
///
/// The derived ordering (`Start`, then `Middle` by creation id, then `End` by
/// polynomial index) is the canonical ordering used to linearize the graph
/// into the adjacency matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
  /// The unique source node.
  Start,
  /// An internal node, identified by its creation id.
  Middle(usize),
  /// The sink node of the polynomial with the given index.
  End(usize),
}

/// The branching-program DAG built by one compilation.
///
/// Holds at most one edge per ordered node pair; writing a weight for an
/// existing pair overwrites the previous one.
#[derive(Debug)]
pub struct Graph {
  num_middle: usize,
  num_end: usize,
  edges: HashMap<(Node, Node), Entry>,
}

impl Graph {
  fn new(num_end: usize) -> Self {
    Self {
      num_middle: 0,
      num_end,
      edges: HashMap::new(),
    }
  }

  fn fresh_middle(&mut self) -> Node {
    let node = Node::Middle(self.num_middle);
    self.num_middle += 1;
    node
  }

  /// Sets the weight of the edge `u -> v`, overwriting any previous weight.
  pub fn set_edge(&mut self, u: Node, v: Node, weight: Entry) {
    self.edges.insert((u, v), weight);
  }

  /// The weight of the edge `u -> v`, if present.
  pub fn edge_weight(&self, u: Node, v: Node) -> Option<&Entry> {
    self.edges.get(&(u, v))
  }

  /// Total number of nodes: Start, Middles, and one End per polynomial.
  pub fn node_count(&self) -> usize {
    1 + self.num_middle + self.num_end
  }

  /// Number of Middle nodes created.
  pub fn middle_count(&self) -> usize {
    self.num_middle
  }

  /// Number of End nodes (one per input polynomial).
  pub fn end_count(&self) -> usize {
    self.num_end
  }

  /// Number of edges.
  pub fn edge_count(&self) -> usize {
    self.edges.len()
  }

  /// Iterates over all edges as `(source, target, weight)`.
  pub fn edges(&self) -> impl Iterator<Item = (Node, Node, &Entry)> {
    self.edges.iter().map(|(&(u, v), w)| (u, v, w))
  }

  /// Position of a node in the canonical ordering.
  pub fn node_index(&self, node: Node) -> usize {
    match node {
      Node::Start => 0,
      Node::Middle(id) => 1 + id,
      Node::End(i) => 1 + self.num_middle + i,
    }
  }
}

/// One step of a term walk: the coefficient edge or a variable edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum WalkValue {
  Coeff(BigInt),
  Var(Variable),
}

impl WalkValue {
  fn weight(&self) -> Entry {
    match self {
      WalkValue::Coeff(c) => Entry::Int(c.clone()),
      WalkValue::Var(v) => Entry::var(*v),
    }
  }
}

/// Builds the shared branching program for the given polynomials.
///
/// For each polynomial `i`, the sum over all Start→End_i paths of the product
/// of edge weights equals `p_i`. The suffix-sharing table is re-keyed per
/// polynomial, so structure is shared between terms of one polynomial only.
///
/// Inputs must already be validated (in-namespace, square-free); see
/// [`crate::garble::garble_polynomials`].
pub fn build_graph(polys: &[Polynomial]) -> Graph {
  let mut graph = Graph::new(polys.len());

  for (i, poly) in polys.iter().enumerate() {
    let end = Node::End(i);
    let mut node_of_suffix: HashMap<Vec<WalkValue>, Node> = HashMap::new();

    for term in poly.terms() {
      let mut walk = vec![WalkValue::Coeff(term.coeff.clone())];
      walk.extend(term.monomial.vars().iter().map(|&v| WalkValue::Var(v)));

      // Constant term: a single direct edge. A second constant term in the
      // same polynomial overwrites the first (last write wins).
      if walk.len() == 1 {
        graph.set_edge(Node::Start, end, walk[0].weight());
        continue;
      }

      let mut cur = Node::Start;
      let last = walk.len() - 1;
      for idx in 0..walk.len() {
        let weight = walk[idx].weight();
        if idx == last {
          graph.set_edge(cur, end, weight);
          break;
        }
        let suffix = walk[idx + 1..].to_vec();
        let next = match node_of_suffix.get(&suffix) {
          Some(&node) => node,
          None => {
            let node = graph.fresh_middle();
            node_of_suffix.insert(suffix, node);
            node
          }
        };
        graph.set_edge(cur, next, weight);
        cur = next;
      }
    }
  }

  graph
}
