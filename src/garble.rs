//! From branching program to garbling matrices: adjacency assembly, the
//! Laplacian-like `Lx` matrix, the cofactor (signed-minor) vector `dfx`, and
//! the `L0`/`L1` split consumed by the partial-garbling scheme.
//!
//! `Lx = Adjacency - Identity` with the Start column removed; its cofactors
//! are the generating functions of weighted path sums from Start to every
//! node, which is what aligns `dfx[i]` with polynomial `i` after rotation.

use crate::{
  abp::{Graph, build_graph},
  errors::GarblingError,
  matrix::{Entry, Matrix, determinant},
  poly::Polynomial,
  start_span,
};
use num_bigint::BigInt;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, info_span};

/// The immutable output of one compilation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarblingBundle {
  /// Size of the public-variable namespace `x0..x_{n-1}`.
  pub num_public_vars: usize,
  /// First factor of the private-selector shape.
  pub num_private_vars1: usize,
  /// Second factor of the private-selector shape.
  pub num_private_vars2: usize,
  /// The input polynomials, as supplied.
  pub polys: Vec<Polynomial>,
  /// Cofactor vector; entry `i < num_polys` corresponds to polynomial `i`,
  /// the remaining entries to the Start and Middle nodes. Length equals the
  /// total node count of the branching program.
  pub dfx: Vec<Polynomial>,
  /// Constant part of the transposed non-End rows of `Lx`.
  pub l0: Matrix<BigInt>,
  /// Per-public-variable linear part, column-blocked: block `k` holds the
  /// coefficients of `x_k` and has the same width as `l0`.
  pub l1: Matrix<BigInt>,
}

impl GarblingBundle {
  /// The bundle with symbolic entries rendered in their canonical textual
  /// form, for diffable fixtures and human-readable export.
  pub fn to_pretty(&self) -> PrettyBundle {
    PrettyBundle {
      num_public_vars: self.num_public_vars,
      num_private_vars1: self.num_private_vars1,
      num_private_vars2: self.num_private_vars2,
      polys: self.polys.iter().map(|p| p.to_string()).collect(),
      dfx_coeffs: self.dfx.iter().map(|p| p.to_string()).collect(),
      l0: self
        .l0
        .to_rows()
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect(),
      l1: self
        .l1
        .to_rows()
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect(),
    }
  }
}

/// A [`GarblingBundle`] with every entry rendered as text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrettyBundle {
  /// Size of the public-variable namespace.
  pub num_public_vars: usize,
  /// First factor of the private-selector shape.
  pub num_private_vars1: usize,
  /// Second factor of the private-selector shape.
  pub num_private_vars2: usize,
  /// Canonical text of each input polynomial.
  pub polys: Vec<String>,
  /// Canonical text of each cofactor entry.
  pub dfx_coeffs: Vec<String>,
  /// `L0` as nested decimal strings.
  pub l0: Vec<Vec<String>>,
  /// `L1` as nested decimal strings.
  pub l1: Vec<Vec<String>>,
}

/// Linearizes the graph into a square matrix under the canonical node
/// ordering; cell `(i, j)` is the weight of the edge `i -> j`, or zero.
pub fn adjacency_matrix(graph: &Graph) -> Matrix<Entry> {
  let n = graph.node_count();
  let mut adj = Matrix::zero(n, n);
  for (u, v, weight) in graph.edges() {
    adj[(graph.node_index(u), graph.node_index(v))] = weight.clone();
  }
  adj
}

/// `Lx = Adjacency - Identity`, with the Start column (column 0) removed.
pub fn lx_matrix(adj: &Matrix<Entry>) -> Matrix<Entry> {
  let mut lx = adj.clone();
  for i in 0..lx.rows() {
    // the graph has no self-loops, so the diagonal is integer zero
    debug_assert!(lx[(i, i)].is_zero());
    lx[(i, i)] = Entry::from(-1);
  }
  lx.delete_col(0)
}

/// Computes the signed-minor vector of `Lx` and rotates the End-node entries
/// to the front.
///
/// For each row `i`, the row is deleted, the determinant of the remaining
/// square matrix is taken, and the result is signed by
/// `(-1)^((i+1)+(cols+1))`. The `num_polys` trailing entries (the End rows,
/// which sort last in the canonical ordering) are then moved to the front,
/// preserving relative order.
///
/// The row tasks are independent pure functions of `(Lx, i)` and are
/// dispatched on the rayon pool; results land in their slot by row index, so
/// the output is deterministic regardless of completion order.
pub fn cofactor_vector(lx: &Matrix<Entry>, num_polys: usize) -> Vec<Polynomial> {
  let rows = lx.rows();
  let cols = lx.cols();
  assert!(num_polys <= rows);

  let coeffs: Vec<Polynomial> = (0..rows)
    .into_par_iter()
    .map(|i| {
      let minor = determinant(&lx.delete_row(i));
      if (i + cols) % 2 == 1 {
        minor.mul_scalar(&BigInt::from(-1))
      } else {
        minor
      }
    })
    .collect();

  let mut dfx = coeffs[rows - num_polys..].to_vec();
  dfx.extend_from_slice(&coeffs[..rows - num_polys]);
  dfx
}

/// Splits the transposed non-End rows of `Lx` into the constant matrix `L0`
/// and the per-public-variable blocks of `L1`.
///
/// With `Lx_bar = transpose(Lx[0..rows-num_polys, :])`: an integer entry goes
/// into `L0`, an entry `coeff * x_k` puts `coeff` into column `k*width + j`
/// of `L1`. An entry referencing a variable outside the declared namespace is
/// a structural violation of the admissible input shape and is reported with
/// its cell location.
pub fn split_l0_l1(
  lx: &Matrix<Entry>,
  num_polys: usize,
  num_public_vars: usize,
) -> Result<(Matrix<BigInt>, Matrix<BigInt>), GarblingError> {
  let width = lx.rows() - num_polys;
  let height = lx.cols();
  let mut l0 = Matrix::zero(height, width);
  let mut l1 = Matrix::zero(height, width * num_public_vars);

  for i in 0..height {
    for j in 0..width {
      // (j, i): Lx_bar is the transpose of the kept rows
      match &lx[(j, i)] {
        Entry::Int(c) => l0[(i, j)] = c.clone(),
        Entry::Linear { coeff, var } => {
          if *var >= num_public_vars {
            return Err(GarblingError::NonAdmissibleEntry { row: i, col: j });
          }
          l1[(i, var * width + j)] = coeff.clone();
        }
      }
    }
  }

  Ok((l0, l1))
}

fn validate_inputs(num_public_vars: usize, polys: &[Polynomial]) -> Result<(), GarblingError> {
  for (poly_index, poly) in polys.iter().enumerate() {
    for term in poly.terms() {
      if let Some(var) = term.monomial.repeated_var() {
        return Err(GarblingError::RepeatedVariable { poly_index, var });
      }
      if let Some(&var) = term.monomial.vars().last() {
        if var >= num_public_vars {
          return Err(GarblingError::VariableOutOfRange {
            poly_index,
            var,
            num_public_vars,
          });
        }
      }
    }
  }
  Ok(())
}

/// Compiles a tuple of polynomials into its partial-garbling representation.
///
/// This is the single compilation entry point: it validates the
/// configuration and input shape, builds the shared branching program,
/// assembles `Lx`, and computes `dfx` and the `L0`/`L1` split (the latter two
/// concurrently, as both only read `Lx`). All errors surface synchronously;
/// the computation is deterministic, so nothing is retried.
pub fn garble_polynomials(
  num_public_vars: usize,
  num_private_vars1: usize,
  num_private_vars2: usize,
  polys: &[Polynomial],
) -> Result<GarblingBundle, GarblingError> {
  if num_private_vars1 * num_private_vars2 != polys.len() {
    return Err(GarblingError::InvalidConfiguration {
      num_private_vars1,
      num_private_vars2,
      num_polys: polys.len(),
    });
  }
  validate_inputs(num_public_vars, polys)?;
  let num_polys = polys.len();

  let (_bp_span, bp_t) = start_span!("build_branching_program");
  let graph = build_graph(polys);
  info!(
    elapsed_ms = %bp_t.elapsed().as_millis(),
    nodes = graph.node_count(),
    edges = graph.edge_count(),
    "build_branching_program"
  );

  let (_lx_span, lx_t) = start_span!("assemble_lx");
  let adj = adjacency_matrix(&graph);
  let lx = lx_matrix(&adj);
  info!(elapsed_ms = %lx_t.elapsed().as_millis(), "assemble_lx");

  if lx.cols() < num_polys {
    return Err(GarblingError::InternalInvariant {
      reason: format!(
        "Lx has {} columns but {} End rows must rotate to the front",
        lx.cols(),
        num_polys
      ),
    });
  }

  let (_cof_span, cof_t) = start_span!("cofactors_and_split");
  let (dfx, split) = rayon::join(
    || cofactor_vector(&lx, num_polys),
    || split_l0_l1(&lx, num_polys, num_public_vars),
  );
  let (l0, l1) = split?;
  info!(elapsed_ms = %cof_t.elapsed().as_millis(), "cofactors_and_split");

  Ok(GarblingBundle {
    num_public_vars,
    num_private_vars1,
    num_private_vars2,
    polys: polys.to_vec(),
    dfx,
    l0,
    l1,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::poly::Term;

  fn big(v: i64) -> BigInt {
    BigInt::from(v)
  }

  #[test]
  fn test_constant_polynomial_boundary() {
    // p0 = 7 over an empty namespace: Start -7-> End, no Middle nodes
    let bundle = garble_polynomials(0, 1, 1, &[Polynomial::constant(7)]).unwrap();
    assert_eq!(bundle.dfx.len(), 2);
    assert_eq!(bundle.dfx[0].to_string(), "7");
    assert_eq!(bundle.dfx[1].to_string(), "1");
    assert_eq!(bundle.l0.to_rows(), vec![vec![big(7)]]);
    assert_eq!(bundle.l1.cols(), 0);
  }

  #[test]
  fn test_single_variable_polynomial() {
    // p0 = x0: nodes Start, M0, End
    let p = Polynomial::new(vec![Term::new(1, vec![0])]);
    let bundle = garble_polynomials(1, 1, 1, &[p]).unwrap();

    assert_eq!(bundle.dfx.len(), 3);
    assert_eq!(bundle.dfx[0].to_string(), "x0");
    assert_eq!(bundle.dfx[1].to_string(), "1");
    assert_eq!(bundle.dfx[2].to_string(), "1");

    assert_eq!(
      bundle.l0.to_rows(),
      vec![vec![big(1), big(-1)], vec![big(0), big(0)]]
    );
    assert_eq!(
      bundle.l1.to_rows(),
      vec![vec![big(0), big(0)], vec![big(0), big(1)]]
    );
  }

  #[test]
  fn test_lx_shape_and_contents() {
    let p = Polynomial::new(vec![Term::new(1, vec![0])]);
    let graph = build_graph(&[p]);
    let lx = lx_matrix(&adjacency_matrix(&graph));
    // rows: Start, M0, End; cols: M0, End
    assert_eq!((lx.rows(), lx.cols()), (3, 2));
    assert_eq!(lx[(0, 0)], Entry::from(1));
    assert_eq!(lx[(0, 1)], Entry::from(0));
    assert_eq!(lx[(1, 0)], Entry::from(-1));
    assert_eq!(lx[(1, 1)], Entry::var(0));
    assert_eq!(lx[(2, 0)], Entry::from(0));
    assert_eq!(lx[(2, 1)], Entry::from(-1));
  }

  #[test]
  fn test_dfx_entries_equal_input_polynomials() {
    let polys = vec![
      Polynomial::new(vec![
        Term::new(3, vec![0, 1]),
        Term::new(5, vec![1, 2]),
        Term::constant(7),
      ]),
      Polynomial::new(vec![
        Term::new(2, vec![0, 2]),
        Term::new(4, vec![1]),
        Term::constant(6),
      ]),
    ];
    let bundle = garble_polynomials(3, 1, 2, &polys).unwrap();
    for (i, p) in polys.iter().enumerate() {
      assert_eq!(bundle.dfx[i], p.canonicalize());
    }
  }

  #[test]
  fn test_adjacency_matches_reference_example() {
    // p0 = 3*x0*x1 + 5*x1*x2 + 7, p1 = 2*x0*x2 + 4*x1 + 6
    let polys = vec![
      Polynomial::new(vec![
        Term::new(3, vec![0, 1]),
        Term::new(5, vec![1, 2]),
        Term::constant(7),
      ]),
      Polynomial::new(vec![
        Term::new(2, vec![0, 2]),
        Term::new(4, vec![1]),
        Term::constant(6),
      ]),
    ];
    let graph = build_graph(&polys);
    assert_eq!(graph.node_count(), 10);
    let adj = adjacency_matrix(&graph);

    // order: Start, M0..M6, End0, End1
    let z = Entry::from(0);
    let expected = vec![
      // Start row: coefficient edges and the two constant terms
      vec![
        z.clone(),
        Entry::from(3),
        z.clone(),
        Entry::from(5),
        z.clone(),
        Entry::from(2),
        z.clone(),
        Entry::from(4),
        Entry::from(7),
        Entry::from(6),
      ],
      // M0 -x0-> M1
      vec![
        z.clone(),
        z.clone(),
        Entry::var(0),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
      ],
      // M1 -x1-> End0
      vec![
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        Entry::var(1),
        z.clone(),
      ],
      // M2 -x1-> M3
      vec![
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        Entry::var(1),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
      ],
      // M3 -x2-> End0
      vec![
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        Entry::var(2),
        z.clone(),
      ],
      // M4 -x0-> M5
      vec![
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        Entry::var(0),
        z.clone(),
        z.clone(),
        z.clone(),
      ],
      // M5 -x2-> End1
      vec![
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        Entry::var(2),
      ],
      // M6 -x1-> End1
      vec![
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        z.clone(),
        Entry::var(1),
      ],
      // End rows are empty
      vec![z.clone(); 10],
      vec![z.clone(); 10],
    ];
    assert_eq!(adj.to_rows(), expected);
  }

  #[test]
  fn test_invalid_configuration_rejected_before_graph_work() {
    let err = garble_polynomials(1, 2, 3, &[Polynomial::constant(1)]).unwrap_err();
    assert_eq!(
      err,
      GarblingError::InvalidConfiguration {
        num_private_vars1: 2,
        num_private_vars2: 3,
        num_polys: 1,
      }
    );
  }

  #[test]
  fn test_variable_outside_namespace_rejected() {
    let p = Polynomial::new(vec![Term::new(1, vec![0, 4])]);
    let err = garble_polynomials(3, 1, 1, &[p]).unwrap_err();
    assert_eq!(
      err,
      GarblingError::VariableOutOfRange {
        poly_index: 0,
        var: 4,
        num_public_vars: 3,
      }
    );
  }

  #[test]
  fn test_repeated_variable_rejected() {
    let p = Polynomial::new(vec![Term {
      coeff: big(1),
      monomial: crate::poly::Monomial::new(vec![1, 1]),
    }]);
    let err = garble_polynomials(3, 1, 1, &[p]).unwrap_err();
    assert_eq!(
      err,
      GarblingError::RepeatedVariable {
        poly_index: 0,
        var: 1,
      }
    );
  }

  #[test]
  fn test_pretty_bundle() {
    let p = Polynomial::new(vec![Term::new(1, vec![0]), Term::constant(-2)]);
    let bundle = garble_polynomials(1, 1, 1, &[p]).unwrap();
    let pretty = bundle.to_pretty();
    assert_eq!(pretty.polys, vec!["-2 + x0".to_string()]);
    assert_eq!(pretty.dfx_coeffs[0], "-2 + x0");
    assert_eq!(pretty.l0.len(), bundle.l0.rows());
  }
}
