//! This module defines errors returned by the library.
use thiserror::Error;

/// Errors returned by the partial-garbling compiler
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum GarblingError {
  /// returned if the private-selector shape does not factor the number of polynomials
  #[error("InvalidConfiguration: {num_private_vars1} * {num_private_vars2} != {num_polys}")]
  InvalidConfiguration {
    /// first factor of the private-selector shape
    num_private_vars1: usize,
    /// second factor of the private-selector shape
    num_private_vars2: usize,
    /// number of polynomials supplied
    num_polys: usize,
  },
  /// returned if a term references a variable outside the declared public namespace
  #[error(
    "VariableOutOfRange: x{var} in polynomial {poly_index}, namespace holds {num_public_vars} variables"
  )]
  VariableOutOfRange {
    /// index of the offending polynomial
    poly_index: usize,
    /// the out-of-range variable index
    var: usize,
    /// size of the declared public namespace
    num_public_vars: usize,
  },
  /// returned if a term's monomial repeats a variable; inputs must be square-free per term
  #[error("RepeatedVariable: x{var} in polynomial {poly_index}")]
  RepeatedVariable {
    /// index of the offending polynomial
    poly_index: usize,
    /// the repeated variable index
    var: usize,
  },
  /// returned if an entry of the transposed Lx is neither an integer nor an
  /// integer multiple of one declared public variable
  #[error("NonAdmissibleEntry: at cell ({row}, {col})")]
  NonAdmissibleEntry {
    /// row of the offending cell
    row: usize,
    /// column of the offending cell
    col: usize,
  },
  /// returned when an internal invariant of the compilation is violated; this
  /// signals an implementation bug rather than bad input
  #[error("InternalInvariant: {reason}")]
  InternalInvariant {
    /// description of the violated invariant
    reason: String,
  },
}
