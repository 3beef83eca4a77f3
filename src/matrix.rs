//! Exact symbolic matrix arithmetic over entries that are either integer
//! constants or an integer multiple of a single public variable.
//!
//! The determinant is computed by Laplace expansion along columns with
//! sub-determinants memoized per remaining-row set, so identical minors are
//! evaluated once instead of the `O(n!)` times a naive expansion would. All
//! coefficients are arbitrary-precision integers; no division is performed.

use crate::poly::{PolySum, Polynomial, Variable};
use bitvec::vec::BitVec;
use core::fmt;
use num_bigint::BigInt;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::{
  collections::HashMap,
  ops::{Index, IndexMut},
};

/// A matrix entry: an integer, or `coeff * x_var` for one public variable.
///
/// This is the full set of shapes a branching-program adjacency matrix can
/// contain; entries mixing two variables are unrepresentable by construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
  /// An integer constant.
  Int(BigInt),
  /// An integer multiple of a single public variable.
  Linear {
    /// The integer coefficient.
    coeff: BigInt,
    /// The public variable index.
    var: Variable,
  },
}

impl Entry {
  /// The additive identity.
  pub fn zero() -> Self {
    Entry::Int(BigInt::zero())
  }

  /// An entry holding the bare variable `x_var`.
  pub fn var(var: Variable) -> Self {
    Entry::Linear {
      coeff: BigInt::one(),
      var,
    }
  }

  /// Returns true if the entry is the integer zero.
  pub fn is_zero(&self) -> bool {
    match self {
      Entry::Int(c) => c.is_zero(),
      Entry::Linear { coeff, .. } => coeff.is_zero(),
    }
  }

  /// The entry as a single-term polynomial.
  pub fn to_polynomial(&self) -> Polynomial {
    match self {
      Entry::Int(c) => Polynomial::constant(c.clone()),
      Entry::Linear { coeff, var } => Polynomial::constant(coeff.clone()).mul_var(*var),
    }
  }

  /// Multiplies a polynomial by this entry.
  fn mul_poly(&self, p: &Polynomial) -> Polynomial {
    match self {
      Entry::Int(c) => p.mul_scalar(c),
      Entry::Linear { coeff, var } => p.mul_scalar(coeff).mul_var(*var),
    }
  }
}

impl Default for Entry {
  fn default() -> Self {
    Entry::zero()
  }
}

impl From<i64> for Entry {
  fn from(c: i64) -> Self {
    Entry::Int(BigInt::from(c))
  }
}

impl From<BigInt> for Entry {
  fn from(c: BigInt) -> Self {
    Entry::Int(c)
  }
}

impl fmt::Display for Entry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_polynomial())
  }
}

/// A dense row-major matrix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix<T> {
  rows: usize,
  cols: usize,
  data: Vec<T>,
}

impl<T: Clone + Default> Matrix<T> {
  /// Creates a `rows x cols` matrix filled with `T::default()`.
  pub fn zero(rows: usize, cols: usize) -> Self {
    Self {
      rows,
      cols,
      data: vec![T::default(); rows * cols],
    }
  }
}

impl<T: Clone> Matrix<T> {
  /// Number of rows.
  pub fn rows(&self) -> usize {
    self.rows
  }

  /// Number of columns.
  pub fn cols(&self) -> usize {
    self.cols
  }

  /// Returns a copy with row `i` removed.
  pub fn delete_row(&self, i: usize) -> Self {
    assert!(i < self.rows);
    let mut data = Vec::with_capacity((self.rows - 1) * self.cols);
    for r in 0..self.rows {
      if r != i {
        data.extend_from_slice(&self.data[r * self.cols..(r + 1) * self.cols]);
      }
    }
    Self {
      rows: self.rows - 1,
      cols: self.cols,
      data,
    }
  }

  /// Returns a copy with column `j` removed.
  pub fn delete_col(&self, j: usize) -> Self {
    assert!(j < self.cols);
    let mut data = Vec::with_capacity(self.rows * (self.cols - 1));
    for r in 0..self.rows {
      for c in 0..self.cols {
        if c != j {
          data.push(self.data[r * self.cols + c].clone());
        }
      }
    }
    Self {
      rows: self.rows,
      cols: self.cols - 1,
      data,
    }
  }

  /// The matrix as nested row vectors.
  pub fn to_rows(&self) -> Vec<Vec<T>> {
    (0..self.rows)
      .map(|r| self.data[r * self.cols..(r + 1) * self.cols].to_vec())
      .collect()
  }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
  type Output = T;

  #[inline]
  fn index(&self, (r, c): (usize, usize)) -> &T {
    debug_assert!(r < self.rows && c < self.cols);
    &self.data[r * self.cols + c]
  }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
  #[inline]
  fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
    debug_assert!(r < self.rows && c < self.cols);
    &mut self.data[r * self.cols + c]
  }
}

/// Exact determinant of a square symbolic matrix, as a polynomial in the
/// public variables.
///
/// Expansion proceeds along columns left to right; the recursion state is the
/// set of rows not yet consumed, and sub-determinants are memoized under that
/// set. On the sparse matrices produced by branching programs the number of
/// distinct row sets stays small, which is what makes the cofactor step
/// tractable.
pub fn determinant(m: &Matrix<Entry>) -> Polynomial {
  assert_eq!(m.rows(), m.cols(), "determinant requires a square matrix");
  let n = m.rows();
  let mut avail: BitVec = BitVec::repeat(true, n);
  let mut memo: HashMap<BitVec, Polynomial> = HashMap::new();
  det_rec(m, &mut avail, 0, &mut memo)
}

fn det_rec(
  m: &Matrix<Entry>,
  avail: &mut BitVec,
  col: usize,
  memo: &mut HashMap<BitVec, Polynomial>,
) -> Polynomial {
  let n = m.cols();
  if col == n {
    return Polynomial::constant(1);
  }
  if let Some(p) = memo.get(avail) {
    return p.clone();
  }

  let mut acc = PolySum::default();
  let rows: Vec<usize> = avail.iter_ones().collect();
  for (pos, &r) in rows.iter().enumerate() {
    let entry = &m[(r, col)];
    if entry.is_zero() {
      continue;
    }
    avail.set(r, false);
    let sub = det_rec(m, avail, col + 1, memo);
    avail.set(r, true);
    let contribution = entry.mul_poly(&sub);
    if pos % 2 == 0 {
      acc.add_poly(&contribution);
    } else {
      acc.sub_poly(&contribution);
    }
  }

  let result = acc.into_polynomial();
  memo.insert(avail.clone(), result.clone());
  result
}
