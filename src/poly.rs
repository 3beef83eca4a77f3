//! Polynomial model: variables, square-free monomials, terms, and polynomials
//! in sum-of-monomials form over the public-variable namespace `x0..x_{n-1}`.
//!
//! A `Polynomial` keeps its terms in the order they were supplied; term order
//! influences the shape of the branching program built from it, so it is not
//! normalized away. [`Polynomial::canonicalize`] produces the order-free form
//! used for outputs and comparisons.

use core::fmt;
use itertools::Itertools;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index into the ordered public-variable namespace; variable `v` denotes `x_v`.
pub type Variable = usize;

/// A product of public variables, stored sorted by index ascending.
///
/// The empty monomial denotes the constant `1`. Input polynomials must be
/// square-free per term; products formed inside the determinant engine may
/// carry repeated variables, so the representation permits them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Monomial {
  vars: Vec<Variable>,
}

impl Monomial {
  /// Creates a monomial from the given variables, sorting them by index.
  pub fn new(mut vars: Vec<Variable>) -> Self {
    vars.sort_unstable();
    Self { vars }
  }

  /// The empty monomial, i.e. the constant `1`.
  pub const fn one() -> Self {
    Self { vars: Vec::new() }
  }

  /// The variables of this monomial, sorted ascending.
  pub fn vars(&self) -> &[Variable] {
    &self.vars
  }

  /// Total degree of the monomial.
  pub fn degree(&self) -> usize {
    self.vars.len()
  }

  /// Returns true for the empty (constant) monomial.
  pub fn is_one(&self) -> bool {
    self.vars.is_empty()
  }

  /// Returns a variable that appears more than once, if any.
  pub fn repeated_var(&self) -> Option<Variable> {
    self
      .vars
      .windows(2)
      .find(|w| w[0] == w[1])
      .map(|w| w[0])
  }

  /// Multiplies by a single variable, keeping the sorted order.
  pub(crate) fn mul_var(&self, var: Variable) -> Self {
    let mut vars = self.vars.clone();
    let pos = vars.partition_point(|&v| v <= var);
    vars.insert(pos, var);
    Self { vars }
  }
}

impl fmt::Display for Monomial {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.vars.is_empty() {
      return write!(f, "1");
    }
    let factors = self
      .vars
      .iter()
      .dedup_with_count()
      .map(|(count, v)| {
        if count == 1 {
          format!("x{v}")
        } else {
          format!("x{v}^{count}")
        }
      })
      .join("*");
    write!(f, "{factors}")
  }
}

/// One term of a polynomial: an integer coefficient times a monomial.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
  /// The integer coefficient.
  pub coeff: BigInt,
  /// The monomial multiplied by the coefficient.
  pub monomial: Monomial,
}

impl Term {
  /// Creates a term from a coefficient and a list of variables.
  pub fn new(coeff: impl Into<BigInt>, vars: Vec<Variable>) -> Self {
    Self {
      coeff: coeff.into(),
      monomial: Monomial::new(vars),
    }
  }

  /// Creates a constant term.
  pub fn constant(coeff: impl Into<BigInt>) -> Self {
    Self {
      coeff: coeff.into(),
      monomial: Monomial::one(),
    }
  }
}

/// A multivariate integer polynomial as an ordered list of terms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polynomial {
  terms: Vec<Term>,
}

impl Polynomial {
  /// Creates a polynomial from terms, preserving their order.
  pub fn new(terms: Vec<Term>) -> Self {
    Self { terms }
  }

  /// The zero polynomial.
  pub fn zero() -> Self {
    Self { terms: Vec::new() }
  }

  /// A constant polynomial.
  pub fn constant(c: impl Into<BigInt>) -> Self {
    let c = c.into();
    if c.is_zero() {
      Self::zero()
    } else {
      Self {
        terms: vec![Term::constant(c)],
      }
    }
  }

  /// The terms of this polynomial, in their stored order.
  pub fn terms(&self) -> &[Term] {
    &self.terms
  }

  /// Returns true if the polynomial is identically zero.
  pub fn is_zero(&self) -> bool {
    self.terms.iter().all(|t| t.coeff.is_zero())
  }

  /// The largest variable index referenced, if any variable appears.
  pub fn max_variable(&self) -> Option<Variable> {
    self
      .terms
      .iter()
      .filter_map(|t| t.monomial.vars().last().copied())
      .max()
  }

  /// Evaluates the polynomial at the given assignment of public variables.
  ///
  /// # Panics
  /// Panics if a term references a variable index outside `assignment`.
  pub fn evaluate(&self, assignment: &[BigInt]) -> BigInt {
    let mut acc = BigInt::zero();
    for term in &self.terms {
      let mut val = term.coeff.clone();
      for &v in term.monomial.vars() {
        val *= &assignment[v];
      }
      acc += val;
    }
    acc
  }

  /// Combines like monomials, drops zero coefficients, and sorts terms into
  /// the canonical (lexicographic by monomial) order.
  pub fn canonicalize(&self) -> Self {
    let mut sum = PolySum::default();
    sum.add_poly(self);
    sum.into_polynomial()
  }

  /// Multiplies every coefficient by `c`.
  pub(crate) fn mul_scalar(&self, c: &BigInt) -> Self {
    if c.is_zero() {
      return Self::zero();
    }
    Self {
      terms: self
        .terms
        .iter()
        .map(|t| Term {
          coeff: &t.coeff * c,
          monomial: t.monomial.clone(),
        })
        .collect(),
    }
  }

  /// Multiplies every monomial by the variable `var`.
  pub(crate) fn mul_var(&self, var: Variable) -> Self {
    Self {
      terms: self
        .terms
        .iter()
        .map(|t| Term {
          coeff: t.coeff.clone(),
          monomial: t.monomial.mul_var(var),
        })
        .collect(),
    }
  }
}

impl fmt::Display for Polynomial {
  /// Canonical textual form, e.g. `3*x0*x1 - x2 + 7`.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let canon = self.canonicalize();
    if canon.terms.is_empty() {
      return write!(f, "0");
    }
    for (i, term) in canon.terms.iter().enumerate() {
      let mag = term.coeff.abs();
      if i == 0 {
        if term.coeff.is_negative() {
          write!(f, "-")?;
        }
      } else if term.coeff.is_negative() {
        write!(f, " - ")?;
      } else {
        write!(f, " + ")?;
      }
      if term.monomial.is_one() {
        write!(f, "{mag}")?;
      } else if mag.is_one() {
        write!(f, "{}", term.monomial)?;
      } else {
        write!(f, "{mag}*{}", term.monomial)?;
      }
    }
    Ok(())
  }
}

/// An order-free accumulator of terms, used to build canonical polynomials.
#[derive(Default)]
pub(crate) struct PolySum {
  terms: BTreeMap<Monomial, BigInt>,
}

impl PolySum {
  /// Adds `coeff * monomial` into the sum.
  pub(crate) fn add_term(&mut self, monomial: &Monomial, coeff: &BigInt) {
    if coeff.is_zero() {
      return;
    }
    *self
      .terms
      .entry(monomial.clone())
      .or_insert_with(BigInt::zero) += coeff;
  }

  /// Adds a polynomial into the sum.
  pub(crate) fn add_poly(&mut self, poly: &Polynomial) {
    for term in poly.terms() {
      self.add_term(&term.monomial, &term.coeff);
    }
  }

  /// Subtracts a polynomial from the sum.
  pub(crate) fn sub_poly(&mut self, poly: &Polynomial) {
    for term in poly.terms() {
      self.add_term(&term.monomial, &(-&term.coeff));
    }
  }

  /// Finishes the sum into a canonical polynomial.
  pub(crate) fn into_polynomial(self) -> Polynomial {
    Polynomial {
      terms: self
        .terms
        .into_iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(monomial, coeff)| Term { coeff, monomial })
        .collect(),
    }
  }
}
