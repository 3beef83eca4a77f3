//! This library compiles a tuple of multivariate integer polynomials into the
//! compact algebraic representation used by a partial-garbling scheme for
//! partially-hiding functional encryption (PHFE): each polynomial becomes a
//! weighted path-sum over a shared branching program, and that graph is
//! reduced to the matrices `L0`, `L1` and the cofactor vector `dfx` from
//! which `sum_i p_i(x) * z_i` is linearly reconstructable for any public
//! input `x`.
#![deny(
  warnings,
  unused,
  future_incompatible,
  nonstandard_style,
  rust_2018_idioms,
  missing_docs
)]
#![forbid(unsafe_code)]

pub mod abp;
pub mod errors;
pub mod garble;
pub mod matrix;
pub mod poly;

/// Start a span + timer, return `(Span, Instant)`.
macro_rules! start_span {
    ($name:expr $(, $($fmt:tt)+)?) => {{
        let span       = info_span!($name $(, $($fmt)+)?);
        let span_clone = span.clone();    // lives as long as the guard
        let _guard      = span_clone.enter();
        (span, Instant::now())
    }};
}
pub(crate) use start_span;

pub use errors::GarblingError;
pub use garble::{GarblingBundle, PrettyBundle, garble_polynomials};
pub use poly::{Monomial, Polynomial, Term, Variable};
