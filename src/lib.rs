//! Sparse least-squares kernel for ADMM gain synthesis.
//!
//! Each ADMM iteration of a formation-control gain design solves a sparse
//! least-squares subproblem `A x ≈ b`. This crate provides the pieces for it
//! on compressed sparse column (CSC) matrices, without densifying them.
//!
//! How it works (high level):
//! - Assemble augmented systems with `vertical_concat` (e.g. a regularization
//!   block stacked beneath the constraint matrix).
//! - Order columns by nonzero count and fill estimate (`sort_range_by_keys`).
//! - Factor with `iterated_qr`: sparse Householder QR that marks numerically
//!   dependent columns instead of failing, then re-runs with those columns
//!   moved last so the accepted part of `R` is square upper triangular.
//! - Back-substitute with `FactorizationResult::solve`, or call
//!   `solve_least_squares` to add iterative refinement.
//! - When a subproblem is singular, `RegularizedSolver` solves the
//!   `[A; sqrt(lambda) I]` system with faer's sparse QR.
//!
//! Example:
//! ```rust
//! use swarm_qr_rs::{iterated_qr, SparseMatrix};
//!
//! // [[1, 0], [0, 2], [3, 4]]
//! let a = SparseMatrix::new(3, 2, vec![0, 2, 4], vec![0, 2, 1, 2], vec![1.0, 3.0, 2.0, 4.0])
//!     .unwrap();
//! let b = SparseMatrix::from_dense_col_major(3, 1, &[1.0, 2.0, 3.0]).unwrap();
//! let factorization = iterated_qr(&a, &b).unwrap();
//! assert_eq!(factorization.rank(), 2);
//! let x = factorization.solve_column(0);
//! assert!((x[0] - 1.0 / 7.0).abs() < 1e-12);
//! assert!((x[1] - 5.0 / 7.0).abs() < 1e-12);
//! ```

mod concat;
mod error;
mod matrix;
mod qr;
mod regularized;
mod report;
mod sort;

pub use concat::vertical_concat;
pub use error::KernelError;
pub use matrix::{MatrixError, SparseMatrix};
pub use qr::{
    iterated_qr, iterated_qr_with, iterated_qr_with_reporter, solve_least_squares,
    ColumnOrdering, FactorizationResult, LeastSquaresSolution, Projection, QrOptions, Tolerance,
};
pub use regularized::RegularizedSolver;
pub use report::{PivotReport, RankStatus, Reporter, TableReporter};
pub use sort::{insertion_sort_by, sort_range, sort_range_by_keys};
