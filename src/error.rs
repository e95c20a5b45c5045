use core::fmt;

use crate::matrix::MatrixError;

/// Errors returned by the kernel operations.
#[derive(Debug)]
pub enum KernelError {
    /// A matrix failed CSC validation.
    Matrix(MatrixError),
    /// Operand dimensions are incompatible.
    ShapeMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Factorization found no usable pivot.
    SingularSystem { nrows: usize, ncols: usize },
    /// Values were supplied for a different sparsity pattern.
    PatternMismatch,
    /// The pattern has zero rows or columns.
    InvalidDimensions { nrows: usize, ncols: usize },
    /// The regularization weight is not positive and finite.
    InvalidRegularization { lambda: f64 },
    /// faer reported an error during factorization or solve.
    Faer(faer_sparse::FaerError),
    /// Workspace requirement overflowed.
    WorkspaceOverflow,
    /// Workspace allocation failed.
    WorkspaceAlloc,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matrix(err) => write!(f, "invalid sparse matrix: {err}"),
            Self::ShapeMismatch {
                op,
                expected,
                actual,
            } => {
                write!(f, "shape mismatch in {op}: expected {expected}, got {actual}")
            }
            Self::SingularSystem { nrows, ncols } => {
                write!(f, "singular system: no usable pivot in {nrows}x{ncols} matrix")
            }
            Self::PatternMismatch => {
                write!(f, "matrix pattern does not match the factorized pattern")
            }
            Self::InvalidDimensions { nrows, ncols } => {
                write!(f, "invalid dimensions: nrows={nrows}, ncols={ncols}")
            }
            Self::InvalidRegularization { lambda } => {
                write!(f, "regularization must be positive and finite (got {lambda})")
            }
            Self::Faer(err) => write!(f, "faer error: {err:?}"),
            Self::WorkspaceOverflow => write!(f, "workspace size overflow"),
            Self::WorkspaceAlloc => write!(f, "workspace allocation failed"),
        }
    }
}

impl std::error::Error for KernelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Matrix(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MatrixError> for KernelError {
    fn from(err: MatrixError) -> Self {
        Self::Matrix(err)
    }
}
