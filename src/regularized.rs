use dyn_stack::{GlobalPodBuffer, PodStack, ReborrowMut};
use faer_core::mat;
use faer_core::sparse::{SparseColMatRef, SymbolicSparseColMatRef};
use faer_core::{Conj, Parallelism};
use faer_sparse::qr::{factorize_symbolic_qr, QrSymbolicParams, SymbolicQr};

use crate::concat::vertical_concat;
use crate::error::KernelError;
use crate::matrix::SparseMatrix;

/// Pattern of `[A; I]` with the positions of the identity block recorded.
#[derive(Debug)]
struct AugmentedPattern {
    base_rows: usize,
    ncols: usize,
    col_ptrs: Vec<usize>,
    row_indices: Vec<usize>,
    diag_positions: Vec<usize>,
}

impl AugmentedPattern {
    fn new(pattern: &SparseMatrix) -> Result<(Self, Vec<f64>), KernelError> {
        let ncols = pattern.ncols();
        let stacked = vertical_concat(pattern, &SparseMatrix::identity(ncols))?;
        // Shifted identity rows sort last in every column.
        let diag_positions = (0..ncols)
            .map(|col| stacked.col_ptrs()[col + 1] - 1)
            .collect();
        let (_, _, col_ptrs, row_indices, values) = stacked.into_parts();
        Ok((
            Self {
                base_rows: pattern.nrows(),
                ncols,
                col_ptrs,
                row_indices,
                diag_positions,
            },
            values,
        ))
    }

    fn nrows(&self) -> usize {
        self.base_rows + self.ncols
    }

    /// Range of the `A` block of `col` in the augmented arrays.
    fn base_range(&self, col: usize) -> core::ops::Range<usize> {
        self.col_ptrs[col]..self.diag_positions[col]
    }

    fn matches(&self, a: &SparseMatrix) -> bool {
        a.shape() == (self.base_rows, self.ncols)
            && (0..self.ncols)
                .all(|col| a.row_indices_of_col(col) == &self.row_indices[self.base_range(col)])
    }

    fn as_symbolic(&self) -> SymbolicSparseColMatRef<'_, usize> {
        unsafe {
            SymbolicSparseColMatRef::new_unchecked(
                self.nrows(),
                self.ncols,
                &self.col_ptrs,
                None,
                &self.row_indices,
            )
        }
    }
}

/// Tikhonov-regularized least squares for a fixed sparsity pattern.
///
/// Solves `min ||A x - b||^2 + lambda ||x||^2` through a sparse QR of
/// `[A; sqrt(lambda) I]`. The symbolic factorization and all workspace are
/// built once; each solve only refreshes values.
pub struct RegularizedSolver {
    augmented: AugmentedPattern,
    symbolic_qr: SymbolicQr<usize>,
    qr_indices: Vec<usize>,
    qr_values: Vec<f64>,
    qr_stack: GlobalPodBuffer,
    parallelism: Parallelism,
    values: Vec<f64>,
    rhs: Vec<f64>,
}

impl RegularizedSolver {
    /// Create a solver for the pattern of `pattern` (its values are ignored).
    pub fn new(pattern: &SparseMatrix, parallelism: Parallelism) -> Result<Self, KernelError> {
        if pattern.nrows() == 0 || pattern.ncols() == 0 {
            return Err(KernelError::InvalidDimensions {
                nrows: pattern.nrows(),
                ncols: pattern.ncols(),
            });
        }

        let (augmented, values) = AugmentedPattern::new(pattern)?;
        let symbolic_qr =
            factorize_symbolic_qr(augmented.as_symbolic(), QrSymbolicParams::default())
                .map_err(KernelError::Faer)?;

        let factor_req = symbolic_qr
            .factorize_numeric_qr_req::<f64>(parallelism)
            .map_err(|_| KernelError::WorkspaceOverflow)?;
        let solve_req = symbolic_qr
            .solve_in_place_req::<f64>(1, parallelism)
            .map_err(|_| KernelError::WorkspaceOverflow)?;
        let req = factor_req
            .try_or(solve_req)
            .map_err(|_| KernelError::WorkspaceOverflow)?;
        let qr_stack = GlobalPodBuffer::try_new(req).map_err(|_| KernelError::WorkspaceAlloc)?;

        let qr_indices = vec![0usize; symbolic_qr.len_indices()];
        let qr_values = vec![0.0; symbolic_qr.len_values()];
        let rhs = vec![0.0; augmented.nrows()];

        Ok(Self {
            augmented,
            symbolic_qr,
            qr_indices,
            qr_values,
            qr_stack,
            parallelism,
            values,
            rhs,
        })
    }

    /// Rows of `A`.
    pub fn nrows(&self) -> usize {
        self.augmented.base_rows
    }

    /// Columns of `A`.
    pub fn ncols(&self) -> usize {
        self.augmented.ncols
    }

    /// Solve with a matrix whose pattern equals the construction pattern.
    pub fn solve(
        &mut self,
        a: &SparseMatrix,
        lambda: f64,
        rhs: &[f64],
        x: &mut [f64],
    ) -> Result<(), KernelError> {
        if !self.augmented.matches(a) {
            return Err(KernelError::PatternMismatch);
        }
        self.solve_with_values(a.values(), lambda, rhs, x)
    }

    /// Solve with raw CSC values aligned with the construction pattern.
    ///
    /// Unlike [`SparseMatrix`], `values` may contain zeros, so a matrix whose
    /// entries cancel during an update can keep its pattern.
    pub fn solve_with_values(
        &mut self,
        values: &[f64],
        lambda: f64,
        rhs: &[f64],
        x: &mut [f64],
    ) -> Result<(), KernelError> {
        let m = self.nrows();
        let n = self.ncols();
        let nnz = self.values.len() - n;
        if values.len() != nnz {
            return Err(KernelError::ShapeMismatch {
                op: "regularized solve (values)",
                expected: nnz,
                actual: values.len(),
            });
        }
        if rhs.len() != m {
            return Err(KernelError::ShapeMismatch {
                op: "regularized solve (rhs)",
                expected: m,
                actual: rhs.len(),
            });
        }
        if x.len() != n {
            return Err(KernelError::ShapeMismatch {
                op: "regularized solve (x)",
                expected: n,
                actual: x.len(),
            });
        }
        if !(lambda.is_finite() && lambda > 0.0) {
            return Err(KernelError::InvalidRegularization { lambda });
        }

        // Write A's values column by column, then sqrt(lambda) on the diagonal block.
        let diag = lambda.sqrt();
        let mut offset = 0;
        for col in 0..n {
            let range = self.augmented.base_range(col);
            let len = range.len();
            self.values[range].copy_from_slice(&values[offset..offset + len]);
            offset += len;
            self.values[self.augmented.diag_positions[col]] = diag;
        }

        self.rhs[..m].copy_from_slice(rhs);
        self.rhs[m..].fill(0.0);

        let a = SparseColMatRef::<'_, usize, f64>::new(
            self.augmented.as_symbolic(),
            self.values.as_slice(),
        );
        let mut stack = PodStack::new(&mut self.qr_stack);
        let qr = self.symbolic_qr.factorize_numeric_qr::<f64>(
            &mut self.qr_indices,
            &mut self.qr_values,
            a,
            self.parallelism,
            stack.rb_mut(),
        );

        let mut rhs_mat = mat::from_column_major_slice_mut::<f64>(&mut self.rhs, m + n, 1);
        let mut stack = PodStack::new(&mut self.qr_stack);
        qr.solve_in_place_with_conj(
            Conj::No,
            rhs_mat.rb_mut(),
            self.parallelism,
            stack.rb_mut(),
        );

        // The solution occupies the first n entries.
        x.copy_from_slice(&self.rhs[..n]);
        log::trace!("regularized solve: m={m}, n={n}, lambda={lambda:.3e}");
        Ok(())
    }
}
