use core::fmt;
use core::ops::Range;

use faer_core::sparse::{SparseColMatRef, SymbolicSparseColMatRef};

use crate::sort::insertion_sort_by;

/// Real sparse matrix in compressed sparse column (CSC) form.
///
/// Indices are zero-based. Within each column the row indices are strictly
/// increasing and every stored value is finite and non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    col_ptrs: Vec<usize>,
    row_indices: Vec<usize>,
    values: Vec<f64>,
}

/// Validation errors for a SparseMatrix.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// col_ptrs length is not ncols + 1.
    ColPtrLen { expected: usize, actual: usize },
    /// col_ptrs[0] is not 0.
    ColPtrStart { value: usize },
    /// col_ptrs is not non-decreasing.
    ColPtrNotMonotonic { col: usize, prev: usize, next: usize },
    /// col_ptrs[ncols] does not match row_indices length.
    ColPtrOutOfBounds { last: usize, row_indices_len: usize },
    /// values and row_indices differ in length.
    ValuesLen { expected: usize, actual: usize },
    /// A row index is >= nrows.
    RowIndexOutOfBounds { col: usize, row: usize, nrows: usize },
    /// Row indices in a column are not strictly increasing.
    RowIndexNotSorted { col: usize, prev: usize, next: usize },
    /// A stored value is exactly zero.
    ExplicitZero { col: usize, row: usize },
    /// A stored value is NaN or infinite.
    NonFinite { col: usize, row: usize },
    /// A triplet lies outside the matrix.
    TripletOutOfBounds {
        index: usize,
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
    /// Dense input length is not nrows * ncols.
    DenseLen { expected: usize, actual: usize },
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColPtrLen { expected, actual } => {
                write!(f, "col_ptrs length {actual} does not match expected {expected}")
            }
            Self::ColPtrStart { value } => {
                write!(f, "col_ptrs must start at 0 (got {value})")
            }
            Self::ColPtrNotMonotonic { col, prev, next } => {
                write!(f, "col_ptrs not monotonic at col {col}: {prev} > {next}")
            }
            Self::ColPtrOutOfBounds {
                last,
                row_indices_len,
            } => {
                write!(
                    f,
                    "col_ptrs end {last} does not match row_indices length {row_indices_len}"
                )
            }
            Self::ValuesLen { expected, actual } => {
                write!(f, "values length {actual} does not match expected {expected}")
            }
            Self::RowIndexOutOfBounds { col, row, nrows } => {
                write!(f, "row index {row} in col {col} exceeds nrows {nrows}")
            }
            Self::RowIndexNotSorted { col, prev, next } => {
                write!(
                    f,
                    "row indices not strictly increasing in col {col}: {prev} >= {next}"
                )
            }
            Self::ExplicitZero { col, row } => {
                write!(f, "explicit zero stored at ({row}, {col})")
            }
            Self::NonFinite { col, row } => {
                write!(f, "non-finite value at ({row}, {col})")
            }
            Self::TripletOutOfBounds {
                index,
                row,
                col,
                nrows,
                ncols,
            } => {
                write!(
                    f,
                    "triplet {index} at ({row}, {col}) lies outside a {nrows}x{ncols} matrix"
                )
            }
            Self::DenseLen { expected, actual } => {
                write!(f, "dense data length {actual} does not match expected {expected}")
            }
        }
    }
}

impl std::error::Error for MatrixError {}

impl SparseMatrix {
    /// Creates a validated CSC matrix.
    ///
    /// Requirements:
    /// - `col_ptrs.len() == ncols + 1`
    /// - `col_ptrs` is non-decreasing and starts at `0`
    /// - `col_ptrs[ncols] == row_indices.len() == values.len()`
    /// - row indices are strictly increasing and `< nrows` within each column
    /// - values are finite and non-zero
    pub fn new(
        nrows: usize,
        ncols: usize,
        col_ptrs: Vec<usize>,
        row_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, MatrixError> {
        let expected = ncols + 1;
        if col_ptrs.len() != expected {
            return Err(MatrixError::ColPtrLen {
                expected,
                actual: col_ptrs.len(),
            });
        }
        if col_ptrs[0] != 0 {
            return Err(MatrixError::ColPtrStart {
                value: col_ptrs[0],
            });
        }
        for col in 0..ncols {
            let prev = col_ptrs[col];
            let next = col_ptrs[col + 1];
            if prev > next {
                return Err(MatrixError::ColPtrNotMonotonic { col, prev, next });
            }
        }
        let last = col_ptrs[ncols];
        if last != row_indices.len() {
            return Err(MatrixError::ColPtrOutOfBounds {
                last,
                row_indices_len: row_indices.len(),
            });
        }
        if values.len() != row_indices.len() {
            return Err(MatrixError::ValuesLen {
                expected: row_indices.len(),
                actual: values.len(),
            });
        }

        for col in 0..ncols {
            let range = col_ptrs[col]..col_ptrs[col + 1];
            let mut prev: Option<usize> = None;
            for idx in range {
                let row = row_indices[idx];
                if row >= nrows {
                    return Err(MatrixError::RowIndexOutOfBounds { col, row, nrows });
                }
                if let Some(prev) = prev {
                    if prev >= row {
                        return Err(MatrixError::RowIndexNotSorted {
                            col,
                            prev,
                            next: row,
                        });
                    }
                }
                let value = values[idx];
                if !value.is_finite() {
                    return Err(MatrixError::NonFinite { col, row });
                }
                if value == 0.0 {
                    return Err(MatrixError::ExplicitZero { col, row });
                }
                prev = Some(row);
            }
        }

        Ok(Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices,
            values,
        })
    }

    /// Builds a matrix from parts already known to satisfy the invariants.
    pub(crate) fn from_parts_unchecked(
        nrows: usize,
        ncols: usize,
        col_ptrs: Vec<usize>,
        row_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(col_ptrs.len(), ncols + 1);
        debug_assert_eq!(col_ptrs[ncols], row_indices.len());
        debug_assert_eq!(row_indices.len(), values.len());
        debug_assert!((0..ncols).all(|col| {
            let rows = &row_indices[col_ptrs[col]..col_ptrs[col + 1]];
            rows.windows(2).all(|w| w[0] < w[1]) && rows.iter().all(|&r| r < nrows)
        }));
        Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices,
            values,
        }
    }

    /// Consumes the matrix, returning `(nrows, ncols, col_ptrs, row_indices, values)`.
    pub fn into_parts(self) -> (usize, usize, Vec<usize>, Vec<usize>, Vec<f64>) {
        (
            self.nrows,
            self.ncols,
            self.col_ptrs,
            self.row_indices,
            self.values,
        )
    }

    /// An `nrows x ncols` matrix with no stored entries.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            col_ptrs: vec![0; ncols + 1],
            row_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// The `n x n` identity.
    pub fn identity(n: usize) -> Self {
        Self::diagonal_unchecked(n, 1.0)
    }

    /// `scale * I` of size `n x n`. A zero scale yields the empty matrix.
    pub fn scaled_identity(n: usize, scale: f64) -> Result<Self, MatrixError> {
        if !scale.is_finite() {
            return Err(MatrixError::NonFinite { col: 0, row: 0 });
        }
        if scale == 0.0 {
            return Ok(Self::zeros(n, n));
        }
        Ok(Self::diagonal_unchecked(n, scale))
    }

    fn diagonal_unchecked(n: usize, value: f64) -> Self {
        Self {
            nrows: n,
            ncols: n,
            col_ptrs: (0..=n).collect(),
            row_indices: (0..n).collect(),
            values: vec![value; n],
        }
    }

    /// Assembles a matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate positions are summed, entries that end up exactly zero are
    /// dropped and each column is sorted by row.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self, MatrixError> {
        let mut starts = vec![0usize; ncols + 1];
        for (index, &(row, col, value)) in triplets.iter().enumerate() {
            if row >= nrows || col >= ncols {
                return Err(MatrixError::TripletOutOfBounds {
                    index,
                    row,
                    col,
                    nrows,
                    ncols,
                });
            }
            if !value.is_finite() {
                return Err(MatrixError::NonFinite { col, row });
            }
            starts[col + 1] += 1;
        }
        for col in 0..ncols {
            starts[col + 1] += starts[col];
        }

        // Bucket triplet positions by column, keeping input order.
        let mut order = vec![0usize; triplets.len()];
        let mut next = starts.clone();
        for (index, &(_, col, _)) in triplets.iter().enumerate() {
            order[next[col]] = index;
            next[col] += 1;
        }

        let mut col_ptrs = Vec::with_capacity(ncols + 1);
        let mut row_indices = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        col_ptrs.push(0);
        for col in 0..ncols {
            let range = starts[col]..starts[col + 1];
            insertion_sort_by(&mut order, range.clone(), |&i, &j| {
                triplets[i].0 < triplets[j].0
            });

            let col_start = row_indices.len();
            for &index in &order[range] {
                let (row, _, value) = triplets[index];
                if row_indices.len() > col_start && row_indices.last() == Some(&row) {
                    if let Some(last) = values.last_mut() {
                        *last += value;
                    }
                } else {
                    pop_trailing_zero(&mut row_indices, &mut values, col_start);
                    row_indices.push(row);
                    values.push(value);
                }
            }
            pop_trailing_zero(&mut row_indices, &mut values, col_start);
            // Finite duplicates can still overflow when summed.
            for (&row, value) in row_indices[col_start..].iter().zip(&values[col_start..]) {
                if !value.is_finite() {
                    return Err(MatrixError::NonFinite { col, row });
                }
            }
            col_ptrs.push(row_indices.len());
        }

        Ok(Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices,
            values,
        })
    }

    /// Builds a matrix from column-major dense data, skipping zeros.
    pub fn from_dense_col_major(
        nrows: usize,
        ncols: usize,
        data: &[f64],
    ) -> Result<Self, MatrixError> {
        let expected = nrows * ncols;
        if data.len() != expected {
            return Err(MatrixError::DenseLen {
                expected,
                actual: data.len(),
            });
        }
        let mut col_ptrs = Vec::with_capacity(ncols + 1);
        let mut row_indices = Vec::new();
        let mut values = Vec::new();
        col_ptrs.push(0);
        for col in 0..ncols {
            for row in 0..nrows {
                let value = data[col * nrows + row];
                if !value.is_finite() {
                    return Err(MatrixError::NonFinite { col, row });
                }
                if value != 0.0 {
                    row_indices.push(row);
                    values.push(value);
                }
            }
            col_ptrs.push(row_indices.len());
        }
        Ok(Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices,
            values,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(nrows, ncols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.row_indices.len()
    }

    /// Column pointer array in CSC format.
    pub fn col_ptrs(&self) -> &[usize] {
        &self.col_ptrs
    }

    /// Row index array in CSC format.
    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    /// Value array in CSC format, aligned with `row_indices`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Index range in row_indices/values for the given column.
    pub fn col_range(&self, col: usize) -> Range<usize> {
        self.col_ptrs[col]..self.col_ptrs[col + 1]
    }

    /// Sorted row indices for the given column.
    pub fn row_indices_of_col(&self, col: usize) -> &[usize] {
        &self.row_indices[self.col_range(col)]
    }

    /// Values for the given column, aligned with row_indices_of_col.
    pub fn values_of_col(&self, col: usize) -> &[f64] {
        &self.values[self.col_range(col)]
    }

    /// Number of stored entries in the given column.
    pub fn col_nnz(&self, col: usize) -> usize {
        self.col_ptrs[col + 1] - self.col_ptrs[col]
    }

    /// Euclidean norm of the given column.
    pub fn col_norm(&self, col: usize) -> f64 {
        scaled_norm(self.values_of_col(col).iter().copied())
    }

    /// Entry at `(row, col)`, zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self.row_indices_of_col(col).binary_search(&row) {
            Ok(pos) => self.values_of_col(col)[pos],
            Err(_) => 0.0,
        }
    }

    /// Computes `A x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != ncols`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.ncols, "vector length must equal ncols");
        let mut y = vec![0.0; self.nrows];
        for (col, &xj) in x.iter().enumerate() {
            if xj == 0.0 {
                continue;
            }
            let range = self.col_range(col);
            for (&row, &value) in self.row_indices[range.clone()]
                .iter()
                .zip(&self.values[range])
            {
                y[row] += value * xj;
            }
        }
        y
    }

    /// Dense copy in column-major order.
    pub fn to_dense_col_major(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.nrows * self.ncols];
        for col in 0..self.ncols {
            let range = self.col_range(col);
            for (&row, &value) in self.row_indices[range.clone()]
                .iter()
                .zip(&self.values[range])
            {
                dense[col * self.nrows + row] = value;
            }
        }
        dense
    }

    /// Stacks `bottom` beneath `self`. See [`crate::vertical_concat`].
    pub fn vstack(&self, bottom: &SparseMatrix) -> Result<SparseMatrix, crate::KernelError> {
        crate::concat::vertical_concat(self, bottom)
    }

    /// Borrowed faer view of the sparsity pattern.
    pub fn as_symbolic(&self) -> SymbolicSparseColMatRef<'_, usize> {
        // Invariants were checked on construction.
        unsafe {
            SymbolicSparseColMatRef::new_unchecked(
                self.nrows,
                self.ncols,
                &self.col_ptrs,
                None,
                &self.row_indices,
            )
        }
    }

    /// Borrowed faer view of the matrix.
    pub fn as_faer(&self) -> SparseColMatRef<'_, usize, f64> {
        SparseColMatRef::<'_, usize, f64>::new(self.as_symbolic(), self.values.as_slice())
    }
}

fn pop_trailing_zero(row_indices: &mut Vec<usize>, values: &mut Vec<f64>, col_start: usize) {
    if row_indices.len() > col_start && values.last() == Some(&0.0) {
        row_indices.pop();
        values.pop();
    }
}

/// Euclidean norm accumulated against the running largest magnitude, so
/// entries near the overflow or underflow thresholds square safely.
pub(crate) fn scaled_norm(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut scale = 0.0_f64;
    let mut ssq = 1.0_f64;
    for value in values {
        let abs = value.abs();
        if abs == 0.0 {
            continue;
        }
        if scale < abs {
            let ratio = scale / abs;
            ssq = 1.0 + ssq * ratio * ratio;
            scale = abs;
        } else {
            let ratio = abs / scale;
            ssq += ratio * ratio;
        }
    }
    scale * ssq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_csc_layout() {
        let ok = SparseMatrix::new(3, 2, vec![0, 2, 4], vec![0, 2, 1, 2], vec![1.0, 3.0, 2.0, 4.0]);
        assert!(ok.is_ok());

        let err = SparseMatrix::new(3, 2, vec![0, 2], vec![0, 2], vec![1.0, 3.0]).unwrap_err();
        assert_eq!(err, MatrixError::ColPtrLen { expected: 3, actual: 2 });

        let err = SparseMatrix::new(3, 1, vec![0, 2], vec![2, 0], vec![1.0, 3.0]).unwrap_err();
        assert_eq!(err, MatrixError::RowIndexNotSorted { col: 0, prev: 2, next: 0 });

        let err = SparseMatrix::new(3, 1, vec![0, 2], vec![1, 1], vec![1.0, 3.0]).unwrap_err();
        assert_eq!(err, MatrixError::RowIndexNotSorted { col: 0, prev: 1, next: 1 });

        let err = SparseMatrix::new(2, 1, vec![0, 1], vec![2], vec![1.0]).unwrap_err();
        assert_eq!(err, MatrixError::RowIndexOutOfBounds { col: 0, row: 2, nrows: 2 });

        let err = SparseMatrix::new(2, 1, vec![0, 1], vec![1], vec![0.0]).unwrap_err();
        assert_eq!(err, MatrixError::ExplicitZero { col: 0, row: 1 });

        let err = SparseMatrix::new(2, 1, vec![0, 1], vec![1], vec![]).unwrap_err();
        assert_eq!(err, MatrixError::ValuesLen { expected: 1, actual: 0 });
    }

    #[test]
    fn triplets_are_sorted_summed_and_pruned() {
        let m = SparseMatrix::from_triplets(
            3,
            2,
            &[
                (2, 0, 3.0),
                (0, 0, 1.0),
                (1, 1, 2.0),
                (2, 1, 1.5),
                (2, 1, 2.5),
                (0, 1, 1.0),
                (0, 1, -1.0),
            ],
        )
        .unwrap();
        assert_eq!(m.col_ptrs(), &[0, 2, 4]);
        assert_eq!(m.row_indices(), &[0, 2, 1, 2]);
        assert_eq!(m.values(), &[1.0, 3.0, 2.0, 4.0]);

        let err = SparseMatrix::from_triplets(1, 1, &[(0, 0, 1e308), (0, 0, 1e308)]).unwrap_err();
        assert_eq!(err, MatrixError::NonFinite { col: 0, row: 0 });

        let err =
            SparseMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, -1e308), (1, 1, -1e308)])
                .unwrap_err();
        assert_eq!(err, MatrixError::NonFinite { col: 1, row: 1 });
    }

    #[test]
    fn scaled_norm_survives_extreme_magnitudes() {
        assert_eq!(scaled_norm(Vec::new()), 0.0);
        assert_eq!(scaled_norm([0.0, -0.0]), 0.0);
        assert!((scaled_norm([3.0, 4.0]) - 5.0).abs() < 1e-15);

        for scale in [1e-170, 1e-155, 1e160, 1e200] {
            let norm = scaled_norm([3.0 * scale, 0.0, -4.0 * scale]);
            assert!(norm.is_finite() && norm > 0.0, "scale {scale:e}");
            assert!((norm / scale - 5.0).abs() < 1e-14, "scale {scale:e}");
        }

        let m = SparseMatrix::from_triplets(2, 1, &[(0, 0, 1e200), (1, 0, 1e200)]).unwrap();
        assert!((m.col_norm(0) / 1e200 - 2.0_f64.sqrt()).abs() < 1e-14);
    }

    #[test]
    fn triplet_out_of_bounds_is_rejected() {
        let err = SparseMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 2, 1.0)]).unwrap_err();
        assert!(matches!(err, MatrixError::TripletOutOfBounds { index: 1, .. }));
    }

    #[test]
    fn dense_round_trip_and_product() {
        let dense = [1.0, 0.0, 3.0, 0.0, 2.0, 4.0];
        let m = SparseMatrix::from_dense_col_major(3, 2, &dense).unwrap();
        assert_eq!(m.nnz(), 4);
        assert_eq!(m.to_dense_col_major(), dense.to_vec());
        assert_eq!(m.get(2, 1), 4.0);
        assert_eq!(m.get(0, 1), 0.0);
        assert_eq!(m.mul_vec(&[1.0, 1.0]), vec![1.0, 2.0, 7.0]);
        assert!((m.col_norm(0) - 10.0_f64.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn identity_helpers() {
        let eye = SparseMatrix::identity(3);
        assert_eq!(eye.col_ptrs(), &[0, 1, 2, 3]);
        assert_eq!(eye.row_indices(), &[0, 1, 2]);
        let scaled = SparseMatrix::scaled_identity(2, 0.5).unwrap();
        assert_eq!(scaled.values(), &[0.5, 0.5]);
        assert_eq!(SparseMatrix::scaled_identity(2, 0.0).unwrap().nnz(), 0);
    }

    #[test]
    fn faer_view_shares_layout() {
        let m = SparseMatrix::from_triplets(3, 2, &[(0, 0, 1.0), (2, 1, 4.0)]).unwrap();
        let view = m.as_faer();
        assert_eq!(view.nrows(), 3);
        assert_eq!(view.ncols(), 2);
    }
}
