use crate::error::KernelError;
use crate::matrix::SparseMatrix;

/// Stacks `bottom` beneath `top`.
///
/// Column `j` of the result holds `top`'s column `j` followed by `bottom`'s
/// column `j` with row indices shifted by `top.nrows()`. Every shifted row is
/// larger than any row of `top`, so appending keeps each column sorted.
///
/// Fails with [`KernelError::ShapeMismatch`] when the column counts differ.
pub fn vertical_concat(
    top: &SparseMatrix,
    bottom: &SparseMatrix,
) -> Result<SparseMatrix, KernelError> {
    if top.ncols() != bottom.ncols() {
        return Err(KernelError::ShapeMismatch {
            op: "vertical_concat (ncols)",
            expected: top.ncols(),
            actual: bottom.ncols(),
        });
    }

    let ncols = top.ncols();
    let shift = top.nrows();
    let nnz = top.nnz() + bottom.nnz();
    let mut col_ptrs = Vec::with_capacity(ncols + 1);
    let mut row_indices = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    col_ptrs.push(0);
    for col in 0..ncols {
        row_indices.extend_from_slice(top.row_indices_of_col(col));
        values.extend_from_slice(top.values_of_col(col));
        row_indices.extend(bottom.row_indices_of_col(col).iter().map(|&row| row + shift));
        values.extend_from_slice(bottom.values_of_col(col));
        col_ptrs.push(row_indices.len());
    }

    Ok(SparseMatrix::from_parts_unchecked(
        top.nrows() + bottom.nrows(),
        ncols,
        col_ptrs,
        row_indices,
        values,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_columns(m: &SparseMatrix) -> bool {
        (0..m.ncols()).all(|col| m.row_indices_of_col(col).windows(2).all(|w| w[0] < w[1]))
    }

    #[test]
    fn stacks_regularization_block() {
        let top = SparseMatrix::from_triplets(
            3,
            2,
            &[(0, 0, 1.0), (2, 0, 3.0), (1, 1, 2.0), (2, 1, 4.0)],
        )
        .unwrap();
        let bottom = SparseMatrix::scaled_identity(2, 0.5).unwrap();
        let stacked = vertical_concat(&top, &bottom).unwrap();

        assert_eq!(stacked.shape(), (5, 2));
        assert_eq!(stacked.nnz(), top.nnz() + bottom.nnz());
        assert_eq!(stacked.col_ptrs(), &[0, 3, 6]);
        assert_eq!(stacked.row_indices(), &[0, 2, 3, 1, 2, 4]);
        assert_eq!(stacked.values(), &[1.0, 3.0, 0.5, 2.0, 4.0, 0.5]);
        assert!(sorted_columns(&stacked));
    }

    #[test]
    fn shifts_every_bottom_row_by_top_height() {
        let top = SparseMatrix::zeros(4, 3);
        let bottom =
            SparseMatrix::from_triplets(2, 3, &[(1, 0, 1.0), (0, 2, -2.0), (1, 2, 5.0)]).unwrap();
        let stacked = top.vstack(&bottom).unwrap();
        assert_eq!(stacked.nrows(), 6);
        assert_eq!(stacked.row_indices_of_col(0), &[5]);
        assert_eq!(stacked.row_indices_of_col(1), &[] as &[usize]);
        assert_eq!(stacked.row_indices_of_col(2), &[4, 5]);
        assert_eq!(stacked.values_of_col(2), &[-2.0, 5.0]);
    }

    #[test]
    fn rejects_column_mismatch() {
        let top = SparseMatrix::identity(2);
        let bottom = SparseMatrix::identity(3);
        let err = vertical_concat(&top, &bottom).unwrap_err();
        assert!(matches!(
            err,
            KernelError::ShapeMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }
}
