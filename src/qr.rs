//! Rank-revealing sparse QR with column deferral.
//!
//! Columns are eliminated left to right with sparse Householder reflectors.
//! A column whose remainder below the existing pivot rows is negligible
//! relative to its original norm is marked dependent and produces no new row
//! of `R`. When dependent columns end up interleaved with accepted ones, the
//! ordering is rearranged to move them last and the elimination re-runs, so
//! the accepted part of `R` is a leading square upper-triangular block.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::KernelError;
use crate::matrix::{scaled_norm, SparseMatrix};
use crate::report::{PivotReport, RankStatus, Reporter, TableReporter};
use crate::sort::{sort_range, sort_range_by_keys};

/// Threshold for declaring a pivot negligible.
///
/// A column is dependent when the norm of its part outside the existing pivot
/// rows is at most `tolerance * ||a_j||`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// `20 * (m + n) * f64::EPSILON`.
    Default,
    /// A caller supplied relative tolerance (negative values act as zero).
    Relative(f64),
}

impl Tolerance {
    /// Relative threshold for an `nrows x ncols` matrix.
    pub fn resolve(self, nrows: usize, ncols: usize) -> f64 {
        match self {
            Self::Default => 20.0 * (nrows + ncols) as f64 * f64::EPSILON,
            Self::Relative(tol) => tol.max(0.0),
        }
    }
}

/// Initial column ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrdering {
    /// Columns in their given order.
    Natural,
    /// Ascending column nonzero count, ties broken by the summed nonzero
    /// count of the rows the column touches.
    DegreeFill,
}

/// Options controlling the factorization.
#[derive(Debug, Clone)]
pub struct QrOptions {
    /// Rank decision threshold.
    pub tolerance: Tolerance,
    /// Initial column ordering.
    pub ordering: ColumnOrdering,
    /// Upper bound on elimination passes; always capped by `min(m, n)`.
    pub max_passes: usize,
    /// Iterative refinement steps used by [`solve_least_squares`].
    pub refinement_steps: usize,
    /// Print a pivot table when the factorization finishes.
    pub verbose: bool,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::Default,
            ordering: ColumnOrdering::DegreeFill,
            max_passes: usize::MAX,
            refinement_steps: 1,
            verbose: false,
        }
    }
}

/// Dense accumulator for one sparse column, tracking which rows it touched.
struct Workspace {
    values: Vec<f64>,
    marked: Vec<bool>,
    pattern: Vec<usize>,
    /// Reflectors still to visit, smallest index first.
    pending: BinaryHeap<Reverse<usize>>,
}

impl Workspace {
    fn new(nrows: usize) -> Self {
        Self {
            values: vec![0.0; nrows],
            marked: vec![false; nrows],
            pattern: Vec::new(),
            pending: BinaryHeap::new(),
        }
    }

    fn touch(&mut self, row: usize) {
        if !self.marked[row] {
            self.marked[row] = true;
            self.pattern.push(row);
        }
    }

    fn clear(&mut self) {
        for &row in &self.pattern {
            self.values[row] = 0.0;
            self.marked[row] = false;
        }
        self.pattern.clear();
    }

    fn load_column(&mut self, matrix: &SparseMatrix, col: usize) {
        self.clear();
        for (&row, &value) in matrix
            .row_indices_of_col(col)
            .iter()
            .zip(matrix.values_of_col(col))
        {
            self.touch(row);
            self.values[row] = value;
        }
    }

    fn norm_of(&self, rows: &[usize]) -> f64 {
        scaled_norm(rows.iter().map(|&row| self.values[row]))
    }
}

/// Householder reflectors `H_k = I - beta_k v_k v_kᵀ`, stored column-wise.
///
/// `v_k` is zero on the pivot rows of reflectors `0..k`, so later reflectors
/// never disturb rows already assigned to `R`. Each `v_k` is normalized to
/// one on its pivot row.
#[derive(Debug, Clone)]
struct Reflectors {
    col_ptrs: Vec<usize>,
    row_indices: Vec<usize>,
    values: Vec<f64>,
    betas: Vec<f64>,
    pivot_rows: Vec<usize>,
    /// Rank index owning each row, if the row is a pivot row.
    pivot_rank: Vec<Option<usize>>,
    /// Reflectors whose support contains each row, ascending.
    by_row: Vec<Vec<usize>>,
}

impl Reflectors {
    fn new(nrows: usize) -> Self {
        Self {
            col_ptrs: vec![0],
            row_indices: Vec::new(),
            values: Vec::new(),
            betas: Vec::new(),
            pivot_rows: Vec::new(),
            pivot_rank: vec![None; nrows],
            by_row: vec![Vec::new(); nrows],
        }
    }

    fn len(&self) -> usize {
        self.betas.len()
    }

    fn nrows(&self) -> usize {
        self.pivot_rank.len()
    }

    fn push(&mut self, entries: impl Iterator<Item = (usize, f64)>, beta: f64, pivot_row: usize) {
        let k = self.betas.len();
        for (row, value) in entries {
            self.row_indices.push(row);
            self.values.push(value);
            self.by_row[row].push(k);
        }
        self.col_ptrs.push(self.row_indices.len());
        self.pivot_rank[pivot_row] = Some(k);
        self.betas.push(beta);
        self.pivot_rows.push(pivot_row);
    }

    fn apply(&self, k: usize, work: &mut Workspace) {
        let range = self.col_ptrs[k]..self.col_ptrs[k + 1];
        let rows = &self.row_indices[range.clone()];
        let v = &self.values[range];
        let dot: f64 = rows
            .iter()
            .zip(v)
            .map(|(&row, &vi)| vi * work.values[row])
            .sum();
        if dot == 0.0 {
            return;
        }
        let tau = self.betas[k] * dot;
        for (&row, &vi) in rows.iter().zip(v) {
            work.touch(row);
            work.values[row] -= tau * vi;
        }
    }

    /// Applies `H_{len-1} ... H_0` to `work`, visiting only the reflectors
    /// whose support meets the column's current pattern. Returns how many
    /// reflectors were visited.
    fn apply_all(&self, work: &mut Workspace) -> usize {
        let mut pending = std::mem::take(&mut work.pending);
        pending.clear();
        for &row in &work.pattern {
            pending.extend(self.by_row[row].iter().map(|&k| Reverse(k)));
        }

        let mut visited = 0;
        let mut last = None;
        while let Some(Reverse(k)) = pending.pop() {
            if last == Some(k) {
                continue;
            }
            last = Some(k);
            visited += 1;
            let before = work.pattern.len();
            self.apply(k, work);
            // Rows filled in by `H_k` can only pull in later reflectors.
            for &row in &work.pattern[before..] {
                pending.extend(
                    self.by_row[row]
                        .iter()
                        .filter(|&&j| j > k)
                        .map(|&j| Reverse(j)),
                );
            }
        }
        work.pending = pending;
        visited
    }

    /// Splits the nonzeros of `work` into rank indices of pivot rows (sorted)
    /// and the remaining rows.
    fn split(&self, work: &Workspace, on_pivots: &mut Vec<usize>, remaining: &mut Vec<usize>) {
        on_pivots.clear();
        remaining.clear();
        for &row in &work.pattern {
            if work.values[row] == 0.0 {
                continue;
            }
            match self.pivot_rank[row] {
                Some(rank) => on_pivots.push(rank),
                None => remaining.push(row),
            }
        }
        let len = on_pivots.len();
        sort_range(on_pivots, 0..len);
    }
}

/// Qᵀ applied to a right-hand side.
#[derive(Debug, Clone)]
pub struct Projection {
    /// `rank x k` entries of `Qᵀ rhs` on the pivot rows.
    pub qtb: SparseMatrix,
    /// Norm of the part of `Qᵀ rhs` outside the pivot rows, per column.
    pub residual_norms: Vec<f64>,
}

/// Result of [`iterated_qr`].
///
/// Satisfies `Qᵀ A P = R` where `P` is the column permutation given by
/// `col_perm` and the rows of `R` are the pivot rows in rank order.
#[derive(Debug, Clone)]
pub struct FactorizationResult {
    nrows: usize,
    ncols: usize,
    r: SparseMatrix,
    qtb: SparseMatrix,
    residual_norms: Vec<f64>,
    col_perm: Vec<usize>,
    pivot_positions: Vec<usize>,
    dependent_columns: Vec<usize>,
    status: RankStatus,
    passes: usize,
    tolerance: f64,
    reflectors: Reflectors,
}

impl FactorizationResult {
    /// Rows of the factorized matrix.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Columns of the factorized matrix.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of accepted pivots.
    pub fn rank(&self) -> usize {
        self.pivot_positions.len()
    }

    /// Whether every column produced a pivot.
    pub fn status(&self) -> RankStatus {
        self.status
    }

    /// Shorthand for `status() == RankStatus::FullRank`.
    pub fn is_full_rank(&self) -> bool {
        self.status == RankStatus::FullRank
    }

    /// Upper-trapezoidal factor, `rank x n`, columns in permuted order.
    pub fn r(&self) -> &SparseMatrix {
        &self.r
    }

    /// Projected right-hand side on the pivot rows, `rank x k`.
    pub fn qtb(&self) -> &SparseMatrix {
        &self.qtb
    }

    /// Least-squares residual norm per right-hand-side column.
    pub fn residual_norms(&self) -> &[f64] {
        &self.residual_norms
    }

    /// `col_perm()[p]` is the original column at permuted position `p`.
    pub fn col_perm(&self) -> &[usize] {
        &self.col_perm
    }

    /// Permuted positions of the accepted pivots, in rank order.
    pub fn pivot_positions(&self) -> &[usize] {
        &self.pivot_positions
    }

    /// Original indices of the columns judged dependent.
    pub fn dependent_columns(&self) -> &[usize] {
        &self.dependent_columns
    }

    /// Elimination passes performed.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Relative threshold used for rank decisions.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Applies `Qᵀ` to a new right-hand side with the same row count.
    pub fn project(&self, rhs: &SparseMatrix) -> Result<Projection, KernelError> {
        if rhs.nrows() != self.nrows {
            return Err(KernelError::ShapeMismatch {
                op: "project (nrows)",
                expected: self.nrows,
                actual: rhs.nrows(),
            });
        }
        Ok(project_columns(&self.reflectors, rhs))
    }

    /// Basic least-squares solution (`n x k`) for the factorized right-hand
    /// side. Unknowns of dependent columns are zero.
    pub fn solve(&self) -> SparseMatrix {
        let columns: Vec<Vec<f64>> = (0..self.qtb.ncols())
            .map(|col| self.back_substitute(&self.qtb, col))
            .collect();
        dense_columns_to_sparse(self.ncols, &columns)
    }

    /// Basic solution for one column of the factorized right-hand side.
    ///
    /// # Panics
    ///
    /// Panics if `rhs_col` is not a column of the right-hand side.
    pub fn solve_column(&self, rhs_col: usize) -> Vec<f64> {
        self.back_substitute(&self.qtb, rhs_col)
    }

    /// Basic least-squares solution for a new right-hand side.
    pub fn solve_rhs(&self, rhs: &SparseMatrix) -> Result<SparseMatrix, KernelError> {
        let projection = self.project(rhs)?;
        let columns: Vec<Vec<f64>> = (0..rhs.ncols())
            .map(|col| self.back_substitute(&projection.qtb, col))
            .collect();
        Ok(dense_columns_to_sparse(self.ncols, &columns))
    }

    fn back_substitute(&self, projected: &SparseMatrix, rhs_col: usize) -> Vec<f64> {
        let rank = self.rank();
        let mut y = vec![0.0; rank];
        for (&row, &value) in projected
            .row_indices_of_col(rhs_col)
            .iter()
            .zip(projected.values_of_col(rhs_col))
        {
            y[row] = value;
        }

        let mut x = vec![0.0; self.ncols];
        for i in (0..rank).rev() {
            let position = self.pivot_positions[i];
            let rows = self.r.row_indices_of_col(position);
            let values = self.r.values_of_col(position);
            // The diagonal is the last stored entry of an accepted column.
            let last = rows.len() - 1;
            debug_assert_eq!(rows[last], i);
            let xi = y[i] / values[last];
            for (&row, &value) in rows[..last].iter().zip(&values[..last]) {
                y[row] -= xi * value;
            }
            x[self.col_perm[position]] = xi;
        }
        x
    }
}

/// Solution returned by [`solve_least_squares`].
#[derive(Debug, Clone)]
pub struct LeastSquaresSolution {
    /// `n x k` solution.
    pub x: SparseMatrix,
    /// `||b - A x||` per right-hand-side column.
    pub residual_norms: Vec<f64>,
    /// Refinement steps that improved at least one column.
    pub refinement_steps: usize,
    pub factorization: FactorizationResult,
}

enum ReporterSlot<'a> {
    External(&'a mut dyn Reporter),
    Local(TableReporter),
    None,
}

impl<'a> ReporterSlot<'a> {
    fn new(reporter: Option<&'a mut dyn Reporter>, verbose: bool) -> Self {
        match reporter {
            Some(r) => Self::External(r),
            None if verbose => Self::Local(TableReporter::new()),
            None => Self::None,
        }
    }

    fn as_mut(&mut self) -> Option<&mut dyn Reporter> {
        match self {
            Self::External(r) => Some(*r),
            Self::Local(r) => Some(r),
            Self::None => None,
        }
    }
}

/// Factorizes `a` with default options and projects `b`.
///
/// See [`iterated_qr_with`].
pub fn iterated_qr(a: &SparseMatrix, b: &SparseMatrix) -> Result<FactorizationResult, KernelError> {
    iterated_qr_with(a, b, &QrOptions::default())
}

/// Factorizes `a` (`m x n`) and projects `b` (`m x k`).
///
/// Fails with [`KernelError::ShapeMismatch`] if the row counts differ and
/// with [`KernelError::SingularSystem`] if no pivot is accepted. Dependent
/// columns lower the rank instead of failing.
pub fn iterated_qr_with(
    a: &SparseMatrix,
    b: &SparseMatrix,
    options: &QrOptions,
) -> Result<FactorizationResult, KernelError> {
    iterated_qr_with_reporter(a, b, options, None)
}

/// Same as [`iterated_qr_with`], forwarding pivot decisions to `reporter`.
pub fn iterated_qr_with_reporter(
    a: &SparseMatrix,
    b: &SparseMatrix,
    options: &QrOptions,
    reporter: Option<&mut dyn Reporter>,
) -> Result<FactorizationResult, KernelError> {
    if a.nrows() != b.nrows() {
        return Err(KernelError::ShapeMismatch {
            op: "iterated_qr (nrows)",
            expected: a.nrows(),
            actual: b.nrows(),
        });
    }

    let (m, n) = a.shape();
    let mut reporter = ReporterSlot::new(reporter, options.verbose);
    let tolerance = options.tolerance.resolve(m, n);
    let max_passes = options.max_passes.clamp(1, m.min(n).max(1));

    let mut order = initial_ordering(a, options.ordering);
    let mut passes = 0;
    let elimination = loop {
        let elimination = eliminate(a, &order, tolerance, passes, &mut reporter);
        passes += 1;
        if let Some(r) = reporter.as_mut() {
            r.on_pass_end(passes, elimination.reflectors.len());
        }
        let deferred = defer_dependent(&order, &elimination.accepted);
        if deferred == order || passes >= max_passes {
            break elimination;
        }
        log::debug!(
            "pass {passes}: rank {} of {n}, deferring {} dependent columns",
            elimination.reflectors.len(),
            n - elimination.reflectors.len()
        );
        order = deferred;
    };
    if let Some(r) = reporter.as_mut() {
        r.on_finish();
    }

    let Elimination {
        r_col_ptrs,
        r_rows,
        r_values,
        reflectors,
        pivot_positions,
        accepted,
    } = elimination;
    let rank = reflectors.len();
    if rank == 0 {
        return Err(KernelError::SingularSystem { nrows: m, ncols: n });
    }

    let dependent_columns: Vec<usize> = order
        .iter()
        .zip(&accepted)
        .filter(|&(_, &ok)| !ok)
        .map(|(&col, _)| col)
        .collect();
    let status = if rank == n {
        RankStatus::FullRank
    } else {
        RankStatus::RankDeficient
    };
    log::debug!("factorized {m}x{n}: rank {rank} after {passes} passes");

    let r = SparseMatrix::from_parts_unchecked(rank, n, r_col_ptrs, r_rows, r_values);
    let Projection {
        qtb,
        residual_norms,
    } = project_columns(&reflectors, b);

    Ok(FactorizationResult {
        nrows: m,
        ncols: n,
        r,
        qtb,
        residual_norms,
        col_perm: order,
        pivot_positions,
        dependent_columns,
        status,
        passes,
        tolerance,
        reflectors,
    })
}

/// Least-squares solve of `A X ≈ B` with iterative refinement.
///
/// After the basic solution, up to `options.refinement_steps` corrections
/// `X += argmin ||A D - (B - A X)||` are applied, each kept only for the
/// columns whose residual shrinks. Stops early once no column improves.
pub fn solve_least_squares(
    a: &SparseMatrix,
    b: &SparseMatrix,
    options: &QrOptions,
) -> Result<LeastSquaresSolution, KernelError> {
    let factorization = iterated_qr_with(a, b, options)?;
    let k = b.ncols();
    let targets: Vec<Vec<f64>> = (0..k).map(|col| dense_column(b, col)).collect();
    let mut columns: Vec<Vec<f64>> = (0..k)
        .map(|col| factorization.solve_column(col))
        .collect();
    let mut residuals: Vec<Vec<f64>> = columns
        .iter()
        .zip(&targets)
        .map(|(x, target)| residual(a, target, x))
        .collect();
    let mut residual_norms: Vec<f64> = residuals.iter().map(|r| l2_norm(r)).collect();

    let mut refinement_steps = 0;
    for step in 0..options.refinement_steps {
        let rhs = dense_columns_to_sparse(a.nrows(), &residuals);
        let correction = factorization.solve_rhs(&rhs)?;
        let mut improved = false;
        for col in 0..k {
            let mut candidate = columns[col].clone();
            for (&row, &delta) in correction
                .row_indices_of_col(col)
                .iter()
                .zip(correction.values_of_col(col))
            {
                candidate[row] += delta;
            }
            let candidate_residual = residual(a, &targets[col], &candidate);
            let candidate_norm = l2_norm(&candidate_residual);
            if candidate_norm < residual_norms[col] {
                columns[col] = candidate;
                residuals[col] = candidate_residual;
                residual_norms[col] = candidate_norm;
                improved = true;
            }
        }
        log::trace!("refinement step {step}: improved={improved}");
        if !improved {
            break;
        }
        refinement_steps += 1;
    }

    Ok(LeastSquaresSolution {
        x: dense_columns_to_sparse(a.ncols(), &columns),
        residual_norms,
        refinement_steps,
        factorization,
    })
}

struct Elimination {
    r_col_ptrs: Vec<usize>,
    r_rows: Vec<usize>,
    r_values: Vec<f64>,
    reflectors: Reflectors,
    pivot_positions: Vec<usize>,
    /// Per permuted position.
    accepted: Vec<bool>,
}

fn initial_ordering(a: &SparseMatrix, ordering: ColumnOrdering) -> Vec<usize> {
    let n = a.ncols();
    let mut order: Vec<usize> = (0..n).collect();
    if ordering == ColumnOrdering::Natural {
        return order;
    }
    let mut row_counts = vec![0usize; a.nrows()];
    for &row in a.row_indices() {
        row_counts[row] += 1;
    }
    let degree: Vec<usize> = (0..n).map(|col| a.col_nnz(col)).collect();
    let fill: Vec<usize> = (0..n)
        .map(|col| {
            a.row_indices_of_col(col)
                .iter()
                .map(|&row| row_counts[row])
                .sum()
        })
        .collect();
    sort_range_by_keys(&mut order, 0..n, &degree, &fill);
    order
}

/// Accepted columns first, dependent ones after, each group in input order.
fn defer_dependent(order: &[usize], accepted: &[bool]) -> Vec<usize> {
    let mut next = Vec::with_capacity(order.len());
    next.extend(
        order
            .iter()
            .zip(accepted)
            .filter(|&(_, &ok)| ok)
            .map(|(&col, _)| col),
    );
    next.extend(
        order
            .iter()
            .zip(accepted)
            .filter(|&(_, &ok)| !ok)
            .map(|(&col, _)| col),
    );
    next
}

fn eliminate(
    a: &SparseMatrix,
    order: &[usize],
    tolerance: f64,
    pass: usize,
    reporter: &mut ReporterSlot<'_>,
) -> Elimination {
    let (m, n) = a.shape();
    let mut work = Workspace::new(m);
    let mut reflectors = Reflectors::new(m);
    let mut on_pivots = Vec::new();
    let mut remaining = Vec::new();

    let mut r_col_ptrs = Vec::with_capacity(n + 1);
    let mut r_rows = Vec::new();
    let mut r_values = Vec::new();
    let mut pivot_positions = Vec::new();
    let mut accepted = vec![false; n];
    r_col_ptrs.push(0);

    for (position, &col) in order.iter().enumerate() {
        work.load_column(a, col);
        let visited = reflectors.apply_all(&mut work);
        reflectors.split(&work, &mut on_pivots, &mut remaining);

        for &rank in &on_pivots {
            r_rows.push(rank);
            r_values.push(work.values[reflectors.pivot_rows[rank]]);
        }

        let original_norm = a.col_norm(col);
        let remaining_norm = work.norm_of(&remaining);
        let mut pivot_row = None;
        if original_norm > 0.0 && remaining_norm > tolerance * original_norm {
            let mut pivot = remaining[0];
            for &row in &remaining[1..] {
                if work.values[row].abs() > work.values[pivot].abs() {
                    pivot = row;
                }
            }
            let xp = work.values[pivot];
            let alpha = if xp >= 0.0 {
                -remaining_norm
            } else {
                remaining_norm
            };
            // v = x / (x_p - alpha) with v_p = 1, beta = (alpha - x_p) / alpha.
            // |x_p - alpha| >= |x_p| is the largest magnitude, so |v| <= 1.
            let denom = xp - alpha;
            let beta = (alpha - xp) / alpha;
            let rank = reflectors.len();
            reflectors.push(
                remaining.iter().map(|&row| {
                    (row, if row == pivot { 1.0 } else { work.values[row] / denom })
                }),
                beta,
                pivot,
            );
            r_rows.push(rank);
            r_values.push(alpha);
            pivot_positions.push(position);
            accepted[position] = true;
            pivot_row = Some(pivot);
        }
        r_col_ptrs.push(r_rows.len());

        log::trace!(
            "pass {pass} col {col}: {visited} reflectors, norm {original_norm:.3e}, remaining {remaining_norm:.3e}, pivot {pivot_row:?}"
        );
        if let Some(r) = reporter.as_mut() {
            r.on_pivot(&PivotReport {
                pass,
                position,
                column: col,
                pivot_row,
                original_norm,
                remaining_norm,
                accepted: pivot_row.is_some(),
            });
        }
    }

    Elimination {
        r_col_ptrs,
        r_rows,
        r_values,
        reflectors,
        pivot_positions,
        accepted,
    }
}

fn project_columns(reflectors: &Reflectors, rhs: &SparseMatrix) -> Projection {
    let k = rhs.ncols();
    let mut work = Workspace::new(reflectors.nrows());
    let mut on_pivots = Vec::new();
    let mut remaining = Vec::new();
    let mut col_ptrs = Vec::with_capacity(k + 1);
    let mut row_indices = Vec::new();
    let mut values = Vec::new();
    let mut residual_norms = Vec::with_capacity(k);
    col_ptrs.push(0);

    for col in 0..k {
        work.load_column(rhs, col);
        reflectors.apply_all(&mut work);
        reflectors.split(&work, &mut on_pivots, &mut remaining);
        for &rank in &on_pivots {
            row_indices.push(rank);
            values.push(work.values[reflectors.pivot_rows[rank]]);
        }
        col_ptrs.push(row_indices.len());
        residual_norms.push(work.norm_of(&remaining));
    }

    Projection {
        qtb: SparseMatrix::from_parts_unchecked(
            reflectors.len(),
            k,
            col_ptrs,
            row_indices,
            values,
        ),
        residual_norms,
    }
}

fn dense_column(matrix: &SparseMatrix, col: usize) -> Vec<f64> {
    let mut dense = vec![0.0; matrix.nrows()];
    for (&row, &value) in matrix
        .row_indices_of_col(col)
        .iter()
        .zip(matrix.values_of_col(col))
    {
        dense[row] = value;
    }
    dense
}

fn dense_columns_to_sparse(nrows: usize, columns: &[Vec<f64>]) -> SparseMatrix {
    let mut col_ptrs = Vec::with_capacity(columns.len() + 1);
    let mut row_indices = Vec::new();
    let mut values = Vec::new();
    col_ptrs.push(0);
    for column in columns {
        for (row, &value) in column.iter().enumerate() {
            if value != 0.0 {
                row_indices.push(row);
                values.push(value);
            }
        }
        col_ptrs.push(row_indices.len());
    }
    SparseMatrix::from_parts_unchecked(nrows, columns.len(), col_ptrs, row_indices, values)
}

fn residual(a: &SparseMatrix, target: &[f64], x: &[f64]) -> Vec<f64> {
    let ax = a.mul_vec(x);
    target.iter().zip(&ax).map(|(t, v)| t - v).collect()
}

fn l2_norm(x: &[f64]) -> f64 {
    scaled_norm(x.iter().copied())
}
