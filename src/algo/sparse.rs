//! Compressed sparse row matrices and a conjugate gradient solver.
//!
//! The solver is written for symmetric definite systems of either sign: a
//! negative definite matrix runs the same iteration with negative step sizes.
//! Singular systems (graph Laplacians on closed meshes) converge as long as
//! the right-hand side lies in the range of the matrix.
//!
//! The solver never fails; it reports how the iteration ended through
//! [`SolveStatus`] and leaves the decision to the caller.

use nalgebra::DVector;

/// Rayleigh quotient `p·Ap / p·p` below which a search direction is treated
/// as lying in the null space.
const BREAKDOWN_EPSILON: f64 = 1e-14;

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// row_ptr[i] is where row i starts in col_idx/values; row_ptr[rows] = nnz.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            if last == Some((row, col)) {
                if let Some(acc) = values.last_mut() {
                    *acc += val;
                }
                continue;
            }
            col_idx.push(col);
            values.push(val);
            row_ptr[row + 1] += 1;
            last = Some((row, col));
        }

        // per-row counts to offsets
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Entry at (row, col), zero if not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        match self.col_idx[range.clone()].binary_search(&col) {
            Ok(k) => self.values[range.start + k],
            Err(_) => 0.0,
        }
    }

    /// Stored entries of one row as (col, value) pairs.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Main diagonal.
    pub fn diagonal(&self) -> DVector<f64> {
        DVector::from_fn(self.rows.min(self.cols), |i, _| self.get(i, i))
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        DVector::from_fn(self.rows, |i, _| {
            self.row(i).map(|(j, a)| a * x[j]).sum()
        })
    }
}

/// How a conjugate gradient run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Relative residual dropped below the tolerance.
    Converged,
    /// Iteration budget exhausted first.
    NotConverged,
    /// A search direction hit the (numerical) null space or produced a
    /// non-finite value; the last finite iterate is returned.
    Breakdown,
    /// Matrix and vector shapes disagree, or the right-hand side is not
    /// finite. The returned vector is all zeros.
    InvalidInput,
}

/// Result of a linear solve, returned whether or not it succeeded.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Best available solution.
    pub x: DVector<f64>,
    /// How the iteration ended.
    pub status: SolveStatus,
    /// Iterations performed.
    pub iterations: usize,
    /// Final `|b - Ax| / |b|` (0 when `b` is zero).
    pub relative_residual: f64,
}

impl SolveReport {
    /// Whether the solver reached its tolerance.
    #[inline]
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    fn invalid(n: usize) -> Self {
        Self {
            x: DVector::zeros(n),
            status: SolveStatus::InvalidInput,
            iterations: 0,
            relative_residual: f64::INFINITY,
        }
    }
}

/// Solve A*x = b using the Conjugate Gradient method.
///
/// `a` must be symmetric and (semi)definite of either sign.
///
/// # Arguments
///
/// * `a` - The system matrix
/// * `b` - The right-hand side vector
/// * `x0` - Optional initial guess (zeros if None)
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance (relative residual norm)
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: Option<&DVector<f64>>,
    max_iter: usize,
    tolerance: f64,
) -> SolveReport {
    let n = b.len();
    if a.nrows() != n || a.ncols() != n || x0.is_some_and(|x| x.len() != n) {
        return SolveReport::invalid(a.ncols());
    }
    if b.iter().any(|v| !v.is_finite()) {
        return SolveReport::invalid(n);
    }

    let b_norm = b.norm();
    if b_norm == 0.0 {
        return SolveReport {
            x: DVector::zeros(n),
            status: SolveStatus::Converged,
            iterations: 0,
            relative_residual: 0.0,
        };
    }

    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => DVector::zeros(n),
    };
    let mut r = b - a.mul_vec(&x);
    let mut r_norm_sq = r.dot(&r);
    let report = |x: DVector<f64>, status, iterations, r_norm_sq: f64| SolveReport {
        x,
        status,
        iterations,
        relative_residual: r_norm_sq.sqrt() / b_norm,
    };

    if r_norm_sq.sqrt() / b_norm < tolerance {
        return report(x, SolveStatus::Converged, 0, r_norm_sq);
    }

    let mut p = r.clone();
    for iter in 0..max_iter {
        let ap = a.mul_vec(&p);
        let p_ap = p.dot(&ap);
        if !p_ap.is_finite() || p_ap.abs() <= BREAKDOWN_EPSILON * p.norm_squared() {
            return report(x, SolveStatus::Breakdown, iter, r_norm_sq);
        }
        let alpha = r_norm_sq / p_ap;

        x += alpha * &p;
        r -= alpha * &ap;

        let new_r_norm_sq = r.dot(&r);
        if !new_r_norm_sq.is_finite() {
            x -= alpha * &p;
            return report(x, SolveStatus::Breakdown, iter, r_norm_sq);
        }
        if new_r_norm_sq.sqrt() / b_norm < tolerance {
            return report(x, SolveStatus::Converged, iter + 1, new_r_norm_sq);
        }

        let beta = new_r_norm_sq / r_norm_sq;
        p = &r + beta * &p;
        r_norm_sq = new_r_norm_sq;
    }

    report(x, SolveStatus::NotConverged, max_iter, r_norm_sq)
}
