//! Recovery of true regional activities `c` from observed means `m`, by
//! solving `G c = m`.

use nalgebra::{DMatrix, DVector};
use tracing::{info, warn};

use crate::{Error, Result};

/// Systems whose condition number exceeds this are solved via the SVD
/// pseudo-inverse rather than LU decomposition, unless otherwise specified
pub const DEFAULT_CONDITION_LIMIT: f64 = 1e6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// LU decomposition
    Direct,
    /// Least-squares, minimum-norm solution via the SVD
    PseudoInverse,
}

#[derive(Clone, Debug)]
pub struct Solution {
    pub values: DVector<f64>,
    pub method: Method,
    /// Ratio of largest to smallest singular value of `G`
    pub condition_number: f64,
    /// Numerical rank of `G`
    pub rank: usize,
}

pub fn solve(g: &DMatrix<f64>, m: &DVector<f64>, condition_limit: f64) -> Result<Solution> {
    let k = g.nrows();
    if k == 0 || g.ncols() != k || m.len() != k {
        return Err(Error::DimensionMismatch(format!(
            "cannot solve a {}x{} system with {} measurements", g.nrows(), g.ncols(), m.len()
        )));
    }
    if !(condition_limit >= 1.0) {
        return Err(Error::InvalidParameter(format!(
            "condition number limit must be at least 1, got {condition_limit}"
        )));
    }
    if g.iter().chain(m.iter()).any(|v| !v.is_finite()) {
        return Err(Error::Numerical("linear system contains non-finite values".into()));
    }
    for i in 0..k {
        if g.row(i).iter().all(|&v| v == 0.0) {
            return Err(Error::SingularMatrix(format!("row {i} is zero")));
        }
        if g.column(i).iter().all(|&v| v == 0.0) {
            return Err(Error::SingularMatrix(format!("column {i} is zero")));
        }
    }

    let svd = g.clone().svd(true, true);
    let s_max = svd.singular_values.max();
    let s_min = svd.singular_values.min();
    let condition_number = if s_min > 0.0 { s_max / s_min } else { f64::INFINITY };
    let tolerance = k as f64 * f64::EPSILON * s_max;
    let rank = svd.rank(tolerance);
    if rank == 0 {
        return Err(Error::SingularMatrix("all singular values vanish".into()));
    }
    info!(condition_number, rank, "transfer matrix conditioning");

    if condition_number <= condition_limit {
        match g.clone().lu().solve(m) {
            Some(values) if values.iter().all(|v| v.is_finite()) => {
                return Ok(Solution { values, method: Method::Direct, condition_number, rank })
            }
            _ => warn!("LU solve failed, falling back to pseudo-inverse"),
        }
    } else {
        warn!(condition_number, condition_limit, "ill-conditioned transfer matrix, using pseudo-inverse");
    }

    let values = svd.solve(m, tolerance).map_err(|e| Error::SingularMatrix(e.to_string()))?;
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::SingularMatrix("pseudo-inverse solution is not finite".into()));
    }
    Ok(Solution { values, method: Method::PseudoInverse, condition_number, rank })
}
