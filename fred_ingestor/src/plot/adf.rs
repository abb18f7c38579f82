//! Augmented Dickey-Fuller unit-root test.
//!
//! Regression with constant: Δy_t = α + ρ·y_{t-1} + Σ γ_i·Δy_{t-i} + ε_t,
//! lag depth by the Schwert rule. The reported statistic is the
//! t-statistic on ρ; p-values use the MacKinnon (1994) response-surface
//! approximation and critical values the MacKinnon (2010) asymptotic
//! constants for the constant-only case.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdfError {
    #[error("Not enough observations for ADF: need at least {needed}, got {got}")]
    NotEnoughData { needed: usize, got: usize },

    #[error("ADF design matrix is singular")]
    Singular,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CriticalValues {
    pub one_percent: f64,
    pub five_percent: f64,
    pub ten_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    pub lags_used: usize,
    pub n_obs: usize,
    pub critical_values: CriticalValues,
}

const MIN_OBSERVATIONS: usize = 12;

/// MacKinnon asymptotic critical values, constant-only regression.
const CRITICAL: CriticalValues = CriticalValues {
    one_percent: -3.43,
    five_percent: -2.86,
    ten_percent: -2.57,
};

// MacKinnon (1994) p-value surface for the constant case, one I(1)
// variable. Small-p polynomial below tau_star, large-p above.
const TAU_STAR: f64 = -1.61;
const TAU_MIN: f64 = -18.83;
const TAU_MAX: f64 = 2.74;
const SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

pub fn adf_test(values: &[f64]) -> Result<AdfResult, AdfError> {
    let n = values.len();
    if n < MIN_OBSERVATIONS {
        return Err(AdfError::NotEnoughData {
            needed: MIN_OBSERVATIONS,
            got: n,
        });
    }

    // Schwert rule, bounded so the regression keeps degrees of freedom.
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
    let lags = schwert.min(n / 2 - 3);

    let dy: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    // Rows t = lags..dy.len(); regressors: const, y_{t-1}, dy_{t-1..t-lags}.
    let m = dy.len() - lags;
    let k = 2 + lags;
    if m <= k {
        return Err(AdfError::NotEnoughData {
            needed: k + lags + 2,
            got: n,
        });
    }

    let x = DMatrix::from_fn(m, k, |row, col| {
        let t = row + lags;
        match col {
            0 => 1.0,
            1 => values[t],
            c => dy[t - (c - 1)],
        }
    });
    let y = DVector::from_iterator(m, dy[lags..].iter().copied());

    let xtx = x.transpose() * &x;
    let xtx_inv = xtx.try_inverse().ok_or(AdfError::Singular)?;
    let beta = &xtx_inv * x.transpose() * &y;
    let residuals = &y - &x * &beta;
    let ssr = residuals.dot(&residuals);
    let sigma2 = ssr / (m - k) as f64;
    let se = (sigma2 * xtx_inv[(1, 1)]).sqrt();
    if !se.is_finite() || se == 0.0 {
        return Err(AdfError::Singular);
    }

    let statistic = beta[1] / se;
    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p(statistic),
        lags_used: lags,
        n_obs: m,
        critical_values: CRITICAL,
    })
}

fn mackinnon_p(stat: f64) -> f64 {
    if stat <= TAU_MIN {
        return 0.0;
    }
    if stat >= TAU_MAX {
        return 1.0;
    }
    let z = if stat <= TAU_STAR {
        polyval(&SMALL_P, stat)
    } else {
        polyval(&LARGE_P, stat)
    };
    let normal = Normal::new(0.0, 1.0).expect("unit normal is valid");
    normal.cdf(z)
}

fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .enumerate()
        .map(|(i, c)| c * x.powi(i as i32))
        .sum()
}
