//! Lag-polynomial helpers for seasonal ARMA models.
//!
//! Coefficients follow the sign convention of the recursion
//! `w_t = Σ φ_i w_{t-i} + e_t + Σ θ_j e_{t-j}`.

/// Map unconstrained values to the coefficients of a stationary AR
/// polynomial through partial autocorrelations in `(-1, 1)`.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(unconstrained.len());
    for (k, &u) in unconstrained.iter().enumerate() {
        let r = u.tanh();
        let previous = phi.clone();
        for j in 0..k {
            phi[j] = previous[j] - r * previous[k - 1 - j];
        }
        phi.push(r);
    }
    phi
}

/// Map unconstrained values to the coefficients of an invertible MA
/// polynomial `1 + Σ θ_j B^j`.
pub fn constrain_invertible(unconstrained: &[f64]) -> Vec<f64> {
    constrain_stationary(unconstrained)
        .into_iter()
        .map(|c| -c)
        .collect()
}

/// Multiply two lag polynomials given as full coefficient vectors
/// (`[1, c_1, c_2, ...]`).
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Full AR polynomial `1 - Σ φ_i B^i` from recursion coefficients,
/// spreading them `step` lags apart (use `step = s` for seasonal terms).
pub fn ar_polynomial(phi: &[f64], step: usize) -> Vec<f64> {
    let mut poly = vec![0.0; phi.len() * step + 1];
    poly[0] = 1.0;
    for (i, &c) in phi.iter().enumerate() {
        poly[(i + 1) * step] = -c;
    }
    poly
}

/// Full MA polynomial `1 + Σ θ_j B^j`, spaced `step` lags apart.
pub fn ma_polynomial(theta: &[f64], step: usize) -> Vec<f64> {
    let mut poly = vec![0.0; theta.len() * step + 1];
    poly[0] = 1.0;
    for (j, &c) in theta.iter().enumerate() {
        poly[(j + 1) * step] = c;
    }
    poly
}

/// Recursion coefficients `φ*` of the product `φ(B)·Φ(B^s)`.
pub fn expand_ar(phi: &[f64], seasonal_phi: &[f64], period: usize) -> Vec<f64> {
    let poly = multiply(&ar_polynomial(phi, 1), &ar_polynomial(seasonal_phi, period));
    trim_trailing(poly.iter().skip(1).map(|c| -c).collect())
}

/// Recursion coefficients `θ*` of the product `θ(B)·Θ(B^s)`.
pub fn expand_ma(theta: &[f64], seasonal_theta: &[f64], period: usize) -> Vec<f64> {
    let poly = multiply(&ma_polynomial(theta, 1), &ma_polynomial(seasonal_theta, period));
    trim_trailing(poly.into_iter().skip(1).collect())
}

/// AR recursion coefficients including `(1 - B)^d (1 - B^s)^D`.
pub fn integrated_ar(expanded_ar: &[f64], d: usize, cap_d: usize, period: usize) -> Vec<f64> {
    let mut poly = ar_polynomial(expanded_ar, 1);
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..cap_d {
            poly = multiply(&poly, &seasonal);
        }
    }
    trim_trailing(poly.iter().skip(1).map(|c| -c).collect())
}

/// First `n` psi-weights of the MA(∞) representation of an ARMA process
/// (`ψ_0 = 1`).
pub fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = if j <= ma.len() { ma[j - 1] } else { 0.0 };
        for (i, &a) in ar.iter().enumerate().take(j) {
            value += a * psi[j - 1 - i];
        }
        psi.push(value);
    }
    psi
}

fn trim_trailing(mut coefficients: Vec<f64>) -> Vec<f64> {
    while coefficients.last() == Some(&0.0) {
        coefficients.pop();
    }
    coefficients
}
