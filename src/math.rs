use nalgebra::{DVector, DVectorView};

fn view(a: &[f64]) -> DVectorView<'_, f64> {
    DVectorView::from_slice(a, a.len())
}

/// Computes the dot-product of `a` and `b`.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    view(&a[..n]).dot(&view(&b[..n]))
}

/// Computes the infinity norm: `max(abs(a))`
pub fn norm_inf(a: &[f64]) -> f64 {
    view(a).amax()
}

/// Returns the 2-norm (Euclidean) of `a`.
pub fn norm(a: &[f64]) -> f64 {
    view(a).norm()
}

/// Returns `x + alpha * d`.
pub(crate) fn axpy(alpha: f64, d: &[f64], x: &[f64]) -> Vec<f64> {
    let mut y = DVector::from_column_slice(x);
    y.axpy(alpha, &view(d), 1.0);
    y.as_slice().to_vec()
}
