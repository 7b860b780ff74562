mod ecmp;
mod scenario_spec;
mod sim_time;
mod topologies;

/// Relative comparison for rates and times derived from float arithmetic.
pub(crate) fn assert_close(actual: f64, expected: f64) {
    let tol = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual}"
    );
}
