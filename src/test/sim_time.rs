use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_millis(1.0), SimTime(0.001));
    assert_eq!(SimTime::from_micros(500.0), SimTime(0.0005));
    assert_eq!(SimTime::from_secs(2.5).as_secs(), 2.5);
}

#[test]
fn sim_time_orders_totally_and_since_never_goes_negative() {
    let a = SimTime(1.0);
    let b = a.after(0.5);
    assert!(a < b);
    assert_eq!(b.since(a), 0.5);
    assert_eq!(a.since(b), 0.0);
    assert_eq!(SimTime(0.0).max(SimTime(3.0)), SimTime(3.0));
}

#[test]
fn sim_time_validity_rejects_negative_and_non_finite() {
    assert!(SimTime::ZERO.is_valid());
    assert!(SimTime(12.0).is_valid());
    assert!(!SimTime(-1.0).is_valid());
    assert!(!SimTime(f64::NAN).is_valid());
    assert!(!SimTime(f64::INFINITY).is_valid());
}

#[test]
fn negative_zero_seconds_normalise_to_zero() {
    assert!(SimTime(-0.0) < SimTime::ZERO);
    assert_eq!(SimTime::from_secs(-0.0), SimTime::ZERO);
}

#[test]
fn next_instant_is_strictly_later() {
    let late = SimTime(1e9);
    assert_eq!(late.after(1e-12), late);
    assert!(late.next_instant() > late);
    assert!(SimTime::ZERO.next_instant() > SimTime::ZERO);
}
