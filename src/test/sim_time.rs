use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs_f64(f64::INFINITY), SimTime::MAX);
}

#[test]
fn float_seconds_round_up_to_the_next_nanosecond() {
    assert_eq!(SimTime::from_secs_f64(10.0), SimTime::from_secs(10));
    assert_eq!(SimTime::from_secs_f64(1.5e-9), SimTime(2));
    assert_eq!(SimTime::from_secs_f64(0.0), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(-3.0), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
}

#[test]
fn float_seconds_absorb_division_noise() {
    // 2000 / (1000 / 3) 在 f64 下可能不是精确的 6
    let secs = 2000.0 / (1000.0_f64 / 3.0);
    assert_eq!(SimTime::from_secs_f64(secs), SimTime::from_secs(6));
}

#[test]
fn secs_since_never_goes_negative() {
    let a = SimTime::from_millis(1500);
    let b = SimTime::from_secs(1);
    assert!((a.secs_since(b) - 0.5).abs() < 1e-12);
    assert_eq!(b.secs_since(a), 0.0);
    assert_eq!(a.as_secs_f64(), 1.5);
}
