use crate::metrics::MetricsError;
use crate::metrics::rate::RateCounter;
use std::time::Duration;

#[test]
fn new_rejects_zero_window() {
    let err = RateCounter::new(Duration::ZERO).unwrap_err();
    assert_eq!(err, MetricsError::InvalidWindow);
}

#[test]
fn avg_is_sum_of_increments_over_window() {
    let mut rate = RateCounter::new(Duration::from_secs(5)).unwrap();

    rate.incr_by(1.0).unwrap();
    rate.incr_by(2.5).unwrap();
    rate.incr_by(0.0).unwrap();

    assert_eq!(rate.count(), 3.5);
    assert_eq!(rate.avg_per_sec(), 0.7);
}

#[test]
fn avg_with_sub_second_window() {
    let mut rate = RateCounter::new(Duration::from_millis(500)).unwrap();
    rate.incr_by(1.0).unwrap();

    assert_eq!(rate.avg_per_sec(), 2.0);
}

#[test]
fn negative_increment_is_rejected_without_state_change() {
    let mut rate = RateCounter::new(Duration::from_secs(1)).unwrap();
    rate.incr_by(3.0).unwrap();

    let err = rate.incr_by(-1.0).unwrap_err();

    assert_eq!(err, MetricsError::NegativeIncrement { value: -1.0 });
    assert_eq!(rate.count(), 3.0);
}

#[test]
fn nan_increment_is_rejected() {
    let mut rate = RateCounter::new(Duration::from_secs(1)).unwrap();

    assert!(rate.incr_by(f64::NAN).is_err());
    assert_eq!(rate.count(), 0.0);
}

#[test]
fn reset_returns_to_zero() {
    let mut rate = RateCounter::new(Duration::from_secs(10)).unwrap();
    rate.incr_by(42.0).unwrap();

    rate.reset();

    assert_eq!(rate.count(), 0.0);
    assert_eq!(rate.avg_per_sec(), 0.0);
    assert_eq!(rate.window(), Duration::from_secs(10));
}
