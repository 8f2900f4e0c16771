use chrono::{Duration, TimeZone, Utc};
use sentra_types::{format_duration, format_timestamp, Clock, ManualClock, SystemClock};

// ── ManualClock ──────────────────────────────────────────────────

#[test]
fn manual_clock_is_frozen_until_advanced() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    assert_eq!(clock.now(), start);
    assert_eq!(clock.now(), start);

    clock.advance_secs(3601);
    assert_eq!(clock.now(), start + Duration::seconds(3601));
}

#[test]
fn manual_clock_can_move_backward() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    clock.advance(Duration::minutes(-5));
    assert_eq!(clock.now(), start - Duration::minutes(5));

    clock.set(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn system_clock_tracks_utc_now() {
    let before = Utc::now();
    let now = SystemClock.now();
    assert!(now >= before);
}

// ── Formatting ───────────────────────────────────────────────────

#[test]
fn durations_render_like_a_countdown() {
    assert_eq!(format_duration(0), "0:00:00");
    assert_eq!(format_duration(59), "0:00:59");
    assert_eq!(format_duration(3600), "1:00:00");
    assert_eq!(format_duration(86_399), "23:59:59");
    assert_eq!(format_duration(86_400), "1 day, 0:00:00");
    assert_eq!(format_duration(3 * 86_400 + 5), "3 days, 0:00:05");
}

#[test]
fn timestamps_render_in_utc() {
    let at = Utc.with_ymd_and_hms(2026, 10, 16, 8, 5, 3).unwrap();
    assert_eq!(format_timestamp(at), "2026-10-16 08:05:03");
}
