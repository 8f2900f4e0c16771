use chrono::Utc;
use sentra_types::{
    EasingKind, MovementCommand, SessionState, SessionStatus, Severity, ThreatEvent, ThreatKind,
};

// ── SessionState ─────────────────────────────────────────────────

#[test]
fn terminal_states() {
    assert!(SessionState::Expired.is_terminal());
    assert!(SessionState::Terminated.is_terminal());
    assert!(!SessionState::Authenticated.is_terminal());
    assert!(!SessionState::Unauthenticated.is_terminal());
    assert!(!SessionState::Authenticating.is_terminal());
}

#[test]
fn fresh_status_is_unauthenticated_with_unique_id() {
    let a = SessionStatus::unauthenticated();
    let b = SessionStatus::default();
    assert_eq!(a.state, SessionState::Unauthenticated);
    assert!(!a.is_authenticated());
    assert_ne!(a.session, b.session);
}

#[test]
fn session_state_serializes_snake_case() {
    let json = serde_json::to_string(&SessionState::Authenticating).unwrap();
    assert_eq!(json, "\"authenticating\"");
    assert_eq!(SessionState::Terminated.to_string(), "terminated");
}

// ── Threats ──────────────────────────────────────────────────────

#[test]
fn only_integrity_and_injection_are_always_fatal() {
    let fatal: Vec<_> = ThreatKind::ALL
        .iter()
        .filter(|k| k.is_always_fatal())
        .copied()
        .collect();
    assert_eq!(fatal, vec![ThreatKind::InjectedCode, ThreatKind::IntegrityMismatch]);
}

#[test]
fn threat_kind_names_match_serde() {
    for kind in ThreatKind::ALL {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.as_str()));
    }
}

#[test]
fn threat_event_carries_its_fields() {
    let now = Utc::now();
    let event = ThreatEvent::new(ThreatKind::Timing, "probe took 900ms", now, Severity::Warn);
    assert_eq!(event.kind, ThreatKind::Timing);
    assert_eq!(event.details, "probe took 900ms");
    assert_eq!(event.observed_at, now);
    assert!(!event.is_fatal());
}

// ── MovementCommand ──────────────────────────────────────────────

#[test]
fn command_validation() {
    assert!(MovementCommand::new(1, 2, 0.0, EasingKind::Linear).validate().is_ok());
    assert!(MovementCommand::new(1, 2, 300.0, EasingKind::EaseOutQuad).validate().is_ok());
    assert!(MovementCommand::new(1, 2, -1.0, EasingKind::Linear).validate().is_err());
    assert!(MovementCommand::new(1, 2, f64::NAN, EasingKind::Linear).validate().is_err());
    assert!(MovementCommand::new(1, 2, f64::INFINITY, EasingKind::Linear).validate().is_err());
}

#[test]
fn command_easing_defaults_when_absent() {
    let cmd: MovementCommand =
        serde_json::from_str(r#"{"dx":120,"dy":-45,"duration_ms":300.0}"#).unwrap();
    assert_eq!(cmd.easing, EasingKind::EaseOutQuad);
    assert!(!cmd.is_noop());
    assert!(MovementCommand::new(0, 0, 10.0, EasingKind::Linear).is_noop());
}
