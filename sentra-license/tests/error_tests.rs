use sentra_license::LicenseError;

#[test]
fn error_display_invalid_key() {
    assert!(format!("{}", LicenseError::InvalidKey).contains("key must not be empty"));
}

#[test]
fn error_display_malformed_blob() {
    let msg = format!("{}", LicenseError::MalformedBlob("bad padding".into()));
    assert!(msg.contains("malformed license blob"));
    assert!(msg.contains("bad padding"));
}

#[test]
fn error_display_identity_unavailable() {
    let msg = format!("{}", LicenseError::IdentityUnavailable("user name".into()));
    assert!(msg.contains("identity unavailable"));
}

#[test]
fn rejection_shows_only_the_server_message() {
    let err = LicenseError::LoginRejected("License expired on server".into());
    assert_eq!(format!("{err}"), "License expired on server");
}

#[test]
fn termination_message_is_generic() {
    assert_eq!(format!("{}", LicenseError::SessionTerminated), "session ended");
}

#[test]
fn error_display_expired() {
    assert_eq!(format!("{}", LicenseError::SessionExpired), "session expired");
}

#[test]
fn error_from_serde_json() {
    let serde_err: Result<serde_json::Value, _> = serde_json::from_str("not json");
    let err: LicenseError = serde_err.unwrap_err().into();
    assert!(format!("{err}").contains("serialization"));
}
