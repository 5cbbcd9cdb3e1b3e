use super::*;

const USER_ID: &str = "4f9c2d2e-8a51-4d7e-9a0f-2b1d5c6e7f80";

#[test]
fn parse_token_response_extracts_session() {
    let json = format!(
        r#"{{"access_token":"tok-1","token_type":"bearer","expires_in":3600,"refresh_token":"r",
            "user":{{"id":"{USER_ID}","email":"admin@site.com","aud":"authenticated"}}}}"#
    );
    let session = parse_token_response(&json).unwrap();
    assert_eq!(session.access_token, "tok-1");
    assert_eq!(session.user_id.to_string(), USER_ID);
    assert_eq!(session.email, "admin@site.com");
}

#[test]
fn parse_token_response_rejects_empty_token() {
    let json = format!(r#"{{"access_token":"","user":{{"id":"{USER_ID}"}}}}"#);
    assert!(matches!(parse_token_response(&json), Err(IdentityError::Parse(_))));
}

#[test]
fn parse_token_response_rejects_garbage() {
    assert!(matches!(parse_token_response("<html>"), Err(IdentityError::Parse(_))));
}

#[test]
fn parse_user_response_keeps_supplied_token() {
    let json = format!(r#"{{"id":"{USER_ID}","email":"a@b.c"}}"#);
    let session = parse_user_response("stored", &json).unwrap();
    assert_eq!(session.access_token, "stored");
    assert_eq!(session.email, "a@b.c");
}

#[test]
fn parse_user_response_tolerates_missing_email() {
    let json = format!(r#"{{"id":"{USER_ID}","phone":"+100"}}"#);
    let session = parse_user_response("stored", &json).unwrap();
    assert_eq!(session.email, "");
}

#[test]
fn session_debug_hides_access_token() {
    let session = Session { access_token: "secret-token".into(), user_id: Uuid::nil(), email: "a@b.c".into() };
    let rendered = format!("{session:?}");
    assert!(!rendered.contains("secret-token"));
    assert!(rendered.contains("a@b.c"));
}
