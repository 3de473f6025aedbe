use axum::http::StatusCode;
use rstest::rstest;
use sewa_api::middleware::error_handling::{AppError, map_error};
use sewa_core::errors::SewaError;

#[rstest]
#[case(SewaError::Validation("Name is required".into()), StatusCode::BAD_REQUEST)]
#[case(SewaError::Authentication("Incorrect password".into()), StatusCode::UNAUTHORIZED)]
#[case(SewaError::Permission("AwardScore".into()), StatusCode::FORBIDDEN)]
#[case(SewaError::NotFound("Score".into()), StatusCode::NOT_FOUND)]
#[case(SewaError::Capacity("Chess".into()), StatusCode::CONFLICT)]
#[case(SewaError::RemoteWrite(eyre::eyre!("connection reset")), StatusCode::BAD_GATEWAY)]
#[case(
    SewaError::PartialWrite {
        completed: "Sewadar Kirpal Singh (G-1) was added".into(),
        pending: "marking them present".into(),
        failed: eyre::eyre!("connection reset"),
    },
    StatusCode::BAD_GATEWAY
)]
#[case(
    SewaError::Internal(Box::new(std::io::Error::other("disk full"))),
    StatusCode::INTERNAL_SERVER_ERROR
)]
fn test_error_status(#[case] error: SewaError, #[case] status: StatusCode) {
    assert_eq!(map_error(error).status(), status);
}

#[tokio::test]
async fn test_remote_failure_body_is_generic() {
    let response = map_error(SewaError::RemoteWrite(eyre::eyre!("password authentication failed")));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Could not save the change"));
    assert!(!message.contains("password"));
}

#[tokio::test]
async fn test_partial_write_body_names_the_saved_step() {
    let response = map_error(SewaError::PartialWrite {
        completed: "Sewadar Kirpal Singh (G-1) was added".into(),
        pending: "marking them present".into(),
        failed: eyre::eyre!("password authentication failed"),
    });
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Sewadar Kirpal Singh (G-1) was added"));
    assert!(!message.contains("password"));
}

#[test]
fn test_eyre_reports_are_internal() {
    let error = AppError::from(eyre::eyre!("boom"));
    assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
