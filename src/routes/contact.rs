use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{email_client::EmailClient, startup::AppState};

// Every submission lands in the site owner's inbox. A literal rather than
// configuration: the site has exactly one owner.
const INBOX: &str = "hey.alex.portfolio@gmail.com";

/// What the contact form posts. All three fields are free-form text, no
/// further validation is applied to them.
#[derive(Deserialize)]
pub struct ContactSubmission {
    name: String,
    email: String,
    message: String,
}

#[tracing::instrument(name = "Relaying a contact form submission", skip(app_state, payload))]
pub async fn submit_contact(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<impl IntoResponse, ContactError> {
    let Json(submission) = payload.map_err(ContactError::MalformedRequest)?;

    let email_client = app_state
        .email_client
        .as_ref()
        .ok_or(ContactError::MissingConfiguration)?;

    send_contact_email(email_client, &submission).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Email sent successfully" })),
    ))
}

#[tracing::instrument(
    name = "Forwarding a submission to the site inbox",
    skip(email_client, submission),
    fields(
        sender_name = %submission.name,
        sender_email = %submission.email
    )
)]
async fn send_contact_email(
    email_client: &EmailClient,
    submission: &ContactSubmission,
) -> Result<(), reqwest::Error> {
    let subject = format!("New message from {}", submission.name);
    let body = format!(
        "Name: {}\nEmail: {}\nMessage: {}",
        submission.name, submission.email, submission.message
    );
    email_client.send_email(INBOX, &subject, &body).await
}

#[derive(thiserror::Error, Debug)]
pub enum ContactError {
    #[error("email configuration is missing")]
    MissingConfiguration,
    #[error("couldn't read the submitted payload, {0}")]
    MalformedRequest(JsonRejection),
    #[error("couldn't relay the message, reqwest error {0}")]
    SendFailure(#[from] reqwest::Error),
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        // The original site reports 500 for every failure, malformed input
        // included, and the page only distinguishes ok from not-ok.
        let user_facing = match &self {
            ContactError::MissingConfiguration => {
                tracing::error!("{}", self);
                "Email configuration is missing"
            }
            ContactError::MalformedRequest(e) => {
                tracing::error!("{}", e);
                "Internal server error"
            }
            ContactError::SendFailure(e) => {
                tracing::error!("{}", e);
                "Failed to send email"
            }
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": user_facing })),
        )
            .into_response()
    }
}
