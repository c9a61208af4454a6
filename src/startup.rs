use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::Request,
    response::Response,
    routing::{get, post},
    serve::Serve,
};
use tokio::net::TcpListener;
use tower_http::{services::ServeFile, trace::TraceLayer};
use tracing::{Span, info, info_span};
use uuid::Uuid;

use crate::{
    configuration::Settings,
    email_client::EmailClient,
    routes::{health_check, index, submit_contact},
};

pub struct AppState {
    // `None` when the mail secrets are absent from configuration; the
    // contact route turns that into a per-request error.
    pub email_client: Option<EmailClient>,
}

pub async fn run(
    listener: TcpListener,
    email_client: Option<EmailClient>,
) -> anyhow::Result<Serve<TcpListener, Router, Router>> {
    // Wrapped in an Arc pointer to allow cheap cloning of AppState across
    // handlers instead of cloning the EmailClient itself.
    let app_state = Arc::new(AppState { email_client });
    let app = Router::new()
        .route("/", get(index))
        .route("/health_check", get(health_check))
        .route("/api/contact", post(submit_contact))
        .nest_service("/templates", ServeFile::new("templates/output.css"))
        .with_state(app_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let request_id = Uuid::new_v4();
                    info_span!(
                        "http_request",
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        request_id = ?request_id,
                    )
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    let status = response.status();
                    let headers = response.headers();
                    span.record("status", &status.as_u16());
                    info!(parent: span, ?status, ?headers, ?latency, "Response sent");
                }),
        );

    Ok(axum::serve(listener, app))
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    // build is the one that invokes the `run()` function
    // then any fn invokes `run_until_stopped`
    pub async fn build(configuration: Settings) -> anyhow::Result<Self> {
        let email_client = configuration
            .email_client
            .client()
            .map_err(anyhow::Error::msg)?;
        if email_client.is_none() {
            tracing::warn!(
                "Email configuration is missing; contact submissions will be rejected \
                 until both the sender email and the authorization token are set"
            );
        }

        let listener = TcpListener::bind(format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        ))
        .await?;
        let port = listener.local_addr()?.port();

        let server = run(listener, email_client).await?;

        Ok(Self { server, port })
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        Ok(self.server.await?)
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
