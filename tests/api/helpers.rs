use std::sync::LazyLock;

use portfolio_site::{
    configuration::{Settings, get_configuration},
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};
use secrecy::SecretString;
use wiremock::MockServer;

// Set TEST_LOG to get the application logs of a failing test.
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub email_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_contact(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/contact", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Sends the body as-is with a JSON content type, for payloads that are
    /// not valid JSON to begin with.
    pub async fn post_contact_raw(&self, body: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/contact", &self.address))
            .header("Content-Type", "application/json")
            .body(body.to_owned())
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Boot the application with full email configuration, pointing the mail
/// client at a wiremock server standing in for the provider.
pub async fn spawn_app() -> TestApp {
    let email_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c.email_client.base_url = email_server.uri();
        c.email_client.sender_email = Some("portfolio@example.com".to_string());
        c.email_client.authorization_token = Some(SecretString::new("test-token".into()));
        c
    };

    launch(configuration, email_server).await
}

/// Boot the application with both mail secrets absent, as if the operator
/// forgot to provide them.
pub async fn spawn_app_without_email_config() -> TestApp {
    let email_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c.email_client.base_url = email_server.uri();
        c.email_client.sender_email = None;
        c.email_client.authorization_token = None;
        c
    };

    launch(configuration, email_server).await
}

async fn launch(configuration: Settings, email_server: MockServer) -> TestApp {
    LazyLock::force(&TRACING);

    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let application_port = application.port();
    tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{}", application_port),
        email_server,
        api_client: reqwest::Client::new(),
    }
}
