use mailchimp_connector::configuration::get_configuration;
use mailchimp_connector::mailchimp_client::MailChimpClient;
use mailchimp_connector::telemetry::get_subscriber;
use mailchimp_connector::telemetry::init_subscriber;
use once_cell::sync::Lazy;
use wiremock::MockServer;

/// Init the tracing subscriber once only.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different closure types, hence the duplicated arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber).expect("init tracing");
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber).expect("init tracing");
        }
    };
});

pub struct TestClient {
    pub client: MailChimpClient,
    /// Stands in for `https://<dc>.api.mailchimp.com/3.0`
    pub mailchimp_server: MockServer,
}

impl TestClient {
    /// Number of requests the mock server has seen so far
    pub async fn request_count(&self) -> usize {
        self.mailchimp_server
            .received_requests()
            .await
            .expect("request recording is enabled")
            .len()
    }
}

/// Build a `MailChimpClient` from the real configuration files, with only the
/// base url pointed at a fresh mock server. No list is selected.
pub async fn spawn_client() -> TestClient {
    Lazy::force(&TRACING);

    let mailchimp_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().expect("load configuration");
        cfg.mailchimp.base_url = Some(mailchimp_server.uri());
        cfg
    };

    let client = cfg.mailchimp.client().expect("build client");

    TestClient {
        client,
        mailchimp_server,
    }
}
