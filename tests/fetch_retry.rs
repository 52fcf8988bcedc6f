//! Integration tests for the resilient fetcher
//!
//! These tests use wiremock to script response sequences and a counting
//! rotator to observe exactly when identity rotation happens.

use arena_harvest::config::Config;
use arena_harvest::crawler::{build_http_client, FetchError, Fetcher};
use arena_harvest::tor::{Rotate, TorError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Rotator that succeeds and counts invocations
#[derive(Clone)]
struct CountingRotator {
    rotations: Arc<AtomicU32>,
}

impl Rotate for CountingRotator {
    async fn rotate(&self) -> Result<(), TorError> {
        self.rotations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Rotator that fails every time, as if the control port went away
struct FailingRotator;

impl Rotate for FailingRotator {
    async fn rotate(&self) -> Result<(), TorError> {
        Err(TorError::Protocol("connection reset".to_string()))
    }
}

/// Creates a test configuration pointing at nothing in particular; the
/// fetcher only reads the fetch section and the proxy section
fn create_test_config(max_attempts: u32) -> Config {
    let mut config = Config::default();
    config.proxy.socks_url = None;
    config.fetch.max_attempts = max_attempts;
    config.fetch.pause_secs_min = 0;
    config.fetch.pause_secs_max = 0;
    config
}

fn create_fetcher<R: Rotate>(config: &Config, rotator: R) -> Fetcher<R> {
    let client = build_http_client(&config.proxy, &config.fetch).expect("Failed to build client");
    Fetcher::new(client, rotator, &config.fetch)
}

#[tokio::test]
async fn test_fetch_success_on_first_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rotations = Arc::new(AtomicU32::new(0));
    let config = create_test_config(10);
    let fetcher = create_fetcher(
        &config,
        CountingRotator {
            rotations: Arc::clone(&rotations),
        },
    );

    let body = fetcher
        .fetch(&format!("{}/page.php", mock_server.uri()))
        .await
        .expect("Fetch failed");

    assert_eq!(body, "<html>ok</html>");
    assert_eq!(rotations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fetch_rotates_through_rate_limiting() {
    let mock_server = MockServer::start().await;

    // Mounted first, so the 429 wins for the first three requests.
    Mock::given(method("GET"))
        .and(path("/page.php"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>finally</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rotations = Arc::new(AtomicU32::new(0));
    let config = create_test_config(10);
    let fetcher = create_fetcher(
        &config,
        CountingRotator {
            rotations: Arc::clone(&rotations),
        },
    );

    let body = fetcher
        .fetch(&format!("{}/page.php", mock_server.uri()))
        .await
        .expect("Fetch failed");

    // 429 on attempts 1-3, success on attempt 4, one rotation per failure.
    assert_eq!(body, "<html>finally</html>");
    assert_eq!(rotations.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_fetch_rotates_on_server_errors_too() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page.php"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rotations = Arc::new(AtomicU32::new(0));
    let config = create_test_config(10);
    let fetcher = create_fetcher(
        &config,
        CountingRotator {
            rotations: Arc::clone(&rotations),
        },
    );

    let body = fetcher
        .fetch(&format!("{}/page.php", mock_server.uri()))
        .await
        .expect("Fetch failed");

    assert_eq!(body, "<html>ok</html>");
    assert_eq!(rotations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetch_exhausts_budget_and_names_the_address() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blocked.php"))
        .respond_with(ResponseTemplate::new(429))
        .expect(10)
        .mount(&mock_server)
        .await;

    let rotations = Arc::new(AtomicU32::new(0));
    let config = create_test_config(10);
    let fetcher = create_fetcher(
        &config,
        CountingRotator {
            rotations: Arc::clone(&rotations),
        },
    );

    let target = format!("{}/blocked.php", mock_server.uri());
    let err = fetcher.fetch(&target).await.expect_err("Fetch should fail");

    match err {
        FetchError::Exhausted { url, attempts } => {
            assert_eq!(url, target);
            assert_eq!(attempts, 10);
        }
        other => panic!("Expected exhaustion, got {:?}", other),
    }

    // One rotation per failed attempt, including the last one.
    assert_eq!(rotations.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_fetch_rotation_failure_ends_the_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page.php"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(10);
    let fetcher = create_fetcher(&config, FailingRotator);

    let err = fetcher
        .fetch(&format!("{}/page.php", mock_server.uri()))
        .await
        .expect_err("Fetch should fail");

    assert!(matches!(err, FetchError::Rotation(_)));
}

#[tokio::test]
async fn test_fetch_fails_fast_on_permanent_status_when_configured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone.php"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rotations = Arc::new(AtomicU32::new(0));
    let mut config = create_test_config(10);
    config.fetch.rotate_on_any_error = false;
    let fetcher = create_fetcher(
        &config,
        CountingRotator {
            rotations: Arc::clone(&rotations),
        },
    );

    let err = fetcher
        .fetch(&format!("{}/gone.php", mock_server.uri()))
        .await
        .expect_err("Fetch should fail");

    match err {
        FetchError::Exhausted { attempts, .. } => assert_eq!(attempts, 1),
        other => panic!("Expected exhaustion, got {:?}", other),
    }
    assert_eq!(rotations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fetch_transport_error_is_retryable() {
    // Nothing is listening on this port; every attempt is a connect error.
    let rotations = Arc::new(AtomicU32::new(0));
    let config = create_test_config(2);
    let fetcher = create_fetcher(
        &config,
        CountingRotator {
            rotations: Arc::clone(&rotations),
        },
    );

    let err = fetcher
        .fetch("http://127.0.0.1:9/page.php")
        .await
        .expect_err("Fetch should fail");

    assert!(matches!(err, FetchError::Exhausted { attempts: 2, .. }));
    assert_eq!(rotations.load(Ordering::SeqCst), 2);
}
