use skyvern_http::{PollOptions, SkyvernClient, SkyvernError};
use std::time::Duration;

fn live_client() -> Option<SkyvernClient> {
    match SkyvernClient::from_env() {
        Ok(client) => Some(client),
        Err(_) => {
            eprintln!("skipping live test: SKYVERN_API_KEY not set");
            None
        }
    }
}

#[tokio::test]
async fn live_unknown_run_is_a_client_error() {
    let Some(client) = live_client() else {
        return;
    };

    let err = client
        .wait_for_run_completion(
            "tsk_does_not_exist",
            &PollOptions::default().with_timeout(Duration::from_secs(30)),
        )
        .await
        .expect_err("unknown run must not resolve");

    match err {
        SkyvernError::Http { status, .. } => {
            assert!((400..500).contains(&status), "unexpected status {status}")
        }
        other => panic!("expected http error, got {other:?}"),
    }
}
