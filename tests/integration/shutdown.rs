//! Integration tests for process shutdown signals

#[cfg(unix)]
#[tokio::test]
async fn sigterm_triggers_shutdown() {
    use breakdown_alert::core::{ShutdownReason, ShutdownSignal};
    use std::time::Duration;

    let signal = ShutdownSignal::install().unwrap();

    let status = std::process::Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let reason = tokio::time::timeout(Duration::from_secs(5), signal.recv())
        .await
        .expect("SIGTERM was not observed");
    assert_eq!(reason, ShutdownReason::Terminate);
}
