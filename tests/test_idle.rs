//! Idle-connection sweep

use test_helpers::*;

use tokio::time::{sleep, Duration};

#[tokio::test]
async fn test_silent_connection_is_closed() {
    let mut config = test_config(&[("alt.test", 1, 0)], 2);
    config.server.idle_timeout_secs = 1;
    let (addr, _storage) = start_server(config).await;

    let mut client = NntpClient::connect(addr).await;
    // Send nothing; the sweep should take the connection down.
    assert!(client.read_eof().await, "idle connection was never closed");
}

#[tokio::test]
async fn test_active_connection_is_kept() {
    let mut config = test_config(&[("alt.test", 1, 0)], 2);
    config.server.idle_timeout_secs = 2;
    let (addr, _storage) = start_server(config).await;

    let mut client = NntpClient::connect(addr).await;
    // Keep traffic flowing well inside the timeout for longer than one
    // full timeout window.
    for _ in 0..10 {
        sleep(Duration::from_millis(300)).await;
        client.send("GROUP alt.test").await;
        assert_eq!(client.read_line().await, "211 0 0 0 alt.test");
    }
}

#[tokio::test]
async fn test_sweep_disabled_by_default() {
    // Default config carries no idle timeout; a quiet connection survives
    // past any plausible sweep interval.
    let (addr, _storage) = start_server(test_config(&[("alt.test", 1, 0)], 2)).await;
    let mut client = NntpClient::connect(addr).await;

    sleep(Duration::from_millis(1500)).await;
    client.send("GROUP alt.test").await;
    assert_eq!(client.read_line().await, "211 0 0 0 alt.test");
}
