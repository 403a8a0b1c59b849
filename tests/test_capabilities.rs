//! CAPABILITIES advertisement and its stateless behavior

use test_helpers::*;

#[tokio::test]
async fn test_capabilities_block_shape() {
    let (addr, _storage) = start_server(test_config(&[("alt.test", 1, 0)], 2)).await;
    let mut client = NntpClient::connect(addr).await;

    client.send("CAPABILITIES").await;
    let status = client.read_line().await;
    assert!(status.starts_with("101 "), "status was: {status}");

    let caps = client.read_multiline_block().await;
    assert_eq!(caps.first().map(String::as_str), Some("VERSION 2"));
    assert!(caps.iter().any(|c| c == "READER"));
    assert!(caps.iter().any(|c| c == "POST"));
}

#[tokio::test]
async fn test_capabilities_idempotent() {
    let (addr, _storage) = start_server(test_config(&[("alt.test", 1, 0)], 2)).await;
    let mut client = NntpClient::connect(addr).await;

    client.send("CAPABILITIES").await;
    let first_status = client.read_line().await;
    let first_block = client.read_multiline_block().await;

    client.send("capabilities").await;
    let second_status = client.read_line().await;
    let second_block = client.read_multiline_block().await;

    assert_eq!(first_status, second_status);
    assert_eq!(first_block, second_block);
}
