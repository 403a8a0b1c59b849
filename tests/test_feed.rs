//! Peer propagation: accepted articles reach subscribed peers, with group
//! routing and loop prevention.

use test_helpers::*;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use nntp_serverd::config::{Config, SubscriptionConfig};
use nntp_serverd::storage::MemoryStorage;
use nntp_serverd::{NntpServer, Storage};

/// One received article: the raw lines between 340 and the terminator.
type ReceivedArticle = Vec<String>;

/// Minimal receiving peer: greets, accepts one POST exchange per
/// connection, and reports each received article on the channel.
async fn spawn_mock_peer() -> (u16, mpsc::UnboundedReceiver<ReceivedArticle>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("peer bind");
    let port = listener.local_addr().expect("peer addr").port();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let (read_half, mut write_half) = stream.into_split();
                let mut reader = BufReader::new(read_half).lines();
                let _ = write_half.write_all(b"200 mock peer ready\r\n").await;
                while let Ok(Some(line)) = reader.next_line().await {
                    match line.as_str() {
                        "POST" => {
                            let _ = write_half.write_all(b"340 go ahead\r\n").await;
                            let mut article = Vec::new();
                            while let Ok(Some(body_line)) = reader.next_line().await {
                                if body_line == "." {
                                    break;
                                }
                                article.push(body_line);
                            }
                            let _ = tx.send(article);
                            let _ = write_half.write_all(b"240 article received\r\n").await;
                        }
                        "QUIT" => {
                            let _ = write_half.write_all(b"205 bye\r\n").await;
                            return;
                        }
                        _ => {
                            let _ = write_half.write_all(b"500 unknown\r\n").await;
                        }
                    }
                }
            });
        }
    });

    (port, rx)
}

async fn start_feeding_server(
    mut config: Config,
    subscriptions: Vec<SubscriptionConfig>,
) -> std::net::SocketAddr {
    config.subscriptions = subscriptions;
    let storage: Arc<dyn Storage> = MemoryStorage::new();
    let server = NntpServer::bind(config, storage).await.expect("server bind");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(server.run());
    addr
}

fn subscription(port: u16, group: &str) -> SubscriptionConfig {
    SubscriptionConfig {
        host: "127.0.0.1".to_string(),
        port,
        group: group.to_string(),
    }
}

#[tokio::test]
async fn test_article_is_pushed_to_matching_peer_only() {
    let (matching_port, mut matching_rx) = spawn_mock_peer().await;
    let (other_port, mut other_rx) = spawn_mock_peer().await;

    let config = test_config(&[("alt.test", 1, 0), ("misc.other", 2, 0)], 2);
    let addr = start_feeding_server(
        config,
        vec![
            subscription(matching_port, "alt.test"),
            subscription(other_port, "misc.other"),
        ],
    )
    .await;

    let mut client = NntpClient::connect(addr).await;
    post_article(&mut client, "alt.test", "fed", &["feed me"]).await;

    let received = timeout(Duration::from_secs(5), matching_rx.recv())
        .await
        .expect("peer never received the article")
        .expect("peer channel closed");
    assert!(received.iter().any(|l| l == "Subject: fed"));
    assert!(received.iter().any(|l| l == "feed me"));
    // The Path header grew through this server.
    assert!(received
        .iter()
        .any(|l| l.starts_with("Path: test.example.org!")));

    // The non-matching peer sees nothing.
    let other = timeout(Duration::from_millis(500), other_rx.recv()).await;
    assert!(other.is_err(), "article leaked to a non-subscribed group");
}

#[tokio::test]
async fn test_local_headers_are_stripped_before_feeding() {
    let (port, mut rx) = spawn_mock_peer().await;
    let config = test_config(&[("alt.test", 1, 0)], 2);
    let addr = start_feeding_server(config, vec![subscription(port, "alt.test")]).await;

    let mut client = NntpClient::connect(addr).await;
    client.send("POST").await;
    assert!(client.read_line().await.starts_with("340 "));
    client.send("Newsgroups: alt.test").await;
    client.send("Subject: scrubbed").await;
    client.send("X-Trace: private routing detail").await;
    client.send("NNTP-Posting-Host: 10.0.0.1").await;
    client.send("").await;
    client.send("body").await;
    client.send(".").await;
    assert!(client.read_line().await.starts_with("240 "));

    let received = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("peer never received the article")
        .expect("peer channel closed");
    assert!(received.iter().any(|l| l == "Subject: scrubbed"));
    assert!(!received.iter().any(|l| l.starts_with("X-Trace:")));
    assert!(!received.iter().any(|l| l.starts_with("NNTP-Posting-Host:")));
}

#[tokio::test]
async fn test_path_loop_is_not_fed_back() {
    let (port, mut rx) = spawn_mock_peer().await;
    let config = test_config(&[("alt.test", 1, 0)], 2);
    let addr = start_feeding_server(config, vec![subscription(port, "alt.test")]).await;

    let mut client = NntpClient::connect(addr).await;
    client.send("POST").await;
    assert!(client.read_line().await.starts_with("340 "));
    client.send("Newsgroups: alt.test").await;
    client.send("Subject: looped").await;
    // The article already passed through the subscribed peer.
    client.send("Path: 127.0.0.1!origin").await;
    client.send("").await;
    client.send("body").await;
    client.send(".").await;
    assert!(client.read_line().await.starts_with("240 "));

    let looped = timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(looped.is_err(), "looped article was fed back to its source");
}
