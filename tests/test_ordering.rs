//! Response ordering with a multi-worker reader pool
//!
//! Many pipelined commands on one connection must come back in the order
//! sent even when several reader workers could pick the connection up.

use test_helpers::*;

#[tokio::test]
async fn test_pipelined_responses_keep_command_order() {
    let groups: Vec<(String, i64)> = (0..8)
        .map(|n| (format!("alt.order{n}"), n as i64 + 1))
        .collect();
    let group_refs: Vec<(&str, i64, u32)> = groups
        .iter()
        .map(|(name, id)| (name.as_str(), *id, 0))
        .collect();
    let (addr, _storage) = start_server(test_config(&group_refs, 4)).await;
    let mut client = NntpClient::connect(addr).await;

    // Pipeline: write every command before reading anything back.
    for round in 0..25 {
        let (name, _) = &groups[round % groups.len()];
        client.send(&format!("GROUP {name}")).await;
    }

    for round in 0..25 {
        let (name, _) = &groups[round % groups.len()];
        let response = client.read_line().await;
        assert_eq!(
            response,
            format!("211 0 0 0 {name}"),
            "out of order at round {round}"
        );
    }
}

#[tokio::test]
async fn test_connections_do_not_interleave_each_other() {
    let (addr, _storage) =
        start_server(test_config(&[("alt.a", 1, 0), ("alt.b", 2, 0)], 4)).await;
    let mut first = NntpClient::connect(addr).await;
    let mut second = NntpClient::connect(addr).await;

    for _ in 0..10 {
        first.send("GROUP alt.a").await;
        second.send("GROUP alt.b").await;
    }
    for _ in 0..10 {
        assert_eq!(first.read_line().await, "211 0 0 0 alt.a");
        assert_eq!(second.read_line().await, "211 0 0 0 alt.b");
    }
}
