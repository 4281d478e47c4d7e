//! Server dispatch behaviour over the in-memory transport.

use std::num::NonZeroUsize;

use bytes::Bytes;
use rstest::rstest;
use snapwire::{
    fragment::{ChunkSender, FragmentationConfig, SenderConfig},
    reassembly::SenderId,
};
use snapwire_testing::{chunk_datagram, raw_datagram, text_datagram};
use tokio::time::timeout;

use crate::common::{MemoryServer, WAIT, addr, pattern_payload};

mod common;

#[tokio::test]
async fn text_reaches_text_sink() {
    let server = MemoryServer::start().await;
    assert!(server.injector.inject(addr(5000), text_datagram("hello")));

    let messages = timeout(WAIT, server.texts.wait_for(1)).await.expect("text delivered");
    assert_eq!(messages, vec![(SenderId::from(addr(5000)), "hello".to_owned())]);
    server.stop().await;
}

#[tokio::test]
async fn invalid_utf8_text_is_delivered_lossily() {
    let server = MemoryServer::start().await;
    server.injector.inject(addr(5000), raw_datagram(0, &[b'o', b'k', 0xFF]));

    let messages = timeout(WAIT, server.texts.wait_for(1)).await.expect("text delivered");
    assert_eq!(messages[0].1, "ok\u{FFFD}");
    server.stop().await;
}

#[tokio::test]
async fn out_of_order_chunks_reassemble() {
    let server = MemoryServer::start().await;
    let payload = pattern_payload(250);
    for index in [2, 0, 1] {
        let start = index as usize * 100;
        let end = (start + 100).min(payload.len());
        server
            .injector
            .inject(addr(5000), chunk_datagram(3, index, &payload[start..end]));
    }

    let saved = timeout(WAIT, server.saved.wait_for(1)).await.expect("transfer saved");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, SenderId::from(addr(5000)));
    assert_eq!(saved[0].1, Bytes::from(payload));
    server.stop().await;
}

#[tokio::test]
async fn duplicate_chunk_saves_once() {
    let server = MemoryServer::start().await;
    let payload = pattern_payload(250);
    let chunk = |index: u32| {
        let start = index as usize * 100;
        let end = (start + 100).min(payload.len());
        chunk_datagram(3, index, &payload[start..end])
    };
    for index in [1, 1, 0, 2] {
        server.injector.inject(addr(5000), chunk(index));
    }
    // A later transfer from another sender proves the first has been handled.
    server.injector.inject(addr(6000), chunk_datagram(1, 0, b"marker"));

    let mut saved = timeout(WAIT, server.saved.wait_for(2)).await.expect("both saved");
    saved.sort_by_key(|(sender, _)| sender.addr().port());
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].1, Bytes::from(payload.clone()));
    assert_eq!(saved[1].1, Bytes::from_static(b"marker"));
    server.stop().await;
}

#[rstest]
#[case::kind_only_chunk(raw_datagram(1, &[]))]
#[case::truncated_chunk_header(raw_datagram(1, &[0, 0, 0, 2, 0]))]
#[case::short_kind(Bytes::from_static(&[0, 0]))]
#[case::empty(Bytes::new())]
#[case::unknown_kind(raw_datagram(7, b"whatever"))]
#[case::zero_chunks(chunk_datagram(0, 0, b"x"))]
#[case::index_out_of_range(chunk_datagram(2, 2, b"x"))]
#[case::oversized(chunk_datagram(1, 0, &[0; 200]))]
#[tokio::test]
async fn bad_datagrams_are_dropped(#[case] datagram: Bytes) {
    let server = MemoryServer::start().await;
    server.injector.inject(addr(5000), datagram);
    // The same sender can still complete a transfer afterwards.
    server.injector.inject(addr(5000), chunk_datagram(1, 0, b"after"));

    let saved = timeout(WAIT, server.saved.wait_for(1)).await.expect("server survived");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].1, Bytes::from_static(b"after"));
    assert!(server.texts.messages().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn interleaved_senders_are_isolated() {
    let server = MemoryServer::start().await;
    let first = pattern_payload(250);
    let second: Vec<u8> = pattern_payload(180).into_iter().rev().collect();
    let body = |payload: &[u8], index: u32| {
        let start = index as usize * 100;
        payload[start..(start + 100).min(payload.len())].to_vec()
    };

    server.injector.inject(addr(5000), chunk_datagram(3, 0, &body(&first, 0)));
    server.injector.inject(addr(6000), chunk_datagram(2, 1, &body(&second, 1)));
    server.injector.inject(addr(5000), chunk_datagram(3, 2, &body(&first, 2)));
    server.injector.inject(addr(6000), chunk_datagram(2, 0, &body(&second, 0)));
    server.injector.inject(addr(5000), chunk_datagram(3, 1, &body(&first, 1)));

    let mut saved = timeout(WAIT, server.saved.wait_for(2)).await.expect("both saved");
    saved.sort_by_key(|(sender, _)| sender.addr().port());
    assert_eq!(saved[0], (SenderId::from(addr(5000)), Bytes::from(first)));
    assert_eq!(saved[1], (SenderId::from(addr(6000)), Bytes::from(second)));
    server.stop().await;
}

#[tokio::test]
async fn reordered_sender_output_reassembles() {
    let server = MemoryServer::start().await;
    let sender = server.chunk_sender(server.injector.sender(addr(5000)).holding());
    let payload = pattern_payload(950);

    let report = sender.send_image(payload.clone()).await.expect("send");
    assert_eq!(report.total_chunks, 10);
    assert_eq!(sender.transport().release_reversed(), 10);

    let saved = timeout(WAIT, server.saved.wait_for(1)).await.expect("transfer saved");
    assert_eq!(saved[0].1, Bytes::from(payload));
    server.stop().await;
}

#[tokio::test]
async fn lost_chunk_leaves_transfer_incomplete() {
    let server = MemoryServer::start().await;
    let lossy = server.chunk_sender(server.injector.sender(addr(5000)).dropping(|pos| pos == 1));
    let intact = server.chunk_sender(server.injector.sender(addr(6000)));

    lossy.send_image(pattern_payload(250)).await.expect("send lossy");
    intact.send_image(pattern_payload(120)).await.expect("send intact");

    let recorded = server.saved.clone();
    timeout(WAIT, recorded.wait_for(1)).await.expect("intact saved");
    // One worker keeps arrival order, so the lossy chunks were handled first.
    server.stop().await;
    let saved = recorded.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, SenderId::from(addr(6000)));
}

#[tokio::test]
async fn sender_text_and_image_share_a_link() {
    let server = MemoryServer::start().await;
    let sender = server.chunk_sender(server.injector.sender(addr(5000)));

    sender.send_text("incoming").await.expect("send text");
    sender.send_image(pattern_payload(300)).await.expect("send image");

    let texts = timeout(WAIT, server.texts.wait_for(1)).await.expect("text delivered");
    let saved = timeout(WAIT, server.saved.wait_for(1)).await.expect("image saved");
    assert_eq!(texts[0].1, "incoming");
    assert_eq!(saved[0].1.len(), 300);
    server.stop().await;
}

#[rstest]
#[case::path_mtu(1_400)]
#[case::minimum_ipv4(576)]
#[tokio::test]
async fn default_server_accepts_smaller_sender_datagrams(#[case] budget: usize) {
    let server = MemoryServer::start_default().await;
    let limit =
        NonZeroUsize::new(FragmentationConfig::DEFAULT_MAX_PAYLOAD_SIZE).expect("non-zero");
    let sender = ChunkSender::new(server.injector.sender(addr(5000)), SenderConfig {
        fragmentation: FragmentationConfig::for_datagram_budget(budget, limit).expect("fits"),
        rate_limit: None,
    });
    let payload = pattern_payload(300_000);

    let report = sender.send_image(payload.clone()).await.expect("send");
    assert!(report.total_chunks > FragmentationConfig::default().max_chunks());

    let saved = timeout(WAIT, server.saved.wait_for(1)).await.expect("transfer saved");
    assert_eq!(saved[0].1, Bytes::from(payload));
    server.stop().await;
}
