//! Generated checks that fragmenting then reassembling is lossless.

use std::num::NonZeroUsize;

use proptest::{
    collection::vec,
    prelude::{Just, Strategy, any},
    prop_assert,
    prop_assert_eq,
    sample::Index,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};
use rstest::rstest;

use super::support::{chunks, sender};
use crate::{
    fragment::FragmentationConfig,
    packet::{CHUNK_HEADER_LEN, DEFAULT_MAX_DATAGRAM_SIZE},
    reassembly::{ChunkOutcome, Reassembler, ReassemblyConfig},
};

const MAX_PAYLOAD: usize = 600;
const MAX_PEER_PAYLOAD: usize = 256 * 1024;
const MIN_PEER_BUDGET: usize = ReassemblyConfig::MIN_CHUNK_BODY + CHUNK_HEADER_LEN;

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    TestRunner::new_with_rng(config, TestRng::deterministic_rng(RngAlgorithm::ChaCha))
}

#[derive(Clone, Debug)]
struct TransferCase {
    budget: usize,
    payload: Vec<u8>,
    order: Vec<usize>,
    duplicates: Vec<Index>,
}

impl TransferCase {
    fn fragmentation(&self) -> FragmentationConfig {
        let limit = NonZeroUsize::new(MAX_PAYLOAD).expect("non-zero");
        FragmentationConfig::for_datagram_budget(self.budget, limit).expect("budget above header")
    }
}

fn transfer_strategy() -> impl Strategy<Value = TransferCase> {
    (13_usize..80, vec(any::<u8>(), 0..=MAX_PAYLOAD))
        .prop_flat_map(|(budget, payload)| {
            let chunk_count = payload.len().div_ceil(budget - 12).max(1);
            let order = Just((0..chunk_count).collect::<Vec<_>>()).prop_shuffle();
            (
                Just(budget),
                Just(payload),
                order,
                vec(any::<Index>(), 0..4),
            )
        })
        .prop_map(|(budget, payload, order, duplicates)| TransferCase {
            budget,
            payload,
            order,
            duplicates,
        })
}

/// A transfer cut by a peer whose datagram budget is unrelated to the
/// receiver's.
#[derive(Clone, Debug)]
struct PeerCase {
    budget: usize,
    payload: Vec<u8>,
    order: Vec<usize>,
}

fn peer_strategy() -> impl Strategy<Value = PeerCase> {
    (
        MIN_PEER_BUDGET..=DEFAULT_MAX_DATAGRAM_SIZE,
        0..=MAX_PEER_PAYLOAD,
        any::<u8>(),
    )
        .prop_flat_map(|(budget, len, seed)| {
            let payload: Vec<u8> = (0..len)
                .map(|i| seed.wrapping_add(u8::try_from(i % 251).expect("below 251")))
                .collect();
            let chunk_count = len.div_ceil(budget - CHUNK_HEADER_LEN).max(1);
            let order = Just((0..chunk_count).collect::<Vec<_>>()).prop_shuffle();
            (Just(budget), Just(payload), order)
        })
        .prop_map(|(budget, payload, order)| PeerCase {
            budget,
            payload,
            order,
        })
}

/// Feed `case` in its arrival order with duplicates spliced in ahead of the
/// final chunk, returning every completed payload.
fn reassemble(case: &TransferCase) -> Result<Vec<Vec<u8>>, TestCaseError> {
    let fragmentation = case.fragmentation();
    let chunks = chunks(fragmentation, &case.payload);
    let (last, earlier) = case
        .order
        .split_last()
        .ok_or_else(|| TestCaseError::fail("empty arrival order"))?;
    let mut arrivals = earlier.to_vec();
    if !earlier.is_empty() {
        for dup in &case.duplicates {
            let chunk = earlier[dup.index(earlier.len())];
            arrivals.insert(dup.index(arrivals.len() + 1), chunk);
        }
    }
    arrivals.push(*last);

    let mut reassembler = Reassembler::new(ReassemblyConfig::from_fragmentation(&fragmentation));
    let mut completed = Vec::new();
    for i in arrivals {
        let (header, body) = chunks
            .get(i)
            .cloned()
            .ok_or_else(|| TestCaseError::fail("chunk index out of range"))?;
        match reassembler.push(sender(9), header, body) {
            Ok(ChunkOutcome::Complete(done)) => completed.push(done.into_payload().to_vec()),
            Ok(_) => {}
            Err(err) => return Err(TestCaseError::fail(format!("rejected: {err}"))),
        }
    }
    prop_assert_eq!(reassembler.buffered_len(), 0);
    Ok(completed)
}

#[rstest]
#[case(64)]
#[case(128)]
fn any_arrival_order_reassembles_original(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    runner
        .run(&transfer_strategy(), |case| {
            let completed = reassemble(&case)?;
            prop_assert!(!completed.is_empty());
            prop_assert_eq!(completed.first(), Some(&case.payload));
            Ok(())
        })
        .expect("fragmented payloads should reassemble in any order");
}

#[test]
fn duplicates_never_complete_a_transfer_twice() {
    let mut runner = deterministic_runner(96);
    runner
        .run(&transfer_strategy(), |case| {
            let completed = reassemble(&case)?;
            prop_assert_eq!(completed, vec![case.payload]);
            Ok(())
        })
        .expect("duplicates should be idempotent");
}

#[test]
fn interleaved_senders_do_not_interfere() {
    let mut runner = deterministic_runner(64);
    let strategy = (transfer_strategy(), transfer_strategy());
    runner
        .run(&strategy, |(left, right)| {
            let config = ReassemblyConfig::from_fragmentation(&left.fragmentation());
            let left_chunks = chunks(left.fragmentation(), &left.payload);
            let right_chunks = chunks(left.fragmentation(), &right.payload);
            let mut reassembler = Reassembler::new(config);
            let mut left_done = None;
            let mut right_done = None;

            for i in 0..left_chunks.len().max(right_chunks.len()) {
                if let Some((header, body)) = left_chunks.get(i).cloned()
                    && let Ok(ChunkOutcome::Complete(done)) =
                        reassembler.push(sender(1), header, body)
                {
                    left_done = Some(done.into_payload());
                }
                if let Some((header, body)) = right_chunks.get(i).cloned()
                    && let Ok(ChunkOutcome::Complete(done)) =
                        reassembler.push(sender(2), header, body)
                {
                    right_done = Some(done.into_payload());
                }
            }

            prop_assert_eq!(left_done.as_deref(), Some(left.payload.as_slice()));
            prop_assert_eq!(right_done.as_deref(), Some(right.payload.as_slice()));
            Ok(())
        })
        .expect("senders should reassemble independently");
}

#[test]
fn default_receiver_reassembles_any_peer_budget() {
    let mut runner = deterministic_runner(32);
    runner
        .run(&peer_strategy(), |case| {
            let receiver = ReassemblyConfig::default();
            prop_assert!(case.payload.len() <= receiver.max_transfer_size.get());
            let limit = NonZeroUsize::new(FragmentationConfig::DEFAULT_MAX_PAYLOAD_SIZE)
                .expect("non-zero");
            let fragmentation = FragmentationConfig::for_datagram_budget(case.budget, limit)
                .expect("budget above header");
            let chunks = chunks(fragmentation, &case.payload);

            let mut reassembler = Reassembler::new(receiver);
            let mut completed = None;
            for &i in &case.order {
                let (header, body) = chunks
                    .get(i)
                    .cloned()
                    .ok_or_else(|| TestCaseError::fail("chunk index out of range"))?;
                match reassembler.push(sender(7), header, body) {
                    Ok(ChunkOutcome::Complete(done)) => completed = Some(done.into_payload()),
                    Ok(_) => {}
                    Err(err) => return Err(TestCaseError::fail(format!("rejected: {err}"))),
                }
            }

            prop_assert_eq!(completed.as_deref(), Some(case.payload.as_slice()));
            Ok(())
        })
        .expect("payloads within the byte ceiling should reassemble at any peer budget");
}
