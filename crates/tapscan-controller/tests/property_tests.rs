//! Property-based tests for the scan lifecycle.
//!
//! These tests use proptest to generate random command sequences and tag
//! records and verify that the access and masking invariants hold for all
//! of them.

mod common;

use chrono::Utc;
use proptest::prelude::*;
use tapscan_controller::{StartOutcome, mask_identifier, parse};
use tapscan_core::ScanPhase;
use tapscan_hardware::RawTagRecord;

/// One step of a presenter/radio interaction.
#[derive(Debug, Clone)]
enum Step {
    Start,
    Cancel,
    Tag(String),
    EmptyTag,
    Fail,
}

/// Strategy for hexadecimal identifiers of realistic UID lengths.
fn hex_uid() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9A-Fa-f]{4,20}").expect("Failed to create UID regex strategy")
}

/// Strategy for identifiers that may or may not be valid.
fn any_uid() -> impl Strategy<Value = String> {
    prop_oneof![hex_uid(), "[ -~]{0,12}"]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Start),
        2 => Just(Step::Cancel),
        2 => any_uid().prop_map(Step::Tag),
        1 => Just(Step::EmptyTag),
        1 => Just(Step::Fail),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build test runtime")
}

/// Apply `steps`, checking the access invariant at every quiescent point.
async fn run_steps(steps: Vec<Step>) {
    let (controller, radio) = common::spawn_ready().await;
    let mut attempts = 0;

    for step in steps {
        let scanning = controller.phase() == ScanPhase::Scanning;

        match step {
            Step::Start => {
                let outcome = controller.start().await;
                if scanning {
                    assert_eq!(outcome, StartOutcome::AlreadyScanning);
                } else {
                    assert_eq!(outcome, StartOutcome::Started);
                    attempts += 1;
                }
                assert_eq!(controller.phase(), ScanPhase::Scanning);
            }
            Step::Cancel => {
                let before = controller.phase();
                controller.cancel().await;
                let expected = if scanning { ScanPhase::Idle } else { before };
                assert_eq!(controller.phase(), expected);
            }
            Step::Tag(_) | Step::EmptyTag | Step::Fail if !scanning => continue,
            Step::Tag(id) => {
                radio.present_tag(RawTagRecord::new().with_id(id)).await.unwrap();
                common::wait_until(&controller, |s| s.phase() != ScanPhase::Scanning).await;
            }
            Step::EmptyTag => {
                radio.present_empty_tag().await.unwrap();
                let state = common::wait_for_phase(&controller, ScanPhase::Failed).await;
                assert_eq!(state.error(), Some("Unreadable tag"));
            }
            Step::Fail => {
                radio.fail_next_request("Tag was lost").await.unwrap();
                common::wait_for_phase(&controller, ScanPhase::Failed).await;
            }
        }

        common::assert_access_invariant(&controller, &radio);
        assert_eq!(radio.stats().requests, attempts);
    }

    controller.teardown().await;
    let stats = radio.stats();
    assert!(!stats.held);
    assert_eq!(stats.releases, attempts);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: exclusive access is held only while an attempt is in flight,
    /// and every attempt is released exactly once.
    #[test]
    fn prop_access_held_only_while_scanning(steps in prop::collection::vec(step(), 0..24)) {
        runtime().block_on(run_steps(steps));
    }

    /// Property: masking keeps exactly the last four characters.
    #[test]
    fn prop_mask_keeps_last_four(id in "[ -~]{4,32}") {
        let masked = mask_identifier(Some(&id));
        let tail = &id[id.len() - 4..];

        prop_assert!(masked.starts_with("**** **** **** "));
        prop_assert!(masked.ends_with(tail));
        prop_assert_eq!(masked.len(), "**** **** **** ".len() + 4);
    }

    /// Property: short identifiers never leak any character.
    #[test]
    fn prop_mask_hides_short_identifiers(id in "[ -~]{0,3}") {
        prop_assert_eq!(mask_identifier(Some(&id)), "****");
    }

    /// Property: any hexadecimal identifier parses and keeps its value.
    #[test]
    fn prop_hex_identifier_parses(id in hex_uid()) {
        let summary = parse(&RawTagRecord::new().with_id(id.clone()), Utc::now()).unwrap();

        prop_assert_eq!(&summary.tag_id, &id);
        prop_assert_eq!(summary.masked_number, mask_identifier(Some(&id)));
    }

    /// Property: technologies come out unique, non-blank, in first-seen order.
    #[test]
    fn prop_technologies_unique_in_order(
        techs in prop::collection::vec(prop_oneof![
            Just("NfcA"), Just("NfcB"), Just("IsoDep"), Just("Ndef"), Just(" "), Just(""),
        ], 0..12)
    ) {
        let raw = RawTagRecord::new().with_tech_types(techs.clone());
        let summary = parse(&raw, Utc::now()).unwrap();

        let mut expected: Vec<String> = Vec::new();
        for tech in techs.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !expected.iter().any(|seen| seen == tech) {
                expected.push(tech.to_string());
            }
        }
        prop_assert_eq!(summary.technologies, expected);
    }
}
