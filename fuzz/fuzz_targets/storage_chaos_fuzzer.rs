//! Fuzz target for case sequencing under storage failures
//!
//! Drives a `MemoryStorage` through `ChaoticStorage` with fuzzer-chosen
//! failure rates, case counts, clock movement and message sizes.
//!
//! # Strategy
//!
//! - Variable failure rates (0% to 90%)
//! - Appends spread over several cases, some after expiry
//! - Oversize messages mixed in
//!
//! # Invariants
//!
//! - The store NEVER panics
//! - Injected failures are always transient; rejections never are
//! - A failed append leaves no trace: every case log stays 0..n with no
//!   gaps or duplicates

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealdrop_crypto::{EphemeralKeyPair, seal};
use sealdrop_proto::{CaseId, SubmitRequest, check_sequence};
use sealdrop_store::{ChaoticStorage, ManualEnv, MemoryStorage, Storage, StoreConfig};

#[derive(Debug, Arbitrary)]
struct ChaosScenario {
    chaos_seed: u64,
    /// 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    /// 1-4 cases
    case_count: u8,
    operations: Vec<Operation>,
}

#[derive(Debug, Arbitrary)]
enum Operation {
    Append { case_index: u8, size: u8 },
    Advance { hours: u16 },
    Load { case_index: u8 },
}

fuzz_target!(|scenario: ChaosScenario| {
    let env = ManualEnv::new(1_700_000_000, scenario.chaos_seed);
    let config = StoreConfig { max_ciphertext_size: 200, case_ttl_secs: 24 * 60 * 60 };
    let memory = MemoryStorage::with_config(env.clone(), config);
    let failure_rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let storage = ChaoticStorage::with_seed(memory.clone(), failure_rate, scenario.chaos_seed);

    let case_count = usize::from(scenario.case_count % 4) + 1;
    let cases: Vec<CaseId> =
        (0..case_count).map(|_| memory.create_case().expect("healthy store").case_id).collect();

    let reviewer = EphemeralKeyPair::from_secret_bytes([0x42; 32]);
    let mut expected = vec![0u64; case_count];

    for operation in scenario.operations.into_iter().take(256) {
        match operation {
            Operation::Append { case_index, size } => {
                let index = usize::from(case_index) % case_count;
                let sealed = seal(&vec![0u8; usize::from(size)], reviewer.public_key())
                    .expect("OS RNG available");
                let request = SubmitRequest::new(cases[index].clone(), sealed).expect("within protocol limit");

                match storage.append_message(request) {
                    Ok(envelope) => {
                        assert_eq!(envelope.seq(), expected[index]);
                        expected[index] += 1;
                    },
                    Err(err) => {
                        let injected = err.to_string().contains("injected");
                        assert_eq!(err.is_transient(), injected);
                    },
                }
            },
            Operation::Advance { hours } => env.advance(u64::from(hours) * 3600),
            Operation::Load { case_index } => {
                let index = usize::from(case_index) % case_count;
                if let Ok(messages) = storage.load_messages(&cases[index]) {
                    assert_eq!(messages.len() as u64, expected[index]);
                }
            },
        }
    }

    for (case_id, count) in cases.iter().zip(&expected) {
        let messages = memory.load_messages(case_id).expect("healthy store");
        assert_eq!(messages.len() as u64, *count);
        assert!(check_sequence(&messages).is_clean());
    }
});
