//! Fuzz target for the JSON codecs
//!
//! Feeds arbitrary bytes to every decoder that accepts untrusted input:
//! envelopes, envelope batches, submit requests and report payloads.
//!
//! # Invariants
//!
//! - Decoders NEVER panic; invalid input is always `Err`
//! - Anything that decodes re-encodes and decodes to the same value

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealdrop_proto::{Envelope, ReportPayload, SubmitRequest};

fuzz_target!(|data: &[u8]| {
    let _ = ReportPayload::from_bytes(data);

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(envelope) = Envelope::decode(text) {
        let again = Envelope::decode(&envelope.to_json()).expect("re-encoded envelope must decode");
        assert_eq!(again, envelope);
    }

    if let Ok(request) = SubmitRequest::decode(text) {
        let again = SubmitRequest::decode(&request.to_json()).expect("re-encoded request must decode");
        assert_eq!(again, request);
    }

    if let Ok(items) = Envelope::decode_batch(text) {
        for envelope in items.into_iter().flatten() {
            assert!(Envelope::decode(&envelope.to_json()).is_ok());
        }
    }
});
