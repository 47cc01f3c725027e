//! Case log continuity check.
//!
//! The store assigns `seq` starting at 0 and incrementing by one per append.
//! A reviewer holding the envelopes of one case can therefore tell whether
//! the store withheld or replayed anything: missing numbers are gaps, repeated
//! numbers are duplicates. Trailing withholding (dropping the newest
//! messages) is not detectable from the envelopes alone.

use std::ops::RangeInclusive;

use crate::envelope::Envelope;

/// Result of checking a case's envelopes for continuity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceReport {
    /// Missing sequence numbers, as inclusive ranges in ascending order
    pub gaps: Vec<RangeInclusive<u64>>,
    /// Sequence numbers seen more than once, ascending, each listed once
    pub duplicates: Vec<u64>,
    /// Highest sequence number seen, if any
    pub highest: Option<u64>,
}

impl SequenceReport {
    /// No gaps and no duplicates.
    pub fn is_clean(&self) -> bool {
        self.gaps.is_empty() && self.duplicates.is_empty()
    }

    /// Count of missing sequence numbers across all gaps.
    pub fn missing_count(&self) -> u64 {
        self.gaps.iter().map(|r| r.end() - r.start() + 1).sum()
    }
}

/// Check envelopes of one case for gaps and duplicates.
///
/// Input order does not matter. An empty slice is clean.
pub fn check_sequence(envelopes: &[Envelope]) -> SequenceReport {
    let mut seqs: Vec<u64> = envelopes.iter().map(Envelope::seq).collect();
    seqs.sort_unstable();

    let mut report = SequenceReport { highest: seqs.last().copied(), ..SequenceReport::default() };
    let mut expected: u64 = 0;
    let mut previous: Option<u64> = None;

    for seq in seqs {
        if previous == Some(seq) {
            if report.duplicates.last() != Some(&seq) {
                report.duplicates.push(seq);
            }
            continue;
        }

        if seq > expected {
            report.gaps.push(expected..=seq - 1);
        }

        previous = Some(seq);
        expected = seq.saturating_add(1);
    }

    report
}
