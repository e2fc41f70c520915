//! # Byte-Stream Framer
//!
//! Finds complete, checksum-valid frames inside an arbitrary stream of
//! incoming serial bytes.
//!
//! The framer is fed whatever the transport produced (`update`) and is
//! resumable: a frame split across any number of reads is reassembled, and
//! a single read holding several back-to-back frames yields all of them.
//! Anything that fails to parse — stray bytes before a start sequence, an
//! out-of-range length, a checksum mismatch — is silently discarded and
//! scanning resumes on the following byte. Resync only ever moves forward;
//! discarded bytes are never rescanned.

use bytes::BytesMut;
use tracing::trace;

use super::checksum::xor_checksum;
use super::{CHECKSUM_LEN, MAX_PAYLOAD_LEN, MIN_PAYLOAD_LEN, START_SEQUENCE};

/// Scanner position within the current candidate frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Matching the start sequence; `matched` bytes seen so far
    Sync { matched: usize },
    /// Start sequence matched, next byte is the declared payload length
    Length,
    /// Accumulating payload + checksum; `remaining` bytes still missing
    Body { remaining: usize },
}

/// Resumable frame scanner
///
/// Holds at most one in-progress candidate frame across calls. Yielded
/// frames have the 2-byte start sequence stripped and consist of the
/// length byte, the payload, and the trailing checksum byte.
#[derive(Debug)]
pub struct Framer {
    start: [u8; 2],
    min_payload: usize,
    max_payload: usize,
    validate_checksum: bool,
    state: ScanState,
    /// Candidate bytes after the start sequence: length + payload + checksum
    candidate: BytesMut,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    /// Create a framer with the protocol defaults: `AA 55` start sequence,
    /// payload length in `[1, 64]`, checksum validation on
    pub fn new() -> Self {
        Self::with_limits(MIN_PAYLOAD_LEN, MAX_PAYLOAD_LEN, true)
    }

    /// Create a framer with explicit length bounds and checksum switch
    pub fn with_limits(min_payload: usize, max_payload: usize, validate_checksum: bool) -> Self {
        Self {
            start: START_SEQUENCE,
            min_payload,
            max_payload,
            validate_checksum,
            state: ScanState::Sync { matched: 0 },
            candidate: BytesMut::with_capacity(MAX_PAYLOAD_LEN + 2),
        }
    }

    /// Feed newly received bytes, returning every frame completed by them
    ///
    /// Each returned frame is `length byte + payload + checksum byte`; the
    /// start sequence has already been consumed. Invalid candidates are
    /// dropped without notice and scanning continues within the same call.
    pub fn update(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &byte in bytes {
            if let Some(frame) = self.feed(byte) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Read-sizing hint: how many more bytes could complete the current frame
    ///
    /// While scanning for a start sequence this is the size of the smallest
    /// frame that could still arrive; once the length byte is known it is
    /// exactly the number of outstanding body bytes.
    pub fn bytes_wanted(&self) -> usize {
        match self.state {
            ScanState::Sync { matched } => {
                (self.start.len() - matched) + 1 + self.min_payload + CHECKSUM_LEN
            }
            ScanState::Length => 1 + self.min_payload + CHECKSUM_LEN,
            ScanState::Body { remaining } => remaining,
        }
    }

    fn feed(&mut self, byte: u8) -> Option<Vec<u8>> {
        match self.state {
            ScanState::Sync { matched } => {
                if byte == self.start[matched] {
                    if matched + 1 == self.start.len() {
                        self.candidate.clear();
                        self.state = ScanState::Length;
                    } else {
                        self.state = ScanState::Sync { matched: matched + 1 };
                    }
                } else {
                    // A mismatch can still be the first byte of the real
                    // start sequence (e.g. `AA AA 55`)
                    let restart = usize::from(byte == self.start[0]);
                    self.state = ScanState::Sync { matched: restart };
                }
                None
            }
            ScanState::Length => {
                let declared = byte as usize;
                if declared < self.min_payload || declared > self.max_payload {
                    trace!("framer: payload length {} out of range, resyncing", declared);
                    self.state = ScanState::Sync { matched: 0 };
                    return None;
                }
                self.candidate.extend_from_slice(&[byte]);
                self.state = ScanState::Body {
                    remaining: declared + CHECKSUM_LEN,
                };
                None
            }
            ScanState::Body { remaining } => {
                self.candidate.extend_from_slice(&[byte]);
                if remaining > 1 {
                    self.state = ScanState::Body {
                        remaining: remaining - 1,
                    };
                    return None;
                }

                // Candidate complete; the trailer-inclusive XOR of
                // everything after the start sequence must be zero
                self.state = ScanState::Sync { matched: 0 };
                if self.validate_checksum && xor_checksum(&self.candidate) != 0 {
                    trace!("framer: checksum mismatch, dropping {} bytes", self.candidate.len());
                    return None;
                }
                Some(self.candidate.to_vec())
            }
        }
    }
}
