//! Bounded capture of process output

use serde::{Deserialize, Serialize};

/// Output stream collected up to a byte cap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedOutput {
    pub text: String,
    pub truncated: bool,
}

/// Accumulates chunks without growing past `cap` bytes.
///
/// Bytes beyond the cap are dropped and the truncation flag is raised.
#[derive(Debug)]
pub struct CappedBuffer {
    bytes: Vec<u8>,
    cap: usize,
    truncated: bool,
}

impl CappedBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(cap.min(8 * 1024)),
            cap,
            truncated: false,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        let room = self.cap.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Finish capture; invalid UTF-8 (including a split trailing character)
    /// is replaced rather than rejected
    pub fn finish(self) -> CapturedOutput {
        CapturedOutput {
            text: String::from_utf8_lossy(&self.bytes).into_owned(),
            truncated: self.truncated,
        }
    }
}
