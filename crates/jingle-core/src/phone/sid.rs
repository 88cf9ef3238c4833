//! Session identifier generation for outbound calls

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::SessionId;

// Shared by every generator in the process so two phones never collide
static NEXT_SID: AtomicU64 = AtomicU64::new(1);

/// Generates `<prefix>-<nonce>-<counter>` identifiers
///
/// The counter makes every SID unique within the process, even under
/// concurrent dials. The per-generator random nonce keeps SIDs from
/// repeating across restarts.
#[derive(Debug, Clone)]
pub struct SidGenerator {
    prefix: String,
    nonce: String,
}

impl SidGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut nonce = uuid::Uuid::new_v4().simple().to_string();
        nonce.truncate(8);
        Self {
            prefix: prefix.into(),
            nonce,
        }
    }

    pub fn next_sid(&self) -> SessionId {
        let n = NEXT_SID.fetch_add(1, Ordering::Relaxed);
        SessionId(format!("{}-{}-{}", self.prefix, self.nonce, n))
    }
}
