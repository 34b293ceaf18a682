//! Frame synchronization pattern matching.

/// Width of the P25 frame sync word in bits.
pub const SYNC_BITS: u32 = 48;

const SYNC_MASK: u64 = (1 << SYNC_BITS) - 1;

/// Sliding 48-bit window compared against a fixed sync word.
///
/// The detector shifts one bit per call and reports a level, not an edge:
/// `matches` stays true for as long as the window equals the pattern, and the
/// framer samples it once per dibit. Matching is exact; symbol errors inside
/// the sync word suppress detection.
#[derive(Debug, Clone)]
pub struct SyncDetector {
    pattern: u64,
    register: u64,
}

impl SyncDetector {
    /// Detector for the given 48-bit pattern. High bits above the window
    /// width are ignored.
    pub fn new(pattern: u64) -> SyncDetector {
        SyncDetector {
            pattern: pattern & SYNC_MASK,
            register: 0,
        }
    }

    /// Shift one received bit into the window.
    pub fn receive(&mut self, bit: bool) {
        self.register = ((self.register << 1) | bit as u64) & SYNC_MASK;
    }

    /// Whether the current window equals the sync pattern.
    pub fn matches(&self) -> bool {
        self.register == self.pattern
    }

    pub fn reset(&mut self) {
        self.register = 0;
    }
}
