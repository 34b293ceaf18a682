//! P25 Phase 1 trunked-radio frame decoding.
//!
//! Feed demodulated C4FM dibits into a [`Framer`] and receive decoded data
//! units (voice headers, terminators, packet data, trunking signalling
//! blocks) through a registered [`MessageSink`]. The framer hunts for the
//! 48-bit frame sync word, recovers the Network Identifier that follows,
//! and assembles the frame type the NID announces, handling status-symbol
//! punctuation, multi-block continuation and the de-interleaved half-rate
//! trellis coding that protects trunking blocks.
//!
//! ```
//! use p25::{Dibit, Framer, FramerConfig};
//!
//! let mut framer = Framer::new(FramerConfig::default());
//! framer.set_listener(Box::new(|message: p25::P25Message| {
//!     println!("{:?} from NAC {:#x}", message.duid(), message.nac());
//! }));
//! framer.receive(Dibit::new(0b01));
//! ```

pub mod bits;
pub mod duid;
pub mod frames;
pub mod framer;
pub mod interleave;
pub mod sync;
pub mod trellis;

pub use bits::{BitBuffer, BufferFullError, Dibit};
pub use duid::Duid;
pub use frames::{P25Message, RawFrame, Tsbk, TsbkKind, calculate_crc};
pub use framer::{
    DEFAULT_STATUS_SCHEDULE, Framer, FramerConfig, MessageAssembler, MessageSink,
    P25_SYNC_PATTERN,
};
pub use sync::SyncDetector;
pub use trellis::TrellisHalfRate;
