//! Data Unit Identifiers.
//!
//! The 4-bit DUID field of the NID selects the frame type and therefore the
//! total length an assembler must collect. Continuation states (PDU2/3,
//! TSBK2/3) never appear on the air; they are entered by the assembler when
//! an in-band field announces more blocks.

use serde::Serialize;

/// Data unit type of a P25 frame, including the internal assembly states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Duid {
    /// Initial state: only the 64-bit NID has been requested so far.
    Nid,
    /// Header data unit preceding a voice call.
    Hdu,
    /// Simple call terminator.
    Tdu,
    /// Terminator carrying a link control word.
    Tdulc,
    /// Voice superframe 1.
    Ldu1,
    /// Voice superframe 2.
    Ldu2,
    /// Packet data unit header block.
    Pdu1,
    /// Packet continuation, one extra block.
    Pdu2,
    /// Packet continuation, two extra blocks.
    Pdu3,
    /// First trunking signalling block.
    Tsbk1,
    /// Second trunking signalling block of a multi-block burst.
    Tsbk2,
    /// Third and final trunking signalling block.
    Tsbk3,
    /// NID carried an unrecognized DUID code.
    Unknown,
}

impl Duid {
    /// Map a received 4-bit DUID code to its frame type.
    pub fn from_code(code: u8) -> Option<Duid> {
        match code {
            0x0 => Some(Duid::Hdu),
            0x3 => Some(Duid::Tdu),
            0x5 => Some(Duid::Ldu1),
            0x7 => Some(Duid::Tsbk1),
            0xA => Some(Duid::Ldu2),
            0xC => Some(Duid::Pdu1),
            0xF => Some(Duid::Tdulc),
            _ => None,
        }
    }

    /// The over-the-air DUID code, for the types that have one.
    pub fn code(self) -> Option<u8> {
        match self {
            Duid::Hdu => Some(0x0),
            Duid::Tdu => Some(0x3),
            Duid::Ldu1 => Some(0x5),
            Duid::Tsbk1 => Some(0x7),
            Duid::Ldu2 => Some(0xA),
            Duid::Pdu1 => Some(0xC),
            Duid::Tdulc => Some(0xF),
            _ => None,
        }
    }

    /// Total message length in bits, sync excluded.
    pub fn bit_length(self) -> usize {
        match self {
            Duid::Nid | Duid::Unknown => 64,
            Duid::Hdu => 792,
            Duid::Tdu => 504,
            Duid::Tdulc => 648,
            Duid::Ldu1 | Duid::Ldu2 => 1728,
            Duid::Pdu1 => 260,
            Duid::Pdu2 => 456,
            Duid::Pdu3 => 652,
            Duid::Tsbk1 | Duid::Tsbk2 | Duid::Tsbk3 => 260,
        }
    }

    pub fn is_tsbk(self) -> bool {
        matches!(self, Duid::Tsbk1 | Duid::Tsbk2 | Duid::Tsbk3)
    }

    pub fn is_pdu(self) -> bool {
        matches!(self, Duid::Pdu1 | Duid::Pdu2 | Duid::Pdu3)
    }

    /// Successor state for a continued trunking burst.
    pub fn next_tsbk(self) -> Option<Duid> {
        match self {
            Duid::Tsbk1 => Some(Duid::Tsbk2),
            Duid::Tsbk2 => Some(Duid::Tsbk3),
            _ => None,
        }
    }
}
