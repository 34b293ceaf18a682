// Decoded P25 message structures.
//
// Every emitted message owns a snapshot of its assembled bits; downstream
// consumers never alias the assembler's working buffer.

use std::ops::Range;

use serde::Serialize;

use crate::bits::BitBuffer;
use crate::duid::Duid;

/// NAC field of the NID: bits 0-11 of every assembled frame.
pub const NID_NAC: Range<usize> = 0..12;
/// DUID field of the NID: bits 12-15.
pub const NID_DUID: Range<usize> = 12..16;

/// CRC-CCITT over a bit range, polynomial x^16 + x^12 + x^5 + 1 (0x1021),
/// initial value 0xFFFF, MSB first.
pub fn calculate_crc(bits: &BitBuffer, range: Range<usize>) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for ix in range {
        let feedback = (crc & 0x8000 != 0) != bits.get_bit(ix);
        crc <<= 1;
        if feedback {
            crc ^= 0x1021;
        }
    }
    crc
}

/// An assembled frame carried as raw bits plus its NID header fields.
#[derive(Debug, Clone, Serialize)]
pub struct RawFrame {
    pub duid: Duid,
    /// Network Access Code, the 12-bit "digital squelch" system id.
    pub nac: u16,
    pub bits: BitBuffer,
}

impl RawFrame {
    pub fn new(duid: Duid, bits: BitBuffer) -> RawFrame {
        let nac = bits.get_int(NID_NAC) as u16;
        RawFrame { duid, nac, bits }
    }

    pub fn to_hex(&self) -> String {
        self.bits.to_hex()
    }
}

/// A decoded message, tagged by data unit type.
///
/// Voice and terminator units are carried raw; their payload structure
/// (IMBE frames, link control words) is interpreted downstream. TSBKs are
/// decoded here because their continuation flag feeds back into frame
/// assembly.
#[derive(Debug, Clone, Serialize)]
pub enum P25Message {
    Hdu(RawFrame),
    Tdu(RawFrame),
    Tdulc(RawFrame),
    Ldu1(RawFrame),
    Ldu2(RawFrame),
    /// Packet data unit; `duid` distinguishes the header-only case from the
    /// continued two- and three-block forms.
    Pdu(RawFrame),
    Tsbk(Tsbk),
    /// NID with an unrecognized DUID code, kept for inspection.
    Unknown(RawFrame),
}

impl P25Message {
    pub(crate) fn from_raw(frame: RawFrame) -> P25Message {
        match frame.duid {
            Duid::Hdu => P25Message::Hdu(frame),
            Duid::Tdu => P25Message::Tdu(frame),
            Duid::Tdulc => P25Message::Tdulc(frame),
            Duid::Ldu1 => P25Message::Ldu1(frame),
            Duid::Ldu2 => P25Message::Ldu2(frame),
            Duid::Pdu1 | Duid::Pdu2 | Duid::Pdu3 => P25Message::Pdu(frame),
            _ => P25Message::Unknown(frame),
        }
    }

    pub fn duid(&self) -> Duid {
        match self {
            P25Message::Tsbk(tsbk) => tsbk.duid,
            P25Message::Hdu(f)
            | P25Message::Tdu(f)
            | P25Message::Tdulc(f)
            | P25Message::Ldu1(f)
            | P25Message::Ldu2(f)
            | P25Message::Pdu(f)
            | P25Message::Unknown(f) => f.duid,
        }
    }

    pub fn nac(&self) -> u16 {
        match self {
            P25Message::Tsbk(tsbk) => tsbk.nac,
            P25Message::Hdu(f)
            | P25Message::Tdu(f)
            | P25Message::Tdulc(f)
            | P25Message::Ldu1(f)
            | P25Message::Ldu2(f)
            | P25Message::Pdu(f)
            | P25Message::Unknown(f) => f.nac,
        }
    }
}

/// Trunking signalling block opcodes (the 6-bit opcode field).
pub struct Opcode;

impl Opcode {
    pub const GROUP_VOICE_GRANT: u8 = 0x00;
    pub const GROUP_VOICE_GRANT_UPDATE: u8 = 0x02;
    pub const UNIT_VOICE_GRANT: u8 = 0x04;
    pub const GROUP_AFFILIATION_RESPONSE: u8 = 0x28;
    pub const RFSS_STATUS_BROADCAST: u8 = 0x3A;
    pub const NETWORK_STATUS_BROADCAST: u8 = 0x3B;
    pub const ADJACENT_STATUS_BROADCAST: u8 = 0x3C;
    pub const IDENTIFIER_UPDATE: u8 = 0x3D;
}

/// One decoded Trunking Signalling Block.
///
/// Payload layout (98 bits = 96 TSBK bits + 2 trellis flush bits):
/// Bit 0: LB, set on the last block of a burst
/// Bit 1: P, payload is protected (encrypted)
/// Bits 2-7: opcode
/// Bits 8-15: manufacturer ID, 0x00 for standard messages
/// Bits 16-79: opcode-specific arguments
/// Bits 80-95: CRC-CCITT over bits 0-79
#[derive(Debug, Clone, Serialize)]
pub struct Tsbk {
    pub nac: u16,
    /// Which block of the burst this came from (TSBK1/2/3).
    pub duid: Duid,
    pub last_block: bool,
    pub protected: bool,
    pub opcode: u8,
    pub mfid: u8,
    /// Received CRC field; see [`Tsbk::crc_ok`].
    pub crc: u16,
    pub kind: TsbkKind,
    /// The full 98-bit decoded payload.
    pub bits: BitBuffer,
}

/// Opcode-specific decoded arguments. Values are raw field integers;
/// channel-to-frequency mapping and unit alias lookup are downstream
/// concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TsbkKind {
    GroupVoiceGrant {
        service_options: u8,
        channel: u16,
        group: u16,
        source: u32,
    },
    GroupVoiceGrantUpdate {
        channel_a: u16,
        group_a: u16,
        channel_b: u16,
        group_b: u16,
    },
    UnitVoiceGrant {
        channel: u16,
        target: u32,
        source: u32,
    },
    GroupAffiliationResponse {
        group: u16,
        announcement_group: u16,
        target: u32,
    },
    RfssStatusBroadcast {
        lra: u8,
        system: u16,
        rfss: u8,
        site: u8,
        channel: u16,
        service_class: u8,
    },
    NetworkStatusBroadcast {
        lra: u8,
        wacn: u32,
        system: u16,
        channel: u16,
        service_class: u8,
    },
    AdjacentStatusBroadcast {
        lra: u8,
        system: u16,
        rfss: u8,
        site: u8,
        channel: u16,
        service_class: u8,
    },
    IdentifierUpdate {
        identifier: u8,
        bandwidth: u16,
        tx_offset: u16,
        channel_spacing: u16,
        base_frequency: u32,
    },
    /// Opcode without a dedicated decoder; the payload is still available
    /// through [`Tsbk::bits`].
    Other,
}

impl Tsbk {
    /// Build a typed TSBK from a trellis-decoded 98-bit payload.
    ///
    /// # Panics
    ///
    /// Panics if the payload is not 98 bits wide.
    pub fn from_payload(nac: u16, duid: Duid, bits: BitBuffer) -> Tsbk {
        assert_eq!(bits.size(), 98, "TSBK payload must be 98 bits");

        let opcode = bits.get_int(2..8) as u8;
        let kind = match opcode {
            Opcode::GROUP_VOICE_GRANT => TsbkKind::GroupVoiceGrant {
                service_options: bits.get_int(16..24) as u8,
                channel: bits.get_int(24..40) as u16,
                group: bits.get_int(40..56) as u16,
                source: bits.get_int(56..80) as u32,
            },
            Opcode::GROUP_VOICE_GRANT_UPDATE => TsbkKind::GroupVoiceGrantUpdate {
                channel_a: bits.get_int(16..32) as u16,
                group_a: bits.get_int(32..48) as u16,
                channel_b: bits.get_int(48..64) as u16,
                group_b: bits.get_int(64..80) as u16,
            },
            Opcode::UNIT_VOICE_GRANT => TsbkKind::UnitVoiceGrant {
                channel: bits.get_int(16..32) as u16,
                target: bits.get_int(32..56) as u32,
                source: bits.get_int(56..80) as u32,
            },
            Opcode::GROUP_AFFILIATION_RESPONSE => TsbkKind::GroupAffiliationResponse {
                announcement_group: bits.get_int(16..32) as u16,
                group: bits.get_int(32..48) as u16,
                target: bits.get_int(48..72) as u32,
            },
            Opcode::RFSS_STATUS_BROADCAST => TsbkKind::RfssStatusBroadcast {
                lra: bits.get_int(16..24) as u8,
                system: bits.get_int(28..40) as u16,
                rfss: bits.get_int(40..48) as u8,
                site: bits.get_int(48..56) as u8,
                channel: bits.get_int(56..72) as u16,
                service_class: bits.get_int(72..80) as u8,
            },
            Opcode::NETWORK_STATUS_BROADCAST => TsbkKind::NetworkStatusBroadcast {
                lra: bits.get_int(16..24) as u8,
                wacn: bits.get_int(24..44) as u32,
                system: bits.get_int(44..56) as u16,
                channel: bits.get_int(56..72) as u16,
                service_class: bits.get_int(72..80) as u8,
            },
            Opcode::ADJACENT_STATUS_BROADCAST => TsbkKind::AdjacentStatusBroadcast {
                lra: bits.get_int(16..24) as u8,
                system: bits.get_int(28..40) as u16,
                rfss: bits.get_int(40..48) as u8,
                site: bits.get_int(48..56) as u8,
                channel: bits.get_int(56..72) as u16,
                service_class: bits.get_int(72..80) as u8,
            },
            Opcode::IDENTIFIER_UPDATE => TsbkKind::IdentifierUpdate {
                identifier: bits.get_int(16..20) as u8,
                bandwidth: bits.get_int(20..29) as u16,
                tx_offset: bits.get_int(29..38) as u16,
                channel_spacing: bits.get_int(38..48) as u16,
                base_frequency: bits.get_int(48..80) as u32,
            },
            _ => TsbkKind::Other,
        };

        Tsbk {
            nac,
            duid,
            last_block: bits.get_bit(0),
            protected: bits.get_bit(1),
            opcode,
            mfid: bits.get_int(8..16) as u8,
            crc: bits.get_int(80..96) as u16,
            kind,
            bits,
        }
    }

    pub fn is_last_block(&self) -> bool {
        self.last_block
    }

    /// Whether the received CRC matches the payload. The framer never acts
    /// on this; it is for the consumer's validation pass.
    pub fn crc_ok(&self) -> bool {
        calculate_crc(&self.bits, 0..80) == self.crc
    }

    pub fn to_hex(&self) -> String {
        self.bits.to_hex()
    }
}
