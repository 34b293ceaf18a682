//! Dibit ingest: sync detection, message assembly, dispatch.

use log::{debug, info};

use crate::bits::{BitBuffer, Dibit};
use crate::duid::Duid;
use crate::frames::{NID_DUID, NID_NAC, P25Message, RawFrame, Tsbk};
use crate::interleave;
use crate::sync::SyncDetector;
use crate::trellis::TrellisHalfRate;

/// The P25 Phase 1 frame sync word.
pub const P25_SYNC_PATTERN: u64 = 0x5575_F5FF_77FF;

/// Status symbols punctuate the stream every 35 symbols; relative to the
/// first post-sync bit they land at these buffer offsets. The schedule is a
/// physical-layer property, independent of the frame being assembled.
pub const DEFAULT_STATUS_SCHEDULE: [u16; 14] = [
    22, 92, 162, 232, 302, 372, 442, 512, 582, 652, 722, 792, 862, 932,
];

/// Boundaries of the trellis-coded block within a TSBK or PDU header frame:
/// the 196 coded bits directly follow the 64-bit NID.
const BLOCK_START: usize = 64;
const BLOCK_END: usize = 260;

/// First 98 bits of the decoded block region.
const TSBK_PAYLOAD_END: usize = 162;

/// PDU header: blocks-to-follow is the low 7 bits of header octet 6,
/// the pad block count the low 5 bits of octet 7.
const PDU_BLOCKS_TO_FOLLOW: std::ops::Range<usize> = 113..120;
const PDU_PAD_BLOCKS: std::ops::Range<usize> = 123..128;

/// Construction-time framer configuration.
#[derive(Debug, Clone)]
pub struct FramerConfig {
    /// 48-bit frame sync word to hunt for.
    pub sync_pattern: u64,
    /// Invert both bits of every dibit before matching and assembly.
    pub inverted: bool,
    /// Buffer offsets at which a status symbol is skipped.
    pub status_schedule: Vec<u16>,
    /// Number of pooled assemblers; clamped to at least one. Two lets a
    /// true sync be caught while a false trigger is still draining.
    pub assembler_pool_size: u8,
}

impl Default for FramerConfig {
    fn default() -> FramerConfig {
        FramerConfig {
            sync_pattern: P25_SYNC_PATTERN,
            inverted: false,
            status_schedule: DEFAULT_STATUS_SCHEDULE.to_vec(),
            assembler_pool_size: 2,
        }
    }
}

/// Downstream consumer of decoded messages.
pub trait MessageSink {
    fn on_message(&mut self, message: P25Message);
}

impl<F: FnMut(P25Message)> MessageSink for F {
    fn on_message(&mut self, message: P25Message) {
        self(message)
    }
}

/// One message assembly context.
///
/// Starts in the `Nid` state collecting the 64 bits after sync, then
/// re-targets its buffer according to the DUID field, skipping the status
/// symbols that the transmitter interleaves into the stream. TSBK and PDU
/// frames may extend themselves when an in-band field announces
/// continuation blocks.
#[derive(Debug)]
pub struct MessageAssembler {
    active: bool,
    complete: bool,
    duid: Duid,
    status_ix: usize,
    schedule: Vec<u16>,
    buffer: BitBuffer,
    trellis: TrellisHalfRate,
}

impl MessageAssembler {
    pub fn new(schedule: Vec<u16>) -> MessageAssembler {
        MessageAssembler {
            active: false,
            complete: false,
            duid: Duid::Nid,
            status_ix: 0,
            schedule,
            buffer: BitBuffer::new(Duid::Nid.bit_length()),
            trellis: TrellisHalfRate::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn duid(&self) -> Duid {
        self.duid
    }

    /// Current buffer write position, in bits.
    pub fn pos(&self) -> usize {
        self.buffer.pos()
    }

    /// Begin consuming dibits. Must only be called on a reset assembler.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Return to the construction state: inactive, NID-sized empty buffer,
    /// status schedule rewound. Keeps the existing allocation.
    pub fn reset(&mut self) {
        self.active = false;
        self.complete = false;
        self.duid = Duid::Nid;
        self.status_ix = 0;
        self.buffer.set_size(Duid::Nid.bit_length());
        self.buffer.clear(0..Duid::Nid.bit_length());
        self.buffer.set_pos(0);
    }

    /// Consume one dibit, possibly completing a message.
    pub fn receive(&mut self, dibit: Dibit) -> Option<P25Message> {
        if !self.active {
            return None;
        }

        // A status symbol displaces a payload dibit at each scheduled
        // offset; it is dropped, never appended.
        if self.status_ix < self.schedule.len()
            && self.buffer.pos() == self.schedule[self.status_ix] as usize
        {
            self.status_ix += 1;
            return None;
        }

        if self.buffer.add(dibit.bit1()).is_err() || self.buffer.add(dibit.bit2()).is_err() {
            // Cannot happen while check_complete keeps the buffer sized
            // ahead of the pointer; latch completion rather than lose sync
            // on the whole stream.
            self.complete = true;
            return None;
        }

        if self.buffer.is_full() {
            return self.check_complete();
        }
        None
    }

    /// The buffer just filled: emit, extend, or finish, per current DUID.
    fn check_complete(&mut self) -> Option<P25Message> {
        match self.duid {
            Duid::Nid => {
                let code = self.buffer.get_int(NID_DUID) as u8;
                match Duid::from_code(code) {
                    Some(duid) => {
                        debug!("NID resolved to {duid:?} ({} bits)", duid.bit_length());
                        self.set_duid(duid);
                        None
                    }
                    None => {
                        debug!("unrecognized DUID code {code:#x}");
                        self.complete = true;
                        Some(P25Message::from_raw(RawFrame::new(
                            Duid::Unknown,
                            self.buffer.clone(),
                        )))
                    }
                }
            }

            Duid::Hdu | Duid::Tdu | Duid::Tdulc | Duid::Ldu1 | Duid::Ldu2 => {
                self.complete = true;
                Some(P25Message::from_raw(RawFrame::new(
                    self.duid,
                    self.buffer.clone(),
                )))
            }

            Duid::Pdu1 => {
                let blocks = self.buffer.get_int(PDU_BLOCKS_TO_FOLLOW);
                let pad = self.buffer.get_int(PDU_PAD_BLOCKS);
                match blocks + pad {
                    24 | 32 => {
                        debug!("PDU continues as PDU2 ({blocks}+{pad} blocks)");
                        self.set_duid(Duid::Pdu2);
                        None
                    }
                    36 | 48 => {
                        debug!("PDU continues as PDU3 ({blocks}+{pad} blocks)");
                        self.set_duid(Duid::Pdu3);
                        None
                    }
                    _ => {
                        self.complete = true;
                        Some(P25Message::from_raw(RawFrame::new(
                            Duid::Pdu1,
                            self.buffer.clone(),
                        )))
                    }
                }
            }

            Duid::Pdu2 | Duid::Pdu3 => {
                self.complete = true;
                Some(P25Message::from_raw(RawFrame::new(
                    self.duid,
                    self.buffer.clone(),
                )))
            }

            Duid::Tsbk1 | Duid::Tsbk2 | Duid::Tsbk3 => {
                interleave::deinterleave(&mut self.buffer, BLOCK_START, BLOCK_END);
                self.trellis.decode(&mut self.buffer, BLOCK_START, BLOCK_END);

                let nac = self.buffer.get_int(NID_NAC) as u16;
                let payload = self.buffer.get(BLOCK_START..TSBK_PAYLOAD_END);
                let tsbk = Tsbk::from_payload(nac, self.duid, payload);

                match self.duid.next_tsbk() {
                    Some(next) if !tsbk.is_last_block() => {
                        debug!("TSBK continues as {next:?}");
                        self.set_duid(next);
                        self.buffer.set_pos(BLOCK_START);
                    }
                    _ => self.complete = true,
                }
                Some(P25Message::Tsbk(tsbk))
            }

            Duid::Unknown => {
                self.complete = true;
                Some(P25Message::from_raw(RawFrame::new(
                    Duid::Unknown,
                    self.buffer.clone(),
                )))
            }
        }
    }

    /// Switch the expected data unit, resizing the buffer to its canonical
    /// length. Already-written bits and the write pointer are preserved.
    fn set_duid(&mut self, duid: Duid) {
        self.duid = duid;
        self.buffer.set_size(duid.bit_length());
    }
}

/// The P25 framer: hunts for frame sync in a dibit stream and drives a pool
/// of assemblers, pushing completed messages to the registered listener.
///
/// Single ingest context only; `receive` is not reentrant.
pub struct Framer {
    sync: SyncDetector,
    inverted: bool,
    assemblers: Vec<MessageAssembler>,
    sink: Option<Box<dyn MessageSink>>,
    dispatched: u64,
    dropped_syncs: u64,
}

impl Framer {
    pub fn new(config: FramerConfig) -> Framer {
        let pool = config.assembler_pool_size.max(1) as usize;
        Framer {
            sync: SyncDetector::new(config.sync_pattern),
            inverted: config.inverted,
            assemblers: (0..pool)
                .map(|_| MessageAssembler::new(config.status_schedule.clone()))
                .collect(),
            sink: None,
            dispatched: 0,
            dropped_syncs: 0,
        }
    }

    /// Feed one received C4FM symbol.
    pub fn receive(&mut self, dibit: Dibit) {
        let dibit = if self.inverted { dibit.invert() } else { dibit };

        self.sync.receive(dibit.bit1());
        self.sync.receive(dibit.bit2());

        let mut emitted = Vec::new();
        for assembler in &mut self.assemblers {
            if !assembler.is_active() {
                continue;
            }
            if let Some(message) = assembler.receive(dibit) {
                emitted.push(message);
            }
            if assembler.is_complete() {
                assembler.reset();
            }
        }
        for message in emitted {
            self.dispatch(message);
        }

        if self.sync.matches() {
            match self.assemblers.iter_mut().find(|a| !a.is_active()) {
                Some(assembler) => assembler.activate(),
                None => {
                    self.dropped_syncs += 1;
                    debug!("sync matched but no assembler available, trigger dropped");
                }
            }
        }
    }

    /// Push a message to the listener, if one is registered.
    pub fn dispatch(&mut self, message: P25Message) {
        self.dispatched += 1;
        if let Some(sink) = self.sink.as_mut() {
            sink.on_message(message);
        }
    }

    pub fn set_listener(&mut self, sink: Box<dyn MessageSink>) {
        self.sink = Some(sink);
    }

    pub fn clear_listener(&mut self) {
        self.sink = None;
    }

    /// Detach the listener and discard all assembly state. The framer must
    /// not be fed afterwards.
    pub fn dispose(&mut self) {
        self.sink = None;
        self.assemblers.clear();
        self.sync.reset();
    }

    /// Sync triggers dropped because every assembler was busy.
    pub fn dropped_syncs(&self) -> u64 {
        self.dropped_syncs
    }

    /// Messages dispatched so far, whether or not a listener was attached.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Assembly contexts, for inspection.
    pub fn assemblers(&self) -> &[MessageAssembler] {
        &self.assemblers
    }
}

impl Drop for Framer {
    fn drop(&mut self) {
        info!(
            "P25 framer: {} messages dispatched, {} sync triggers dropped",
            self.dispatched, self.dropped_syncs
        );
    }
}
