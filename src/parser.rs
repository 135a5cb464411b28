//! The inbound state machine reassembling a raw byte stream into typed messages.
//!
//! Bytes are fed one at a time with [`Parser::advance`]. The machine keeps running-status state
//! across calls, accumulates System Exclusive bodies up to a fixed capacity, and treats System
//! Real Time bytes as a side channel that never perturbs an in-progress message.

use crate::message::{DEFAULT_SYSEX_MAX, Message, MidiType, channel_from_status_byte};
use tinyvec::ArrayVec;

const NO_RUNNING_STATUS: u8 = 0;

/// Accumulation state between bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing pending.
    Idle,
    /// A status byte arrived; `expected - 1` data bytes complete the message.
    Pending {
        status: u8,
        expected: u8,
        data: [u8; 2],
        have: u8,
    },
    /// Inside a System Exclusive frame.
    SystemExclusive,
}

/// Total on-wire length (status plus data) of a fixed-length message type.
fn expected_length(kind: MidiType) -> u8 {
    match kind {
        MidiType::ProgramChange
        | MidiType::AfterTouchChannel
        | MidiType::TimeCodeQuarterFrame
        | MidiType::SongSelect => 2,
        _ => 3,
    }
}

/// The inbound parser state machine.
///
/// [`advance()`](Self::advance) consumes one byte per call and returns a completed, framing-valid
/// [`Message`] exactly when its final byte arrives. Bytes that cannot be classified under the
/// current state are silently discarded; there is no error channel.
#[derive(Debug, Clone)]
pub struct Parser<const SYSEX_MAX: usize = DEFAULT_SYSEX_MAX> {
    state: State,
    running_status: u8,
    sysex: ArrayVec<[u8; SYSEX_MAX]>,
    /// Body bytes seen in the current frame, including any dropped past capacity.
    sysex_len: u16,
}

impl<const SYSEX_MAX: usize> Parser<SYSEX_MAX> {
    /// Creates an idle parser.
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            running_status: NO_RUNNING_STATUS,
            sysex: ArrayVec::new(),
            sysex_len: 0,
        }
    }

    /// Abandons any accumulation state and clears running status.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.running_status = NO_RUNNING_STATUS;
        self.sysex.clear();
        self.sysex_len = 0;
    }

    /// Consumes one byte; returns a message exactly when this byte completes one.
    pub fn advance(&mut self, byte: u8) -> Option<Message<SYSEX_MAX>> {
        // System Real Time is handled out of band: it may interleave with the
        // data bytes of another message and must leave the accumulation state
        // and running status untouched.
        if byte >= 0xF8 {
            return match MidiType::from_status_byte(byte) {
                MidiType::InvalidType => None,
                kind => Some(Message::one_byte(kind)),
            };
        }
        match self.state {
            State::Idle => self.advance_idle(byte),
            State::Pending { .. } => self.advance_pending(byte),
            State::SystemExclusive => self.advance_sysex(byte),
        }
    }

    fn advance_idle(&mut self, byte: u8) -> Option<Message<SYSEX_MAX>> {
        if byte < 0x80 {
            // A data byte with no explicit status is an implicit repeat of the
            // running status, when one is armed.
            if MidiType::from_status_byte(self.running_status).is_channel_message() {
                let status = self.running_status;
                let expected = expected_length(MidiType::from_status_byte(status));
                self.state = State::Pending {
                    status,
                    expected,
                    data: [0; 2],
                    have: 0,
                };
                return self.advance_pending(byte);
            }
            #[cfg(feature = "defmt")]
            defmt::trace!("dropping stray data byte {=u8:x}", byte);
            return None;
        }
        let kind = MidiType::from_status_byte(byte);
        match kind {
            MidiType::InvalidType => {
                // Undefined status bytes, and End of Exclusive with no open
                // frame, land here.
                #[cfg(feature = "defmt")]
                defmt::trace!("discarding unclassifiable status byte {=u8:x}", byte);
                self.reset();
                None
            }
            MidiType::TuneRequest => Some(Message::one_byte(kind)),
            MidiType::SystemExclusive => {
                self.running_status = NO_RUNNING_STATUS;
                self.sysex.clear();
                self.sysex_len = 0;
                self.state = State::SystemExclusive;
                None
            }
            _ => {
                self.state = State::Pending {
                    status: byte,
                    expected: expected_length(kind),
                    data: [0; 2],
                    have: 0,
                };
                None
            }
        }
    }

    fn advance_pending(&mut self, byte: u8) -> Option<Message<SYSEX_MAX>> {
        if byte >= 0x80 {
            // A new status byte abandons the partial message.
            self.state = State::Idle;
            return self.advance_idle(byte);
        }
        let State::Pending {
            status,
            expected,
            mut data,
            have,
        } = self.state
        else {
            return None;
        };
        data[usize::from(have)] = byte;
        let have = have + 1;
        if have + 1 < expected {
            self.state = State::Pending {
                status,
                expected,
                data,
                have,
            };
            return None;
        }

        // Final data byte: the message is complete. Channel types arm running
        // status; system common clears it.
        self.state = State::Idle;
        let kind = MidiType::from_status_byte(status);
        if kind.is_channel_message() {
            self.running_status = status;
        } else {
            self.running_status = NO_RUNNING_STATUS;
        }
        Some(Message {
            channel: if kind.is_channel_message() {
                channel_from_status_byte(status)
            } else {
                0
            },
            kind,
            data1: data[0],
            data2: if expected == 3 { data[1] } else { 0 },
            valid: true,
            ..Message::invalid()
        })
    }

    fn advance_sysex(&mut self, byte: u8) -> Option<Message<SYSEX_MAX>> {
        if byte < 0x80 {
            // Body byte: stored while room remains, always counted so the
            // consumer can detect truncation.
            let _ = self.sysex.try_push(byte);
            self.sysex_len = self.sysex_len.saturating_add(1);
            return None;
        }
        let message = self.finish_sysex();
        if byte != 0xF7 {
            // Any other status byte both terminates the frame and opens its
            // own message.
            let _ = self.advance_idle(byte);
        }
        Some(message)
    }

    fn finish_sysex(&mut self) -> Message<SYSEX_MAX> {
        let mut message = Message::invalid();
        message.kind = MidiType::SystemExclusive;
        message.data1 = (self.sysex_len & 0xFF) as u8;
        message.data2 = (self.sysex_len >> 8) as u8;
        message.sysex[..self.sysex.len()].copy_from_slice(&self.sysex);
        message.valid = true;
        self.sysex.clear();
        self.sysex_len = 0;
        self.state = State::Idle;
        message
    }
}

impl<const SYSEX_MAX: usize> Default for Parser<SYSEX_MAX> {
    fn default() -> Self {
        Self::new()
    }
}
