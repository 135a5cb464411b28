//! The decoded message record and the closed set of MIDI message types.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;
use num_traits::ToPrimitive as _;

/// A MIDI channel. Meaningful values are 1..=16; [`CHANNEL_OMNI`] and [`CHANNEL_OFF`] are reserved
/// input-filter selectors.
pub type Channel = u8;

/// Input-channel wildcard: listen on all 16 channels.
pub const CHANNEL_OMNI: Channel = 0;

/// Input-channel sentinel that disables message reception entirely.
pub const CHANNEL_OFF: Channel = 17;

/// Default capacity of the [`Message`] System Exclusive payload buffer.
pub const DEFAULT_SYSEX_MAX: usize = 128;

/// Lowest value of a pitch-bend message; the raw 14-bit wire value is rebased by this offset so
/// that 0 means center.
pub const PITCH_BEND_MIN: i16 = -8192;

/// Highest value of a pitch-bend message.
pub const PITCH_BEND_MAX: i16 = 8191;

/// The type of a MIDI message, tagged with its wire status value.
///
/// Channel voice types carry the channel in the status byte's low nibble on the wire; the
/// discriminants here hold the high nibble only (the channel 1 form).
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MidiType {
    /// Sentinel for bytes that do not form a valid message.
    InvalidType = 0x00,
    /// Note released.
    NoteOff = 0x80,
    /// Note pressed.
    NoteOn = 0x90,
    /// Polyphonic key pressure.
    AfterTouchPoly = 0xA0,
    /// Controller value change.
    ControlChange = 0xB0,
    /// Patch selection.
    ProgramChange = 0xC0,
    /// Channel-wide key pressure.
    AfterTouchChannel = 0xD0,
    /// 14-bit pitch wheel position.
    PitchBend = 0xE0,
    /// Variable-length vendor-defined block.
    SystemExclusive = 0xF0,
    /// Time code quarter frame.
    TimeCodeQuarterFrame = 0xF1,
    /// Song position pointer in MIDI beats.
    SongPosition = 0xF2,
    /// Song selection.
    SongSelect = 0xF3,
    /// Request for analog oscillator tuning.
    TuneRequest = 0xF6,
    /// Timing clock, 24 per quarter note.
    Clock = 0xF8,
    /// Start the sequence.
    Start = 0xFA,
    /// Resume a stopped sequence.
    Continue = 0xFB,
    /// Stop the sequence.
    Stop = 0xFC,
    /// Keep-alive; expected every 300 ms once seen.
    ActiveSensing = 0xFE,
    /// Reset the receiver to power-up state.
    SystemReset = 0xFF,
}

impl MidiType {
    /// Extracts the message type encoded in a status byte.
    ///
    /// Data bytes (high bit clear) and the undefined status bytes 0xF4, 0xF5, 0xF9 and 0xFD map
    /// to [`InvalidType`](Self::InvalidType).
    pub fn from_status_byte(status: u8) -> Self {
        if status < 0x80 || status == 0xF4 || status == 0xF5 || status == 0xF9 || status == 0xFD {
            return Self::InvalidType;
        }
        let normalized = if status < 0xF0 { status & 0xF0 } else { status };
        Self::from_u8(normalized).unwrap_or(Self::InvalidType)
    }

    /// Returns `true` for the channel voice types (note, pressure, control, program, pitch bend).
    pub fn is_channel_message(self) -> bool {
        matches!(
            self,
            Self::NoteOff
                | Self::NoteOn
                | Self::AfterTouchPoly
                | Self::ControlChange
                | Self::ProgramChange
                | Self::AfterTouchChannel
                | Self::PitchBend
        )
    }

    /// Returns `true` for the single-byte System Real Time types.
    pub fn is_real_time(self) -> bool {
        matches!(
            self,
            Self::Clock
                | Self::Start
                | Self::Continue
                | Self::Stop
                | Self::ActiveSensing
                | Self::SystemReset
        )
    }
}

/// Extracts the channel (1..=16) from a channel-voice status byte.
pub fn channel_from_status_byte(status: u8) -> Channel {
    (status & 0x0F) + 1
}

/// Composes a channel-voice status byte from a type and a channel.
pub fn status_byte(kind: MidiType, channel: Channel) -> u8 {
    kind.to_u8().unwrap_or(0) | (channel.wrapping_sub(1) & 0x0F)
}

/// The decoded record of one complete MIDI message.
///
/// [`MidiInterface`](crate::interface::MidiInterface) retains a single instance and overwrites it
/// in place on every successful read; consume a message before the next read call mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<const SYSEX_MAX: usize = DEFAULT_SYSEX_MAX> {
    /// Channel the message is scoped to, 1..=16, or 0 for system messages.
    pub channel: Channel,
    /// The decoded message type.
    pub kind: MidiType,
    /// First data byte, 0..=127. For System Exclusive, the low byte of the payload length.
    pub data1: u8,
    /// Second data byte, 0..=127 (0 for two-byte messages). For System Exclusive, the high byte
    /// of the payload length.
    pub data2: u8,
    /// System Exclusive payload with the frame bytes stripped. Only the first
    /// [`sysex_size()`](Self::sysex_size) bytes are meaningful.
    pub sysex: [u8; SYSEX_MAX],
    /// Whether the byte sequence that produced this message conformed to protocol framing.
    /// Channel matching is not part of validity.
    pub valid: bool,
}

impl<const SYSEX_MAX: usize> Message<SYSEX_MAX> {
    /// An invalid, empty message.
    pub fn invalid() -> Self {
        Self {
            channel: 0,
            kind: MidiType::InvalidType,
            data1: 0,
            data2: 0,
            sysex: [0; SYSEX_MAX],
            valid: false,
        }
    }

    /// A complete one-byte system message (real time, or a tune request).
    pub fn one_byte(kind: MidiType) -> Self {
        Self {
            kind,
            valid: true,
            ..Self::invalid()
        }
    }

    /// Logical length of the System Exclusive payload.
    ///
    /// The length travels split across `data1` (low byte) and `data2` (high byte) and may exceed
    /// the buffer capacity when the incoming payload was truncated; the result is capped at
    /// `SYSEX_MAX` so it always indexes into [`sysex`](Self::sysex). A result equal to the
    /// capacity may therefore indicate truncation.
    pub fn sysex_size(&self) -> usize {
        let size = usize::from(self.data2) << 8 | usize::from(self.data1);
        size.min(SYSEX_MAX)
    }

    /// The meaningful prefix of the System Exclusive payload.
    pub fn sysex_bytes(&self) -> &[u8] {
        &self.sysex[..self.sysex_size()]
    }
}

impl<const SYSEX_MAX: usize> Default for Message<SYSEX_MAX> {
    fn default() -> Self {
        Self::invalid()
    }
}

#[cfg(feature = "defmt")]
impl<const SYSEX_MAX: usize> defmt::Format for Message<SYSEX_MAX> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Message {{ kind: {}, channel: {}, data1: {}, data2: {}, sysex: {}, valid: {} }}",
            self.kind,
            self.channel,
            self.data1,
            self.data2,
            self.sysex_bytes(),
            self.valid
        );
    }
}
