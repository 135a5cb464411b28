//! Optional per-message-type handler slots, invoked synchronously on completed messages.

use crate::message::{Channel, Message, MidiType, PITCH_BEND_MIN};

/// A set of optional handler slots, one per message type.
///
/// Slots left `None` are silently ignored. Handlers run synchronously, exactly once per completed
/// message, in the same context that called `read`. Keep them short if that context is
/// interrupt-adjacent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Callbacks {
    /// Note Off, which also receives NoteOn-with-zero-velocity when that rule is enabled:
    /// (channel, note, velocity).
    pub note_off: Option<fn(Channel, u8, u8)>,
    /// Note On: (channel, note, velocity).
    pub note_on: Option<fn(Channel, u8, u8)>,
    /// Polyphonic key pressure: (channel, note, pressure).
    pub after_touch_poly: Option<fn(Channel, u8, u8)>,
    /// Control change: (channel, controller number, value).
    pub control_change: Option<fn(Channel, u8, u8)>,
    /// Program change: (channel, program number).
    pub program_change: Option<fn(Channel, u8)>,
    /// Channel pressure: (channel, pressure).
    pub after_touch_channel: Option<fn(Channel, u8)>,
    /// Pitch bend, rebased to −8192..=8191: (channel, bend).
    pub pitch_bend: Option<fn(Channel, i16)>,
    /// System Exclusive payload, frame bytes stripped.
    pub system_exclusive: Option<fn(&[u8])>,
    /// Time code quarter frame data byte.
    pub time_code_quarter_frame: Option<fn(u8)>,
    /// Song position in MIDI beats.
    pub song_position: Option<fn(u16)>,
    /// Song select: song number.
    pub song_select: Option<fn(u8)>,
    /// Tune request.
    pub tune_request: Option<fn()>,
    /// Timing clock.
    pub clock: Option<fn()>,
    /// Sequence start.
    pub start: Option<fn()>,
    /// Sequence continue.
    pub resume: Option<fn()>,
    /// Sequence stop.
    pub stop: Option<fn()>,
    /// Active sensing keep-alive.
    pub active_sensing: Option<fn()>,
    /// System reset.
    pub system_reset: Option<fn()>,
}

impl Callbacks {
    /// Invokes the slot matching the message type, when one is set.
    pub fn dispatch<const SYSEX_MAX: usize>(&self, message: &Message<SYSEX_MAX>) {
        match message.kind {
            MidiType::NoteOff => {
                if let Some(handler) = self.note_off {
                    handler(message.channel, message.data1, message.data2);
                }
            }
            MidiType::NoteOn => {
                if let Some(handler) = self.note_on {
                    handler(message.channel, message.data1, message.data2);
                }
            }
            MidiType::AfterTouchPoly => {
                if let Some(handler) = self.after_touch_poly {
                    handler(message.channel, message.data1, message.data2);
                }
            }
            MidiType::ControlChange => {
                if let Some(handler) = self.control_change {
                    handler(message.channel, message.data1, message.data2);
                }
            }
            MidiType::ProgramChange => {
                if let Some(handler) = self.program_change {
                    handler(message.channel, message.data1);
                }
            }
            MidiType::AfterTouchChannel => {
                if let Some(handler) = self.after_touch_channel {
                    handler(message.channel, message.data1);
                }
            }
            MidiType::PitchBend => {
                if let Some(handler) = self.pitch_bend {
                    let raw = i16::from(message.data1 & 0x7F) | i16::from(message.data2 & 0x7F) << 7;
                    handler(message.channel, raw + PITCH_BEND_MIN);
                }
            }
            MidiType::SystemExclusive => {
                if let Some(handler) = self.system_exclusive {
                    handler(message.sysex_bytes());
                }
            }
            MidiType::TimeCodeQuarterFrame => {
                if let Some(handler) = self.time_code_quarter_frame {
                    handler(message.data1);
                }
            }
            MidiType::SongPosition => {
                if let Some(handler) = self.song_position {
                    handler(u16::from(message.data2) << 7 | u16::from(message.data1));
                }
            }
            MidiType::SongSelect => {
                if let Some(handler) = self.song_select {
                    handler(message.data1);
                }
            }
            MidiType::TuneRequest => {
                if let Some(handler) = self.tune_request {
                    handler();
                }
            }
            MidiType::Clock => {
                if let Some(handler) = self.clock {
                    handler();
                }
            }
            MidiType::Start => {
                if let Some(handler) = self.start {
                    handler();
                }
            }
            MidiType::Continue => {
                if let Some(handler) = self.resume {
                    handler();
                }
            }
            MidiType::Stop => {
                if let Some(handler) = self.stop {
                    handler();
                }
            }
            MidiType::ActiveSensing => {
                if let Some(handler) = self.active_sensing {
                    handler();
                }
            }
            MidiType::SystemReset => {
                if let Some(handler) = self.system_reset {
                    handler();
                }
            }
            MidiType::InvalidType => {}
        }
    }
}
