//! Runtime behavior switches for the engine.

use num_derive::{FromPrimitive, ToPrimitive};

/// Pass-through routing policy for completed inbound messages.
///
/// System messages are never channel-scoped and are forwarded under every policy except
/// [`Off`](Self::Off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThruMode {
    /// No forwarding.
    Off,
    /// Forward every message.
    Full,
    /// Forward only channel messages matching the input channel.
    SameChannel,
    /// Forward only channel messages on other channels.
    DifferentChannel,
}

/// Behavior switches applied while decoding and encoding messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Configuration {
    /// Compress outbound channel messages by omitting repeated status bytes.
    ///
    /// Off by default: some hardware drops the first message after a cable reconnect when the
    /// status byte is elided.
    pub use_running_status: bool,
    /// Surface NoteOn messages carrying velocity 0 as NoteOff, the way most keyboards mean them.
    pub null_velocity_note_on_is_note_off: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            use_running_status: false,
            null_velocity_note_on_is_note_off: true,
        }
    }
}
