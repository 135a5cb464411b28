use crate::callbacks::Callbacks;
use crate::configuration::{Configuration, ThruMode};
use crate::message::{
    CHANNEL_OFF, CHANNEL_OMNI, Channel, DEFAULT_SYSEX_MAX, Message, MidiType, PITCH_BEND_MIN,
    status_byte,
};
use crate::parameter::ParameterSession;
use crate::parser::Parser;
use crate::transport::{MIDI_BAUD_RATE, Transport};
use num_traits::ToPrimitive as _;

/// Control-change numbers reserved for the 14-bit parameter-negotiation scheme.
pub mod control {
    /// Data Entry MSB.
    pub const DATA_ENTRY_MSB: u8 = 6;
    /// Data Entry LSB.
    pub const DATA_ENTRY_LSB: u8 = 38;
    /// Data Increment.
    pub const DATA_INCREMENT: u8 = 96;
    /// Data Decrement.
    pub const DATA_DECREMENT: u8 = 97;
    /// Non-Registered Parameter Number LSB.
    pub const NRPN_LSB: u8 = 98;
    /// Non-Registered Parameter Number MSB.
    pub const NRPN_MSB: u8 = 99;
    /// Registered Parameter Number LSB.
    pub const RPN_LSB: u8 = 100;
    /// Registered Parameter Number MSB.
    pub const RPN_MSB: u8 = 101;
}

const NO_RUNNING_STATUS: u8 = 0;

/// The engine tying a [`Transport`] to the codec layers.
///
/// Generic over the transport and the System Exclusive buffer capacity. All state is fixed-size
/// and owned; the engine is single-threaded, synchronous and never allocates. One [`Message`] is
/// retained and overwritten in place on every successful read.
pub struct MidiInterface<T: Transport, const SYSEX_MAX: usize = DEFAULT_SYSEX_MAX> {
    transport: T,
    parser: Parser<SYSEX_MAX>,
    message: Message<SYSEX_MAX>,
    input_channel: Channel,
    running_status_tx: u8,
    thru_mode: ThruMode,
    rpn: ParameterSession,
    nrpn: ParameterSession,
    /// Behavior switches. Adjust before [`begin()`](Self::begin).
    pub configuration: Configuration,
    /// Inbound message handler slots.
    pub callbacks: Callbacks,
}

impl<T: Transport, const SYSEX_MAX: usize> MidiInterface<T, SYSEX_MAX> {
    /// Wraps a transport. Call [`begin()`](Self::begin) before use.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            parser: Parser::new(),
            message: Message::invalid(),
            input_channel: CHANNEL_OMNI,
            running_status_tx: NO_RUNNING_STATUS,
            thru_mode: ThruMode::Off,
            rpn: ParameterSession::new(),
            nrpn: ParameterSession::new(),
            configuration: Configuration::default(),
            callbacks: Callbacks::default(),
        }
    }

    /// Opens the transport at the MIDI baud rate and arms reception on `channel`.
    ///
    /// Pass-through starts in [`ThruMode::Full`], mirroring a hardware thru jack.
    pub fn begin(&mut self, channel: Channel) {
        self.transport.begin(MIDI_BAUD_RATE);
        self.input_channel = channel;
        self.running_status_tx = NO_RUNNING_STATUS;
        self.parser.reset();
        self.message = Message::invalid();
        self.rpn.reset();
        self.nrpn.reset();
        self.thru_mode = ThruMode::Full;
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // -------------------------------------------------------------------
    // Input

    /// The channel reception is bound to ([`CHANNEL_OMNI`] listens to all).
    pub fn input_channel(&self) -> Channel {
        self.input_channel
    }

    /// Rebinds reception to `channel`.
    pub fn set_input_channel(&mut self, channel: Channel) {
        self.input_channel = channel;
    }

    /// The last completed message. Overwritten by every successful read.
    pub fn message(&self) -> &Message<SYSEX_MAX> {
        &self.message
    }

    /// Polls the transport for one byte and reports whether a message bound for the configured
    /// input channel completed.
    pub fn read(&mut self) -> bool {
        self.read_channel(self.input_channel)
    }

    /// [`read()`](Self::read) against an explicit channel filter.
    ///
    /// A completed message that fails the filter still overwrites the retained [`Message`] but is
    /// neither dispatched to callbacks nor forwarded.
    pub fn read_channel(&mut self, channel: Channel) -> bool {
        if channel >= CHANNEL_OFF {
            return false; // reception disabled
        }
        if self.transport.available() == 0 {
            return false;
        }
        let byte = self.transport.read();
        let Some(mut message) = self.parser.advance(byte) else {
            return false;
        };
        if self.configuration.null_velocity_note_on_is_note_off
            && message.kind == MidiType::NoteOn
            && message.data2 == 0
        {
            message.kind = MidiType::NoteOff;
        }
        self.message = message;
        let channel_match = self.accept(channel);
        if channel_match {
            self.callbacks.dispatch(&self.message);
        }
        // Thru runs on every completed message, matched or not: the
        // DifferentChannel policy forwards exactly the ones the filter drops.
        self.thru_filter(channel);
        channel_match
    }

    /// Channel input filter: system messages always pass; channel messages must match unless
    /// listening on [`CHANNEL_OMNI`].
    fn accept(&self, channel: Channel) -> bool {
        if !self.message.valid {
            return false;
        }
        if channel == CHANNEL_OMNI {
            return true;
        }
        if self.message.kind.is_channel_message() {
            return self.message.channel == channel;
        }
        true
    }

    // -------------------------------------------------------------------
    // Output

    /// Sends a channel message, masking the data bytes to 7 bits.
    ///
    /// Real-time types are routed to [`send_real_time()`](Self::send_real_time). An out-of-range
    /// channel, or a type that is neither channel-scoped nor real-time, is silently ignored.
    pub fn send(&mut self, kind: MidiType, data1: u8, data2: u8, channel: Channel) {
        if channel == CHANNEL_OMNI || channel >= CHANNEL_OFF || kind == MidiType::InvalidType {
            return;
        }
        if !kind.is_channel_message() {
            self.send_real_time(kind); // only real-time kinds produce output
            return;
        }
        let status = status_byte(kind, channel);
        if self.configuration.use_running_status {
            if self.running_status_tx != status {
                self.running_status_tx = status;
                self.transport.write(status);
            }
        } else {
            self.transport.write(status);
        }
        self.transport.write(data1 & 0x7F);
        if !matches!(kind, MidiType::ProgramChange | MidiType::AfterTouchChannel) {
            self.transport.write(data2 & 0x7F);
        }
    }

    /// Sends a Note On.
    pub fn send_note_on(&mut self, note: u8, velocity: u8, channel: Channel) {
        self.send(MidiType::NoteOn, note, velocity, channel);
    }

    /// Sends a Note Off.
    pub fn send_note_off(&mut self, note: u8, velocity: u8, channel: Channel) {
        self.send(MidiType::NoteOff, note, velocity, channel);
    }

    /// Sends a program change.
    pub fn send_program_change(&mut self, program: u8, channel: Channel) {
        self.send(MidiType::ProgramChange, program, 0, channel);
    }

    /// Sends a control change.
    pub fn send_control_change(&mut self, number: u8, value: u8, channel: Channel) {
        self.send(MidiType::ControlChange, number, value, channel);
    }

    /// Sends a channel-wide aftertouch pressure.
    pub fn send_after_touch(&mut self, pressure: u8, channel: Channel) {
        self.send(MidiType::AfterTouchChannel, pressure, 0, channel);
    }

    /// Sends a polyphonic aftertouch pressure for one note.
    pub fn send_after_touch_poly(&mut self, note: u8, pressure: u8, channel: Channel) {
        self.send(MidiType::AfterTouchPoly, note, pressure, channel);
    }

    /// Sends a pitch bend, `bend` in −8192..=8191 (0 = center).
    pub fn send_pitch_bend(&mut self, bend: i16, channel: Channel) {
        let value = (i32::from(bend) - i32::from(PITCH_BEND_MIN)) as u16;
        self.send(
            MidiType::PitchBend,
            (value & 0x7F) as u8,
            ((value >> 7) & 0x7F) as u8,
            channel,
        );
    }

    /// Sends a System Exclusive frame.
    ///
    /// When `contains_boundaries` is false the 0xF0/0xF7 frame bytes are written around `data`;
    /// pass true when `data` already carries them. Payload bytes must be 7-bit clean; pack
    /// arbitrary data with [`sysex::encode`](crate::sysex::encode) first.
    pub fn send_sys_ex(&mut self, data: &[u8], contains_boundaries: bool) {
        if !contains_boundaries {
            self.transport.write(0xF0);
        }
        for &byte in data {
            self.transport.write(byte);
        }
        if !contains_boundaries {
            self.transport.write(0xF7);
        }
        if self.configuration.use_running_status {
            self.running_status_tx = NO_RUNNING_STATUS;
        }
    }

    /// Sends a time code quarter frame composed from its nibbles.
    pub fn send_time_code_quarter_frame(&mut self, type_nibble: u8, values_nibble: u8) {
        self.send_time_code_quarter_frame_raw((type_nibble & 0x07) << 4 | (values_nibble & 0x0F));
    }

    /// Sends a raw time code quarter frame data byte.
    pub fn send_time_code_quarter_frame_raw(&mut self, data: u8) {
        self.write_system_common(&[0xF1, data & 0x7F]);
    }

    /// Sends a song position pointer in MIDI beats.
    pub fn send_song_position(&mut self, beats: u16) {
        self.write_system_common(&[0xF2, (beats & 0x7F) as u8, ((beats >> 7) & 0x7F) as u8]);
    }

    /// Sends a song select.
    pub fn send_song_select(&mut self, song: u8) {
        self.write_system_common(&[0xF3, song & 0x7F]);
    }

    /// Sends a tune request.
    pub fn send_tune_request(&mut self) {
        self.write_system_common(&[0xF6]);
    }

    /// Sends a single-byte System Real Time message; other types are ignored.
    ///
    /// Real time is transparent to outbound running status.
    pub fn send_real_time(&mut self, kind: MidiType) {
        if kind.is_real_time()
            && let Some(status) = kind.to_u8()
        {
            self.transport.write(status);
        }
    }

    fn write_system_common(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.transport.write(byte);
        }
        if self.configuration.use_running_status {
            self.running_status_tx = NO_RUNNING_STATUS;
        }
    }

    // -------------------------------------------------------------------
    // 14-bit parameter negotiation

    /// Opens registered parameter `number` for editing on `channel`.
    ///
    /// Emits the two parameter-select control changes, number LSB first, then MSB. Selecting the
    /// already-open number sends nothing.
    pub fn begin_rpn(&mut self, number: u16, channel: Channel) {
        if !self.rpn.begin(number) {
            return;
        }
        self.send_control_change(control::RPN_LSB, (number & 0x7F) as u8, channel);
        self.send_control_change(control::RPN_MSB, ((number >> 7) & 0x7F) as u8, channel);
    }

    /// Sends a full 14-bit value for the open registered parameter: data entry MSB first, then
    /// LSB.
    pub fn send_rpn_value(&mut self, value: u16, channel: Channel) {
        self.rpn.set_value(value);
        self.send_control_change(control::DATA_ENTRY_MSB, ((value >> 7) & 0x7F) as u8, channel);
        self.send_control_change(control::DATA_ENTRY_LSB, (value & 0x7F) as u8, channel);
    }

    /// Sends a registered-parameter value from its pre-split halves.
    pub fn send_rpn_value_split(&mut self, msb: u8, lsb: u8, channel: Channel) {
        self.rpn
            .set_value(u16::from(msb & 0x7F) << 7 | u16::from(lsb & 0x7F));
        self.send_control_change(control::DATA_ENTRY_MSB, msb, channel);
        self.send_control_change(control::DATA_ENTRY_LSB, lsb, channel);
    }

    /// Nudges the open registered parameter up by `amount`.
    pub fn send_rpn_increment(&mut self, amount: u8, channel: Channel) {
        self.rpn.increment(amount);
        self.send_control_change(control::DATA_INCREMENT, amount, channel);
    }

    /// Nudges the open registered parameter down by `amount`.
    pub fn send_rpn_decrement(&mut self, amount: u8, channel: Channel) {
        self.rpn.decrement(amount);
        self.send_control_change(control::DATA_DECREMENT, amount, channel);
    }

    /// Closes the open registered parameter with the two null-function selects.
    pub fn end_rpn(&mut self, channel: Channel) {
        self.send_control_change(control::RPN_LSB, 0x7F, channel);
        self.send_control_change(control::RPN_MSB, 0x7F, channel);
        self.rpn.end();
    }

    /// Opens non-registered parameter `number` for editing on `channel`.
    ///
    /// Emits the two parameter-select control changes, number LSB first, then MSB. Selecting the
    /// already-open number sends nothing.
    pub fn begin_nrpn(&mut self, number: u16, channel: Channel) {
        if !self.nrpn.begin(number) {
            return;
        }
        self.send_control_change(control::NRPN_LSB, (number & 0x7F) as u8, channel);
        self.send_control_change(control::NRPN_MSB, ((number >> 7) & 0x7F) as u8, channel);
    }

    /// Sends a full 14-bit value for the open non-registered parameter: data entry MSB first,
    /// then LSB.
    pub fn send_nrpn_value(&mut self, value: u16, channel: Channel) {
        self.nrpn.set_value(value);
        self.send_control_change(control::DATA_ENTRY_MSB, ((value >> 7) & 0x7F) as u8, channel);
        self.send_control_change(control::DATA_ENTRY_LSB, (value & 0x7F) as u8, channel);
    }

    /// Sends a non-registered-parameter value from its pre-split halves.
    pub fn send_nrpn_value_split(&mut self, msb: u8, lsb: u8, channel: Channel) {
        self.nrpn
            .set_value(u16::from(msb & 0x7F) << 7 | u16::from(lsb & 0x7F));
        self.send_control_change(control::DATA_ENTRY_MSB, msb, channel);
        self.send_control_change(control::DATA_ENTRY_LSB, lsb, channel);
    }

    /// Nudges the open non-registered parameter up by `amount`.
    pub fn send_nrpn_increment(&mut self, amount: u8, channel: Channel) {
        self.nrpn.increment(amount);
        self.send_control_change(control::DATA_INCREMENT, amount, channel);
    }

    /// Nudges the open non-registered parameter down by `amount`.
    pub fn send_nrpn_decrement(&mut self, amount: u8, channel: Channel) {
        self.nrpn.decrement(amount);
        self.send_control_change(control::DATA_DECREMENT, amount, channel);
    }

    /// Closes the open non-registered parameter with the two null-function selects.
    pub fn end_nrpn(&mut self, channel: Channel) {
        self.send_control_change(control::NRPN_LSB, 0x7F, channel);
        self.send_control_change(control::NRPN_MSB, 0x7F, channel);
        self.nrpn.end();
    }

    /// Read-only view of the registered-parameter tracking session.
    pub fn rpn_session(&self) -> &ParameterSession {
        &self.rpn
    }

    /// Read-only view of the non-registered-parameter tracking session.
    pub fn nrpn_session(&self) -> &ParameterSession {
        &self.nrpn
    }

    // -------------------------------------------------------------------
    // Thru

    /// Enables pass-through forwarding with the given policy.
    pub fn turn_thru_on(&mut self, mode: ThruMode) {
        self.thru_mode = mode;
    }

    /// Disables pass-through forwarding.
    pub fn turn_thru_off(&mut self) {
        self.thru_mode = ThruMode::Off;
    }

    /// The active pass-through policy.
    pub fn thru_mode(&self) -> ThruMode {
        self.thru_mode
    }

    /// Forwards the retained message per the active policy.
    fn thru_filter(&mut self, channel: Channel) {
        if self.thru_mode == ThruMode::Off {
            return;
        }
        let message = self.message;
        if message.kind.is_channel_message() {
            let matches = message.channel == channel || channel == CHANNEL_OMNI;
            let forward = match self.thru_mode {
                ThruMode::Off => false,
                ThruMode::Full => true,
                ThruMode::SameChannel => matches,
                ThruMode::DifferentChannel => !matches,
            };
            if forward {
                self.send(message.kind, message.data1, message.data2, message.channel);
            }
            return;
        }
        // System messages carry no channel and are always forwarded.
        match message.kind {
            MidiType::SystemExclusive => {
                self.send_sys_ex(&message.sysex[..message.sysex_size()], false);
            }
            MidiType::TimeCodeQuarterFrame => self.send_time_code_quarter_frame_raw(message.data1),
            MidiType::SongPosition => {
                self.send_song_position(u16::from(message.data2) << 7 | u16::from(message.data1));
            }
            MidiType::SongSelect => self.send_song_select(message.data1),
            MidiType::TuneRequest => self.send_tune_request(),
            kind if kind.is_real_time() => self.send_real_time(kind),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BufferTransport;
    use tinyvec::ArrayVec;

    type TestInterface = MidiInterface<BufferTransport<256>>;

    fn interface() -> TestInterface {
        let mut midi = MidiInterface::new(BufferTransport::new());
        midi.begin(1);
        midi.turn_thru_off(); // most tests assert exact output
        midi
    }

    fn sent(midi: &mut TestInterface) -> ArrayVec<[u8; 64]> {
        let mut out = ArrayVec::new();
        while let Some(byte) = midi.transport_mut().pop_output() {
            out.push(byte);
        }
        out
    }

    /// Pumps `read` once per queued byte, counting accepted messages.
    fn pump(midi: &mut TestInterface) -> usize {
        let mut completed = 0;
        while midi.transport().available() > 0 {
            if midi.read() {
                completed += 1;
            }
        }
        completed
    }

    #[test]
    fn begin_opens_the_transport_at_midi_speed() {
        let mut midi: TestInterface = MidiInterface::new(BufferTransport::new());
        midi.begin(1);
        assert_eq!(31250, midi.transport().baud_rate(), "Expected left but right");
        assert_eq!(ThruMode::Full, midi.thru_mode(), "Expected left but right");
    }

    mod sending {
        use super::*;

        #[test]
        fn note_on_writes_status_and_both_data_bytes() {
            let mut midi = interface();
            midi.send_note_on(60, 127, 1);
            assert_eq!(&[0x90, 60, 127][..], &sent(&mut midi)[..], "Expected left but right");
        }

        #[test]
        fn channel_lands_in_the_status_low_nibble() {
            let mut midi = interface();
            midi.send_note_off(60, 0, 16);
            assert_eq!(&[0x8F, 60, 0][..], &sent(&mut midi)[..], "Expected left but right");
        }

        #[test]
        fn program_change_writes_a_single_data_byte() {
            let mut midi = interface();
            midi.send_program_change(9, 2);
            assert_eq!(&[0xC1, 9][..], &sent(&mut midi)[..], "Expected left but right");
        }

        #[test]
        fn data_bytes_are_masked_to_seven_bits() {
            let mut midi = interface();
            midi.send_control_change(0xFF, 0x80, 1);
            assert_eq!(&[0xB0, 0x7F, 0x00][..], &sent(&mut midi)[..], "Expected left but right");
        }

        #[test]
        fn omni_and_off_channels_send_nothing() {
            let mut midi = interface();
            midi.send_note_on(60, 100, CHANNEL_OMNI);
            midi.send_note_on(60, 100, CHANNEL_OFF);
            assert_eq!(0, midi.transport().output_len(), "Expected left but right");
        }

        #[test]
        fn centered_pitch_bend_is_the_wire_midpoint() {
            let mut midi = interface();
            midi.send_pitch_bend(0, 1);
            assert_eq!(&[0xE0, 0x00, 0x40][..], &sent(&mut midi)[..], "Expected left but right");
        }

        #[test]
        fn pitch_bend_extremes_hit_the_wire_limits() {
            let mut midi = interface();
            midi.send_pitch_bend(-8192, 1);
            midi.send_pitch_bend(8191, 1);
            assert_eq!(
                &[0xE0, 0x00, 0x00, 0xE0, 0x7F, 0x7F][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn running_status_elides_repeated_status_bytes() {
            let mut midi = interface();
            midi.configuration.use_running_status = true;
            midi.send_note_on(60, 100, 1);
            midi.send_note_on(64, 100, 1);
            midi.send_note_off(60, 0, 1);
            assert_eq!(
                &[0x90, 60, 100, 64, 100, 0x80, 60, 0][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn system_common_resets_running_status() {
            let mut midi = interface();
            midi.configuration.use_running_status = true;
            midi.send_note_on(60, 100, 1);
            midi.send_song_select(5);
            midi.send_note_on(64, 100, 1);
            assert_eq!(
                &[0x90, 60, 100, 0xF3, 5, 0x90, 64, 100][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn real_time_is_transparent_to_running_status() {
            let mut midi = interface();
            midi.configuration.use_running_status = true;
            midi.send_note_on(60, 100, 1);
            midi.send_real_time(MidiType::Clock);
            midi.send_note_on(64, 100, 1);
            assert_eq!(
                &[0x90, 60, 100, 0xF8, 64, 100][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn send_real_time_ignores_non_real_time_types() {
            let mut midi = interface();
            midi.send_real_time(MidiType::NoteOn);
            midi.send_real_time(MidiType::SystemExclusive);
            assert_eq!(0, midi.transport().output_len(), "Expected left but right");
        }

        #[test]
        fn sys_ex_frames_the_payload() {
            let mut midi = interface();
            midi.send_sys_ex(&[0x01, 0x02], false);
            assert_eq!(
                &[0xF0, 0x01, 0x02, 0xF7][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn sys_ex_with_boundaries_passes_through_untouched() {
            let mut midi = interface();
            midi.send_sys_ex(&[0xF0, 0x01, 0xF7], true);
            assert_eq!(
                &[0xF0, 0x01, 0xF7][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn song_position_splits_beats_across_two_data_bytes() {
            let mut midi = interface();
            midi.send_song_position(300);
            assert_eq!(
                &[0xF2, 44, 2][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn quarter_frame_nibbles_compose_one_data_byte() {
            let mut midi = interface();
            midi.send_time_code_quarter_frame(0x03, 0x0A);
            assert_eq!(
                &[0xF1, 0x3A][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }
    }

    mod receiving {
        use super::*;

        #[test]
        fn note_on_completes_and_is_retained() {
            let mut midi = interface();
            midi.transport_mut().feed(&[0x90, 0x40, 0x7F]);
            assert!(!midi.read());
            assert!(!midi.read());
            assert!(midi.read());

            let message = midi.message();
            assert_eq!(MidiType::NoteOn, message.kind, "Expected left but right");
            assert_eq!(1, message.channel, "Expected left but right");
            assert_eq!(0x40, message.data1, "Expected left but right");
            assert_eq!(0x7F, message.data2, "Expected left but right");
        }

        #[test]
        fn running_status_completes_a_second_message() {
            let mut midi = interface();
            midi.transport_mut().feed(&[0x90, 0x40, 0x7F, 0x3C, 0x01]);
            assert_eq!(2, pump(&mut midi), "Expected left but right");
            assert_eq!(0x3C, midi.message().data1, "Expected left but right");
            assert_eq!(0x01, midi.message().data2, "Expected left but right");
        }

        #[test]
        fn null_velocity_note_on_surfaces_as_note_off() {
            let mut midi = interface();
            midi.transport_mut().feed(&[0x90, 0x40, 0x00]);
            assert_eq!(1, pump(&mut midi), "Expected left but right");
            assert_eq!(MidiType::NoteOff, midi.message().kind, "Expected left but right");

            midi.configuration.null_velocity_note_on_is_note_off = false;
            midi.transport_mut().feed(&[0x90, 0x40, 0x00]);
            assert_eq!(1, pump(&mut midi), "Expected left but right");
            assert_eq!(MidiType::NoteOn, midi.message().kind, "Expected left but right");
        }

        #[test]
        fn mismatched_channels_are_filtered_but_still_parsed() {
            let mut midi = interface();
            midi.set_input_channel(2);
            midi.transport_mut().feed(&[0x90, 0x40, 0x7F]);
            assert_eq!(0, pump(&mut midi), "Expected left but right");
            // The retained message was still overwritten by the parse.
            assert_eq!(MidiType::NoteOn, midi.message().kind, "Expected left but right");

            midi.transport_mut().feed(&[0x91, 0x41, 0x60]);
            assert_eq!(1, pump(&mut midi), "Expected left but right");
            assert_eq!(2, midi.message().channel, "Expected left but right");
        }

        #[test]
        fn system_messages_pass_every_channel_filter() {
            let mut midi = interface();
            midi.set_input_channel(9);
            midi.transport_mut().feed(&[0xF8]);
            assert_eq!(1, pump(&mut midi), "Expected left but right");
            assert_eq!(MidiType::Clock, midi.message().kind, "Expected left but right");
        }

        #[test]
        fn channel_off_disables_reception() {
            let mut midi = interface();
            midi.set_input_channel(CHANNEL_OFF);
            midi.transport_mut().feed(&[0x90, 0x40, 0x7F]);
            assert!(!midi.read());
            assert_eq!(
                3,
                midi.transport().available(),
                "bytes stay queued while reception is off"
            );
        }

        #[test]
        fn sys_ex_payload_is_available_from_the_retained_message() {
            let mut midi = interface();
            midi.transport_mut().feed(&[0xF0, 0x7D, 0x01, 0x02, 0xF7]);
            assert_eq!(1, pump(&mut midi), "Expected left but right");
            assert_eq!(3, midi.message().sysex_size(), "Expected left but right");
            assert_eq!(
                &[0x7D, 0x01, 0x02],
                midi.message().sysex_bytes(),
                "Expected left but right"
            );
        }

        #[test]
        fn callbacks_fire_once_per_accepted_message() {
            use core::sync::atomic::{AtomicUsize, Ordering};
            static NOTE_ONS: AtomicUsize = AtomicUsize::new(0);

            let mut midi = interface();
            midi.callbacks.note_on = Some(|_, _, _| {
                NOTE_ONS.fetch_add(1, Ordering::Relaxed);
            });
            midi.set_input_channel(1);
            // Channel 1 accepted, channel 2 filtered out.
            midi.transport_mut()
                .feed(&[0x90, 0x40, 0x7F, 0x91, 0x40, 0x7F]);
            pump(&mut midi);
            assert_eq!(1, NOTE_ONS.load(Ordering::Relaxed), "Expected left but right");
        }
    }

    mod parameters {
        use super::*;

        #[test]
        fn rpn_exchange_emits_the_documented_control_sequence() {
            let mut midi = interface();
            midi.begin_rpn(1234, 1);
            midi.send_rpn_value(300, 1);
            midi.end_rpn(1);
            assert_eq!(
                &[
                    0xB0, 100, 82, // number LSB
                    0xB0, 101, 9, // number MSB
                    0xB0, 6, 2, // value MSB
                    0xB0, 38, 44, // value LSB
                    0xB0, 100, 0x7F, // null function LSB
                    0xB0, 101, 0x7F, // null function MSB
                ][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
            assert!(!midi.rpn_session().is_open());
        }

        #[test]
        fn nrpn_uses_its_own_select_controllers() {
            let mut midi = interface();
            midi.begin_nrpn(0x0102, 3);
            assert_eq!(
                &[0xB2, 98, 0x02, 0xB2, 99, 0x02][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn reselecting_the_open_number_sends_nothing() {
            let mut midi = interface();
            midi.begin_rpn(42, 1);
            let _ = sent(&mut midi);
            midi.begin_rpn(42, 1);
            assert_eq!(0, midi.transport().output_len(), "Expected left but right");
        }

        #[test]
        fn increment_and_decrement_use_single_control_changes() {
            let mut midi = interface();
            midi.begin_rpn(42, 1);
            let _ = sent(&mut midi);
            midi.send_rpn_increment(5, 1);
            midi.send_rpn_decrement(2, 1);
            assert_eq!(
                &[0xB0, 96, 5, 0xB0, 97, 2][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn local_tracking_mirrors_the_presumed_peer_value() {
            let mut midi = interface();
            midi.begin_rpn(42, 1);
            midi.send_rpn_value(100, 1);
            midi.send_rpn_increment(5, 1);
            midi.send_rpn_decrement(2, 1);
            assert_eq!(
                103,
                midi.rpn_session().value(42).to_int(),
                "Expected left but right"
            );
        }

        #[test]
        fn split_values_mask_to_seven_bits() {
            let mut midi = interface();
            midi.begin_nrpn(7, 1);
            let _ = sent(&mut midi);
            midi.send_nrpn_value_split(0x02, 0x2C, 1);
            assert_eq!(
                &[0xB0, 6, 0x02, 0xB0, 38, 0x2C][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
            assert_eq!(
                300,
                midi.nrpn_session().value(7).to_int(),
                "Expected left but right"
            );
        }
    }

    mod thru {
        use super::*;

        #[test]
        fn full_mode_forwards_channel_messages_verbatim() {
            let mut midi = interface();
            midi.turn_thru_on(ThruMode::Full);
            midi.transport_mut().feed(&[0x93, 0x40, 0x7F]);
            pump(&mut midi);
            assert_eq!(
                &[0x93, 0x40, 0x7F][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn same_channel_mode_drops_other_channels() {
            let mut midi = interface();
            midi.set_input_channel(2);
            midi.turn_thru_on(ThruMode::SameChannel);
            midi.transport_mut().feed(&[0x93, 0x40, 0x7F]);
            pump(&mut midi);
            assert_eq!(0, midi.transport().output_len(), "Expected left but right");

            midi.transport_mut().feed(&[0x91, 0x40, 0x7F]);
            pump(&mut midi);
            assert_eq!(3, midi.transport().output_len(), "Expected left but right");
        }

        #[test]
        fn different_channel_mode_inverts_the_filter() {
            let mut midi = interface();
            midi.set_input_channel(CHANNEL_OMNI);
            midi.turn_thru_on(ThruMode::DifferentChannel);
            midi.transport_mut().feed(&[0x93, 0x40, 0x7F]);
            pump(&mut midi);
            assert_eq!(0, midi.transport().output_len(), "Expected left but right");
        }

        #[test]
        fn different_channel_mode_forwards_what_the_filter_drops() {
            let mut midi = interface();
            midi.set_input_channel(2);
            midi.turn_thru_on(ThruMode::DifferentChannel);
            midi.transport_mut().feed(&[0x93, 0x40, 0x7F]);
            assert_eq!(0, pump(&mut midi), "the filter rejects channel 4");
            assert_eq!(
                &[0x93, 0x40, 0x7F][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn system_messages_are_forwarded_with_framing() {
            let mut midi = interface();
            midi.turn_thru_on(ThruMode::SameChannel);
            midi.transport_mut().feed(&[0xF0, 0x01, 0x02, 0xF7]);
            pump(&mut midi);
            assert_eq!(
                &[0xF0, 0x01, 0x02, 0xF7][..],
                &sent(&mut midi)[..],
                "Expected left but right"
            );
        }

        #[test]
        fn off_mode_forwards_nothing() {
            let mut midi = interface();
            midi.transport_mut().feed(&[0x90, 0x40, 0x7F, 0xF8]);
            pump(&mut midi);
            assert_eq!(0, midi.transport().output_len(), "Expected left but right");
        }
    }
}
