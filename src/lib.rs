//! This crate implements the byte level of the [MIDI](https://midi.org/midi-1-0) protocol for
//! resource-constrained devices: a stateful parser that reassembles a raw serial byte stream into
//! typed messages (honoring running-status compression and System Exclusive framing), the matching
//! outbound senders, a 7-bit-clean System Exclusive payload codec, and the layered 14-bit RPN/NRPN
//! parameter-negotiation scheme built atop control-change messages.
//!
//! Everything is fixed-capacity and allocation-free. The engine is agnostic to the physical wire:
//! it talks to any byte source/sink through the [`transport::Transport`] trait, whether that is a
//! UART, a USB-MIDI packet adapter, or an in-memory loopback.
//!
//! ```
//! use midiwire::interface::MidiInterface;
//! use midiwire::transport::BufferTransport;
//!
//! let mut midi: MidiInterface<BufferTransport<64>> = MidiInterface::new(BufferTransport::new());
//! midi.begin(1);
//! midi.send_note_on(60, 100, 1);
//! assert_eq!(Some(0x90), midi.transport_mut().pop_output());
//! assert_eq!(Some(60), midi.transport_mut().pop_output());
//! assert_eq!(Some(100), midi.transport_mut().pop_output());
//! ```

#![deny(missing_docs)]
#![no_std]

pub mod callbacks;

pub mod configuration;

/// The transport-facing engine: outbound senders, the inbound read loop, parameter negotiation,
/// and pass-through routing.
pub mod interface;

pub mod message;

pub mod parameter;

pub mod parser;

pub mod ring_buffer;

pub mod sysex;

pub mod transport;
