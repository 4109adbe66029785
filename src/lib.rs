//! This crate drives a networked marine entertainment unit (radio and media
//! player) over NMEA 2000. A single proprietary PGN multiplexes dozens of
//! sub-messages: volume, track metadata, tuner frequency, folder browsing,
//! power and tone. Their layouts are reverse engineered and not consistent in
//! width; sub-messages whose layout is not understood are ignored.
//!
//! The core is two transformations over a shared [`SessionState`]:
//!
//! * [`decode()`] turns a reassembled status payload into a
//!   [`StatusDocument`], updating the state as it goes.
//! * [`encode()`] turns a [`CommandDocument`] into an ordered sequence of
//!   fast packet fragments, including the request/ack/confirm cycle used to
//!   page through folders on the unit.
//!
//! [`MediaController`] keeps both on one side of a mutex. With the `client`
//! feature, [`client::EventLoop`] connects everything to a CAN bus.
//!
//! Like the rest of the N2K world, most of this is built on [the Canboat
//! project's reverse engineering documentation](https://canboat.github.io/canboat/canboat.html).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod buf;
pub mod catalog;
#[cfg(feature = "client")]
pub mod client;
pub mod command;
pub mod config;
mod controller;
pub mod decode;
pub mod encode;
pub mod fast_packet;
mod frame;
mod id;
pub mod state;
pub mod status;
pub mod well_known;

use generic_array::{ArrayLength, GenericArray};

pub use buf::{Buf, BufMut, Truncated};
pub use catalog::Port;
pub use command::{Command, CommandDocument};
pub use config::{Addressing, Config};
pub use controller::MediaController;
pub use decode::{decode, DecodeError};
pub use encode::{encode, EncodeError};
pub use fast_packet::FastPacket;
pub use frame::NmeaFrame;
pub use generic_array::typenum;
pub use id::{Id, DESTINATION_BROADCAST};
pub use state::SessionState;
pub use status::StatusDocument;

/// A fixed-length NMEA 2000 message. This trait is very much inspired by
/// [the gRPC library Prost's trait with the same name](https://docs.rs/prost/latest/prost/trait.Message.html).
pub trait Message {
    const PGN: u32;

    /// Total length of the encoded message in bytes.
    type EncodedLen: ArrayLength;

    /// The error type returned when a message fails to decode.
    type DecodeError;

    /// Encode into a buffer of exactly [`Message::EncodedLen`] bytes.
    fn encode(&self, buf: &mut [u8]);

    /// Decode a message from its encoded form.
    fn decode(data: &[u8]) -> Result<Self, Self::DecodeError>
    where
        Self: Sized;

    /// A zeroed buffer the size of the encoded message.
    fn buffer() -> GenericArray<u8, Self::EncodedLen> {
        GenericArray::default()
    }
}
