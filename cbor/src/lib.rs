#![no_std]
extern crate alloc;

pub mod decode;
pub mod encode;
pub mod value;

mod decode_seq;

pub use decode::{DecodeOptions, Decoded, Decoder, Error, decode, decode_detail, decode_prefix};
pub use encode::{ToCbor, encode};
pub use value::{BigInt, Sign, Simple, Value};

#[cfg(test)]
mod decode_tests;
