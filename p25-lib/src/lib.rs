#![doc = include_str!("../README.md")]

mod error;

pub mod bits;
pub mod dsp;
pub mod edac;
pub mod framing;
pub mod message;

pub use error::{Error, Result};
