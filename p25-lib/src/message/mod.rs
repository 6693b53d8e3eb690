//! Decoded P25 Phase 1 messages and the listener they are dispatched to.
//!
//! Each data unit type has a factory that reads fields from a copy of the assembled
//! frame bits. Factories never touch the framer's own buffer.
use std::fmt;

use crossbeam::channel::Sender;
#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::trace;

use crate::{bits::BinaryMessage, framing::DataUnitId};

mod hdu;
mod ldu;
mod pdu;
mod tsbk;

pub use hdu::HeaderDataUnit;
pub use ldu::{
    EncryptionSync, LinkControl, LinkControlKind, LogicalLinkDataUnit1, LogicalLinkDataUnit2,
    TerminatorLinkControl,
};
pub use pdu::{ConfirmedBlock, PacketDataUnit, PduFormat, PduHeader};
pub use tsbk::Tsbk;

/// Fields common to every dispatched message.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DataUnit {
    /// Network access code from the NID.
    pub nac: u16,
    pub duid: DataUnitId,
    /// `false` when an integrity check on the contents failed and the fields are a best
    /// effort.
    pub valid: bool,
    /// The assembled frame bits, NID included, with status symbols removed.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub bits: BinaryMessage,
}

impl DataUnit {
    pub fn new(nac: u16, duid: DataUnitId, valid: bool, bits: BinaryMessage) -> Self {
        Self {
            nac,
            duid,
            valid,
            bits,
        }
    }
}

/// Simple terminator; carries nothing beyond the NID.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TerminatorDataUnit {
    pub unit: DataUnit,
}

/// Opaque wrapper for data units this crate does not interpret.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UnknownDataUnit {
    pub unit: DataUnit,
    /// Raw DUID value from the NID.
    pub value: u8,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Message {
    Hdu(HeaderDataUnit),
    Ldu1(LogicalLinkDataUnit1),
    Ldu2(LogicalLinkDataUnit2),
    Tdu(TerminatorDataUnit),
    Tdulc(TerminatorLinkControl),
    Tsbk(Tsbk),
    Pdu(PacketDataUnit),
    Unknown(UnknownDataUnit),
}

impl Message {
    pub fn unit(&self) -> &DataUnit {
        match self {
            Self::Hdu(m) => &m.unit,
            Self::Ldu1(m) => &m.unit,
            Self::Ldu2(m) => &m.unit,
            Self::Tdu(m) => &m.unit,
            Self::Tdulc(m) => &m.unit,
            Self::Tsbk(m) => &m.unit,
            Self::Pdu(m) => &m.unit,
            Self::Unknown(m) => &m.unit,
        }
    }

    pub fn nac(&self) -> u16 {
        self.unit().nac
    }

    pub fn duid(&self) -> DataUnitId {
        self.unit().duid
    }

    pub fn is_valid(&self) -> bool {
        self.unit().valid
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit();
        write!(f, "NAC:{:03X} {:<5}", unit.nac, unit.duid.to_string())?;
        if !unit.valid {
            f.write_str(" [CRC FAIL]")?;
        }
        match self {
            Self::Hdu(m) => write!(f, " {m}"),
            Self::Ldu1(m) => write!(f, " {}", m.link_control),
            Self::Ldu2(m) => write!(f, " {}", m.encryption),
            Self::Tdulc(m) => write!(f, " {}", m.link_control),
            Self::Tsbk(m) => write!(f, " {m}"),
            Self::Pdu(m) => write!(f, " {m}"),
            Self::Tdu(_) => Ok(()),
            Self::Unknown(m) => write!(f, " DUID:{:X} {} bits", m.value, m.unit.bits.size()),
        }
    }
}

/// Pack 6-bit symbols into a full message, first hexbit first.
pub(crate) fn hexbit_message(hexbits: &[u8]) -> BinaryMessage {
    let mut msg = BinaryMessage::new(hexbits.len() * 6);
    for (i, h) in hexbits.iter().enumerate() {
        msg.load(i * 6, 6, u64::from(h & 0x3f));
    }
    msg.set_pointer(msg.size());
    msg
}

/// Receiver of decoded messages.
///
/// Called synchronously on the thread feeding the framer, so implementations must not
/// block; hand long work off elsewhere.
pub trait Listener {
    fn receive(&mut self, message: Message);
}

impl Listener for Sender<Message> {
    fn receive(&mut self, message: Message) {
        if self.send(message).is_err() {
            trace!("message receiver disconnected");
        }
    }
}

impl Listener for Vec<Message> {
    fn receive(&mut self, message: Message) {
        self.push(message);
    }
}

impl Listener for Box<dyn FnMut(Message) + Send> {
    fn receive(&mut self, message: Message) {
        (**self)(message);
    }
}
