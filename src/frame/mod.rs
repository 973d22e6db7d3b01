// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

mod apdu;
mod pdu;
mod telegram;

pub use self::{apdu::*, pdu::*, telegram::*};

/// Maximum number of data bytes in one APDU (6 bit length field).
pub const MAX_PAYLOAD_LEN: usize = 63;

/// Class byte + OS/ACK-length byte.
pub const APDU_HEADER_LEN: usize = 2;

/// Start delimiter, length, destination and source address.
pub const TELEGRAM_HEADER_LEN: usize = 4;

/// Two checksum bytes, high byte first.
pub const CRC_LEN: usize = 2;

/// Destination and source address, counted by the length byte.
pub(crate) const ADDRESS_LEN: usize = 2;

/// Largest value the length byte can carry.
pub const MAX_LENGTH_FIELD: usize = u8::MAX as usize;

/// The maximum size of a telegram on the wire.
pub const MAX_TELEGRAM_LEN: usize = MAX_LENGTH_FIELD + 2 + CRC_LEN;

/// Bus address the master uses as source address.
pub const MASTER_ADDRESS: Address = 0x01;

/// A GENIbus node address.
pub type Address = u8;

/// The location of all bytes that belong to the frame.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLocation {
    /// The index where the frame starts
    pub start: usize,
    /// Number of bytes that belong to the frame
    pub size: usize,
}

impl FrameLocation {
    /// One past the last byte of the frame.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.size
    }
}

/// The first byte of a telegram, identifying the frame type.
///
/// Two delimiters are equal if they have the same wire value,
/// i.e. `Custom(0x27) == DataRequest`.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy)]
pub enum StartDelimiter {
    /// `0x27`: master to slave.
    DataRequest,
    /// `0x26`: unsolicited.
    DataMessage,
    /// `0x24`: slave to master.
    DataReply,
    /// Anything else, kept as received.
    Custom(u8),
}

impl StartDelimiter {
    /// Create a new [`StartDelimiter`] with `value`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        match value {
            0x27 => Self::DataRequest,
            0x26 => Self::DataMessage,
            0x24 => Self::DataReply,
            sd => Self::Custom(sd),
        }
    }

    /// Get the [`u8`] value of the current [`StartDelimiter`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::DataRequest => 0x27,
            Self::DataMessage => 0x26,
            Self::DataReply => 0x24,
            Self::Custom(sd) => sd,
        }
    }

    /// `true` for the three delimiters defined by the protocol.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(Self::new(self.value()), Self::Custom(_))
    }
}

impl PartialEq for StartDelimiter {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for StartDelimiter {}

impl From<u8> for StartDelimiter {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for StartDelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0>2X}", self.value())
    }
}

/// The register class addressed by an APDU.
///
/// Like [`StartDelimiter`], equality is by class id.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy)]
pub enum DataClass {
    /// Class `0`.
    ProtocolData,
    /// Class `2`.
    MeasuredData,
    /// Class `3`.
    Commands,
    /// Class `4`.
    ConfigurationParameters,
    /// Class `5`.
    ReferenceValues,
    /// Class `7`.
    AsciiStrings,
    /// Any other class id.
    Custom(u8),
}

impl DataClass {
    /// Create a new [`DataClass`] with `value`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        match value {
            0 => Self::ProtocolData,
            2 => Self::MeasuredData,
            3 => Self::Commands,
            4 => Self::ConfigurationParameters,
            5 => Self::ReferenceValues,
            7 => Self::AsciiStrings,
            id => Self::Custom(id),
        }
    }

    /// Get the [`u8`] value of the current [`DataClass`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::ProtocolData => 0,
            Self::MeasuredData => 2,
            Self::Commands => 3,
            Self::ConfigurationParameters => 4,
            Self::ReferenceValues => 5,
            Self::AsciiStrings => 7,
            Self::Custom(id) => id,
        }
    }
}

impl PartialEq for DataClass {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for DataClass {}

impl From<u8> for DataClass {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for DataClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Operation specifier (OS) of a request APDU.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read the value of data items.
    Get = 0,
    /// Write the value of data items.
    Set = 2,
    /// Read the scaling info of data items.
    Info = 3,
}

impl Operation {
    /// Map the two OS/ACK bits to an operation. `1` is not an operation.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x03 {
            0 => Some(Self::Get),
            2 => Some(Self::Set),
            3 => Some(Self::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Set => "SET",
            Self::Info => "INFO",
        })
    }
}

/// Acknowledge code (ACK) of a reply APDU.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// Operation succeeded.
    Ok = 0,
    /// Reply APDU data field is empty.
    DataClassUnknown = 1,
    /// Reply APDU data field holds the first unknown id.
    DataItemIdUnknown = 2,
    /// Operation illegal or data class write buffer full, data field is empty.
    IllegalOrBufferFull = 3,
}

impl Ack {
    /// Map the two OS/ACK bits to an acknowledge code.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Ok,
            1 => Self::DataClassUnknown,
            2 => Self::DataItemIdUnknown,
            _ => Self::IllegalOrBufferFull,
        }
    }

    const fn get_name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::DataClassUnknown => "Data class unknown",
            Self::DataItemIdUnknown => "Data item id unknown",
            Self::IllegalOrBufferFull => "Operation illegal or write buffer full",
        }
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get_name())
    }
}
