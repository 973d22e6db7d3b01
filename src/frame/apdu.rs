// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;
use crate::{error::*, util::*};
use arrayvec::ArrayVec;

/// APDU data field storage.
pub type Payload = ArrayVec<u8, MAX_PAYLOAD_LEN>;

/// Upper bound of the reply to an ASCII string request.
const ASCII_REPLY_ESTIMATE: usize = 30;

/// Upper bound of the reply bytes per item of an INFO request.
const INFO_REPLY_PER_ITEM: usize = 4;

/// One class-scoped register access (APDU).
///
/// The two OS/ACK bits carry an [`Operation`] in requests and an [`Ack`]
/// in replies. Which one applies is known only to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataUnit {
    class_id: u8,
    op_ack: u8,
    payload: Payload,
}

impl DataUnit {
    /// Create an empty unit. Only the lower two bits of `op_ack` are kept.
    #[must_use]
    pub const fn new(class_id: u8, op_ack: u8) -> Self {
        Self {
            class_id,
            op_ack: op_ack & 0x03,
            payload: Payload::new_const(),
        }
    }

    /// Create an empty request unit.
    #[must_use]
    pub const fn request(class: DataClass, operation: Operation) -> Self {
        Self::new(class.value(), operation as u8)
    }

    /// Create an empty reply unit.
    #[must_use]
    pub const fn reply(class: DataClass, ack: Ack) -> Self {
        Self::new(class.value(), ack as u8)
    }

    /// Create a unit out of received bytes.
    ///
    /// `data` is bounded by the 6 bit length field of the header byte.
    pub(crate) fn from_wire(class_id: u8, op_ack: u8, data: &[u8]) -> Self {
        debug_assert!(fits_payload(data.len()));
        let mut unit = Self::new(class_id, op_ack);
        unit.payload.extend(data.iter().copied());
        unit
    }

    /// Builder style variant of [`set_payload`](Self::set_payload).
    pub fn with_payload(mut self, bytes: &[u8]) -> Result<Self, Error> {
        self.set_payload(bytes)?;
        Ok(self)
    }

    /// The raw register class byte.
    #[must_use]
    pub const fn class_id(&self) -> u8 {
        self.class_id
    }

    /// Typed view of the register class byte.
    #[must_use]
    pub const fn class(&self) -> DataClass {
        DataClass::new(self.class_id)
    }

    /// The raw OS/ACK bits (`0..=3`).
    #[must_use]
    pub const fn op_ack(&self) -> u8 {
        self.op_ack
    }

    /// Request view of the OS/ACK bits.
    #[must_use]
    pub const fn operation(&self) -> Option<Operation> {
        Operation::from_bits(self.op_ack)
    }

    /// Reply view of the OS/ACK bits.
    #[must_use]
    pub const fn ack(&self) -> Ack {
        Ack::from_bits(self.op_ack)
    }

    /// APDU data field.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Replace the data field.
    ///
    /// More than [`MAX_PAYLOAD_LEN`] bytes can't be expressed in the
    /// header byte and are rejected, leaving the unit unchanged.
    pub fn set_payload(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if !fits_payload(bytes.len()) {
            return Err(Error::PayloadTooLong(bytes.len()));
        }
        self.payload.clear();
        self.payload.extend(bytes.iter().copied());
        Ok(())
    }

    /// Append a single data byte.
    pub fn append_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.payload
            .try_push(byte)
            .map_err(|_| Error::PayloadTooLong(self.payload.len() + 1))
    }

    /// Number of data bytes, without header.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    ///  Returns `true` if the data field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Number of bytes on the wire, including the two header bytes.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.len() + APDU_HEADER_LEN
    }

    /// OS/ACK in the upper two bits, data length in the lower six.
    #[must_use]
    pub fn header_byte(&self) -> u8 {
        header_byte(self.op_ack, self.len())
    }

    /// Upper bound of the APDU bytes a device sends back for this request.
    ///
    /// Every GET item is answered with one byte, a SET is answered with an
    /// empty APDU and an INFO item with up to four bytes. ASCII strings are
    /// of unknown length and estimated with 30 bytes.
    #[must_use]
    pub fn reply_len_estimate(&self) -> usize {
        if self.class() == DataClass::AsciiStrings {
            return ASCII_REPLY_ESTIMATE;
        }
        match self.operation() {
            Some(Operation::Get) => self.total_len(),
            Some(Operation::Info) => APDU_HEADER_LEN + self.len() * INFO_REPLY_PER_ITEM,
            Some(Operation::Set) | None => APDU_HEADER_LEN,
        }
    }
}
