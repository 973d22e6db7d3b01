// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

/// Transport bookkeeping that travels with a telegram but is never
/// put on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplyHint {
    /// Upper bound of the reply PDU length.
    pub estimate: usize,
    /// PDU length of the reply that was actually received.
    pub actual: Option<usize>,
    /// Caller owned handle of the device context this telegram belongs to.
    pub device: Option<usize>,
}

/// A complete GENIbus telegram.
///
/// The length byte and the checksum are not stored. Both are computed
/// from the current content whenever the telegram is encoded.
#[derive(Debug, Clone)]
pub struct Telegram {
    pub start_delimiter: StartDelimiter,
    pub destination: Address,
    pub source: Address,
    pub units: UnitBlock,
    /// Not part of the wire format and ignored by `==`.
    pub reply: ReplyHint,
}

impl Telegram {
    /// Create a telegram without any units.
    #[must_use]
    pub const fn new(start_delimiter: StartDelimiter, destination: Address, source: Address) -> Self {
        Self {
            start_delimiter,
            destination,
            source,
            units: UnitBlock::new(),
            reply: ReplyHint {
                estimate: 0,
                actual: None,
                device: None,
            },
        }
    }

    /// Create an empty data request.
    #[must_use]
    pub const fn request(destination: Address, source: Address) -> Self {
        Self::new(StartDelimiter::DataRequest, destination, source)
    }

    /// Attach the handle of the originating device context.
    #[must_use]
    pub fn with_device(mut self, device: usize) -> Self {
        self.reply.device = Some(device);
        self
    }

    /// The value of the length byte: PDU length plus the two address bytes.
    ///
    /// Values above [`MAX_LENGTH_FIELD`] can't be encoded.
    #[must_use]
    pub fn length(&self) -> usize {
        self.units.total_len() + ADDRESS_LEN
    }

    /// Number of bytes of the encoded telegram.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        self.length() + 2 + CRC_LEN
    }

    /// Append a unit to the PDU.
    pub fn add(&mut self, unit: DataUnit) {
        self.units.add(unit);
    }

    /// Store and return the upper bound of the reply PDU length.
    pub fn estimate_reply(&mut self) -> usize {
        self.reply.estimate = self.units.reply_len_estimate();
        self.reply.estimate
    }

    /// Remember the PDU length of the reply to this telegram.
    pub fn record_reply(&mut self, reply: &Telegram) {
        self.reply.actual = Some(reply.units.total_len());
    }
}

impl PartialEq for Telegram {
    fn eq(&self, other: &Self) -> bool {
        self.start_delimiter == other.start_delimiter
            && self.destination == other.destination
            && self.source == other.source
            && self.units == other.units
    }
}

impl Eq for Telegram {}
