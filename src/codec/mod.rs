// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{error::*, frame::*, util::*};
use alloc::vec::Vec;
use arrayvec::ArrayVec;
use core::fmt;

pub mod telegram;

pub use self::telegram::{TelegramBytes, checksum, crc_ccitt};

type Result<T> = core::result::Result<T, Error>;

/// An encoded APDU.
pub type ApduBytes = ArrayVec<u8, { MAX_PAYLOAD_LEN + APDU_HEADER_LEN }>;

/// A non-fatal anomaly found while decoding.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeWarning {
    /// Not even the telegram header was received.
    HeaderTruncated { len: usize },
    /// The APDU at PDU `offset` declares more data bytes than available.
    UnitTruncated {
        offset: usize,
        declared: usize,
        available: usize,
    },
    /// The length byte disagrees with the received number of bytes.
    LengthMismatch { declared: u8, actual: usize },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use DecodeWarning::*;

        match self {
            HeaderTruncated { len } => {
                write!(f, "Telegram header truncated: {len} byte(s) received")
            }
            UnitTruncated {
                offset,
                declared,
                available,
            } => write!(
                f,
                "APDU at PDU offset {offset} truncated: {declared} data byte(s) declared, {available} available"
            ),
            LengthMismatch { declared, actual } => write!(
                f,
                "Length Mismatch: Length Field: {declared}, received: {actual}"
            ),
        }
    }
}

/// Result of a best-effort decode: everything that could be parsed plus
/// the anomalies that were skipped over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub value: T,
    pub warnings: Vec<DecodeWarning>,
}

impl<T> Decoded<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// `true` if nothing was skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Drop the warnings.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Decoded<U> {
        Decoded {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    #[cfg(feature = "log")]
    pub(crate) fn log_warnings(&self) {
        for warning in &self.warnings {
            log::warn!("Failed to decode telegram completely: {warning}");
        }
    }
}

impl DataUnit {
    /// Encode the APDU into `buf`.
    ///
    /// It returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.total_len();
        if buf.len() < len {
            return Err(Error::BufferSize);
        }
        buf[0] = self.class_id();
        buf[1] = self.header_byte();
        buf[APDU_HEADER_LEN..len].copy_from_slice(self.payload());
        Ok(len)
    }

    /// Class byte, header byte, data bytes.
    #[must_use]
    pub fn to_bytes(&self) -> ApduBytes {
        let mut bytes = ApduBytes::new();
        bytes.push(self.class_id());
        bytes.push(self.header_byte());
        bytes.extend(self.payload().iter().copied());
        bytes
    }
}

impl UnitBlock {
    /// Encode all units in order into `buf`.
    ///
    /// It returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < self.total_len() {
            return Err(Error::BufferSize);
        }
        let mut offset = 0;
        for unit in self {
            offset += unit.encode(&mut buf[offset..])?;
        }
        Ok(offset)
    }

    /// The concatenated APDUs.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.iter().flat_map(DataUnit::to_bytes).collect()
    }

    /// Decode the units out of a complete telegram buffer.
    ///
    /// The 4 header bytes are skipped and no APDU may start in the last
    /// 2 (CRC) bytes. Data bytes are only bounded by the end of the buffer,
    /// the checksum is not verified.
    #[must_use]
    pub fn decode(telegram: &[u8]) -> Decoded<Self> {
        let end = telegram.len().saturating_sub(CRC_LEN);
        Self::decode_units(telegram, TELEGRAM_HEADER_LEN, end)
    }

    /// Decode the units of a PDU that is already stripped of the
    /// telegram header and the CRC.
    ///
    /// Decoding stops at the first truncated APDU, the units before it
    /// are kept. A single trailing byte ("request from slave") is ignored.
    #[must_use]
    pub fn decode_pdu(pdu: &[u8]) -> Decoded<Self> {
        Self::decode_units(pdu, 0, pdu.len())
    }

    /// Parse APDUs whose headers lie within `start..end` of `buf`.
    ///
    /// Warning offsets are relative to `start`.
    fn decode_units(buf: &[u8], start: usize, end: usize) -> Decoded<Self> {
        let mut decoded = Decoded::new(Self::new());
        let mut offset = start;

        while offset + APDU_HEADER_LEN <= end {
            let class_id = buf[offset];
            let (op_ack, len) = split_header_byte(buf[offset + 1]);
            let data_start = offset + APDU_HEADER_LEN;

            let Some(data) = buf.get(data_start..data_start + len) else {
                decoded.warnings.push(DecodeWarning::UnitTruncated {
                    offset: offset - start,
                    declared: len,
                    available: buf.len() - data_start,
                });
                break;
            };
            decoded.value.add(DataUnit::from_wire(class_id, op_ack, data));

            offset = data_start + len;
        }
        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_data_unit() {
        let unit = DataUnit::new(0x03, 0).with_payload(&[]).unwrap();
        let buf = &mut [0xEE; 4];
        assert_eq!(unit.encode(buf).unwrap(), 2);
        assert_eq!(buf, &[0x03, 0x00, 0xEE, 0xEE]);

        let unit = DataUnit::request(DataClass::ReferenceValues, Operation::Set)
            .with_payload(&[0x01, 0xFE])
            .unwrap();
        assert_eq!(unit.to_bytes().as_slice(), &[0x05, 0x82, 0x01, 0xFE]);
    }

    #[test]
    fn encode_data_unit_into_short_buffer() {
        let unit = DataUnit::new(2, 0).with_payload(&[1, 2, 3]).unwrap();
        assert_eq!(unit.encode(&mut [0; 4]), Err(Error::BufferSize));
    }

    #[test]
    fn encode_largest_data_unit() {
        let unit = DataUnit::new(4, 3).with_payload(&[0xAB; 63]).unwrap();
        let bytes = unit.to_bytes();
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[1], 0xFF);
        assert!(bytes.is_full());
    }

    #[test]
    fn encode_unit_block() {
        let block: UnitBlock = [
            DataUnit::new(2, 0).with_payload(&[0x10, 0x1A]).unwrap(),
            DataUnit::new(3, 2).with_payload(&[0x05]).unwrap(),
            DataUnit::new(7, 0),
        ]
        .into_iter()
        .collect();
        let buf = &mut [0; 16];
        let len = block.encode(buf).unwrap();
        assert_eq!(len, block.total_len());
        assert_eq!(
            &buf[..len],
            &[
                0x02, // class
                0x02, // GET, 2 bytes
                0x10, // item
                0x1A, // item
                0x03, // class
                0x81, // SET, 1 byte
                0x05, // command
                0x07, // class
                0x00, // GET, empty
            ]
        );
        assert_eq!(block.to_bytes(), &buf[..len]);
        assert_eq!(block.encode(&mut [0; 8]), Err(Error::BufferSize));
        assert_eq!(UnitBlock::new().encode(&mut []), Ok(0));
    }

    mod decode_pdu {
        use super::*;

        #[test]
        fn empty_pdu() {
            let decoded = UnitBlock::decode_pdu(&[]);
            assert!(decoded.value.is_empty());
            assert!(decoded.is_clean());
        }

        #[test]
        fn units_in_wire_order() {
            let pdu: &[u8] = &[
                0x02, 0x42, 0x10, 0x20, // class 2, ACK 1, 2 bytes
                0x05, 0xC0, // class 5, ACK 3, empty
            ];
            let decoded = UnitBlock::decode_pdu(pdu);
            assert!(decoded.is_clean());
            let units = decoded.value.units();
            assert_eq!(units.len(), 2);
            assert_eq!(units[0].class_id(), 2);
            assert_eq!(units[0].ack(), Ack::DataClassUnknown);
            assert_eq!(units[0].payload(), &[0x10, 0x20]);
            assert_eq!(units[1].class(), DataClass::ReferenceValues);
            assert_eq!(units[1].ack(), Ack::IllegalOrBufferFull);
            assert!(units[1].is_empty());
        }

        #[test]
        fn truncated_unit_is_dropped() {
            let pdu: &[u8] = &[
                0x02, 0x01, 0x10, // complete
                0x04, 0x83, 0x01, // declares 3 bytes, only 1 present
            ];
            let decoded = UnitBlock::decode_pdu(pdu);
            assert_eq!(decoded.value.len(), 1);
            assert_eq!(decoded.value.units()[0].payload(), &[0x10]);
            assert_eq!(
                decoded.warnings,
                [DecodeWarning::UnitTruncated {
                    offset: 3,
                    declared: 3,
                    available: 1,
                }]
            );
        }

        #[test]
        fn trailing_request_from_slave_byte_is_ignored() {
            let pdu: &[u8] = &[0x03, 0x00, 0x7E];
            let decoded = UnitBlock::decode_pdu(pdu);
            assert_eq!(decoded.value.len(), 1);
            assert!(decoded.is_clean());
        }
    }

    mod decode_telegram_buffer {
        use super::*;

        #[test]
        fn skips_header_and_crc() {
            let buf: &[u8] = &[0x27, 0x04, 0x01, 0x02, 0x03, 0x00, 0x2A, 0x72];
            let decoded = UnitBlock::decode(buf);
            assert!(decoded.is_clean());
            assert_eq!(decoded.value.units(), &[DataUnit::new(3, 0)]);
        }

        #[test]
        fn short_buffers_yield_no_units() {
            for len in 0..=7 {
                let buf = &[0x27, 0x04, 0x01, 0x02, 0x03, 0x00, 0x2A][..len];
                let decoded = UnitBlock::decode(buf);
                assert!(decoded.value.is_empty(), "len = {len}");
            }
        }

        #[test]
        fn data_may_reach_into_crc_bytes() {
            // The APDU declares 2 data bytes but only the CRC follows.
            let buf: &[u8] = &[0x24, 0x04, 0x01, 0x20, 0x02, 0x02, 0x55, 0xAA];
            let decoded = UnitBlock::decode(buf);
            assert!(decoded.is_clean());
            assert_eq!(decoded.value.units()[0].payload(), &[0x55, 0xAA]);

            // The stripped PDU has no such bytes.
            let decoded = UnitBlock::decode_pdu(&buf[4..6]);
            assert!(decoded.value.is_empty());
            assert_eq!(decoded.warnings.len(), 1);
        }

        #[test]
        fn frame_cut_inside_crc_keeps_complete_unit() {
            let buf: &[u8] = &[
                0x27, // start delimiter
                0x07, // length
                0x20, // destination
                0x01, // source
                0x02, // class
                0x03, // GET, 3 bytes
                0x10, // item
                0x1A, // item
                0x1B, // item
                0xF1, // crc
                      // missing crc second byte
            ];
            let decoded = UnitBlock::decode(buf);
            assert!(decoded.is_clean());
            assert_eq!(decoded.value.len(), 1);
            assert_eq!(decoded.value.units()[0].payload(), &[0x10, 0x1A, 0x1B]);
        }

        #[test]
        fn unit_past_buffer_end_is_truncated() {
            let buf: &[u8] = &[
                0x24, // start delimiter
                0x09, // length
                0x01, // destination
                0x20, // source
                0x03, // class
                0x00, // ACK OK, empty
                0x02, // class
                0x05, // ACK OK, 5 bytes
                0x10, //
                0x11, // -- end of buffer
            ];
            let decoded = UnitBlock::decode(buf);
            assert_eq!(decoded.value.units(), &[DataUnit::new(3, 0)]);
            assert_eq!(
                decoded.warnings,
                [DecodeWarning::UnitTruncated {
                    offset: 2,
                    declared: 5,
                    available: 2,
                }]
            );
        }

        #[test]
        fn no_unit_starts_in_last_two_bytes() {
            let buf: &[u8] = &[0x27, 0x04, 0x01, 0x02, 0x03, 0x00, 0x07, 0x00];
            let decoded = UnitBlock::decode(buf);
            assert_eq!(decoded.value.units(), &[DataUnit::new(3, 0)]);
        }
    }

    #[test]
    fn display_warnings() {
        use alloc::string::ToString;
        assert_eq!(
            DecodeWarning::LengthMismatch {
                declared: 9,
                actual: 4
            }
            .to_string(),
            "Length Mismatch: Length Field: 9, received: 4"
        );
        assert_eq!(
            DecodeWarning::HeaderTruncated { len: 2 }.to_string(),
            "Telegram header truncated: 2 byte(s) received"
        );
    }

    #[test]
    fn map_decoded_value() {
        let decoded = UnitBlock::decode_pdu(&[0x02, 0x02, 0x10]);
        assert!(!decoded.is_clean());
        let mapped = decoded.map(|block| block.len());
        assert_eq!(mapped.value, 0);
        assert_eq!(mapped.warnings.len(), 1);
        assert_eq!(mapped.into_value(), 0);
    }
}
