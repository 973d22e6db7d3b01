// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GENIbus telegrams on a serial line

use super::*;
use alloc::vec;
use byteorder::{BigEndian, ByteOrder};

pub mod master;
pub mod slave;

/// An encoded telegram.
pub type TelegramBytes = ArrayVec<u8, MAX_TELEGRAM_LEN>;

/// CRC-CCITT generator polynomial.
const CRC_POLY: u16 = 0x1021;
const CRC_INIT: u16 = 0xFFFF;

/// The transmitted checksum is the inverted CRC.
const CRC_XOR_OUT: u16 = 0xFFFF;

const CRC_TABLE: [u16; 256] = crc_table(CRC_POLY);

const fn crc_table(poly: u16) -> [u16; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < table.len() {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ poly
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Calculate the CRC-CCITT sum (MSB first, initial value `0xFFFF`).
#[must_use]
pub fn crc_ccitt(data: &[u8]) -> u16 {
    data.iter().fold(CRC_INIT, |crc, &x| {
        (crc << 8) ^ CRC_TABLE[usize::from((crc >> 8) as u8 ^ x)]
    })
}

/// Calculate the telegram checksum over `data`.
///
/// `data` starts with the length byte and ends with the last PDU byte.
#[must_use]
pub fn checksum(data: &[u8]) -> u16 {
    crc_ccitt(data) ^ CRC_XOR_OUT
}

/// Check the trailing two checksum bytes of a complete telegram.
pub fn verify_checksum(buf: &[u8]) -> Result<()> {
    if buf.len() < TELEGRAM_HEADER_LEN + CRC_LEN {
        return Err(Error::BufferSize);
    }
    let (data, crc_buf) = buf.split_at(buf.len() - CRC_LEN);
    let expected_crc = BigEndian::read_u16(crc_buf);
    let actual_crc = checksum(&data[1..]);
    if expected_crc != actual_crc {
        return Err(Error::Crc(expected_crc, actual_crc));
    }
    Ok(())
}

impl Telegram {
    /// Encode the telegram into `buf`.
    ///
    /// The length byte and the checksum are computed from the current
    /// units. It returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let length = self.length();
        if length > MAX_LENGTH_FIELD {
            return Err(Error::TelegramTooLong(length));
        }
        let wire_len = self.wire_len();
        if buf.len() < wire_len {
            return Err(Error::BufferSize);
        }
        buf[0] = self.start_delimiter.value();
        buf[1] = length as u8;
        buf[2] = self.destination;
        buf[3] = self.source;
        let pdu_end = TELEGRAM_HEADER_LEN + self.units.encode(&mut buf[TELEGRAM_HEADER_LEN..])?;
        let crc = checksum(&buf[1..pdu_end]);
        BigEndian::write_u16(&mut buf[pdu_end..], crc);
        Ok(wire_len)
    }

    pub fn to_bytes(&self) -> Result<TelegramBytes> {
        let mut buf = [0; MAX_TELEGRAM_LEN];
        let len = self.encode(&mut buf)?;
        let mut bytes = TelegramBytes::from(buf);
        bytes.truncate(len);
        Ok(bytes)
    }

    /// Decode a complete telegram buffer as far as possible.
    ///
    /// Neither the start delimiter nor the checksum are verified and
    /// anomalies are reported as warnings instead of errors. The value is
    /// `None` only if the header itself is incomplete.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Decoded<Option<Self>> {
        if buf.len() < TELEGRAM_HEADER_LEN {
            let decoded = Decoded {
                value: None,
                warnings: vec![DecodeWarning::HeaderTruncated { len: buf.len() }],
            };
            #[cfg(feature = "log")]
            decoded.log_warnings();
            return decoded;
        }
        let declared = buf[1];
        let actual = buf.len().saturating_sub(TELEGRAM_HEADER_LEN + CRC_LEN) + ADDRESS_LEN;

        let Decoded {
            value: units,
            mut warnings,
        } = UnitBlock::decode(buf);
        if usize::from(declared) != actual {
            warnings.insert(0, DecodeWarning::LengthMismatch { declared, actual });
        }
        let mut telegram = Self::new(StartDelimiter::new(buf[0]), buf[2], buf[3]);
        telegram.units = units;

        let decoded = Decoded {
            value: Some(telegram),
            warnings,
        };
        #[cfg(feature = "log")]
        decoded.log_warnings();
        decoded
    }
}

/// The direction of the telegrams to extract from a byte stream.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderType {
    /// Master to slave: data requests and data messages.
    Request,
    /// Slave to master: data replies and data messages.
    Reply,
}

impl DecoderType {
    const fn accepts(self, start_delimiter: StartDelimiter) -> bool {
        matches!(
            (self, StartDelimiter::new(start_delimiter.value())),
            (_, StartDelimiter::DataMessage)
                | (Self::Request, StartDelimiter::DataRequest)
                | (Self::Reply, StartDelimiter::DataReply)
        )
    }

    #[cfg(feature = "log")]
    const fn name(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Reply => "reply",
        }
    }
}

/// A telegram with verified checksum, borrowed from the receive buffer.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame<'a> {
    pub start_delimiter: StartDelimiter,
    pub destination: Address,
    pub source: Address,
    pub pdu: &'a [u8],
}

impl DecodedFrame<'_> {
    /// Decode the units of the PDU.
    #[must_use]
    pub fn to_telegram(&self) -> Decoded<Telegram> {
        UnitBlock::decode_pdu(self.pdu).map(|units| {
            let mut telegram = Telegram::new(self.start_delimiter, self.destination, self.source);
            telegram.units = units;
            telegram
        })
    }
}

/// Decode telegrams from a buffer.
///
/// Leading bytes that don't start a valid telegram are dropped.
pub fn decode(
    decoder_type: DecoderType,
    buf: &[u8],
) -> Result<Option<(DecodedFrame<'_>, FrameLocation)>> {
    let mut drop_cnt = 0;

    if buf.is_empty() {
        return Err(Error::BufferSize);
    }

    loop {
        let mut retry = false;
        if drop_cnt + 1 >= buf.len() {
            return Ok(None);
        }
        let raw_frame = &buf[drop_cnt..];
        let res = telegram_len(decoder_type, raw_frame)
            .and_then(|frame_len| {
                let Some(frame_len) = frame_len else {
                    // Incomplete frame
                    return Ok(None);
                };
                extract_frame(raw_frame, frame_len).map(|x| {
                    x.map(|res| {
                        let frame_location = FrameLocation {
                            start: drop_cnt,
                            size: frame_len,
                        };
                        (res, frame_location)
                    })
                })
            })
            .or_else(|err| {
                if drop_cnt + 1 >= MAX_TELEGRAM_LEN {
                    #[cfg(feature = "log")]
                    log::error!(
                        "Giving up to decode telegram after dropping {drop_cnt} byte(s): {:X?}",
                        &buf[0..drop_cnt]
                    );
                    return Err(err);
                }
                #[cfg(feature = "log")]
                log::warn!("Failed to decode {} telegram: {err}", decoder_type.name());
                drop_cnt += 1;
                retry = true;
                Ok(None)
            });

        if !retry {
            return res;
        }
    }
}

/// Extract a telegram of `frame_len` bytes out of a buffer.
///
/// Bytes behind the telegram are ignored.
pub fn extract_frame(buf: &[u8], frame_len: usize) -> Result<Option<DecodedFrame<'_>>> {
    if buf.is_empty() || frame_len < TELEGRAM_HEADER_LEN + CRC_LEN {
        return Err(Error::BufferSize);
    }
    if buf.len() < frame_len {
        // Incomplete frame
        return Ok(None);
    }
    let (frame, _) = buf.split_at(frame_len);
    verify_checksum(frame)?;
    Ok(Some(DecodedFrame {
        start_delimiter: StartDelimiter::new(frame[0]),
        destination: frame[2],
        source: frame[3],
        pdu: &frame[TELEGRAM_HEADER_LEN..frame_len - CRC_LEN],
    }))
}

/// Extract the telegram length out of the first two bytes of a buffer.
pub fn telegram_len(decoder_type: DecoderType, buf: &[u8]) -> Result<Option<usize>> {
    let Some(&sd) = buf.first() else {
        return Ok(None);
    };
    if !decoder_type.accepts(StartDelimiter::new(sd)) {
        return Err(Error::StartDelimiter(sd));
    }
    let Some(&length) = buf.get(1) else {
        return Ok(None);
    };
    if usize::from(length) < ADDRESS_LEN {
        return Err(Error::LengthField(length));
    }
    Ok(Some(TELEGRAM_HEADER_LEN + usize::from(length) - ADDRESS_LEN + CRC_LEN))
}
