// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

/// genibus-core Error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// APDU payload exceeds the 6 bit length field
    PayloadTooLong(usize),
    /// Telegram length does not fit into the length byte
    TelegramTooLong(usize),
    /// Invalid buffer size
    BufferSize,
    /// Invalid start delimiter
    StartDelimiter(u8),
    /// Invalid length field
    LengthField(u8),
    /// Invalid CRC
    Crc(u16, u16),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;

        match self {
            PayloadTooLong(len) => write!(f, "APDU payload too long: {len} byte(s), max. 63"),
            TelegramTooLong(len) => {
                write!(f, "Telegram too long: length field would be {len}, max. 255")
            }
            BufferSize => write!(f, "Invalid buffer size"),
            StartDelimiter(sd) => write!(f, "Invalid start delimiter: 0x{sd:0>2X}"),
            LengthField(len) => write!(f, "Invalid length field: {len}"),
            Crc(expected, actual) => write!(
                f,
                "Invalid CRC: expected = 0x{expected:0>4X}, actual = 0x{actual:0>4X}"
            ),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_errors() {
        assert_eq!(
            Error::PayloadTooLong(64).to_string(),
            "APDU payload too long: 64 byte(s), max. 63"
        );
        assert_eq!(
            Error::StartDelimiter(0x42).to_string(),
            "Invalid start delimiter: 0x42"
        );
        assert_eq!(
            Error::Crc(0x2A72, 0x0001).to_string(),
            "Invalid CRC: expected = 0x2A72, actual = 0x0001"
        );
    }
}
