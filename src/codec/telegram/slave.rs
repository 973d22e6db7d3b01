// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GENIbus slave specific functions.
use super::*;

/// Decode a data request (or data message) with verified checksum.
pub fn decode_request(buf: &[u8]) -> Result<Option<Decoded<Telegram>>> {
    if buf.is_empty() {
        return Ok(None);
    }
    decode(DecoderType::Request, buf).map(|frame| {
        frame.map(|(frame, _frame_pos)| {
            let request = frame.to_telegram();
            #[cfg(feature = "log")]
            request.log_warnings();
            request
        })
    })
}

/// Encode a data reply or an unsolicited data message.
pub fn encode_reply(telegram: &Telegram, buf: &mut [u8]) -> Result<usize> {
    let sd = telegram.start_delimiter;
    if sd != StartDelimiter::DataReply && sd != StartDelimiter::DataMessage {
        return Err(Error::StartDelimiter(telegram.start_delimiter.value()));
    }
    telegram.encode(buf)
}
