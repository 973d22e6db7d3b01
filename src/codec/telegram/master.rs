// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GENIbus master specific functions.
use super::*;

/// Encode a data request.
pub fn encode_request(telegram: &Telegram, buf: &mut [u8]) -> Result<usize> {
    if telegram.start_delimiter != StartDelimiter::DataRequest {
        return Err(Error::StartDelimiter(telegram.start_delimiter.value()));
    }
    telegram.encode(buf)
}

/// Decode a data reply (or data message) with verified checksum.
pub fn decode_reply(buf: &[u8]) -> Result<Option<Decoded<Telegram>>> {
    if buf.is_empty() {
        return Ok(None);
    }
    decode(DecoderType::Reply, buf).map(|frame| {
        frame.map(|(frame, _frame_pos)| {
            let reply = frame.to_telegram();
            #[cfg(feature = "log")]
            reply.log_warnings();
            reply
        })
    })
}
