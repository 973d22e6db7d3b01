//! Common helpers

use crate::frame::MAX_PAYLOAD_LEN;

const LEN_MASK: u8 = 0x3F;
const OP_ACK_MASK: u8 = 0x03;
const OP_ACK_SHIFT: u8 = 6;

/// Pack OS/ACK and payload length into the second APDU header byte.
///
/// Only the lower two bits of `op_ack` and the lower six bits of `len` are used.
#[must_use]
pub const fn header_byte(op_ack: u8, len: usize) -> u8 {
    ((op_ack & OP_ACK_MASK) << OP_ACK_SHIFT) | (len as u8 & LEN_MASK)
}

/// Split the second APDU header byte into `(op_ack, len)`.
#[must_use]
pub const fn split_header_byte(byte: u8) -> (u8, usize) {
    ((byte >> OP_ACK_SHIFT) & OP_ACK_MASK, (byte & LEN_MASK) as usize)
}

/// `true` if `len` bytes fit into an APDU data field.
pub(crate) const fn fits_payload(len: usize) -> bool {
    len <= MAX_PAYLOAD_LEN
}
