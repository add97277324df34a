//! Minimal DNS frame handling for the catch-all responder.
//!
//! Only the fixed 12 byte header is parsed. The question section is treated as opaque bytes and
//! echoed back verbatim, followed by a single `A` record answer that points at the first question
//! name with a compressed-name pointer.
use std::net::Ipv4Addr;

pub const HEADER_LEN: usize = 12;
/// Pointer (`0b11` prefix) to offset 12, where the first question's name starts.
const NAME_POINTER: u16 = 0xC00C;
/// QR=1, Opcode=0, RD=1, RA=1, RCODE=0.
const RESPONSE_FLAGS: u16 = 0x8180;
const TYPE_A: u16 = 1;
const CLASS_IN: u16 = 1;
const ANSWER_TTL_SECS: u32 = 60;
const IPV4_RDATA_LEN: u16 = 4;
/// Name pointer, type, class, TTL, RDATA length and RDATA of the single answer record.
pub const ANSWER_LEN: usize = 2 + 2 + 2 + 4 + 2 + IPV4_RDATA_LEN as usize;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame is {actual} bytes, header needs {expected}")]
    Malformed { actual: usize, expected: usize },
}

/// Header fields of an inbound query plus its raw question section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery<'a> {
    pub transaction_id: [u8; 2],
    pub flags: u16,
    pub question_count: u16,
    pub question_section: &'a [u8],
}

/// Decode the header of a query frame.
///
/// # Errors
///
/// Returns [`FrameError::Malformed`] if the frame is shorter than the 12 byte DNS header.
pub fn decode_query_header(frame: &[u8]) -> Result<DnsQuery<'_>, FrameError> {
    if frame.len() < HEADER_LEN {
        return Err(FrameError::Malformed {
            actual: frame.len(),
            expected: HEADER_LEN,
        });
    }
    Ok(DnsQuery {
        transaction_id: [frame[0], frame[1]],
        flags: u16::from_be_bytes([frame[2], frame[3]]),
        question_count: u16::from_be_bytes([frame[4], frame[5]]),
        question_section: &frame[HEADER_LEN..],
    })
}

/// Build the response frame answering `query` with `address`.
///
/// The answer count mirrors the question count but only one answer record is ever appended, so
/// multi-question queries get an answer section shorter than advertised.
pub fn encode_response(query: &DnsQuery<'_>, address: Ipv4Addr) -> Vec<u8> {
    let mut response = Vec::with_capacity(response_len(query));
    response.extend_from_slice(&query.transaction_id);
    response.extend_from_slice(&RESPONSE_FLAGS.to_be_bytes());
    // QDCOUNT, ANCOUNT
    response.extend_from_slice(&query.question_count.to_be_bytes());
    response.extend_from_slice(&query.question_count.to_be_bytes());
    // NSCOUNT, ARCOUNT
    response.extend_from_slice(&[0, 0, 0, 0]);
    response.extend_from_slice(query.question_section);

    response.extend_from_slice(&NAME_POINTER.to_be_bytes());
    response.extend_from_slice(&TYPE_A.to_be_bytes());
    response.extend_from_slice(&CLASS_IN.to_be_bytes());
    response.extend_from_slice(&ANSWER_TTL_SECS.to_be_bytes());
    response.extend_from_slice(&IPV4_RDATA_LEN.to_be_bytes());
    response.extend_from_slice(&address.octets());
    response
}

/// Length of the frame [`encode_response`] produces for `query`.
pub fn response_len(query: &DnsQuery<'_>) -> usize {
    HEADER_LEN + query.question_section.len() + ANSWER_LEN
}
