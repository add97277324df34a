//! Catch-all DNS responder.
//!
//! While the portal is active every DNS query sent to the access point, whatever the name or
//! record type asked for, is answered with a single `A` record for the access point's own
//! address. Clients joining the network therefore resolve every host to the portal's HTTP
//! server, which is what triggers their captive-portal detection.
//!
//! E.g. with the access point at `192.168.4.1`:
//!
//! ```bash
//! ❯ dig @192.168.4.1 +short connectivitycheck.gstatic.com A
//! 192.168.4.1
//! ```
//!
//! The answer has a TTL of 60 seconds. Datagrams shorter than the 12 byte DNS header are dropped
//! without a reply.
//!
//! Only single-question queries get a fully consistent response: the answer count mirrors the
//! question count but a single answer record is appended.

pub mod codec;
pub mod responder;

pub use codec::{decode_query_header, encode_response, DnsQuery, FrameError};
pub use responder::DnsCatchallResponder;
