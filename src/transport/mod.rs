//! UDP transport: datagram send/receive wrappers for the server and client
//! sides (spec §2, component 8; spec §4.8).

pub mod udp_client;
pub mod udp_server;
