//! # pmu-sync
//!
//! A bit-exact IEEE C37.118.2 synchrophasor frame codec, plus a UDP
//! service that estimates and corrects per-client clock offset.
//!
//! The codec ([`frame`]) encodes and decodes configuration, data, header,
//! and command frames; the offset service ([`offset`], [`reply`],
//! [`transport`], [`server`], [`client`]) receives timestamped frames from
//! many clients, tracks per-client clock offset with three online
//! estimators, and replies with a scheme-tagged correction.

pub mod client;
pub mod constants;
pub mod error;
pub mod frame;
pub mod logging;
pub mod offset;
pub mod reply;
pub mod server;
pub mod transport;
pub mod util;

pub use error::PmuError;
pub use frame::{decode, Frame};
