//! Host-facing channel seam.
//!
//! A host runtime drives outbound delivery through [`ChannelOutbound`] and
//! health checks through [`ChannelStatus`] without knowing which platform
//! sits behind them.

pub mod error;
pub mod plugin;

pub use {
    error::{Error, Result},
    plugin::{ChannelHealthSnapshot, ChannelOutbound, ChannelStatus, OutboundMedia},
};
