//! Outbound client for the QQ open platform bot API.
//!
//! Covers app access token caching, per-reply `msg_seq` tracking, the
//! authenticated request wrapper, image upload, and text/image dispatch to
//! direct (C2C), group and guild channel surfaces. [`QqBotClient`] bundles
//! all per-account state; [`outbound::QqBotOutbound`] exposes it through the
//! host channel seam.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod media;
pub mod messages;
pub mod outbound;
pub mod seq;
pub mod target;
pub mod token;
pub mod types;

pub use {
    api::ApiClient,
    client::QqBotClient,
    config::QqBotAccountConfig,
    error::{Error, Result},
    outbound::QqBotOutbound,
    seq::SeqTracker,
    target::MessageTarget,
    token::{Clock, Credential, SystemClock, TokenCache},
    types::SendResult,
};
