//! Outbound message dispatch for the three delivery surfaces.
//!
//! Direct (C2C) and group sends need a `msg_seq`: replies take the next value
//! from the [`SeqTracker`] for the inbound message id, proactive sends always
//! use 1 and omit `msg_id`. Channel sends have no sequence at all.

use {reqwest::Method, serde::Serialize, tracing::debug};

use crate::{Result, api::ApiClient, seq::SeqTracker, types::SendResult};

/// `msg_type` for plain text.
const MSG_TYPE_TEXT: u8 = 0;
/// `msg_type` for rich media referencing an uploaded asset.
const MSG_TYPE_MEDIA: u8 = 7;
/// `msg_seq` of a proactive (non-reply) message.
const PROACTIVE_SEQ: u64 = 1;

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    content: &'a str,
    msg_type: u8,
    msg_seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MediaRef<'a> {
    file_info: &'a str,
}

#[derive(Debug, Serialize)]
struct MediaMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    msg_type: u8,
    media: MediaRef<'a>,
    msg_seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ChannelTextMessage<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Segment<'a> {
    Image { file_info: &'a str },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ChannelImageMessage<'a> {
    segments: Vec<Segment<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg_id: Option<&'a str>,
}

fn c2c_path(openid: &str) -> String {
    format!("/v2/users/{openid}/messages")
}

fn group_path(group_openid: &str) -> String {
    format!("/v2/groups/{group_openid}/messages")
}

fn channel_path(channel_id: &str) -> String {
    format!("/channels/{channel_id}/messages")
}

fn sequence(seqs: &SeqTracker, reply_to: Option<&str>) -> u64 {
    reply_to.map_or(PROACTIVE_SEQ, |id| seqs.next_seq(id))
}

async fn post<B: Serialize>(api: &ApiClient, token: &str, path: &str, body: &B) -> Result<SendResult> {
    api.request(token, Method::POST, path, Some(body)).await
}

/// Send text to a user. Without `reply_to` this is a proactive message.
pub async fn send_c2c_text(
    api: &ApiClient,
    seqs: &SeqTracker,
    token: &str,
    openid: &str,
    content: &str,
    reply_to: Option<&str>,
) -> Result<SendResult> {
    let msg_seq = sequence(seqs, reply_to);
    debug!(openid, msg_seq, reply = reply_to.is_some(), "sending c2c text");
    let body = TextMessage {
        content,
        msg_type: MSG_TYPE_TEXT,
        msg_seq,
        msg_id: reply_to,
    };
    post(api, token, &c2c_path(openid), &body).await
}

/// Send text to a group. Without `reply_to` this is a proactive message.
pub async fn send_group_text(
    api: &ApiClient,
    seqs: &SeqTracker,
    token: &str,
    group_openid: &str,
    content: &str,
    reply_to: Option<&str>,
) -> Result<SendResult> {
    let msg_seq = sequence(seqs, reply_to);
    debug!(group_openid, msg_seq, reply = reply_to.is_some(), "sending group text");
    let body = TextMessage {
        content,
        msg_type: MSG_TYPE_TEXT,
        msg_seq,
        msg_id: reply_to,
    };
    post(api, token, &group_path(group_openid), &body).await
}

/// Send text to a guild channel.
pub async fn send_channel_text(
    api: &ApiClient,
    token: &str,
    channel_id: &str,
    content: &str,
    reply_to: Option<&str>,
) -> Result<SendResult> {
    debug!(channel_id, reply = reply_to.is_some(), "sending channel text");
    let body = ChannelTextMessage {
        content,
        msg_id: reply_to,
    };
    post(api, token, &channel_path(channel_id), &body).await
}

/// Unsolicited text to a user; counts against the platform's monthly quota.
pub async fn send_proactive_c2c_text(
    api: &ApiClient,
    token: &str,
    openid: &str,
    content: &str,
) -> Result<SendResult> {
    send_c2c_text(api, &SeqTracker::new(), token, openid, content, None).await
}

/// Unsolicited text to a group; counts against the platform's monthly quota.
pub async fn send_proactive_group_text(
    api: &ApiClient,
    token: &str,
    group_openid: &str,
    content: &str,
) -> Result<SendResult> {
    send_group_text(api, &SeqTracker::new(), token, group_openid, content, None).await
}

/// Send an uploaded image to a user.
pub async fn send_c2c_image(
    api: &ApiClient,
    seqs: &SeqTracker,
    token: &str,
    openid: &str,
    asset_id: &str,
    caption: Option<&str>,
    reply_to: Option<&str>,
) -> Result<SendResult> {
    let msg_seq = sequence(seqs, reply_to);
    debug!(openid, msg_seq, reply = reply_to.is_some(), "sending c2c image");
    let body = MediaMessage {
        content: caption,
        msg_type: MSG_TYPE_MEDIA,
        media: MediaRef {
            file_info: asset_id,
        },
        msg_seq,
        msg_id: reply_to,
    };
    post(api, token, &c2c_path(openid), &body).await
}

/// Send an uploaded image to a group.
pub async fn send_group_image(
    api: &ApiClient,
    seqs: &SeqTracker,
    token: &str,
    group_openid: &str,
    asset_id: &str,
    caption: Option<&str>,
    reply_to: Option<&str>,
) -> Result<SendResult> {
    let msg_seq = sequence(seqs, reply_to);
    debug!(group_openid, msg_seq, reply = reply_to.is_some(), "sending group image");
    let body = MediaMessage {
        content: caption,
        msg_type: MSG_TYPE_MEDIA,
        media: MediaRef {
            file_info: asset_id,
        },
        msg_seq,
        msg_id: reply_to,
    };
    post(api, token, &group_path(group_openid), &body).await
}

/// Send an uploaded image to a guild channel, optionally followed by a caption.
pub async fn send_channel_image(
    api: &ApiClient,
    token: &str,
    channel_id: &str,
    asset_id: &str,
    caption: Option<&str>,
    reply_to: Option<&str>,
) -> Result<SendResult> {
    debug!(channel_id, reply = reply_to.is_some(), "sending channel image");
    let mut segments = vec![Segment::Image {
        file_info: asset_id,
    }];
    if let Some(text) = caption {
        segments.push(Segment::Text { text });
    }
    let body = ChannelImageMessage {
        segments,
        msg_id: reply_to,
    };
    post(api, token, &channel_path(channel_id), &body).await
}
