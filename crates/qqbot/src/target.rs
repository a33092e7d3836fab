use std::{fmt, str::FromStr};

use crate::Error;

/// Destination of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageTarget {
    /// Direct message to a user, by openid.
    C2c(String),
    /// Group chat, by group openid.
    Group(String),
    /// Guild text channel, by channel id.
    Channel(String),
}

impl MessageTarget {
    pub fn id(&self) -> &str {
        match self {
            Self::C2c(id) | Self::Group(id) | Self::Channel(id) => id,
        }
    }
}

/// Accepts `c2c:<id>`, `user:<id>`, `group:<id>`, `channel:<id>` or a bare
/// id, which is taken as a user openid.
impl FromStr for MessageTarget {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let invalid = || Error::InvalidTarget {
            target: raw.to_string(),
        };

        let (kind, id) = match raw.split_once(':') {
            Some((kind, id)) => (Some(kind), id.trim()),
            None => (None, raw),
        };
        if id.is_empty() {
            return Err(invalid());
        }

        match kind.map(str::to_ascii_lowercase).as_deref() {
            None | Some("c2c" | "user" | "private") => Ok(Self::C2c(id.to_string())),
            Some("group") => Ok(Self::Group(id.to_string())),
            Some("channel") => Ok(Self::Channel(id.to_string())),
            Some(_) => Err(invalid()),
        }
    }
}

impl fmt::Display for MessageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::C2c(id) => write!(f, "c2c:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
            Self::Channel(id) => write!(f, "channel:{id}"),
        }
    }
}
