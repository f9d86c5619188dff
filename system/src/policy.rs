use std::env;

/// What to do with an inbound frame that is not a protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedFramePolicy {
    /// Broadcast the raw frame as a chat message under the sender's current
    /// display name.
    Relay,
    /// Discard the frame.
    Drop,
}

/// Shape of the presence broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceFormat {
    /// `user_list` carrying every display name in join order.
    Roster,
    /// `count` carrying the number of connected clients.
    Count,
}

#[derive(Debug, Clone, Copy)]
pub struct RelayPolicy {
    pub malformed: MalformedFramePolicy,
    pub presence: PresenceFormat,
}

impl Default for RelayPolicy {
    fn default() -> Self {
        Self {
            malformed: MalformedFramePolicy::Drop,
            presence: PresenceFormat::Roster,
        }
    }
}

impl RelayPolicy {
    /// Reads `CHAT_RELAY_MALFORMED` (`drop`/`relay`) and `CHAT_RELAY_PRESENCE`
    /// (`list`/`count`); unrecognized values keep the default.
    pub fn from_env() -> Self {
        let mut policy = Self::default();
        if let Ok(value) = env::var("CHAT_RELAY_MALFORMED") {
            match value.as_str() {
                "drop" => policy.malformed = MalformedFramePolicy::Drop,
                "relay" => policy.malformed = MalformedFramePolicy::Relay,
                other => log::warn!("Unknown CHAT_RELAY_MALFORMED value: {}", other),
            }
        }
        if let Ok(value) = env::var("CHAT_RELAY_PRESENCE") {
            match value.as_str() {
                "list" => policy.presence = PresenceFormat::Roster,
                "count" => policy.presence = PresenceFormat::Count,
                other => log::warn!("Unknown CHAT_RELAY_PRESENCE value: {}", other),
            }
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_to_dropping_malformed_frames_and_roster_presence() {
        let policy = RelayPolicy::default();
        assert_eq!(policy.malformed, MalformedFramePolicy::Drop);
        assert_eq!(policy.presence, PresenceFormat::Roster);
    }
}
