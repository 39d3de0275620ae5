use serde::Serialize;

use crate::axi::encodings::Channel;

/// Handshakes observed per channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelCounters {
    pub aw: u64,
    pub w: u64,
    pub b: u64,
    pub ar: u64,
    pub r: u64,
}

impl ChannelCounters {
    pub fn bump(&mut self, channel: Channel) {
        *self.get_mut(channel) += 1;
    }

    pub fn get(&self, channel: Channel) -> u64 {
        match channel {
            Channel::AW => self.aw,
            Channel::W => self.w,
            Channel::B => self.b,
            Channel::AR => self.ar,
            Channel::R => self.r,
        }
    }

    fn get_mut(&mut self, channel: Channel) -> &mut u64 {
        match channel {
            Channel::AW => &mut self.aw,
            Channel::W => &mut self.w,
            Channel::B => &mut self.b,
            Channel::AR => &mut self.ar,
            Channel::R => &mut self.r,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    pub name: String,
    pub handshakes: ChannelCounters,
    pub writes_completed: u64,
    pub reads_completed: u64,
    /// Responses that came back SLVERR or DECERR.
    pub error_responses: u64,
}

impl AgentStats {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn completed(&self) -> u64 {
        self.writes_completed + self.reads_completed
    }
}
