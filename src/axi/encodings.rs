use std::fmt::{Display, Formatter};

use num_derive::FromPrimitive;

use crate::error::{BfmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    AW,
    W,
    B,
    AR,
    R,
}

impl Channel {
    pub fn is_addr_chnl(self) -> bool {
        matches!(self, Channel::AW | Channel::AR)
    }

    pub fn is_data_chnl(self) -> bool {
        matches!(self, Channel::W | Channel::R)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::AW => "AW",
            Channel::W => "W",
            Channel::B => "B",
            Channel::AR => "AR",
            Channel::R => "R",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive)]
pub enum BurstType {
    Fixed = 0,
    #[default]
    Incr = 1,
    Wrap = 2,
}

impl BurstType {
    pub fn decode(value: u64) -> Result<Self> {
        num_traits::FromPrimitive::from_u64(value).ok_or(BfmError::Encoding {
            field: "burst",
            value,
        })
    }

    pub fn encode(self) -> u64 {
        self as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive)]
pub enum RespType {
    #[default]
    Okay = 0,
    ExOkay = 1,
    SlvErr = 2,
    DecErr = 3,
}

impl RespType {
    pub fn decode(value: u64) -> Result<Self> {
        num_traits::FromPrimitive::from_u64(value).ok_or(BfmError::Encoding {
            field: "resp",
            value,
        })
    }

    pub fn encode(self) -> u64 {
        self as u64
    }

    pub fn is_error(self) -> bool {
        matches!(self, RespType::SlvErr | RespType::DecErr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_decodes_known_values_only() {
        assert_eq!(BurstType::decode(0).unwrap(), BurstType::Fixed);
        assert_eq!(BurstType::decode(2).unwrap(), BurstType::Wrap);
        assert!(matches!(
            BurstType::decode(3),
            Err(BfmError::Encoding { field: "burst", value: 3 })
        ));
    }

    #[test]
    fn resp_round_trips() {
        for resp in [RespType::Okay, RespType::ExOkay, RespType::SlvErr, RespType::DecErr] {
            assert_eq!(RespType::decode(resp.encode()).unwrap(), resp);
        }
        assert!(RespType::DecErr.is_error());
        assert!(!RespType::ExOkay.is_error());
    }
}
