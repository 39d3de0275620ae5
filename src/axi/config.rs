use serde::Deserialize;

/// Optional signals present on an address channel.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AxCfg {
    pub has_lock: bool,
    pub has_cache: bool,
    pub has_prot: bool,
    pub has_qos: bool,
    pub has_region: bool,
    pub has_user: bool,
}

impl AxCfg {
    pub fn full() -> Self {
        Self {
            has_lock: true,
            has_cache: true,
            has_prot: true,
            has_qos: true,
            has_region: true,
            has_user: true,
        }
    }
}

/// Optional signals present on W, B or R.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DataCfg {
    pub has_user: bool,
}

pub type WCfg = DataCfg;
pub type BCfg = DataCfg;
pub type RCfg = DataCfg;

/// Naming and feature flags of one AXI4 port.
///
/// Channel `x` binds `<hierarchy>.<prefix>_x_valid`, `<hierarchy>.<prefix>_x_ready` and
/// `<hierarchy>.<prefix>_x_bits_<field>`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AxiBundleCfg {
    pub prefix: String,
    pub hierarchy: Option<String>,
    pub aw: AxCfg,
    pub w: WCfg,
    pub b: BCfg,
    pub ar: AxCfg,
    pub r: RCfg,
}

impl Default for AxiBundleCfg {
    fn default() -> Self {
        Self {
            prefix: "axi".to_string(),
            hierarchy: None,
            aw: AxCfg::default(),
            w: WCfg::default(),
            b: BCfg::default(),
            ar: AxCfg::default(),
            r: RCfg::default(),
        }
    }
}

impl AxiBundleCfg {
    pub fn channel_prefix(&self, channel: &str) -> String {
        format!("{}_{}", self.prefix, channel)
    }
}
