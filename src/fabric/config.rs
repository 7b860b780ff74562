//! 仿真配置

use serde::{Deserialize, Serialize};

use crate::net::EcmpMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// 单个叶子端口的容量（bytes/s），也是叶内本地交换的线速。
    #[serde(default = "default_port_capacity")]
    pub port_capacity: f64,
    #[serde(default)]
    pub ecmp: EcmpMode,
    /// 记录每次速率变化，用于事后检查容量与字节守恒。
    #[serde(default)]
    pub record_rates: bool,
}

fn default_port_capacity() -> f64 {
    // 10 Gbps
    1.25e9
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            port_capacity: default_port_capacity(),
            ecmp: EcmpMode::default(),
            record_rates: false,
        }
    }
}
