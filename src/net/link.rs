//! 链路类型
//!
//! 叶-脊结构只有两类逻辑链路：叶上行（leaf→spine）和脊下行（spine→leaf）。
//! 同一叶子连到同一脊的多个物理端口聚合成一条逻辑链路。

/// 链路方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Uplink { leaf: usize, spine: usize },
    Downlink { spine: usize, leaf: usize },
}

/// 逻辑链路
#[derive(Debug, Clone)]
pub struct Link {
    pub kind: LinkKind,
    /// 聚合的物理端口数
    pub ports: usize,
    /// bytes/s
    pub capacity: f64,
}

impl Link {
    /// 创建新链路
    pub fn new(kind: LinkKind, ports: usize, port_capacity: f64) -> Self {
        Self {
            kind,
            ports,
            capacity: ports as f64 * port_capacity,
        }
    }
}
