//! 流记录
//!
//! 一条单向数据传输。`remaining` 在 Active 期间只减不增，
//! 归零时恰好转入 Completed；路径在进入网络时确定，此后不变。

use crate::net::{FlowId, LinkId};
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Pending,
    Active,
    Completed,
}

/// 流占用的路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPath {
    /// 源叶与目的叶相同，在叶交换机内本地交换，不占用 fabric 链路。
    Local { leaf: usize },
    /// 源叶上行 + 目的叶下行
    Fabric { spine: usize, links: [LinkId; 2] },
}

impl FlowPath {
    pub fn links(&self) -> &[LinkId] {
        match self {
            FlowPath::Local { .. } => &[],
            FlowPath::Fabric { links, .. } => links,
        }
    }

    pub fn spine(&self) -> Option<usize> {
        match self {
            FlowPath::Local { .. } => None,
            FlowPath::Fabric { spine, .. } => Some(*spine),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Flow {
    pub id: FlowId,
    pub src_leaf: usize,
    pub dst_leaf: usize,
    pub size_bytes: u64,
    pub arrival: SimTime,
    /// 优先级系数，> 0
    pub weight: f64,
    pub ecmp_hash: u64,
    pub(crate) remaining: f64,
    pub(crate) path: Option<FlowPath>,
    pub(crate) state: FlowState,
    pub(crate) completion: Option<SimTime>,
}

impl Flow {
    pub fn new(
        id: FlowId,
        src_leaf: usize,
        dst_leaf: usize,
        size_bytes: u64,
        arrival: SimTime,
        weight: f64,
        ecmp_hash: u64,
    ) -> Self {
        Self {
            id,
            src_leaf,
            dst_leaf,
            size_bytes,
            arrival,
            weight,
            ecmp_hash,
            remaining: size_bytes as f64,
            path: None,
            state: FlowState::Pending,
            completion: None,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn path(&self) -> Option<FlowPath> {
        self.path
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn completion(&self) -> Option<SimTime> {
        self.completion
    }

    pub fn is_local(&self) -> bool {
        self.src_leaf == self.dst_leaf
    }
}
