//! 链路状态
//!
//! 每条链路上当前活跃的流集合，以及每条流当前分配到的端到端速率。
//! 只由驱动器在事件处理中修改。

use std::collections::{HashMap, HashSet};

use super::id::{FlowId, LinkId};
use crate::sim::SimTime;

/// 一条流当前的速率以及速率生效的起始时刻
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowRate {
    pub rate: f64,
    pub since: SimTime,
}

#[derive(Debug, Default)]
pub struct LinkState {
    active: Vec<HashSet<FlowId>>,
    rates: HashMap<FlowId, FlowRate>,
}

impl LinkState {
    pub fn new(num_links: usize) -> Self {
        Self {
            active: vec![HashSet::new(); num_links],
            rates: HashMap::new(),
        }
    }

    pub fn num_links(&self) -> usize {
        self.active.len()
    }

    /// 把流挂到链路上；重复挂载返回 false。
    pub fn attach(&mut self, link: LinkId, flow: FlowId) -> bool {
        self.active[link.0].insert(flow)
    }

    /// 从链路摘下流；不在链路上返回 false。
    pub fn detach(&mut self, link: LinkId, flow: FlowId) -> bool {
        self.active[link.0].remove(&flow)
    }

    pub fn flows_on(&self, link: LinkId) -> &HashSet<FlowId> {
        &self.active[link.0]
    }

    pub fn rate(&self, flow: FlowId) -> Option<FlowRate> {
        self.rates.get(&flow).copied()
    }

    pub fn set_rate(&mut self, flow: FlowId, rate: f64, since: SimTime) {
        self.rates.insert(flow, FlowRate { rate, since });
    }

    pub fn clear_rate(&mut self, flow: FlowId) -> Option<FlowRate> {
        self.rates.remove(&flow)
    }

    /// 链路上已分配速率之和
    pub fn load(&self, link: LinkId) -> f64 {
        let mut ids: Vec<FlowId> = self.active[link.0].iter().copied().collect();
        ids.sort_unstable();
        ids.iter()
            .filter_map(|f| self.rates.get(f))
            .map(|r| r.rate)
            .sum()
    }

    /// 所有链路上的活跃流总数（同一流在两条链路上计两次）
    pub fn attachments(&self) -> usize {
        self.active.iter().map(HashSet::len).sum()
    }
}
