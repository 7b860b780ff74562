//! 速率分配
//!
//! 给定每条链路上的活跃流及其权重、剩余字节，计算满足链路容量约束的速率向量。
//! 分配器是纯函数：不持有可变状态，可以被反复调用。

mod srpt;
mod water_fill;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SimError;
use crate::net::{FlowId, LinkId};

pub use srpt::ShortestRemainingFirst;
pub use water_fill::MaxMinFair;

/// 链路饱和判定的相对容差
pub(crate) const SATURATION_EPS: f64 = 1e-9;

/// 一条参与分配的流
#[derive(Debug, Clone, PartialEq)]
pub struct Demand {
    pub flow: FlowId,
    pub weight: f64,
    pub remaining: f64,
    pub links: Vec<LinkId>,
}

/// 速率分配策略
pub trait RateAllocator: fmt::Debug {
    fn method(&self) -> SchedulingMethod;

    /// 返回与 `demands` 一一对应的端到端速率。
    ///
    /// `capacity` 必须覆盖 `demands` 中出现的每条链路。
    fn allocate(
        &self,
        demands: &[Demand],
        capacity: &HashMap<LinkId, f64>,
    ) -> Result<Vec<f64>, SimError>;

    /// 按 `rates` 推进时，优先级顺序最早何时改变。
    ///
    /// 优先级与剩余字节无关的策略不会自行换序，返回 `None`。
    fn next_reorder(&self, _demands: &[Demand], _rates: &[f64]) -> Option<Reorder> {
        None
    }
}

/// `after` 秒后 `behind` 的剩余字节追上 `ahead`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reorder {
    pub after: f64,
    pub ahead: FlowId,
    pub behind: FlowId,
}

/// 调度方法：配置时解析一次，之后不再按字符串分派。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulingMethod {
    /// 剩余字节最少者严格优先，剩余相同者按权重加权公平
    Pfabric,
    /// 全体流加权 max-min 公平
    MaxMinFair,
}

impl SchedulingMethod {
    pub fn name(self) -> &'static str {
        match self {
            SchedulingMethod::Pfabric => "pfabric",
            SchedulingMethod::MaxMinFair => "maxmin",
        }
    }

    pub fn allocator(self) -> Box<dyn RateAllocator> {
        match self {
            SchedulingMethod::Pfabric => Box::new(ShortestRemainingFirst),
            SchedulingMethod::MaxMinFair => Box::new(MaxMinFair),
        }
    }
}

impl fmt::Display for SchedulingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchedulingMethod {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pfabric" | "srpt" | "strict_priority" => Ok(SchedulingMethod::Pfabric),
            "maxmin" | "max_min" | "fair" | "fair_share" => Ok(SchedulingMethod::MaxMinFair),
            _ => Err(SimError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// 检查每条链路上分配的速率之和不超过容量。
pub fn verify_capacity(
    demands: &[Demand],
    rates: &[f64],
    capacity: &HashMap<LinkId, f64>,
) -> Result<(), SimError> {
    if demands.len() != rates.len() {
        return Err(SimError::invariant(format!(
            "{} rates returned for {} flows",
            rates.len(),
            demands.len()
        )));
    }
    let mut load: HashMap<LinkId, f64> = HashMap::new();
    for (d, &r) in demands.iter().zip(rates) {
        if !(r.is_finite() && r >= 0.0) {
            return Err(SimError::invariant(format!(
                "flow {} allocated rate {r}",
                d.flow
            )));
        }
        for l in &d.links {
            *load.entry(*l).or_default() += r;
        }
    }
    for (l, used) in load {
        let cap = link_capacity(capacity, l)?;
        if used > cap * (1.0 + SATURATION_EPS) {
            return Err(SimError::invariant(format!(
                "link {l} carries {used} over capacity {cap}"
            )));
        }
    }
    Ok(())
}

pub(crate) fn link_capacity(capacity: &HashMap<LinkId, f64>, l: LinkId) -> Result<f64, SimError> {
    match capacity.get(&l) {
        Some(&c) if c > 0.0 => Ok(c),
        Some(&c) => Err(SimError::invariant(format!("link {l} has capacity {c}"))),
        None => Err(SimError::invariant(format!("link {l} has no capacity entry"))),
    }
}
