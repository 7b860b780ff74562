//! pFabric 式调度：剩余字节最少的流严格优先。
//!
//! 流按 (remaining, flow id) 升序分组，剩余字节相同的流为一组。
//! 每组在前面各组用剩的容量上做加权注水，因此高优先级流先拿到它路径上
//! 能用的全部带宽，剩余容量再逐级下放。
//!
//! 同组内单位权重速率不同的流并不真正并列：快的一方下一瞬间剩余就更少。
//! 这样的组按单位权重速率从高到低拆开重算，直到每组内部一致。

use std::collections::HashMap;

use tracing::trace;

use super::water_fill::water_fill;
use super::{Demand, RateAllocator, Reorder, SATURATION_EPS, SchedulingMethod, verify_capacity};
use crate::error::SimError;
use crate::net::LinkId;

#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestRemainingFirst;

impl RateAllocator for ShortestRemainingFirst {
    fn method(&self) -> SchedulingMethod {
        SchedulingMethod::Pfabric
    }

    fn allocate(
        &self,
        demands: &[Demand],
        capacity: &HashMap<LinkId, f64>,
    ) -> Result<Vec<f64>, SimError> {
        let mut classes = priority_classes(demands, &by_remaining(demands));
        // 每轮要么组数增加，要么结束，组数不超过流数。
        loop {
            let mut rates = vec![0.0; demands.len()];
            let mut residual = capacity.clone();
            for group in &classes {
                trace!(
                    class_size = group.len(),
                    remaining = demands[group[0]].remaining,
                    "分配优先级组"
                );
                water_fill(demands, group, &mut residual, capacity, &mut rates)?;
            }
            let refined = split_by_share(demands, &classes, &rates);
            if refined.len() == classes.len() {
                verify_capacity(demands, &rates, capacity)?;
                return Ok(rates);
            }
            trace!(from = classes.len(), to = refined.len(), "拆分并列组");
            classes = refined;
        }
    }

    /// 相邻两组之间，前一组最慢的流与后一组最快的流最先相遇。
    fn next_reorder(&self, demands: &[Demand], rates: &[f64]) -> Option<Reorder> {
        let classes = priority_classes(demands, &by_remaining(demands));
        let mut next: Option<Reorder> = None;
        for pair in classes.windows(2) {
            let slowest = pair[0]
                .iter()
                .copied()
                .min_by(|&a, &b| rates[a].total_cmp(&rates[b]));
            let fastest = pair[1]
                .iter()
                .copied()
                .max_by(|&a, &b| rates[a].total_cmp(&rates[b]));
            let (Some(a), Some(b)) = (slowest, fastest) else {
                continue;
            };
            let closing = rates[b] - rates[a];
            if closing <= 0.0 {
                continue;
            }
            let after = (demands[b].remaining - demands[a].remaining) / closing;
            if !(after.is_finite() && after > 0.0) {
                continue;
            }
            if next.is_none_or(|n| after < n.after) {
                next = Some(Reorder {
                    after,
                    ahead: demands[a].flow,
                    behind: demands[b].flow,
                });
            }
        }
        next
    }
}

fn by_remaining(demands: &[Demand]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..demands.len()).collect();
    order.sort_by(|&a, &b| {
        demands[a]
            .remaining
            .total_cmp(&demands[b].remaining)
            .then(demands[a].flow.cmp(&demands[b].flow))
    });
    order
}

/// 把已排序的下标切成剩余字节相同的组（相对容差内视为相同）。
fn priority_classes(demands: &[Demand], order: &[usize]) -> Vec<Vec<usize>> {
    let mut classes: Vec<Vec<usize>> = Vec::new();
    let mut leader = f64::NAN;
    for &i in order {
        let rem = demands[i].remaining;
        if !classes.is_empty() && nearly_equal(leader, rem) {
            if let Some(class) = classes.last_mut() {
                class.push(i);
            }
            continue;
        }
        leader = rem;
        classes.push(vec![i]);
    }
    classes
}

/// 组内按单位权重速率从高到低拆开；速率一致的组原样保留。
fn split_by_share(demands: &[Demand], classes: &[Vec<usize>], rates: &[f64]) -> Vec<Vec<usize>> {
    let share = |i: usize| rates[i] / demands[i].weight;
    let mut out: Vec<Vec<usize>> = Vec::with_capacity(classes.len());
    for class in classes {
        let mut members = class.clone();
        members.sort_by(|&a, &b| {
            share(b)
                .total_cmp(&share(a))
                .then(demands[a].flow.cmp(&demands[b].flow))
        });
        let start = out.len();
        let mut leader = f64::NAN;
        for i in members {
            let s = share(i);
            if out.len() > start && nearly_equal(leader, s) {
                if let Some(group) = out.last_mut() {
                    group.push(i);
                }
                continue;
            }
            leader = s;
            out.push(vec![i]);
        }
    }
    out
}

fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= SATURATION_EPS * a.abs().max(b.abs())
}
