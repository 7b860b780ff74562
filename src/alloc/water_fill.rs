//! 加权 max-min 公平（注水算法）
//!
//! 每一轮给所有未冻结的流按权重同时加速，直到某条链路饱和；
//! 经过饱和链路的流被冻结，其余流继续下一轮。每轮至少饱和一条链路，
//! 因此轮数不超过参与分配的链路数。

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use super::{Demand, RateAllocator, SATURATION_EPS, SchedulingMethod, link_capacity, verify_capacity};
use crate::error::SimError;
use crate::net::LinkId;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxMinFair;

impl RateAllocator for MaxMinFair {
    fn method(&self) -> SchedulingMethod {
        SchedulingMethod::MaxMinFair
    }

    fn allocate(
        &self,
        demands: &[Demand],
        capacity: &HashMap<LinkId, f64>,
    ) -> Result<Vec<f64>, SimError> {
        let mut rates = vec![0.0; demands.len()];
        let mut residual = capacity.clone();
        let members: Vec<usize> = (0..demands.len()).collect();
        water_fill(demands, &members, &mut residual, capacity, &mut rates)?;
        verify_capacity(demands, &rates, capacity)?;
        Ok(rates)
    }
}

/// 在剩余容量 `residual` 上对 `members`（`demands` 的下标）做加权注水，
/// 分到的速率累加进 `rates`，并从 `residual` 中扣除。
pub(crate) fn water_fill(
    demands: &[Demand],
    members: &[usize],
    residual: &mut HashMap<LinkId, f64>,
    capacity: &HashMap<LinkId, f64>,
    rates: &mut [f64],
) -> Result<(), SimError> {
    for &i in members {
        let d = &demands[i];
        if !(d.weight.is_finite() && d.weight > 0.0) {
            return Err(SimError::invariant(format!(
                "flow {} has weight {}",
                d.flow, d.weight
            )));
        }
        if d.links.is_empty() {
            return Err(SimError::invariant(format!(
                "flow {} has no fabric link to allocate on",
                d.flow
            )));
        }
    }

    let mut unfrozen: Vec<usize> = members.to_vec();
    let mut round = 0_usize;
    loop {
        unfrozen.retain(|&i| {
            demands[i]
                .links
                .iter()
                .all(|l| residual.get(l).is_some_and(|&r| r > 0.0))
        });
        if unfrozen.is_empty() {
            return Ok(());
        }

        let mut weight_on: BTreeMap<LinkId, f64> = BTreeMap::new();
        for &i in &unfrozen {
            for &l in &demands[i].links {
                *weight_on.entry(l).or_default() += demands[i].weight;
            }
        }

        let mut delta = f64::INFINITY;
        for (l, ws) in &weight_on {
            let r = residual.get(l).copied().unwrap_or(0.0);
            delta = delta.min(r / ws);
        }
        if !(delta.is_finite() && delta > 0.0) {
            return Err(SimError::invariant(format!(
                "water-filling stalled with increment {delta}"
            )));
        }
        trace!(round, unfrozen = unfrozen.len(), delta, "注水一轮");

        for &i in &unfrozen {
            rates[i] += delta * demands[i].weight;
        }
        for (l, ws) in weight_on {
            let cap = link_capacity(capacity, l)?;
            let r = residual.entry(l).or_insert(cap);
            *r -= delta * ws;
            if *r < -cap * SATURATION_EPS {
                return Err(SimError::invariant(format!(
                    "link {l} residual capacity went negative ({r})"
                )));
            }
            if *r <= cap * SATURATION_EPS {
                *r = 0.0;
            }
        }
        round += 1;
    }
}
