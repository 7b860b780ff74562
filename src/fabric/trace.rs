//! 速率轨迹
//!
//! 每条流的速率是分段常数；记录每次变化即可还原任意时刻的分配情况。

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::net::{FlowId, LinkId};
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateChange {
    pub time: SimTime,
    pub flow_id: FlowId,
    pub rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RateTrace {
    changes: Vec<RateChange>,
    /// 经过交换网络的流所占的链路；本地交换的流不在其中。
    #[serde(skip)]
    paths: HashMap<FlowId, Vec<LinkId>>,
}

impl RateTrace {
    pub(crate) fn record(&mut self, time: SimTime, flow_id: FlowId, rate: f64) {
        self.changes.push(RateChange {
            time,
            flow_id,
            rate,
        });
    }

    pub(crate) fn record_path(&mut self, flow_id: FlowId, links: &[LinkId]) {
        self.paths.insert(flow_id, links.to_vec());
    }

    /// 按记录顺序（即时间顺序）排列的全部变化
    pub fn changes(&self) -> &[RateChange] {
        &self.changes
    }

    /// 所有出现过变化的时刻，升序去重
    pub fn instants(&self) -> Vec<SimTime> {
        let mut ts: Vec<SimTime> = self.changes.iter().map(|c| c.time).collect();
        ts.dedup();
        ts
    }

    /// `at` 时刻（含同一时刻的全部变化）之后各流的速率；速率为 0 的流不列出。
    pub fn rates_at(&self, at: SimTime) -> HashMap<FlowId, f64> {
        let mut rates = HashMap::new();
        for c in self.changes.iter().take_while(|c| c.time <= at) {
            if c.rate > 0.0 {
                rates.insert(c.flow_id, c.rate);
            } else {
                rates.remove(&c.flow_id);
            }
        }
        rates
    }

    /// `at` 时刻各链路上的速率之和（只含经过交换网络的流）。
    pub fn link_load(&self, at: SimTime) -> BTreeMap<LinkId, f64> {
        let mut rates: Vec<(FlowId, f64)> = self.rates_at(at).into_iter().collect();
        rates.sort_by_key(|&(id, _)| id);
        let mut load = BTreeMap::new();
        for (id, rate) in rates {
            for &l in self.paths.get(&id).map(Vec::as_slice).unwrap_or_default() {
                *load.entry(l).or_insert(0.0) += rate;
            }
        }
        load
    }

    /// 对分段常数速率积分，得到流在 `until` 之前累计发送的字节数。
    pub fn bytes_delivered(&self, flow_id: FlowId, until: SimTime) -> f64 {
        let mut total = 0.0;
        let mut current: Option<(SimTime, f64)> = None;
        for c in self
            .changes
            .iter()
            .filter(|c| c.flow_id == flow_id)
            .take_while(|c| c.time <= until)
        {
            if let Some((since, rate)) = current {
                total += rate * c.time.since(since);
            }
            current = Some((c.time, c.rate));
        }
        if let Some((since, rate)) = current {
            total += rate * until.since(since);
        }
        total
    }
}
