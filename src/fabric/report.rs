//! 仿真结果

use serde::Serialize;

use crate::flow::Flow;
use crate::net::FlowId;
use crate::sim::SimTime;

/// 单条流的完成摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSummary {
    pub flow_id: FlowId,
    pub src_leaf: usize,
    pub dst_leaf: usize,
    /// 本地交换的流没有 spine
    pub spine: Option<usize>,
    pub size_bytes: u64,
    pub arrival_time: f64,
    pub completion_time: f64,
    /// size_bytes / (completion_time - arrival_time)
    pub average_rate: f64,
}

impl FlowSummary {
    pub(crate) fn from_flow(flow: &Flow) -> Option<Self> {
        let completion = flow.completion()?;
        let duration = completion.since(flow.arrival);
        let average_rate = if duration > 0.0 {
            flow.size_bytes as f64 / duration
        } else {
            f64::INFINITY
        };
        Some(Self {
            flow_id: flow.id,
            src_leaf: flow.src_leaf,
            dst_leaf: flow.dst_leaf,
            spine: flow.path().and_then(|p| p.spine()),
            size_bytes: flow.size_bytes,
            arrival_time: flow.arrival.as_secs(),
            completion_time: completion.as_secs(),
            average_rate,
        })
    }

    /// 流完成时间（FCT）
    pub fn fct(&self) -> f64 {
        self.completion_time - self.arrival_time
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    /// 按 flow id 升序
    pub summaries: Vec<FlowSummary>,
    pub events: u64,
    pub reallocations: u64,
    pub final_time: f64,
}

impl SimReport {
    pub fn mean_fct(&self) -> Option<f64> {
        if self.summaries.is_empty() {
            return None;
        }
        let total: f64 = self.summaries.iter().map(FlowSummary::fct).sum();
        Some(total / self.summaries.len() as f64)
    }

    pub fn summary(&self, flow_id: FlowId) -> Option<&FlowSummary> {
        self.summaries
            .binary_search_by_key(&flow_id, |s| s.flow_id)
            .ok()
            .map(|i| &self.summaries[i])
    }
}
