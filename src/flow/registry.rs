//! 流注册表
//!
//! 按 flow id 持有全部流记录。所有修改都由事件处理驱动，没有并发写者。

use std::collections::HashMap;

use tracing::{debug, info};

use super::record::{Flow, FlowPath, FlowState};
use crate::error::SimError;
use crate::net::FlowId;
use crate::sim::SimTime;

#[derive(Debug, Default)]
pub struct FlowRegistry {
    flows: HashMap<FlowId, Flow>,
}

impl FlowRegistry {
    /// 以 Pending 状态登记新流
    pub fn admit(&mut self, flow: Flow) -> Result<(), SimError> {
        if self.flows.contains_key(&flow.id) {
            return Err(SimError::DuplicateFlow(flow.id));
        }
        debug!(flow_id = %flow.id, size_bytes = flow.size_bytes, "登记新流");
        self.flows.insert(flow.id, flow);
        Ok(())
    }

    /// 撤回一条尚未到达的流
    pub(crate) fn withdraw(&mut self, id: FlowId) -> Option<Flow> {
        if self.flows.get(&id)?.state != FlowState::Pending {
            return None;
        }
        self.flows.remove(&id)
    }

    /// Pending → Active
    pub fn mark_active(&mut self, id: FlowId) -> Result<(), SimError> {
        let flow = self.get_mut(id)?;
        if flow.state != FlowState::Pending {
            return Err(SimError::invariant(format!(
                "flow {id} activated from state {:?}",
                flow.state
            )));
        }
        flow.state = FlowState::Active;
        Ok(())
    }

    /// 记录流的路径，只能设置一次。
    pub fn assign_path(&mut self, id: FlowId, path: FlowPath) -> Result<(), SimError> {
        let flow = self.get_mut(id)?;
        if let Some(old) = flow.path {
            return Err(SimError::invariant(format!(
                "flow {id} already routed over {old:?}"
            )));
        }
        flow.path = Some(path);
        Ok(())
    }

    /// 扣减剩余字节（下限为 0）；归零时转入 Completed 并记录完成时刻。
    ///
    /// 返回该流是否因此完成。
    pub fn apply_bytes_sent(
        &mut self,
        id: FlowId,
        bytes: f64,
        now: SimTime,
    ) -> Result<bool, SimError> {
        let flow = self.get_mut(id)?;
        if flow.state != FlowState::Active {
            return Err(SimError::invariant(format!(
                "bytes applied to flow {id} in state {:?}",
                flow.state
            )));
        }
        if bytes.is_nan() || bytes < 0.0 {
            return Err(SimError::invariant(format!(
                "flow {id} sent a negative byte count {bytes}"
            )));
        }
        flow.remaining = (flow.remaining - bytes).max(0.0);
        if flow.remaining > 0.0 {
            return Ok(false);
        }
        flow.state = FlowState::Completed;
        flow.completion = Some(now);
        info!(flow_id = %id, completion = now.as_secs(), "🏁 流完成");
        Ok(true)
    }

    pub fn is_complete(&self, id: FlowId) -> bool {
        self.flows
            .get(&id)
            .is_some_and(|f| f.state == FlowState::Completed)
    }

    pub fn remaining(&self, id: FlowId) -> Option<f64> {
        self.flows.get(&id).map(|f| f.remaining)
    }

    pub fn get(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get(&id)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn count_in(&self, state: FlowState) -> usize {
        self.flows.values().filter(|f| f.state == state).count()
    }

    /// 按 flow id 升序遍历
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Flow> {
        let mut flows: Vec<&Flow> = self.flows.values().collect();
        flows.sort_by_key(|f| f.id);
        flows.into_iter()
    }

    fn get_mut(&mut self, id: FlowId) -> Result<&mut Flow, SimError> {
        self.flows
            .get_mut(&id)
            .ok_or_else(|| SimError::invariant(format!("flow {id} is not registered")))
    }
}
