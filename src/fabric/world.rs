//! 仿真世界
//!
//! 持有拓扑、流注册表、链路状态与速率分配器。每个事件都在这里原子地
//! 更新状态：先把受影响的流推进到当前时刻，再重新分配速率，最后为速率
//! 改变的流重新预测完成时刻。

use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info, trace};

use super::events::{RecomputeOrComplete, Reprioritize};
use super::trace::RateTrace;
use crate::alloc::{Demand, RateAllocator, Reorder, verify_capacity};
use crate::error::SimError;
use crate::flow::{Flow, FlowPath, FlowRegistry, FlowState};
use crate::net::{EcmpSelector, FlowId, LinkId, LinkState};
use crate::sim::{SimTime, Simulator, World};
use crate::topo::LeafSpineTopology;

/// 已调度的完成预测。事件携带的 epoch 与此不一致即为过期事件。
#[derive(Debug, Clone, Copy, PartialEq)]
struct Projection {
    epoch: u64,
    at: SimTime,
}

pub struct FabricWorld {
    pub(crate) topo: LeafSpineTopology,
    pub(crate) flows: FlowRegistry,
    pub(crate) links: LinkState,
    allocator: Box<dyn RateAllocator>,
    ecmp: EcmpSelector,
    projections: HashMap<FlowId, Projection>,
    /// 每次速率改变都换一个新 epoch；换序事件据此判断是否过期。
    rate_epochs: HashMap<FlowId, u64>,
    pending_reorders: HashSet<Reprioritize>,
    next_epoch: u64,
    pub(crate) trace: Option<RateTrace>,
    pub(crate) reallocations: u64,
}

impl World for FabricWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl FabricWorld {
    pub fn new(
        topo: LeafSpineTopology,
        allocator: Box<dyn RateAllocator>,
        ecmp: EcmpSelector,
        record_rates: bool,
    ) -> Self {
        let links = LinkState::new(topo.links().len());
        Self {
            topo,
            flows: FlowRegistry::default(),
            links,
            allocator,
            ecmp,
            projections: HashMap::new(),
            rate_epochs: HashMap::new(),
            pending_reorders: HashSet::new(),
            next_epoch: 0,
            trace: record_rates.then(RateTrace::default),
            reallocations: 0,
        }
    }

    pub fn topology(&self) -> &LeafSpineTopology {
        &self.topo
    }

    pub fn registry(&self) -> &FlowRegistry {
        &self.flows
    }

    pub fn link_state(&self) -> &LinkState {
        &self.links
    }

    pub fn allocator(&self) -> &dyn RateAllocator {
        self.allocator.as_ref()
    }

    /// 流到达：激活、选路、挂上链路并重新分配。
    #[tracing::instrument(skip(self, sim), fields(now = sim.now().as_secs()))]
    pub(crate) fn on_arrival(&mut self, id: FlowId, sim: &mut Simulator) -> Result<(), SimError> {
        let now = sim.now();
        self.flows.mark_active(id)?;
        let (src, dst, hash, local) = {
            let flow = self.flow(id)?;
            (flow.src_leaf, flow.dst_leaf, flow.ecmp_hash, flow.is_local())
        };

        let path = if local {
            FlowPath::Local { leaf: src }
        } else {
            let spine = self
                .ecmp
                .select_spine(hash, src, dst, self.topo.num_spines)
                .ok_or_else(|| SimError::invariant(format!("no spine for flow {id}")))?;
            FlowPath::Fabric {
                spine,
                links: self.topo.path_via(src, spine, dst),
            }
        };
        self.flows.assign_path(id, path)?;
        info!(flow_id = %id, src, dst, spine = ?path.spine(), "📥 流到达");

        match path {
            FlowPath::Local { .. } => {
                self.set_rate(id, self.topo.port_capacity, now);
                self.project(id, sim)
            }
            FlowPath::Fabric { links, .. } => {
                for l in links {
                    self.links.attach(l, id);
                }
                if let Some(trace) = self.trace.as_mut() {
                    trace.record_path(id, &links);
                }
                self.reallocate(&links, sim)
            }
        }
    }

    /// 预测完成事件到期。过期事件直接丢弃。
    #[tracing::instrument(skip(self, sim), fields(now = sim.now().as_secs()))]
    pub(crate) fn on_projected_completion(
        &mut self,
        id: FlowId,
        expected: SimTime,
        epoch: u64,
        sim: &mut Simulator,
    ) -> Result<(), SimError> {
        let live = self.projections.get(&id).copied() == Some(Projection { epoch, at: expected });
        if !live || self.flow(id)?.state() != FlowState::Active {
            debug!(flow_id = %id, epoch, "丢弃过期的完成事件");
            return Ok(());
        }
        self.projections.remove(&id);

        let now = sim.now();
        if !self.settle(id, now)? {
            let leftover = self.flows.remaining(id).unwrap_or(0.0);
            trace!(flow_id = %id, leftover, "补齐最后的字节");
            self.flows.apply_bytes_sent(id, leftover, now)?;
        }

        let freed = self.retire(id, now);
        self.reallocate(&freed, sim)
    }

    /// 两条流的剩余字节相遇：推进并按新的优先级顺序重新分配，不完成任何流。
    #[tracing::instrument(skip(self, sim), fields(now = sim.now().as_secs()))]
    pub(crate) fn on_reorder(&mut self, ev: Reprioritize, sim: &mut Simulator) -> Result<(), SimError> {
        self.pending_reorders.remove(&ev);
        let live = self.rate_epochs.get(&ev.ahead) == Some(&ev.ahead_epoch)
            && self.rate_epochs.get(&ev.behind) == Some(&ev.behind_epoch);
        if !live {
            debug!(ahead = %ev.ahead, behind = %ev.behind, "丢弃过期的换序事件");
            return Ok(());
        }
        let mut seeds = Vec::with_capacity(4);
        for id in [ev.ahead, ev.behind] {
            if let Some(path) = self.flow(id)?.path() {
                seeds.extend_from_slice(path.links());
            }
        }
        info!(ahead = %ev.ahead, behind = %ev.behind, "🔀 优先级换序");
        self.reallocate(&seeds, sim)
    }

    /// 对 `seeds` 所在的连通分量（共享链路的流与链路）重新分配速率。
    #[tracing::instrument(skip(self, sim), fields(now = sim.now().as_secs()))]
    fn reallocate(&mut self, seeds: &[LinkId], sim: &mut Simulator) -> Result<(), SimError> {
        let now = sim.now();

        // 推进到当前时刻；恰好在此刻发完的流先退出，再重算分量。
        let mut seeds = seeds.to_vec();
        let (flow_ids, link_ids) = loop {
            let (flow_ids, link_ids) = self.component(&seeds)?;
            let mut finished = Vec::new();
            for &id in &flow_ids {
                if self.settle(id, now)? {
                    finished.push(id);
                }
            }
            if finished.is_empty() {
                break (flow_ids, link_ids);
            }
            for id in finished {
                let freed = self.retire(id, now);
                seeds.extend(freed);
            }
        };
        if flow_ids.is_empty() {
            return Ok(());
        }

        let mut demands = Vec::with_capacity(flow_ids.len());
        for &id in &flow_ids {
            let flow = self.flow(id)?;
            let links = flow.path().map(|p| p.links().to_vec()).unwrap_or_default();
            demands.push(Demand {
                flow: id,
                weight: flow.weight,
                remaining: flow.remaining(),
                links,
            });
        }
        let capacity: HashMap<LinkId, f64> = link_ids
            .iter()
            .map(|&l| (l, self.topo.capacity(l)))
            .collect();

        let rates = self.allocator.allocate(&demands, &capacity)?;
        verify_capacity(&demands, &rates, &capacity)?;
        if rates.iter().all(|&r| r <= 0.0) {
            return Err(SimError::invariant(format!(
                "no flow among {} on {} links can make progress",
                flow_ids.len(),
                link_ids.len()
            )));
        }
        self.reallocations += 1;
        debug!(
            flows = flow_ids.len(),
            links = link_ids.len(),
            method = %self.allocator.method(),
            "重新分配速率"
        );

        for (d, &rate) in demands.iter().zip(&rates) {
            let old = self.links.rate(d.flow).map(|r| r.rate);
            if old == Some(rate) {
                continue;
            }
            trace!(flow_id = %d.flow, ?old, rate, "速率变化");
            self.set_rate(d.flow, rate, now);
            if rate > 0.0 {
                self.project(d.flow, sim)?;
            } else {
                self.projections.remove(&d.flow);
            }
        }

        match self.allocator.next_reorder(&demands, &rates) {
            Some(reorder) => self.schedule_reorder(reorder, sim),
            None => Ok(()),
        }
    }

    /// 在两条流的剩余字节相遇时刻调度 `Reprioritize`。
    fn schedule_reorder(&mut self, reorder: Reorder, sim: &mut Simulator) -> Result<(), SimError> {
        let now = sim.now();
        let at = now.after(reorder.after);
        if at <= now {
            // 浮点精度内已相遇，视为并列，留给下一次重新分配。
            return Ok(());
        }
        let epoch_of = |id: FlowId| {
            self.rate_epochs
                .get(&id)
                .copied()
                .ok_or_else(|| SimError::invariant(format!("flow {id} reordered without a rate")))
        };
        let ev = Reprioritize {
            ahead: reorder.ahead,
            ahead_epoch: epoch_of(reorder.ahead)?,
            behind: reorder.behind,
            behind_epoch: epoch_of(reorder.behind)?,
        };
        if !self.pending_reorders.insert(ev) {
            return Ok(());
        }
        debug!(
            ahead = %ev.ahead,
            behind = %ev.behind,
            at = at.as_secs(),
            "预测优先级换序"
        );
        sim.schedule(at, ev)
    }

    /// 从种子链路出发，沿“链路 → 流 → 流的其他链路”扩展出连通分量。
    fn component(&self, seeds: &[LinkId]) -> Result<(Vec<FlowId>, Vec<LinkId>), SimError> {
        let mut seen_links: BTreeSet<LinkId> = BTreeSet::new();
        let mut seen_flows: BTreeSet<FlowId> = BTreeSet::new();
        let mut stack: Vec<LinkId> = seeds.to_vec();
        while let Some(l) = stack.pop() {
            if !seen_links.insert(l) {
                continue;
            }
            for &f in self.links.flows_on(l) {
                if !seen_flows.insert(f) {
                    continue;
                }
                let path = self
                    .flow(f)?
                    .path()
                    .ok_or_else(|| SimError::invariant(format!("flow {f} on {l} has no path")))?;
                stack.extend(path.links().iter().filter(|x| !seen_links.contains(*x)));
            }
        }
        let links = seen_links
            .into_iter()
            .filter(|&l| !self.links.flows_on(l).is_empty())
            .collect();
        Ok((seen_flows.into_iter().collect(), links))
    }

    /// 按当前速率把流推进到 `now`；返回流是否恰好发完。
    fn settle(&mut self, id: FlowId, now: SimTime) -> Result<bool, SimError> {
        let Some(current) = self.links.rate(id) else {
            return Ok(false);
        };
        let sent = current.rate * now.since(current.since);
        let done = self.flows.apply_bytes_sent(id, sent, now)?;
        self.links.set_rate(id, current.rate, now);
        Ok(done)
    }

    /// 完成的流离开网络：摘链路、清速率与预测。返回释放出的链路。
    fn retire(&mut self, id: FlowId, now: SimTime) -> Vec<LinkId> {
        let links = self
            .flows
            .get(id)
            .and_then(|f| f.path())
            .map(|p| p.links().to_vec())
            .unwrap_or_default();
        for &l in &links {
            self.links.detach(l, id);
        }
        self.links.clear_rate(id);
        self.projections.remove(&id);
        self.rate_epochs.remove(&id);
        if let Some(trace) = self.trace.as_mut() {
            trace.record(now, id, 0.0);
        }
        debug!(flow_id = %id, links = ?links, "流离开网络");
        links
    }

    fn set_rate(&mut self, id: FlowId, rate: f64, now: SimTime) {
        self.links.set_rate(id, rate, now);
        self.rate_epochs.insert(id, self.next_epoch);
        self.next_epoch += 1;
        if let Some(trace) = self.trace.as_mut() {
            trace.record(now, id, rate);
        }
    }

    /// 以当前速率预测完成时刻并调度 `RecomputeOrComplete`。
    fn project(&mut self, id: FlowId, sim: &mut Simulator) -> Result<(), SimError> {
        let rate = self
            .links
            .rate(id)
            .map(|r| r.rate)
            .filter(|&r| r > 0.0)
            .ok_or_else(|| SimError::invariant(format!("flow {id} projected without a rate")))?;
        let remaining = self.flows.remaining(id).unwrap_or(0.0);
        let now = sim.now();
        let mut at = now.after(remaining / rate);
        if remaining > 0.0 && at <= now {
            // 剩余量小于当前时刻的浮点分辨率，至少推进一个最小步长。
            at = now.next_instant();
        }
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        self.projections.insert(id, Projection { epoch, at });
        trace!(flow_id = %id, rate, remaining, at = at.as_secs(), epoch, "预测完成时刻");
        sim.schedule(
            at,
            RecomputeOrComplete {
                flow: id,
                expected: at,
                epoch,
            },
        )
    }

    fn flow(&self, id: FlowId) -> Result<&Flow, SimError> {
        self.flows
            .get(id)
            .ok_or_else(|| SimError::invariant(format!("flow {id} is not registered")))
    }
}
