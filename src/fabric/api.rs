//! 对外接口
//!
//! 嵌入方按 `configure_topology` → `submit_flow`* → `run_simulation` 的顺序调用。
//! 流级错误只拒绝单次提交，已有状态保持不变。

use tracing::{debug, info, warn};

use super::config::SimConfig;
use super::events::FlowArrival;
use super::report::{FlowSummary, SimReport};
use super::trace::RateTrace;
use super::world::FabricWorld;
use crate::alloc::SchedulingMethod;
use crate::error::SimError;
use crate::flow::{Flow, FlowRegistry, FlowState};
use crate::net::{EcmpSelector, FlowId, LinkState};
use crate::sim::{ScenarioSpec, SimTime, Simulator};
use crate::topo::{LeafSpineOpts, LeafSpineTopology, build_leaf_spine};

/// 驱动器状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    /// 尚未配置拓扑
    Unconfigured,
    /// 已配置，接受流提交
    Idle,
    /// 正在处理事件
    Running,
    /// 事件队列已清空（终态）
    Drained,
}

pub struct FlowSim {
    config: SimConfig,
    phase: SimPhase,
    sim: Simulator,
    world: Option<FabricWorld>,
}

impl FlowSim {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            phase: SimPhase::Unconfigured,
            sim: Simulator::default(),
            world: None,
        }
    }

    /// 按场景文件建立仿真：配置拓扑并依次提交所有流。
    pub fn from_scenario(spec: &ScenarioSpec) -> Result<Self, SimError> {
        let defaults = SimConfig::default();
        let config = SimConfig {
            port_capacity: spec
                .topology
                .port_capacity
                .unwrap_or(defaults.port_capacity),
            ecmp: spec.ecmp.unwrap_or(defaults.ecmp),
            record_rates: spec.record_rates,
        };
        let mut sim = FlowSim::new(config);
        let t = &spec.topology;
        let num_ports = t.num_leaves.checked_mul(t.ports_per_leaf).ok_or_else(|| {
            SimError::Configuration(format!(
                "{} leaves x {} ports overflows",
                t.num_leaves, t.ports_per_leaf
            ))
        })?;
        sim.configure_topology(
            num_ports,
            &spec.method,
            t.num_leaves,
            t.ports_per_leaf,
            t.num_spines,
        )?;
        for f in &spec.flows {
            sim.submit_flow(
                f.src,
                f.dst,
                f.id,
                f.size_bytes,
                f.arrival,
                f.weight.unwrap_or(1.0),
                f.ecmp_hash.unwrap_or(f.id),
            )?;
        }
        Ok(sim)
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// 一次性配置拓扑与调度方法。
    #[tracing::instrument(skip(self))]
    pub fn configure_topology(
        &mut self,
        num_ports: usize,
        method: &str,
        num_leaves: usize,
        ports_per_leaf: usize,
        num_spines: usize,
    ) -> Result<(), SimError> {
        self.ensure_phase(SimPhase::Unconfigured, "configure the topology")?;
        if num_leaves.checked_mul(ports_per_leaf) != Some(num_ports) {
            return Err(SimError::Configuration(format!(
                "{num_ports} ports do not match {num_leaves} leaves x {ports_per_leaf} ports"
            )));
        }
        let opts = LeafSpineOpts {
            num_leaves,
            num_spines,
            ports_per_leaf,
            port_capacity: self.config.port_capacity,
        };
        let topo = build_leaf_spine(&opts)?;
        let method: SchedulingMethod = method.parse()?;
        self.install(topo, method);
        Ok(())
    }

    /// 类型化的配置入口
    pub fn configure(
        &mut self,
        opts: &LeafSpineOpts,
        method: SchedulingMethod,
    ) -> Result<(), SimError> {
        self.ensure_phase(SimPhase::Unconfigured, "configure the topology")?;
        self.config.port_capacity = opts.port_capacity;
        let topo = build_leaf_spine(opts)?;
        self.install(topo, method);
        Ok(())
    }

    fn install(&mut self, topo: LeafSpineTopology, method: SchedulingMethod) {
        info!(
            leaves = topo.num_leaves,
            spines = topo.num_spines,
            ports_per_leaf = topo.ports_per_leaf,
            method = %method,
            "🏗️  leaf-spine 拓扑就绪"
        );
        self.world = Some(FabricWorld::new(
            topo,
            method.allocator(),
            EcmpSelector::new(self.config.ecmp),
            self.config.record_rates,
        ));
        self.phase = SimPhase::Idle;
    }

    /// 提交一条流，在其到达时刻进入网络。
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip(self))]
    pub fn submit_flow(
        &mut self,
        src_leaf: usize,
        dst_leaf: usize,
        flow_id: u64,
        size_bytes: u64,
        arrival_time: f64,
        weight: f64,
        ecmp_hash: u64,
    ) -> Result<(), SimError> {
        self.ensure_phase(SimPhase::Idle, "submit flows")?;
        let id = FlowId(flow_id);
        let world = self
            .world
            .as_mut()
            .ok_or_else(|| SimError::Configuration("topology is not configured".into()))?;

        if size_bytes == 0 {
            return Err(SimError::invalid_flow(id, "size must be positive"));
        }
        let arrival = SimTime::from_secs(arrival_time);
        if !arrival.is_valid() {
            return Err(SimError::invalid_flow(
                id,
                format!("arrival time {arrival_time} must be finite and non-negative"),
            ));
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(SimError::invalid_flow(
                id,
                format!("weight {weight} must be positive"),
            ));
        }
        let leaves = world.topo.num_leaves;
        if src_leaf >= leaves || dst_leaf >= leaves {
            return Err(SimError::invalid_flow(
                id,
                format!("leaf {src_leaf}->{dst_leaf} outside 0..{leaves}"),
            ));
        }

        world.flows.admit(Flow::new(
            id, src_leaf, dst_leaf, size_bytes, arrival, weight, ecmp_hash,
        ))?;
        if let Err(err) = self.sim.schedule(arrival, FlowArrival { flow: id }) {
            // 没有到达事件的流会一直停在 Pending，撤回登记。
            world.flows.withdraw(id);
            return Err(SimError::invalid_flow(id, err.to_string()));
        }
        debug!(flow_id, arrival_time, "流已入队");
        Ok(())
    }

    /// 清空事件队列，返回按 flow id 升序的完成摘要。
    #[tracing::instrument(skip(self))]
    pub fn run_simulation(&mut self) -> Result<SimReport, SimError> {
        self.ensure_phase(SimPhase::Idle, "run the simulation")?;
        let world = self
            .world
            .as_mut()
            .ok_or_else(|| SimError::Configuration("topology is not configured".into()))?;

        self.phase = SimPhase::Running;
        let events = self.sim.run(world)?;

        let stranded = world.flows.count_in(FlowState::Active) + world.flows.count_in(FlowState::Pending);
        if stranded > 0 {
            warn!(stranded, "事件队列已空但仍有未完成的流");
            return Err(SimError::invariant(format!(
                "{stranded} flows left unfinished when the event queue drained"
            )));
        }
        self.phase = SimPhase::Drained;

        let summaries: Vec<FlowSummary> = world
            .flows
            .iter_sorted()
            .filter_map(FlowSummary::from_flow)
            .collect();
        let report = SimReport {
            summaries,
            events,
            reallocations: world.reallocations,
            final_time: self.sim.now().as_secs(),
        };
        info!(
            flows = report.summaries.len(),
            events,
            final_time = report.final_time,
            "📊 仿真结束"
        );
        Ok(report)
    }

    pub fn topology(&self) -> Option<&LeafSpineTopology> {
        self.world.as_ref().map(FabricWorld::topology)
    }

    pub fn registry(&self) -> Option<&FlowRegistry> {
        self.world.as_ref().map(FabricWorld::registry)
    }

    pub fn link_state(&self) -> Option<&LinkState> {
        self.world.as_ref().map(FabricWorld::link_state)
    }

    pub fn method(&self) -> Option<SchedulingMethod> {
        self.world.as_ref().map(|w| w.allocator().method())
    }

    /// 仅在 `record_rates` 打开时存在
    pub fn rate_trace(&self) -> Option<&RateTrace> {
        self.world.as_ref().and_then(|w| w.trace.as_ref())
    }

    fn ensure_phase(&self, expected: SimPhase, action: &str) -> Result<(), SimError> {
        if self.phase == expected {
            return Ok(());
        }
        Err(SimError::Configuration(format!(
            "cannot {action} while the simulation is {:?}",
            self.phase
        )))
    }
}

impl Default for FlowSim {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
