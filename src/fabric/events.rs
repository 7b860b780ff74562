//! 仿真事件
//!
//! 流到达与预测完成两类事件。两者都只负责找到世界并转交处理。

use super::world::FabricWorld;
use crate::error::SimError;
use crate::net::FlowId;
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::trace;

fn fabric_world(world: &mut dyn World) -> Result<&mut FabricWorld, SimError> {
    world
        .as_any_mut()
        .downcast_mut::<FabricWorld>()
        .ok_or_else(|| SimError::invariant("world must be FabricWorld"))
}

/// 事件：流在其到达时刻进入网络。
#[derive(Debug)]
pub struct FlowArrival {
    pub flow: FlowId,
}

impl Event for FlowArrival {
    #[tracing::instrument(skip(self, sim, world), fields(flow_id = %self.flow))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> Result<(), SimError> {
        let FlowArrival { flow } = *self;
        fabric_world(world)?.on_arrival(flow, sim)?;
        trace!("FlowArrival::execute 完成");
        Ok(())
    }
}

/// 事件：按调度时的速率，流应在 `expected` 发完。
///
/// 若此后流的速率变过，`epoch` 已经落后，事件被丢弃。
#[derive(Debug)]
pub struct RecomputeOrComplete {
    pub flow: FlowId,
    pub expected: SimTime,
    pub epoch: u64,
}

impl Event for RecomputeOrComplete {
    #[tracing::instrument(skip(self, sim, world), fields(flow_id = %self.flow, epoch = self.epoch))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> Result<(), SimError> {
        let RecomputeOrComplete {
            flow,
            expected,
            epoch,
        } = *self;
        fabric_world(world)?.on_projected_completion(flow, expected, epoch, sim)
    }
}

/// 事件：`behind` 的剩余字节追上 `ahead`，需要按新顺序重新分配。
///
/// 任一方的速率在此之前变过（epoch 不符）即为过期事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reprioritize {
    pub ahead: FlowId,
    pub ahead_epoch: u64,
    pub behind: FlowId,
    pub behind_epoch: u64,
}

impl Event for Reprioritize {
    #[tracing::instrument(skip(self, sim, world), fields(ahead = %self.ahead, behind = %self.behind))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> Result<(), SimError> {
        fabric_world(world)?.on_reorder(*self, sim)
    }
}
