//! 流级仿真驱动
//!
//! 把拓扑、ECMP、流注册表、链路状态和速率分配器组装成一个仿真世界，
//! 并提供对外的三步接口：配置拓扑、提交流、运行仿真。

mod api;
mod config;
mod events;
mod report;
mod trace;
mod world;

pub use api::{FlowSim, SimPhase};
pub use config::SimConfig;
pub use events::{FlowArrival, RecomputeOrComplete, Reprioritize};
pub use report::{FlowSummary, SimReport};
pub use trace::{RateChange, RateTrace};
pub use world::FabricWorld;
