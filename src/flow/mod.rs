//! 流模型模块
//!
//! 流记录及其注册表。

mod record;
mod registry;

pub use record::{Flow, FlowPath, FlowState};
pub use registry::FlowRegistry;
