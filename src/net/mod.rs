//! 网络模型模块
//!
//! 此模块包含标识符、逻辑链路、链路状态和 ECMP 选路。

// 子模块声明
mod id;
mod link;
mod link_state;
mod routing;

// 重新导出公共接口
pub use id::{FlowId, LinkId};
pub use link::{Link, LinkKind};
pub use link_state::{FlowRate, LinkState};
pub use routing::{EcmpMode, EcmpSelector};
