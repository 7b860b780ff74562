//! 世界 trait
//!
//! 定义仿真世界接口。

use std::any::Any;

/// 仿真世界：由业务层实现（例如拓扑、流表、链路状态）。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
