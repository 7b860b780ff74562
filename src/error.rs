//! 错误类型
//!
//! 仿真核心的统一错误枚举。配置类错误与求解器不变量错误是致命的；
//! 单个流的提交错误只拒绝该次提交，不影响已有状态。

use crate::net::FlowId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// 拓扑参数非法，或配置调用顺序错误。
    #[error("configuration error: {0}")]
    Configuration(String),
    /// 未知的调度方法名。
    #[error("unsupported scheduling method `{0}`")]
    UnsupportedMethod(String),
    /// flow id 已被使用。
    #[error("flow {0} already submitted")]
    DuplicateFlow(FlowId),
    /// 流参数非法（大小、到达时间、权重、叶子索引）。
    #[error("flow {flow} rejected: {reason}")]
    InvalidFlow { flow: FlowId, reason: String },
    /// 容量/链路簿记出现不可能的状态。
    #[error("solver invariant violated: {0}")]
    SolverInvariant(String),
}

impl SimError {
    pub(crate) fn invalid_flow(flow: FlowId, reason: impl Into<String>) -> Self {
        SimError::InvalidFlow {
            flow,
            reason: reason.into(),
        }
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        SimError::SolverInvariant(msg.into())
    }

    /// 致命错误会中止整个仿真；流级错误只拒绝单次提交。
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SimError::DuplicateFlow(_) | SimError::InvalidFlow { .. }
        )
    }
}
