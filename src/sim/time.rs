//! 仿真时间类型
//!
//! 定义仿真时间及其单位转换。流级仿真的完成时刻一般不是整数纳秒，
//! 因此这里用 f64 秒表示，并通过 `total_cmp` 提供全序，便于放进事件堆。

use std::cmp::Ordering;

/// 仿真时间（秒）。
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// `-0.0` 归一为 `0.0`，否则它在全序下排在零之前。
    pub fn from_secs(s: f64) -> SimTime {
        SimTime(s + 0.0)
    }
    pub fn from_millis(ms: f64) -> SimTime {
        SimTime(ms / 1_000.0)
    }
    pub fn from_micros(us: f64) -> SimTime {
        SimTime(us / 1_000_000.0)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// 当前时刻之后 `dt` 秒。
    pub fn after(self, dt: f64) -> SimTime {
        SimTime(self.0 + dt)
    }

    /// 严格晚于当前时刻的下一个可表示时刻（要求时刻非负且有限）。
    pub fn next_instant(self) -> SimTime {
        let t = self.0 + 0.0;
        SimTime(f64::from_bits(t.to_bits() + 1))
    }

    /// 自 `earlier` 起经过的秒数（不会为负）。
    pub fn since(self, earlier: SimTime) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
