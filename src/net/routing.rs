//! ECMP 选路
//!
//! 叶-脊结构中任意两片不同的叶子之间恰有 `num_spines` 条等价路径，
//! 选路等价于选一个 spine。选择只依赖流的 hash 和拓扑，与负载无关，
//! 并在流的整个生命周期内保持不变。

use serde::{Deserialize, Serialize};

/// hash 到 spine 的映射方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EcmpMode {
    /// spine = hash mod num_spines
    #[default]
    Modulo,
    /// 先把 hash 与叶子对、盐值一起做 splitmix64 混合，再取模
    Mixed { salt: u64 },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EcmpSelector {
    mode: EcmpMode,
}

impl EcmpSelector {
    pub fn new(mode: EcmpMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> EcmpMode {
        self.mode
    }

    /// 为流选择 spine。`num_spines == 0` 时没有中间层，返回 None（本地交换）。
    pub fn select_spine(
        &self,
        ecmp_hash: u64,
        src_leaf: usize,
        dst_leaf: usize,
        num_spines: usize,
    ) -> Option<usize> {
        if num_spines == 0 {
            return None;
        }
        let key = match self.mode {
            EcmpMode::Modulo => ecmp_hash,
            EcmpMode::Mixed { salt } => mix64(
                ecmp_hash
                    ^ (src_leaf as u64).wrapping_mul(0x9E3779B97F4A7C15)
                    ^ (dst_leaf as u64)
                    ^ salt,
            ),
        };
        Some((key % num_spines as u64) as usize)
    }
}

/// 一个简单、确定性的 64-bit mixing（替代 RandomState，避免每次运行 hash 不稳定）。
fn mix64(mut x: u64) -> u64 {
    // splitmix64
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
