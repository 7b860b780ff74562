//! Leaf-spine 拓扑构建
//!
//! 每片叶子连接每个 spine（完全二分的核心层）。叶子的 `ports_per_leaf`
//! 个上行端口按 `port % num_spines` 轮流接到各 spine，同一 (leaf, spine)
//! 的端口聚合为一条逻辑链路，下行方向与上行对称。

use crate::error::SimError;
use crate::net::{Link, LinkId, LinkKind};

#[derive(Debug, Clone)]
pub struct LeafSpineOpts {
    pub num_leaves: usize,
    pub num_spines: usize,
    pub ports_per_leaf: usize,
    /// 单个叶子端口的容量（bytes/s）
    pub port_capacity: f64,
}

impl Default for LeafSpineOpts {
    fn default() -> Self {
        Self {
            num_leaves: 2,
            num_spines: 1,
            ports_per_leaf: 2,
            // 10 Gbps
            port_capacity: 1.25e9,
        }
    }
}

/// 构建完成后不可变。
#[derive(Debug, Clone)]
pub struct LeafSpineTopology {
    pub num_leaves: usize,
    pub num_spines: usize,
    pub ports_per_leaf: usize,
    pub port_capacity: f64,
    links: Vec<Link>,
}

impl LeafSpineTopology {
    pub fn num_ports(&self) -> usize {
        self.num_leaves * self.ports_per_leaf
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn capacity(&self, id: LinkId) -> f64 {
        self.links[id.0].capacity
    }

    /// 叶子 `leaf` 接到 `spine` 的物理端口数
    pub fn ports_to_spine(&self, spine: usize) -> usize {
        ports_for(self.ports_per_leaf, self.num_spines, spine)
    }

    /// leaf → spine 的上行链路，O(1)。
    pub fn link_to_spine(&self, leaf: usize, spine: usize) -> LinkId {
        debug_assert!(leaf < self.num_leaves && spine < self.num_spines);
        LinkId(leaf * self.num_spines + spine)
    }

    /// spine → leaf 的下行链路，O(1)。
    pub fn link_from_spine(&self, spine: usize, leaf: usize) -> LinkId {
        debug_assert!(leaf < self.num_leaves && spine < self.num_spines);
        LinkId(self.num_leaves * self.num_spines + spine * self.num_leaves + leaf)
    }

    /// 经由 `spine` 的端到端路径：源叶上行 + 目的叶下行。
    pub fn path_via(&self, src_leaf: usize, spine: usize, dst_leaf: usize) -> [LinkId; 2] {
        [
            self.link_to_spine(src_leaf, spine),
            self.link_from_spine(spine, dst_leaf),
        ]
    }

    /// 两片叶子之间的所有等价路径，按 spine 编号排列。
    pub fn paths(&self, src_leaf: usize, dst_leaf: usize) -> Vec<[LinkId; 2]> {
        (0..self.num_spines)
            .map(|spine| self.path_via(src_leaf, spine, dst_leaf))
            .collect()
    }
}

fn ports_for(ports_per_leaf: usize, num_spines: usize, spine: usize) -> usize {
    ports_per_leaf / num_spines + usize::from(spine < ports_per_leaf % num_spines)
}

pub fn build_leaf_spine(opts: &LeafSpineOpts) -> Result<LeafSpineTopology, SimError> {
    let LeafSpineOpts {
        num_leaves,
        num_spines,
        ports_per_leaf,
        port_capacity,
    } = *opts;

    if num_leaves == 0 || num_spines == 0 || ports_per_leaf == 0 {
        return Err(SimError::Configuration(format!(
            "leaf-spine parameters must be positive (leaves={num_leaves}, spines={num_spines}, ports_per_leaf={ports_per_leaf})"
        )));
    }
    if ports_per_leaf < num_spines {
        return Err(SimError::Configuration(format!(
            "{ports_per_leaf} ports per leaf cannot reach {num_spines} spines"
        )));
    }
    if !(port_capacity.is_finite() && port_capacity > 0.0) {
        return Err(SimError::Configuration(format!(
            "port capacity must be positive and finite, got {port_capacity}"
        )));
    }

    let too_large = || {
        SimError::Configuration(format!(
            "fabric of {num_leaves} leaves x {num_spines} spines x {ports_per_leaf} ports is too large"
        ))
    };
    num_leaves.checked_mul(ports_per_leaf).ok_or_else(too_large)?;
    let num_links = num_leaves
        .checked_mul(num_spines)
        .and_then(|n| n.checked_mul(2))
        .ok_or_else(too_large)?;
    let mut links = Vec::new();
    links.try_reserve_exact(num_links).map_err(|_| too_large())?;
    for leaf in 0..num_leaves {
        for spine in 0..num_spines {
            let ports = ports_for(ports_per_leaf, num_spines, spine);
            links.push(Link::new(LinkKind::Uplink { leaf, spine }, ports, port_capacity));
        }
    }
    for spine in 0..num_spines {
        let ports = ports_for(ports_per_leaf, num_spines, spine);
        for leaf in 0..num_leaves {
            links.push(Link::new(LinkKind::Downlink { spine, leaf }, ports, port_capacity));
        }
    }

    Ok(LeafSpineTopology {
        num_leaves,
        num_spines,
        ports_per_leaf,
        port_capacity,
        links,
    })
}
