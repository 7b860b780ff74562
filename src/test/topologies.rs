use crate::error::SimError;
use crate::net::{LinkId, LinkKind};
use crate::topo::{LeafSpineOpts, build_leaf_spine};
use std::collections::HashSet;

fn opts(num_leaves: usize, num_spines: usize, ports_per_leaf: usize) -> LeafSpineOpts {
    LeafSpineOpts {
        num_leaves,
        num_spines,
        ports_per_leaf,
        port_capacity: 100.0,
    }
}

#[test]
fn leaf_spine_builds_one_uplink_and_downlink_per_leaf_spine_pair() {
    let topo = build_leaf_spine(&opts(4, 3, 6)).expect("build");
    assert_eq!(topo.num_ports(), 24);
    assert_eq!(topo.links().len(), 2 * 4 * 3);

    let mut seen = HashSet::new();
    for leaf in 0..4 {
        for spine in 0..3 {
            let up = topo.link_to_spine(leaf, spine);
            let down = topo.link_from_spine(spine, leaf);
            assert!(seen.insert(up), "duplicate uplink {up:?}");
            assert!(seen.insert(down), "duplicate downlink {down:?}");
            assert_eq!(topo.link(up).kind, LinkKind::Uplink { leaf, spine });
            assert_eq!(topo.link(down).kind, LinkKind::Downlink { spine, leaf });
        }
    }
    assert_eq!(seen.len(), topo.links().len());
}

#[test]
fn leaf_ports_are_spread_round_robin_across_spines() {
    // 5 ports over 3 spines: spines 0 and 1 get two ports, spine 2 gets one.
    let topo = build_leaf_spine(&opts(2, 3, 5)).expect("build");
    assert_eq!(topo.ports_to_spine(0), 2);
    assert_eq!(topo.ports_to_spine(1), 2);
    assert_eq!(topo.ports_to_spine(2), 1);

    assert_eq!(topo.capacity(topo.link_to_spine(1, 0)), 200.0);
    assert_eq!(topo.capacity(topo.link_to_spine(1, 2)), 100.0);
    assert_eq!(topo.capacity(topo.link_from_spine(2, 0)), 100.0);
    assert_eq!(topo.link(topo.link_from_spine(1, 1)).ports, 2);
}

#[test]
fn every_leaf_pair_has_one_path_per_spine() {
    let topo = build_leaf_spine(&opts(3, 4, 4)).expect("build");
    let paths = topo.paths(0, 2);
    assert_eq!(paths.len(), 4);
    for (spine, path) in paths.iter().enumerate() {
        assert_eq!(*path, topo.path_via(0, spine, 2));
        assert_eq!(path[0], topo.link_to_spine(0, spine));
        assert_eq!(path[1], topo.link_from_spine(spine, 2));
    }
    let distinct: HashSet<LinkId> = paths.iter().flatten().copied().collect();
    assert_eq!(distinct.len(), 8);
}

#[test]
fn insufficient_uplinks_are_a_configuration_error() {
    let err = build_leaf_spine(&opts(2, 3, 2)).expect_err("3 spines need 3 ports");
    assert!(matches!(err, SimError::Configuration(_)));
}

#[test]
fn zero_parameters_and_bad_capacity_are_rejected() {
    for bad in [opts(0, 1, 1), opts(2, 0, 1), opts(2, 1, 0)] {
        let err = build_leaf_spine(&bad).expect_err("non-positive parameter");
        assert!(matches!(err, SimError::Configuration(_)), "{bad:?}");
    }
    let mut zero_cap = opts(2, 1, 1);
    zero_cap.port_capacity = 0.0;
    assert!(matches!(
        build_leaf_spine(&zero_cap),
        Err(SimError::Configuration(_))
    ));
}

#[test]
fn oversized_fabrics_are_rejected_instead_of_overflowing() {
    for bad in [opts(usize::MAX / 2 + 1, 1, 2), opts(usize::MAX / 8, 1, 1)] {
        assert!(
            matches!(build_leaf_spine(&bad), Err(SimError::Configuration(_))),
            "{bad:?}"
        );
    }
}
