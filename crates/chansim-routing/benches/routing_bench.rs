//! Benchmarks for Chansim Routing
//!
//! Measures on Kademlia ring networks of increasing size:
//! - Global (Dijkstra) routing under each fee model
//! - Next-hop priority-first routing
//! - Greedy depth-first routing

use chansim_network::{
    kademlia_join, KademliaJoinConfig, Network, NetworkBuilder, NetworkConfig, NodeId,
    RingPosition, Uniform,
};
use chansim_routing::{
    DistanceNetBalancePriority, DistancePriority, FeeModel, GlobalRouting, GreedyDepthFirst,
    NextHopRouting, RoutingStrategy,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const SIZES: [usize; 3] = [100, 500, 2000];

fn build(num_nodes: usize) -> Network {
    let config = NetworkConfig {
        num_nodes,
        id_space: 1 << 20,
        seed: 7,
    };
    NetworkBuilder::new(
        config,
        Box::new(Uniform::unit(7)),
        Box::new(RingPosition::new(config.id_space).expect("id space")),
        Box::new(kademlia_join(&KademliaJoinConfig::default())),
    )
    .build()
    .expect("network builds")
}

fn pairs(network: &Network, count: usize) -> Vec<(NodeId, NodeId)> {
    let ids = network.raw.node_ids();
    let mut rng = StdRng::seed_from_u64(1);
    (0..count)
        .filter_map(|_| {
            let pick: Vec<_> = ids.choose_multiple(&mut rng, 2).copied().collect();
            (pick.len() == 2).then(|| (pick[0], pick[1]))
        })
        .collect()
}

fn bench_strategy(c: &mut Criterion, group_name: &str, routing: &dyn RoutingStrategy) {
    let mut group = c.benchmark_group(group_name);
    for &size in &SIZES {
        let network = build(size);
        let pairs = pairs(&network, 32);
        group.bench_with_input(BenchmarkId::from_parameter(size), &pairs, |b, pairs| {
            b.iter(|| {
                for &(s, t) in pairs {
                    black_box(routing.route(&network.view(), s, t, black_box(1.0)));
                }
            })
        });
    }
    group.finish();
}

fn bench_global(c: &mut Criterion) {
    for (name, fee) in [
        ("global_constant", FeeModel::Constant),
        ("global_net_balance", FeeModel::NetBalance),
        ("global_imbalance", FeeModel::Imbalance),
    ] {
        bench_strategy(c, name, &GlobalRouting::new(fee));
    }
}

fn bench_next_hop(c: &mut Criterion) {
    let distance = NextHopRouting::new(DistancePriority, 1000).expect("budget");
    bench_strategy(c, "next_hop_distance", &distance);
    let balanced = NextHopRouting::new(DistanceNetBalancePriority, 1000).expect("budget");
    bench_strategy(c, "next_hop_net_balance", &balanced);
}

fn bench_greedy(c: &mut Criterion) {
    let greedy = GreedyDepthFirst::new(DistancePriority, 64).expect("depth");
    bench_strategy(c, "greedy_depth_first", &greedy);
}

criterion_group!(benches, bench_global, bench_next_hop, bench_greedy);
criterion_main!(benches);
