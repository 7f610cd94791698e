//! Filter strategies.
//!
//! A filter is a pure predicate over a candidate pair: node `a` considers
//! opening a channel to node `b`. A [`FilterChain`] accepts a pair only if
//! every filter does. Order affects speed only, so cheap filters go first.

use std::fmt;

use crate::{Linear, NetworkView, Node};

/// Predicate over an (initiator, acceptor) pair.
pub trait FilterStrategy: fmt::Debug {
    fn filter(&self, view: &NetworkView<'_>, a: &Node, b: &Node) -> bool;
}

/// Rejects self-channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFilter;

impl FilterStrategy for IdentityFilter {
    fn filter(&self, _view: &NetworkView<'_>, a: &Node, b: &Node) -> bool {
        a.id() != b.id()
    }
}

/// Rejects pairs that already share a channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotConnectedFilter;

impl FilterStrategy for NotConnectedFilter {
    fn filter(&self, view: &NetworkView<'_>, a: &Node, b: &Node) -> bool {
        !view.network.has_channel(a.id(), b.id())
    }
}

/// Accepts partners within `max_distance` under the position strategy.
#[derive(Debug, Clone, Copy)]
pub struct DistanceFilter {
    pub max_distance: f64,
}

impl FilterStrategy for DistanceFilter {
    fn filter(&self, view: &NetworkView<'_>, a: &Node, b: &Node) -> bool {
        view.position.distance(a, b) <= self.max_distance
    }
}

/// Initiators only reach for equally full or fuller partners.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullerFilter;

impl FilterStrategy for FullerFilter {
    fn filter(&self, _view: &NetworkView<'_>, a: &Node, b: &Node) -> bool {
        a.fullness() <= b.fullness()
    }
}

/// The initiator's deposit must be at least `min_incoming_deposit` times
/// the acceptor's deposit.
#[derive(Debug, Clone, Copy)]
pub struct MinIncomingDepositFilter {
    pub deposit: Linear,
    pub min_incoming_deposit: f64,
}

impl FilterStrategy for MinIncomingDepositFilter {
    fn filter(&self, _view: &NetworkView<'_>, a: &Node, b: &Node) -> bool {
        self.deposit.map(a.fullness()) >= self.min_incoming_deposit * self.deposit.map(b.fullness())
    }
}

/// [`MinIncomingDepositFilter`] applied in both directions.
#[derive(Debug, Clone, Copy)]
pub struct MinMutualDepositFilter {
    pub deposit: Linear,
    pub min_mutual_deposit: f64,
}

impl FilterStrategy for MinMutualDepositFilter {
    fn filter(&self, _view: &NetworkView<'_>, a: &Node, b: &Node) -> bool {
        let (da, db) = (self.deposit.map(a.fullness()), self.deposit.map(b.fullness()));
        da >= self.min_mutual_deposit * db && db >= self.min_mutual_deposit * da
    }
}

/// Caps the acceptor's incoming channels at `max_channels(fullness)`.
#[derive(Debug, Clone, Copy)]
pub struct IncomingLimitFilter {
    pub max_channels: Linear,
}

impl FilterStrategy for IncomingLimitFilter {
    fn filter(&self, _view: &NetworkView<'_>, _a: &Node, b: &Node) -> bool {
        b.num_incoming_channels() < self.max_channels.map_count(b.fullness())
    }
}

/// Caps the acceptor's accepted channels at `max_channels(fullness)`.
#[derive(Debug, Clone, Copy)]
pub struct AcceptedLimitFilter {
    pub max_channels: Linear,
}

impl FilterStrategy for AcceptedLimitFilter {
    fn filter(&self, _view: &NetworkView<'_>, _a: &Node, b: &Node) -> bool {
        b.num_accepted_channels() < self.max_channels.map_count(b.fullness())
    }
}

/// Caps the acceptor's initiated plus accepted channels.
#[derive(Debug, Clone, Copy)]
pub struct TotalLimitFilter {
    pub max_channels: Linear,
}

impl FilterStrategy for TotalLimitFilter {
    fn filter(&self, _view: &NetworkView<'_>, _a: &Node, b: &Node) -> bool {
        b.num_channels() < self.max_channels.map_count(b.fullness())
    }
}

/// Caps the acceptor's unidirectional edge count.
///
/// A bidirectional channel counts as one incoming and one outgoing edge, so
/// the cap is doubled and a new channel adds two.
#[derive(Debug, Clone, Copy)]
pub struct TotalBidirectionalLimitFilter {
    pub max_channels: Linear,
}

impl FilterStrategy for TotalBidirectionalLimitFilter {
    fn filter(&self, _view: &NetworkView<'_>, _a: &Node, b: &Node) -> bool {
        let edges = b.num_incoming_channels() + b.num_outgoing_channels();
        edges + 2 <= 2 * self.max_channels.map_count(b.fullness())
    }
}

/// Direction-aware distance band between an emptier and a fuller node.
///
/// The pair is accepted only if their distance lies strictly between the
/// emptier node's threshold and the fuller node's threshold. Known to build
/// poorly routable networks; kept for comparison runs.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdFilter {
    pub thresholds: Linear,
}

impl FilterStrategy for ThresholdFilter {
    fn filter(&self, view: &NetworkView<'_>, a: &Node, b: &Node) -> bool {
        let (emptier, fuller) = if a.fullness() <= b.fullness() {
            (a, b)
        } else {
            (b, a)
        };
        let distance = view.position.distance(a, b);
        self.thresholds.map(emptier.fullness()) < distance
            && distance < self.thresholds.map(fuller.fullness())
    }
}

/// Balances a node's channels over exponential distance buckets.
///
/// A partner at distance `d` falls in bucket
/// `max(0, floor(log2(d)) - merge_count)`, clipped to `num_buckets - 1`. A
/// candidate is accepted only if its bucket is the least populated one among
/// `a`'s current partners, ties going to the lowest index. A node without
/// partners therefore fills bucket 0 first.
///
/// Without an explicit `merge_count` the filter merges
/// `floor(log2(id_space / node_count))` low buckets, so bucket 0 spans the
/// mean gap between ring neighbors.
#[derive(Debug, Clone, Copy)]
pub struct KademliaBucketFilter {
    pub num_buckets: usize,
    pub merge_count: Option<u32>,
}

impl KademliaBucketFilter {
    /// Merge count in effect for `view`.
    pub fn merge_count(&self, view: &NetworkView<'_>) -> u32 {
        self.merge_count.unwrap_or_else(|| {
            let nodes = view.network.node_count().max(1) as u64;
            (view.network.id_space() / nodes).max(1).ilog2()
        })
    }

    /// Bucket index for a distance.
    pub fn bucket(&self, view: &NetworkView<'_>, distance: f64) -> usize {
        let d = distance.max(0.0) as u64;
        if d == 0 {
            return 0;
        }
        let bucket = d.ilog2().saturating_sub(self.merge_count(view)) as usize;
        bucket.min(self.num_buckets.saturating_sub(1))
    }

    /// How many of `node`'s partners fall in each bucket.
    pub fn bucket_counts(&self, view: &NetworkView<'_>, node: &Node) -> Vec<usize> {
        let mut counts = vec![0; self.num_buckets.max(1)];
        for (partner, _) in view.network.neighbors(node.id()) {
            if let Some(other) = view.network.node(partner) {
                counts[self.bucket(view, view.position.distance(node, other))] += 1;
            }
        }
        counts
    }

    /// Lowest-index bucket among the least populated.
    pub fn least_populated_bucket(&self, view: &NetworkView<'_>, node: &Node) -> usize {
        let counts = self.bucket_counts(view, node);
        (0..counts.len())
            .min_by_key(|&i| (counts[i], i))
            .unwrap_or(0)
    }
}

impl FilterStrategy for KademliaBucketFilter {
    fn filter(&self, view: &NetworkView<'_>, a: &Node, b: &Node) -> bool {
        self.bucket(view, view.position.distance(a, b)) == self.least_populated_bucket(view, a)
    }
}

/// Accepts only server-role partners (non-zero fullness).
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerOnlyFilter;

impl FilterStrategy for ServerOnlyFilter {
    fn filter(&self, _view: &NetworkView<'_>, _a: &Node, b: &Node) -> bool {
        b.is_server()
    }
}

/// Conjunction of filters.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn FilterStrategy>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The filters every selection needs: no self-channels, no duplicates.
    pub fn basic() -> Self {
        Self::new().with(IdentityFilter).with(NotConnectedFilter)
    }

    /// Append a filter.
    pub fn with<F: FilterStrategy + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn push(&mut self, filter: Box<dyn FilterStrategy>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether every filter accepts the pair.
    pub fn accepts(&self, view: &NetworkView<'_>, a: &Node, b: &Node) -> bool {
        self.filters.iter().all(|f| f.filter(view, a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeId, RawNetwork, RingPosition};

    struct Fixture {
        net: RawNetwork,
        ring: RingPosition,
    }

    impl Fixture {
        fn new(nodes: &[(u64, f64)]) -> Self {
            let mut net = RawNetwork::new(1 << 10).unwrap();
            for (uid, fullness) in nodes {
                net.add_node(*uid, *fullness).unwrap();
            }
            Self {
                net,
                ring: RingPosition::new(1 << 10).unwrap(),
            }
        }

        fn check(&self, filter: &dyn FilterStrategy, a: u32, b: u32) -> bool {
            let view = NetworkView::new(&self.net, &self.ring);
            filter.filter(
                &view,
                self.net.node(NodeId(a)).unwrap(),
                self.net.node(NodeId(b)).unwrap(),
            )
        }

        fn connect(&mut self, a: u32, b: u32) {
            self.net.open_channel(NodeId(a), NodeId(b), 1.0, 1.0).unwrap();
            self.net.count_connection(NodeId(a), NodeId(b)).unwrap();
        }
    }

    #[test]
    fn identity_and_not_connected() {
        let mut fx = Fixture::new(&[(0, 0.1), (5, 0.2)]);
        assert!(!fx.check(&IdentityFilter, 0, 0));
        assert!(fx.check(&IdentityFilter, 0, 1));
        assert!(fx.check(&NotConnectedFilter, 0, 1));
        fx.connect(0, 1);
        assert!(!fx.check(&NotConnectedFilter, 0, 1));
        assert!(!fx.check(&NotConnectedFilter, 1, 0));
    }

    #[test]
    fn distance_and_fullness_ordering() {
        let fx = Fixture::new(&[(0, 0.5), (100, 0.5), (1000, 0.9)]);
        let near = DistanceFilter { max_distance: 100.0 };
        assert!(fx.check(&near, 0, 1));
        // 1000 is 24 away from 0 going around the ring
        assert!(fx.check(&near, 0, 2));
        assert!(!fx.check(&near, 1, 2));

        assert!(fx.check(&FullerFilter, 0, 1));
        assert!(fx.check(&FullerFilter, 0, 2));
        assert!(!fx.check(&FullerFilter, 2, 0));
    }

    #[test]
    fn deposit_ratios() {
        let fx = Fixture::new(&[(0, 0.0), (1, 1.0)]);
        let incoming = MinIncomingDepositFilter {
            deposit: Linear::new(10.0, 20.0),
            min_incoming_deposit: 0.6,
        };
        // 10 >= 0.6 * 20
        assert!(!fx.check(&incoming, 0, 1));
        assert!(fx.check(&incoming, 1, 0));

        let lenient = MinIncomingDepositFilter {
            deposit: Linear::new(10.0, 20.0),
            min_incoming_deposit: 0.5,
        };
        assert!(fx.check(&lenient, 0, 1));

        let mutual = MinMutualDepositFilter {
            deposit: Linear::new(10.0, 20.0),
            min_mutual_deposit: 0.6,
        };
        assert!(!fx.check(&mutual, 0, 1));
        assert!(!fx.check(&mutual, 1, 0));
    }

    #[test]
    fn channel_limits() {
        let mut fx = Fixture::new(&[(0, 0.0), (1, 0.0), (2, 0.0), (3, 0.0)]);
        let one = Linear::constant(1.0);
        let accepted = AcceptedLimitFilter { max_channels: one };
        let incoming = IncomingLimitFilter { max_channels: one };
        let total = TotalLimitFilter { max_channels: one };
        let bidirectional = TotalBidirectionalLimitFilter { max_channels: one };

        assert!(fx.check(&accepted, 0, 3));
        assert!(fx.check(&bidirectional, 0, 3));
        fx.connect(3, 1);
        // node 3 initiated once: accepted count still zero
        assert!(fx.check(&accepted, 0, 3));
        assert!(!fx.check(&incoming, 0, 3));
        assert!(!fx.check(&total, 0, 3));
        assert!(!fx.check(&bidirectional, 0, 3));
        // node 1 accepted once
        assert!(!fx.check(&accepted, 2, 1));
    }

    #[test]
    fn threshold_band_is_directional() {
        let fx = Fixture::new(&[(0, 0.0), (50, 1.0), (200, 1.0)]);
        let band = ThresholdFilter {
            thresholds: Linear::new(10.0, 100.0),
        };
        // emptier threshold 10 < 50 < fuller threshold 100
        assert!(fx.check(&band, 0, 1));
        assert!(fx.check(&band, 1, 0));
        assert!(!fx.check(&band, 0, 2));
        // equal fullness: band is empty
        assert!(!fx.check(&band, 1, 2));
    }

    #[test]
    fn bucket_index() {
        let fx = Fixture::new(&[(0, 0.5)]);
        let view = NetworkView::new(&fx.net, &fx.ring);
        let kad = KademliaBucketFilter {
            num_buckets: 4,
            merge_count: Some(2),
        };
        assert_eq!(kad.bucket(&view, 0.0), 0);
        assert_eq!(kad.bucket(&view, 1.0), 0);
        assert_eq!(kad.bucket(&view, 7.0), 0);
        assert_eq!(kad.bucket(&view, 8.0), 1);
        assert_eq!(kad.bucket(&view, 16.0), 2);
        assert_eq!(kad.bucket(&view, 500.0), 3);
    }

    #[test]
    fn derived_merge_count_follows_density() {
        // 4 nodes in 1024 ids: mean gap 256
        let fx = Fixture::new(&[(0, 0.5), (256, 0.5), (512, 0.5), (768, 0.5)]);
        let view = NetworkView::new(&fx.net, &fx.ring);
        let kad = KademliaBucketFilter {
            num_buckets: 4,
            merge_count: None,
        };
        assert_eq!(kad.merge_count(&view), 8);
        assert_eq!(kad.bucket(&view, 256.0), 0);
        assert_eq!(kad.bucket(&view, 511.0), 0);
        assert_eq!(kad.bucket(&view, 512.0), 1);
    }

    #[test]
    fn first_partner_lands_in_bucket_zero() {
        let mut fx = Fixture::new(&[(0, 0.5), (2, 0.5), (3, 0.5), (5, 0.5), (40, 0.5), (300, 0.5)]);
        let kad = KademliaBucketFilter {
            num_buckets: 4,
            merge_count: Some(1),
        };
        {
            let view = NetworkView::new(&fx.net, &fx.ring);
            let node = fx.net.node(NodeId(0)).unwrap();
            assert_eq!(kad.bucket_counts(&view, node), vec![0, 0, 0, 0]);
            assert_eq!(kad.least_populated_bucket(&view, node), 0);
            assert_eq!(kad.bucket(&view, 300.0), 3);
        }
        // all buckets tie at zero: only bucket 0 is open
        assert!(fx.check(&kad, 0, 1));
        assert!(!fx.check(&kad, 0, 3));
        assert!(!fx.check(&kad, 0, 4));
        assert!(!fx.check(&kad, 0, 5));

        fx.connect(0, 1);
        {
            let view = NetworkView::new(&fx.net, &fx.ring);
            let node = fx.net.node(NodeId(0)).unwrap();
            assert_eq!(kad.least_populated_bucket(&view, node), 1);
        }
        // bucket 0 is taken; bucket 1 (distance 4..8) is next
        assert!(!fx.check(&kad, 0, 2));
        assert!(fx.check(&kad, 0, 3));
        assert!(!fx.check(&kad, 0, 5));
    }

    #[test]
    fn server_only() {
        let fx = Fixture::new(&[(0, 0.0), (1, 0.7)]);
        assert!(fx.check(&ServerOnlyFilter, 0, 1));
        assert!(!fx.check(&ServerOnlyFilter, 1, 0));
    }

    #[test]
    fn chain_requires_all() {
        let mut fx = Fixture::new(&[(0, 0.2), (1, 0.9)]);
        let chain = FilterChain::basic().with(FullerFilter);
        assert_eq!(chain.len(), 3);
        let view = NetworkView::new(&fx.net, &fx.ring);
        let a = fx.net.node(NodeId(0)).unwrap();
        let b = fx.net.node(NodeId(1)).unwrap();
        assert!(chain.accepts(&view, a, b));
        assert!(!chain.accepts(&view, b, a));
        assert!(!chain.accepts(&view, a, a));
        fx.connect(0, 1);
        let view = NetworkView::new(&fx.net, &fx.ring);
        let a = fx.net.node(NodeId(0)).unwrap();
        let b = fx.net.node(NodeId(1)).unwrap();
        assert!(!chain.accepts(&view, a, b));
    }
}
