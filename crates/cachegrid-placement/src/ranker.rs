//! Server ranking by mean access latency.
//!
//! Servers with a lower mean latency over their attached endpoints rank
//! first; equal means fall back to ascending server id. Servers with no
//! endpoints have no mean and always rank last.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use cachegrid_core::{CacheServer, MeanLatency, ServerId};
use serde::Serialize;

/// A server's position key in the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerRank {
    pub server_id: ServerId,
    pub mean_latency: MeanLatency,
    /// Index of the server in the slice it was ranked from.
    #[serde(skip)]
    pub position: usize,
}

impl ServerRank {
    pub fn of(position: usize, server: &CacheServer) -> Self {
        Self {
            server_id: server.id,
            mean_latency: server.mean_latency(),
            position,
        }
    }
}

impl Ord for ServerRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mean_latency
            .cmp(&other.mean_latency)
            .then(self.server_id.cmp(&other.server_id))
            .then(self.position.cmp(&other.position))
    }
}

impl PartialOrd for ServerRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Rank all servers and return them best first.
pub fn rank_servers(servers: &[CacheServer]) -> Vec<ServerRank> {
    let mut ranks: Vec<ServerRank> = servers
        .iter()
        .enumerate()
        .map(|(position, server)| ServerRank::of(position, server))
        .collect();
    ranks.sort_unstable();
    ranks
}

/// The set of servers still waiting to be processed, best first.
///
/// Mean latencies never change during a run, so the order is computed once
/// into a min-heap and retiring a server is a pop.
#[derive(Debug, Clone, Default)]
pub struct LatencyRanker {
    active: BinaryHeap<Reverse<ServerRank>>,
}

impl LatencyRanker {
    pub fn new(servers: &[CacheServer]) -> Self {
        Self {
            active: servers
                .iter()
                .enumerate()
                .map(|(position, server)| Reverse(ServerRank::of(position, server)))
                .collect(),
        }
    }

    /// The best remaining server, without removing it.
    pub fn best(&self) -> Option<ServerRank> {
        self.active.peek().map(|Reverse(rank)| *rank)
    }

    /// Remove the best remaining server for good.
    pub fn retire_best(&mut self) -> Option<ServerRank> {
        self.active.pop().map(|Reverse(rank)| rank)
    }

    pub fn remaining(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Remaining servers in rank order.
    pub fn ordering(&self) -> Vec<ServerRank> {
        let mut ranks: Vec<ServerRank> = self.active.iter().map(|Reverse(r)| *r).collect();
        ranks.sort_unstable();
        ranks
    }
}
