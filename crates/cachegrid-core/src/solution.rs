//! Placement result and its textual output format.
//!
//! ```text
//! N                    number of caches that received videos
//! c v0 v1 ...          N lines: cache id, then videos in admission order
//! ```

use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SolutionError, SolutionResult};
use crate::types::{ServerId, VideoId};

/// Videos placed on one cache server, in admission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerPlacement {
    pub server: ServerId,
    pub videos: Vec<VideoId>,
}

/// Server-id → placed video ids.
///
/// Only servers holding at least one video appear. Entries are kept in the
/// order servers received their first video.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Solution {
    servers: Vec<ServerPlacement>,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `video` to the list for `server`.
    pub fn push(&mut self, server: ServerId, video: VideoId) {
        match self.servers.iter_mut().rev().find(|p| p.server == server) {
            Some(placement) => placement.videos.push(video),
            None => self.servers.push(ServerPlacement {
                server,
                videos: vec![video],
            }),
        }
    }

    /// Videos on `server`; empty if it received none.
    pub fn videos_on(&self, server: ServerId) -> &[VideoId] {
        self.servers
            .iter()
            .find(|p| p.server == server)
            .map(|p| p.videos.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, server: ServerId, video: VideoId) -> bool {
        self.videos_on(server).contains(&video)
    }

    pub fn placements(&self) -> impl Iterator<Item = &ServerPlacement> {
        self.servers.iter()
    }

    /// Number of servers holding at least one video.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Total number of (server, video) placements.
    pub fn placement_count(&self) -> usize {
        self.servers.iter().map(|p| p.videos.len()).sum()
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        write!(out, "{self}")?;
        out.flush()
    }

    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }

    pub fn load_file(path: &Path) -> SolutionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse the textual output format. Checks syntax only; use the
    /// placement crate's validator to check it against a catalog.
    pub fn parse(input: &str) -> SolutionResult<Self> {
        let mut lines = input
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l))
            .filter(|(_, l)| !l.trim().is_empty());

        let Some((line, first)) = lines.next() else {
            return Err(SolutionError::Parse {
                line: 1,
                message: "missing server count".to_string(),
            });
        };
        let declared: usize = first.trim().parse().map_err(|_| SolutionError::Parse {
            line,
            message: format!("invalid server count {:?}", first.trim()),
        })?;

        let mut solution = Self::new();
        let mut seen = HashSet::new();
        let mut found = 0;
        for (line, text) in lines {
            found += 1;
            let mut ids = text.split_whitespace().map(|token| {
                token.parse::<usize>().map_err(|_| SolutionError::Parse {
                    line,
                    message: format!("invalid id {token:?}"),
                })
            });
            let Some(server) = ids.next().transpose()? else {
                continue;
            };
            if !seen.insert(server) {
                return Err(SolutionError::DuplicateServer(server));
            }
            for video in ids {
                solution.push(server, video?);
            }
        }

        if found != declared {
            return Err(SolutionError::ServerCount { declared, found });
        }
        Ok(solution)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.servers.len())?;
        for placement in &self.servers {
            write!(f, "{}", placement.server)?;
            for video in &placement.videos {
                write!(f, " {video}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
