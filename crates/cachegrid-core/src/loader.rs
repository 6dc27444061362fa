//! Parser for the line-oriented problem input format.
//!
//! ```text
//! V E R C X            videos, endpoints, request records, caches, capacity
//! s0 s1 .. s(V-1)      video sizes
//! L K                  per endpoint: datacenter latency, attached caches
//! c l                  ... K lines: cache id, latency
//! v e n                R lines: video id, endpoint id, request count
//! ```
//!
//! Blank lines are ignored. Every other deviation is a [`CatalogError`].

use std::path::Path;

use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::types::{CacheServer, Catalog, DemandMatrix, Endpoint, Video};

/// Upper bound on the cache count in a header. Caches have no lines of
/// their own, so the input length cannot bound them.
pub const MAX_CACHE_SERVERS: usize = 1 << 20;

/// Read and parse an input file.
pub fn load_catalog(path: &Path) -> CatalogResult<Catalog> {
    let content = std::fs::read_to_string(path)?;
    let catalog = parse_catalog(&content)?;
    debug!(path = %path.display(), %catalog, "catalog loaded");
    Ok(catalog)
}

/// Parse a complete problem instance from its textual form.
pub fn parse_catalog(input: &str) -> CatalogResult<Catalog> {
    let mut lines = Records::new(input);

    let (line, header) = lines.record(
        "header",
        &["video count", "endpoint count", "request count", "cache count", "capacity"],
    )?;
    let [video_count, endpoint_count, request_count, server_count, capacity] = header[..] else {
        unreachable!("record() returns exactly the requested number of fields")
    };
    // Every endpoint and request needs a line of its own and every video a
    // token on the sizes line, so counts beyond the input are malformed.
    let remaining = lines.remaining();
    let video_count = bounded_count(line, "video count", video_count, input.len())?;
    let endpoint_count = bounded_count(line, "endpoint count", endpoint_count, remaining)?;
    let request_count = bounded_count(line, "request count", request_count, remaining)?;
    let server_count = bounded_count(line, "cache count", server_count, MAX_CACHE_SERVERS)?;
    debug!(
        line,
        video_count,
        endpoint_count,
        request_count,
        server_count,
        capacity,
        "parsed header"
    );

    let (line, sizes) = lines.values("video sizes", video_count, "video size")?;
    let mut videos = Vec::with_capacity(sizes.len());
    for (id, size) in sizes.into_iter().enumerate() {
        if size == 0 {
            return Err(CatalogError::ZeroSize { line, video: id });
        }
        videos.push(Video::new(id, size));
    }

    let mut servers: Vec<CacheServer> = (0..server_count)
        .map(|id| CacheServer::new(id, capacity))
        .collect();

    let mut endpoints = Vec::with_capacity(endpoint_count);
    for id in 0..endpoint_count {
        let (_, fields) = lines.record("endpoint description", &["latency", "cache count"])?;
        let [datacenter_latency, attached] = fields[..] else {
            unreachable!("record() returns exactly the requested number of fields")
        };
        endpoints.push(Endpoint {
            id,
            datacenter_latency,
        });

        for _ in 0..attached {
            let (line, fields) = lines.record("cache latency", &["cache id", "latency"])?;
            let [server, latency] = fields[..] else {
                unreachable!("record() returns exactly the requested number of fields")
            };
            let server = check_id(line, "cache", server, server_count)?;
            servers[server].endpoints.insert(id, latency);
        }
    }

    let mut demand = DemandMatrix::new(video_count);
    for _ in 0..request_count {
        let (line, fields) = lines.record(
            "request description",
            &["video id", "endpoint id", "request count"],
        )?;
        let [video, endpoint, count] = fields[..] else {
            unreachable!("record() returns exactly the requested number of fields")
        };
        let video = check_id(line, "video", video, video_count)?;
        let endpoint = check_id(line, "endpoint", endpoint, endpoint_count)?;
        if let Some(previous) = demand.set(video, endpoint, count) {
            debug!(
                line,
                video,
                endpoint,
                previous,
                count,
                "request record replaces earlier one"
            );
        }
    }

    lines.finish()?;

    Ok(Catalog::new(videos, endpoints, servers, demand))
}

fn bounded_count(
    line: usize,
    field: &'static str,
    count: u64,
    limit: usize,
) -> CatalogResult<usize> {
    match usize::try_from(count) {
        Ok(count) if count <= limit => Ok(count),
        _ => Err(CatalogError::CountTooLarge {
            line,
            field,
            count,
            limit,
        }),
    }
}

fn check_id(line: usize, kind: &'static str, id: u64, count: usize) -> CatalogResult<usize> {
    if id >= count as u64 {
        return Err(CatalogError::IdOutOfRange {
            line,
            kind,
            id,
            count,
        });
    }
    Ok(id as usize)
}

/// Non-blank input lines with their 1-based line numbers.
struct Records<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    last_line: usize,
}

impl<'a> Records<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().enumerate(),
            last_line: 0,
        }
    }

    /// Number of non-blank lines not yet consumed.
    fn remaining(&self) -> usize {
        self.lines
            .clone()
            .filter(|(_, text)| !text.trim().is_empty())
            .count()
    }

    fn next_line(&mut self, expected: &'static str) -> CatalogResult<(usize, &'a str)> {
        for (idx, text) in self.lines.by_ref() {
            self.last_line = idx + 1;
            if !text.trim().is_empty() {
                return Ok((idx + 1, text));
            }
        }
        Err(CatalogError::UnexpectedEof {
            line: self.last_line + 1,
            expected,
        })
    }

    /// Next line as exactly `names.len()` non-negative integers.
    fn record(
        &mut self,
        expected: &'static str,
        names: &[&'static str],
    ) -> CatalogResult<(usize, Vec<u64>)> {
        let (line, text) = self.next_line(expected)?;
        let values = parse_fields(line, text, names.len(), |i| names[i])?;
        Ok((line, values))
    }

    /// Next line as exactly `count` non-negative integers of one kind.
    fn values(
        &mut self,
        expected: &'static str,
        count: usize,
        name: &'static str,
    ) -> CatalogResult<(usize, Vec<u64>)> {
        if count == 0 {
            // The sizes line of an empty catalog may be blank or missing.
            return Ok((self.last_line, Vec::new()));
        }
        let (line, text) = self.next_line(expected)?;
        let values = parse_fields(line, text, count, |_| name)?;
        Ok((line, values))
    }

    fn finish(mut self) -> CatalogResult<()> {
        match self.next_line("end of input") {
            Ok((line, _)) => Err(CatalogError::TrailingContent { line }),
            Err(_) => Ok(()),
        }
    }
}

fn parse_fields(
    line: usize,
    text: &str,
    expected: usize,
    name: impl Fn(usize) -> &'static str,
) -> CatalogResult<Vec<u64>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != expected {
        return Err(CatalogError::FieldCount {
            line,
            expected,
            found: tokens.len(),
        });
    }

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let value: i64 = token.parse().map_err(|_| CatalogError::InvalidNumber {
                line,
                value: (*token).to_string(),
            })?;
            u64::try_from(value).map_err(|_| CatalogError::Negative {
                line,
                field: name(i),
                value,
            })
        })
        .collect()
}
