//! Main resolve loop: points in, addresses out, one shared cache

use crate::input::parse_point;
use crate::settings::Settings;
use address_cache_lib::{AddressCache, CacheError, Geocoder, NominatimClient, Outcome, Resolver};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Errors that abort the whole run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Failed to read standard input: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub hits: usize,
    pub stored: usize,
    pub not_stored: usize,
    pub invalid: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Stored => self.stored += 1,
            Outcome::NotStored => self.not_stored += 1,
        }
    }

    pub fn resolved(&self) -> usize {
        self.hits + self.stored + self.not_stored
    }

    /// Whether every input line resolved
    pub fn is_success(&self) -> bool {
        self.invalid == 0 && self.failed == 0
    }
}

/// Resolve the points from the command line, or from stdin when none were given
pub async fn run(settings: Settings) -> Result<Summary, RunError> {
    let cache = Arc::new(AddressCache::new(settings.cache_config()));
    let client = NominatimClient::new(settings.nominatim_options())?;
    tracing::debug!("Using geocoder at {}", client.options().endpoint);
    let resolver = Resolver::new(Arc::clone(&cache), client);

    let mut summary = Summary::default();
    if settings.points.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            print_resolved(resolve_line(&resolver, &line, &mut summary).await);
        }
    } else {
        for point in &settings.points {
            print_resolved(resolve_line(&resolver, point, &mut summary).await);
        }
    }

    let info = cache.info();
    eprintln!(
        "Resolved {} of {} points ({} cache hits, {} fetched and cached, {} fetched uncached, {} failed, {} invalid); cache holds {} regions, tree height {}",
        summary.resolved(),
        summary.resolved() + summary.failed + summary.invalid,
        summary.hits,
        summary.stored,
        summary.not_stored,
        summary.failed,
        summary.invalid,
        info.entries,
        info.height
    );

    Ok(summary)
}

fn print_resolved(address: Option<String>) {
    if let Some(address) = address {
        println!("{}", address);
    }
}

/// Resolve a single input line, recording the result in `summary`
///
/// Returns `None` when the line is not a point or the lookup failed; both are
/// reported and counted but never abort the run.
pub async fn resolve_line<G: Geocoder>(
    resolver: &Resolver<G>,
    line: &str,
    summary: &mut Summary,
) -> Option<String> {
    let point = match parse_point(line) {
        Ok(point) => point,
        Err(e) => {
            tracing::error!("Skipping input {:?}: {}", line.trim(), e);
            summary.invalid += 1;
            return None;
        }
    };

    match resolver.lookup(point).await {
        Ok(resolution) => {
            tracing::debug!("{} -> {} ({})", point, resolution.address, resolution.outcome.as_str());
            summary.record(resolution.outcome);
            Some(resolution.address)
        }
        Err(e) => {
            tracing::error!("Failed to resolve {}: {}", point, e);
            summary.failed += 1;
            None
        }
    }
}
