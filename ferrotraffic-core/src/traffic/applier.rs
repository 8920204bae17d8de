//! Application of report batches to the street network

use hashbrown::HashSet;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::network::RoadNetwork;
use super::resolver::{AnchorStrategy, EdgeResolver};
use crate::model::{ReportBatch, ReportEntry, UpdateMode, ValueType};
use crate::{EdgeId, Error};

/// Reason a single report was skipped; the rest of the batch still applies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EntryRejection {
    #[error("no street found near {lat},{lon}")]
    NotFound { lat: f64, lon: f64 },
    #[error("edge {edge} was already updated by an earlier report of the batch")]
    DuplicateEdge { edge: usize },
    #[error("speed {value} cannot be stored")]
    InvalidSpeed { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedEntry {
    pub id: String,
    #[serde(flatten)]
    pub rejection: EntryRejection,
}

/// Outcome of applying one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyStats {
    /// Edges whose speed changed
    pub updated: usize,
    /// Edges that already had the reported speed
    pub unchanged: usize,
    /// Reports that could not be applied
    pub errors: usize,
    pub rejected: Vec<RejectedEntry>,
}

impl ApplyStats {
    fn reject(&mut self, entry: &ReportEntry, rejection: EntryRejection) {
        debug!("Skipping report {}: {rejection}", entry.id());
        self.errors += 1;
        self.rejected.push(RejectedEntry {
            id: entry.id().to_string(),
            rejection,
        });
    }

    /// Number of reports that were looked at
    pub fn total(&self) -> usize {
        self.updated + self.unchanged + self.errors
    }
}

/// Writes report speeds onto the edges they resolve to
///
/// Within one batch every edge is written at most once, the first report
/// resolving to an edge wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchApplier {
    resolver: EdgeResolver,
}

impl BatchApplier {
    pub fn new(strategy: AnchorStrategy) -> Self {
        Self {
            resolver: EdgeResolver::new(strategy),
        }
    }

    pub fn strategy(&self) -> AnchorStrategy {
        self.resolver.strategy()
    }

    /// Applies `batch` in order
    ///
    /// Taking `&mut N` means the caller holds exclusive access to the network for
    /// the whole batch. Edges written before a failure keep their new speed.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPolicy` for any report other than a speed
    /// replacement, and storage errors from the network
    #[allow(clippy::float_cmp)]
    pub fn apply<N: RoadNetwork + ?Sized>(
        &self,
        network: &mut N,
        batch: &ReportBatch,
    ) -> Result<ApplyStats, Error> {
        let mut stats = ApplyStats::default();
        let mut consumed: HashSet<EdgeId> = HashSet::with_capacity(batch.len());

        for entry in batch {
            let (point, edge) = self.resolver.resolve_entry(&*network, entry);
            let Some(edge) = edge else {
                stats.reject(
                    entry,
                    EntryRejection::NotFound {
                        lat: point.lat,
                        lon: point.lon,
                    },
                );
                continue;
            };

            if !consumed.insert(edge) {
                stats.reject(entry, EntryRejection::DuplicateEdge { edge: edge.index() });
                continue;
            }

            ensure_supported(entry)?;

            let proposed = match network.quantize_speed(entry.value()) {
                Ok(speed) => speed,
                Err(Error::InvalidSpeed(value)) => {
                    stats.reject(entry, EntryRejection::InvalidSpeed { value });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let current = network.speed(edge)?;
            if current == proposed {
                stats.unchanged += 1;
            } else {
                info!(
                    "Speed change at {} ({point}). Old: {current}, new: {proposed}",
                    entry.id()
                );
                network.set_speed(edge, entry.value())?;
                stats.updated += 1;
            }
        }

        info!(
            "Updated {} street elements of {}. Unchanged: {}, errors: {}",
            stats.updated,
            batch.len(),
            stats.unchanged,
            stats.errors
        );
        Ok(stats)
    }
}

fn ensure_supported(entry: &ReportEntry) -> Result<(), Error> {
    match (entry.mode(), entry.value_type()) {
        (UpdateMode::Replace, ValueType::Speed) => Ok(()),
        (mode, value_type) => Err(Error::UnsupportedPolicy {
            mode: mode.to_string(),
            value_type: value_type.to_string(),
        }),
    }
}
