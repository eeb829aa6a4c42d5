//!
//! Distributed EM training of per-partition background models
//!
//! Training is organized as rounds: a scheduler (`survey` or `global`)
//! inspects the registry, pushes one `WorkItem` per live chain onto the work
//! queue and returns the expected completion count; an `EmWorker` consumes
//! the queue and appends one `IterationRecord` per item back into the
//! registry. Callers repeat schedule/drain until the scheduler expects zero.
//!
pub mod global;
pub mod registry;
pub mod survey;

use crate::coded::CodedSequence;
use crate::common::PartitionLabel;
use crate::hmm::HmmModel;
use crate::queue::WorkQueue;
use derive_new::new;
use log::debug;
use registry::JobRegistry;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::str::FromStr;
use std::sync::Arc;

///
/// Composite identity of one training chain.
///
/// Serialized as the string `partition:states:order:replicate` so it can key
/// JSON maps in the persisted registry.
///
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, new, SerializeDisplay, DeserializeFromStr,
)]
pub struct JobId {
    pub partition: PartitionLabel,
    pub n_states: usize,
    pub order: usize,
    pub replicate: usize,
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.partition, self.n_states, self.order, self.replicate
        )
    }
}

///
/// Error (unit type) in from_str of JobId
///
#[derive(Clone, Debug)]
pub struct JobIdParseError;

impl std::fmt::Display for JobIdParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "invalid JobId")
    }
}

impl FromStr for JobId {
    type Err = JobIdParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let mut next = || parts.next().ok_or(JobIdParseError);
        let partition = PartitionLabel::from_str(next()?).map_err(|_| JobIdParseError)?;
        let n_states = next()?.parse().map_err(|_| JobIdParseError)?;
        let order = next()?.parse().map_err(|_| JobIdParseError)?;
        let replicate = next()?.parse().map_err(|_| JobIdParseError)?;
        match parts.next() {
            Some(_) => Err(JobIdParseError),
            None => Ok(JobId {
                partition,
                n_states,
                order,
                replicate,
            }),
        }
    }
}

///
/// One completed EM iteration of a chain.
///
/// `score` is the convergence score reported by the EM primitive (log-space
/// distance between consecutive models; smaller is closer to a fixed point).
///
#[derive(Clone, Debug, PartialEq, new, serde::Serialize, serde::Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub model: HmmModel,
    pub log_norm: f64,
    pub score: f64,
    pub converged: bool,
}

///
/// Unit of work handed to an `EmWorker`: run one EM iteration of `model`
/// over `seqs`, starting from the given iteration number and normalization
/// constant.
///
/// Coded sequences are shared read-only across all items of a
/// `(partition, order)` pair.
///
#[derive(Clone, Debug, new)]
pub struct WorkItem {
    pub job_id: JobId,
    pub iteration: usize,
    pub model: HmmModel,
    pub log_norm: f64,
    pub seqs: Arc<Vec<CodedSequence>>,
}

///
/// The external EM training primitive: one parameter-update step per call.
///
pub trait EmWorker {
    fn step(&mut self, item: &WorkItem) -> IterationRecord;
}

///
/// Consume every queued item, appending each result to the registry.
///
/// Returns the number of items processed, which callers compare against the
/// expected count returned by the scheduling call that filled the queue.
///
pub fn drain_round<W: EmWorker>(
    queue: &WorkQueue<WorkItem>,
    registry: &mut JobRegistry,
    worker: &mut W,
) -> usize {
    let mut n_done = 0;
    while let Some(item) = queue.try_take() {
        let record = worker.step(&item);
        debug!(
            "job={} iteration={} score={} converged={}",
            item.job_id, record.iteration, record.score, record.converged
        );
        registry.append(&item.job_id, record);
        n_done += 1;
    }
    n_done
}

//
// tests
//
