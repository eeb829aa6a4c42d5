//!
//! Global-search planning at the chosen configuration per partition
//!
//! After the survey phase settles on one (state count, order) per partition,
//! the global search runs additional replicates at that configuration under
//! a stricter convergence threshold. Chains whose recorded convergence no
//! longer meets the tighter bar are reopened and iterated further.
//!
use super::registry::JobRegistry;
use super::survey::{initial_model, sorted_partitions};
use super::{JobId, WorkItem};
use crate::coded::{symbol_count, CodedSeqCache, BASE_ALPHABET_SIZE};
use crate::common::{PartitionLabel, Sequence};
use crate::hmm::HmmModel;
use crate::queue::WorkQueue;
use fnv::FnvHashMap;
use log::info;
use rand::Rng;

///
/// The (state count, order) pair a partition settled on during the survey.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChosenConfig {
    pub n_states: usize,
    pub order: usize,
}

pub type ChosenParams = FnvHashMap<PartitionLabel, ChosenConfig>;

///
/// Fatal misconfiguration detected while planning the global search.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    ///
    /// Two survey chains of one partition disagree on (state count, order).
    ///
    InconsistentParams {
        partition: PartitionLabel,
        existing: ChosenConfig,
        conflicting: ChosenConfig,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigError::InconsistentParams {
                partition,
                existing,
                conflicting,
            } => write!(
                f,
                "partition {} has chains at (K={}, order={}) and (K={}, order={})",
                partition,
                existing.n_states,
                existing.order,
                conflicting.n_states,
                conflicting.order
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

///
/// Read the single chosen (state count, order) per partition out of a
/// post-survey registry.
///
/// All chains of one partition must agree; disagreement means the survey
/// phase was not reconciled upstream and planning must halt.
///
pub fn derive_chosen_params(registry: &JobRegistry) -> Result<ChosenParams, ConfigError> {
    let mut chosen = ChosenParams::default();
    let mut job_ids: Vec<&JobId> = registry.job_ids().collect();
    job_ids.sort();
    for job_id in job_ids {
        let config = ChosenConfig {
            n_states: job_id.n_states,
            order: job_id.order,
        };
        match chosen.get(&job_id.partition) {
            None => {
                chosen.insert(job_id.partition.clone(), config);
            }
            Some(&existing) if existing == config => {}
            Some(&existing) => {
                return Err(ConfigError::InconsistentParams {
                    partition: job_id.partition.clone(),
                    existing,
                    conflicting: config,
                });
            }
        }
    }
    Ok(chosen)
}

///
/// Enqueue one global-search round of `n_replicates` chains per partition at
/// its chosen configuration.
///
/// Convergence recorded during the survey is re-examined against the
/// stricter `convergence_threshold`:
///
/// * converged with score within threshold: skip, decrement expected count
/// * converged with score above threshold: reopen the chain and requeue
/// * unconverged: requeue from the last record
/// * absent: initialize fresh, exactly as the survey does
///
/// Returns the number of `WorkItem`s the caller should expect back.
///
pub fn schedule_global_search<R: Rng>(
    rng: &mut R,
    registry: &mut JobRegistry,
    chosen: &ChosenParams,
    n_replicates: usize,
    convergence_threshold: f64,
    training: &FnvHashMap<PartitionLabel, Vec<Sequence>>,
    cache: &mut CodedSeqCache,
    queue: &WorkQueue<WorkItem>,
) -> usize {
    let partitions = sorted_partitions(training);
    let mut expected = n_replicates * partitions.len();
    for replicate in 0..n_replicates {
        for &partition in partitions.iter() {
            let config = chosen[partition];
            let job_id = JobId::new(partition.clone(), config.n_states, config.order, replicate);
            let seqs = cache.get_or_encode(partition, config.order, &training[partition]);
            match registry.last(&job_id).cloned() {
                Some(last) if last.converged && last.score <= convergence_threshold => {
                    expected -= 1;
                }
                Some(last) => {
                    if last.converged {
                        // converged by the survey bar but not by this one
                        info!(
                            "reopening job={} score={} threshold={}",
                            job_id, last.score, convergence_threshold
                        );
                        registry.reopen_last(&job_id);
                    }
                    queue.put(WorkItem::new(
                        job_id,
                        last.iteration + 1,
                        last.model,
                        last.log_norm,
                        seqs,
                    ));
                }
                None => {
                    if !registry.contains(&job_id) {
                        registry.register(&job_id);
                    }
                    let n_symbols = symbol_count(BASE_ALPHABET_SIZE, config.order);
                    let model = initial_model(rng, config.n_states, n_symbols);
                    queue.put(WorkItem::new(job_id, 1, model, 0.0, seqs));
                }
            }
        }
    }
    info!("global search scheduled expected={}", expected);
    expected
}

///
/// Pick, per partition, the (state count, order) whose chain reached the
/// highest log-normalization constant during the survey.
///
/// Callers prune the registry to the winners before `derive_chosen_params`;
/// the winners themselves carry over as the first global-search replicates.
///
pub fn select_survey_winners(registry: &JobRegistry) -> ChosenParams {
    let mut best: FnvHashMap<PartitionLabel, (f64, ChosenConfig)> = FnvHashMap::default();
    let mut job_ids: Vec<&JobId> = registry.job_ids().collect();
    job_ids.sort();
    for job_id in job_ids {
        let last = match registry.last(job_id) {
            Some(last) => last,
            None => continue,
        };
        let config = ChosenConfig {
            n_states: job_id.n_states,
            order: job_id.order,
        };
        match best.get(&job_id.partition) {
            Some(&(log_norm, _)) if log_norm >= last.log_norm => {}
            _ => {
                best.insert(job_id.partition.clone(), (last.log_norm, config));
            }
        }
    }
    best.into_iter()
        .map(|(partition, (_, config))| (partition, config))
        .collect()
}

///
/// A trained model chosen for a partition, ready for decoding.
///
/// `score` is the final log-normalization constant of the winning replicate.
///
#[derive(Clone, Debug, PartialEq)]
pub struct FinalizedModel {
    pub model: HmmModel,
    pub order: usize,
    pub score: f64,
}

pub type FinalizedModelMap = FnvHashMap<PartitionLabel, FinalizedModel>;

///
/// Pick, per partition, the replicate whose last record has the highest
/// log-normalization constant.
///
/// Panics if a partition in `chosen` has no chain with any record; the
/// global search must have completed at least one iteration per partition.
///
pub fn finalize_models(registry: &JobRegistry, chosen: &ChosenParams) -> FinalizedModelMap {
    let mut finalized = FinalizedModelMap::default();
    for (partition, config) in chosen.iter() {
        let best = registry
            .job_ids()
            .filter(|job_id| &job_id.partition == partition)
            .filter_map(|job_id| registry.last(job_id))
            .max_by(|a, b| {
                a.log_norm
                    .partial_cmp(&b.log_norm)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or_else(|| panic!("partition {} has no trained chain", partition));
        finalized.insert(
            partition.clone(),
            FinalizedModel {
                model: best.model.clone(),
                order: config.order,
                score: best.log_norm,
            },
        );
    }
    finalized
}

//
// tests
//
