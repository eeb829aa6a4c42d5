//!
//! Survey-phase scheduling over candidate configurations
//!
//! Enumerates every (partition, order, state count, replicate) combination,
//! seeds fresh chains from the Dirichlet priors and requeues unconverged
//! ones from their last recorded state.
//!
use super::registry::JobRegistry;
use super::{JobId, WorkItem};
use crate::coded::{symbol_count, CodedSeqCache, BASE_ALPHABET_SIZE};
use crate::common::{PartitionLabel, Sequence};
use crate::hmm::HmmModel;
use crate::prior;
use crate::queue::WorkQueue;
use derive_new::new;
use fnv::FnvHashMap;
use itertools::iproduct;
use log::info;
use rand::Rng;

///
/// Sets of candidate parameters swept by the survey phase.
///
#[derive(Clone, Debug, new)]
pub struct SurveyConfig {
    pub orders: Vec<usize>,
    pub state_counts: Vec<usize>,
    pub n_replicates: usize,
}

///
/// Fresh prior-initialized model for `n_states` states over `n_symbols`
/// order-N symbols.
///
pub fn initial_model<R: Rng>(rng: &mut R, n_states: usize, n_symbols: usize) -> HmmModel {
    let init = prior::initial_distribution(rng, n_states);
    let trans = prior::doped_transition_matrix(rng, n_states);
    let emit = (0..n_states)
        .map(|_| prior::emission_distribution(rng, n_symbols))
        .collect();
    HmmModel::new(init, trans, emit)
}

///
/// Partition labels in deterministic (sorted) order, so that scheduling
/// consumes the random source reproducibly for a given seed.
///
pub(super) fn sorted_partitions(
    training: &FnvHashMap<PartitionLabel, Vec<Sequence>>,
) -> Vec<&PartitionLabel> {
    let mut partitions: Vec<&PartitionLabel> = training.keys().collect();
    partitions.sort();
    partitions
}

///
/// Enqueue one survey round: a `WorkItem` per live chain of every candidate
/// combination.
///
/// * fresh jobs are registered and enqueued at iteration 1 with zero
///   log-normalization constant
/// * unconverged chains are requeued from their last record
/// * converged chains are skipped and decrement the expected count
///
/// Returns the number of `WorkItem`s the caller should expect back.
///
pub fn schedule_survey<R: Rng>(
    rng: &mut R,
    config: &SurveyConfig,
    training: &FnvHashMap<PartitionLabel, Vec<Sequence>>,
    registry: &mut JobRegistry,
    cache: &mut CodedSeqCache,
    queue: &WorkQueue<WorkItem>,
) -> usize {
    let partitions = sorted_partitions(training);
    let mut expected =
        config.orders.len() * config.state_counts.len() * config.n_replicates * partitions.len();
    for (replicate, &order, &n_states, partition) in iproduct!(
        0..config.n_replicates,
        config.orders.iter(),
        config.state_counts.iter(),
        partitions.iter().copied()
    ) {
        let job_id = JobId::new(partition.clone(), n_states, order, replicate);
        let seqs = cache.get_or_encode(partition, order, &training[partition]);
        match registry.last(&job_id) {
            Some(last) if last.converged => {
                expected -= 1;
            }
            Some(last) => {
                queue.put(WorkItem::new(
                    job_id,
                    last.iteration + 1,
                    last.model.clone(),
                    last.log_norm,
                    seqs,
                ));
            }
            None => {
                // a registered chain with no record yet is also
                // initialized fresh
                if !registry.contains(&job_id) {
                    registry.register(&job_id);
                }
                let n_symbols = symbol_count(BASE_ALPHABET_SIZE, order);
                let model = initial_model(rng, n_states, n_symbols);
                queue.put(WorkItem::new(job_id, 1, model, 0.0, seqs));
            }
        }
    }
    info!("survey scheduled expected={}", expected);
    expected
}

//
// tests
//
