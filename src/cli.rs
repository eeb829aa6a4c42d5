use crate::coded::CodedSeqCache;
use crate::common::{PartitionLabel, Sequence};
use crate::fragment::{decode_all, fragment};
use crate::mocks::{mock_observation, mock_training_sequences, MockEmWorker};
use crate::queue::WorkQueue;
use crate::train::global::{
    derive_chosen_params, finalize_models, schedule_global_search, select_survey_winners,
    ChosenParams,
};
use crate::train::registry::JobRegistry;
use crate::train::survey::{schedule_survey, SurveyConfig};
use crate::train::{drain_round, EmWorker, WorkItem};
use fnv::FnvHashMap;
use log::info;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::path::Path;

///
/// Load the registry from `path` if it exists, otherwise start empty.
///
pub fn load_registry(path: Option<&Path>) -> JobRegistry {
    match path {
        Some(path) if path.exists() => {
            info!("resuming registry from {}", path.display());
            JobRegistry::from_json_file(path)
                .unwrap_or_else(|err| panic!("cannot load registry: {}", err))
        }
        _ => JobRegistry::new(),
    }
}

///
/// Alternate schedule/drain survey rounds until the scheduler expects no
/// further work. Returns the number of rounds run.
///
pub fn run_survey<R: Rng, W: EmWorker>(
    rng: &mut R,
    config: &SurveyConfig,
    training: &FnvHashMap<PartitionLabel, Vec<Sequence>>,
    registry: &mut JobRegistry,
    cache: &mut CodedSeqCache,
    queue: &WorkQueue<WorkItem>,
    worker: &mut W,
) -> usize {
    let mut n_rounds = 0;
    loop {
        let expected = schedule_survey(rng, config, training, registry, cache, queue);
        if expected == 0 {
            break;
        }
        let n_done = drain_round(queue, registry, worker);
        assert_eq!(n_done, expected);
        n_rounds += 1;
        info!("survey round={} jobs={}", n_rounds, n_done);
    }
    n_rounds
}

///
/// Alternate schedule/drain global-search rounds until every chain meets the
/// stricter convergence threshold. Returns the number of rounds run.
///
pub fn run_global_search<R: Rng, W: EmWorker>(
    rng: &mut R,
    registry: &mut JobRegistry,
    chosen: &ChosenParams,
    n_replicates: usize,
    convergence_threshold: f64,
    training: &FnvHashMap<PartitionLabel, Vec<Sequence>>,
    cache: &mut CodedSeqCache,
    queue: &WorkQueue<WorkItem>,
    worker: &mut W,
) -> usize {
    let mut n_rounds = 0;
    loop {
        let expected = schedule_global_search(
            rng,
            registry,
            chosen,
            n_replicates,
            convergence_threshold,
            training,
            cache,
            queue,
        );
        if expected == 0 {
            break;
        }
        let n_done = drain_round(queue, registry, worker);
        assert_eq!(n_done, expected);
        n_rounds += 1;
        info!("global round={} jobs={}", n_rounds, n_done);
    }
    n_rounds
}

///
/// Full demonstration pipeline over mock data: survey, model selection,
/// global search, then fragment decoding of one mock observation.
///
/// Prints one summary line per fragment and returns the score matrix.
///
pub fn run_pipeline(
    seed: u64,
    orders: &[usize],
    state_counts: &[usize],
    n_survey_replicates: usize,
    n_global_replicates: usize,
    convergence_threshold: f64,
    em_iterations: usize,
    registry_path: Option<&Path>,
) -> Array2<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let training = mock_training_sequences(seed);
    let mut registry = load_registry(registry_path);
    let mut cache = CodedSeqCache::new();
    let n_partitions = training.len();
    let survey_jobs = orders.len() * state_counts.len() * n_survey_replicates * n_partitions;
    let global_jobs = n_global_replicates * n_partitions;
    let queue = WorkQueue::new(survey_jobs.max(global_jobs));
    let mut worker = MockEmWorker::new(em_iterations);

    let config = SurveyConfig::new(orders.to_vec(), state_counts.to_vec(), n_survey_replicates);
    let n_rounds = run_survey(
        &mut rng,
        &config,
        &training,
        &mut registry,
        &mut cache,
        &queue,
        &mut worker,
    );
    info!("survey finished rounds={} chains={}", n_rounds, registry.len());

    let winners = select_survey_winners(&registry);
    registry.retain(|job_id| {
        let config = winners[&job_id.partition];
        job_id.n_states == config.n_states && job_id.order == config.order
    });
    let chosen = derive_chosen_params(&registry).unwrap_or_else(|err| panic!("{}", err));
    for (partition, config) in chosen.iter() {
        info!(
            "chosen partition={} states={} order={}",
            partition, config.n_states, config.order
        );
    }

    let n_rounds = run_global_search(
        &mut rng,
        &mut registry,
        &chosen,
        n_global_replicates,
        convergence_threshold,
        &training,
        &mut cache,
        &queue,
        &mut worker,
    );
    info!("global search finished rounds={}", n_rounds);
    if let Some(path) = registry_path {
        registry
            .to_json_file(path)
            .unwrap_or_else(|err| panic!("cannot save registry: {}", err));
        info!("saved registry to {}", path.display());
    }

    let finalized = finalize_models(&registry, &chosen);
    let (seq, mask) = mock_observation(seed);
    let fragments = fragment(0, 0, &seq, &mask);
    let scores = decode_all(&fragments, &finalized, seq.len(), 1);
    for fragment in fragments.iter() {
        let order = finalized[&fragment.partition].order;
        let begin = fragment.offset + fragment.start;
        let n_scored = fragment.len().saturating_sub(order);
        if n_scored == 0 {
            continue;
        }
        let mean: f64 =
            (0..n_scored).map(|i| scores[[begin + i, 0]]).sum::<f64>() / n_scored as f64;
        println!(
            "{}\t{}\t{}\t{}\t{:.4}",
            fragment.partition,
            fragment.strand,
            begin,
            fragment.len(),
            mean
        );
    }
    scores
}

//
// tests
//
