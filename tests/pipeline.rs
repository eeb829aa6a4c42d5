//!
//! end-to-end test of survey, global search and fragment decoding
//!
use mosaichmm::coded::CodedSeqCache;
use mosaichmm::fragment::{decode_all, fragment};
use mosaichmm::mocks::{mock_observation, mock_training_sequences, MockEmWorker};
use mosaichmm::queue::WorkQueue;
use mosaichmm::train::drain_round;
use mosaichmm::train::global::{
    derive_chosen_params, finalize_models, schedule_global_search, select_survey_winners,
};
use mosaichmm::train::registry::JobRegistry;
use mosaichmm::train::survey::{schedule_survey, SurveyConfig};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

#[test]
fn survey_global_decode_pipeline() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let training = mock_training_sequences(0);
    let mut registry = JobRegistry::new();
    let mut cache = CodedSeqCache::new();
    let queue = WorkQueue::new(100);
    let mut worker = MockEmWorker::new(3);
    let config = SurveyConfig::new(vec![0, 1], vec![2, 3], 2);

    // first round opens every (order, states, replicate, partition) chain
    let expected = schedule_survey(
        &mut rng,
        &config,
        &training,
        &mut registry,
        &mut cache,
        &queue,
    );
    assert_eq!(expected, 2 * 2 * 2 * 3);
    assert_eq!(drain_round(&queue, &mut registry, &mut worker), expected);
    assert_eq!(registry.len(), 24);
    // one encoding per (partition, order)
    assert_eq!(cache.len(), 6);

    // further rounds until every chain reports convergence
    let mut n_rounds = 1;
    loop {
        let expected = schedule_survey(
            &mut rng,
            &config,
            &training,
            &mut registry,
            &mut cache,
            &queue,
        );
        if expected == 0 {
            break;
        }
        assert_eq!(drain_round(&queue, &mut registry, &mut worker), expected);
        n_rounds += 1;
        assert!(n_rounds < 20);
    }
    // the mock worker converges at iteration 3
    assert_eq!(n_rounds, 3);

    // the registry survives a persistence roundtrip mid-pipeline and the
    // reloaded copy schedules no further survey work
    let json = registry.to_json();
    let mut registry = JobRegistry::from_json(&json).unwrap();
    let expected = schedule_survey(
        &mut rng,
        &config,
        &training,
        &mut registry,
        &mut cache,
        &queue,
    );
    assert_eq!(expected, 0);

    // model selection: prune to the winning configuration per partition
    let winners = select_survey_winners(&registry);
    assert_eq!(winners.len(), 3);
    registry.retain(|job_id| {
        let config = winners[&job_id.partition];
        job_id.n_states == config.n_states && job_id.order == config.order
    });
    assert_eq!(registry.len(), 6);
    let chosen = derive_chosen_params(&registry).unwrap();

    // global search under a stricter bar reopens the surveyed chains and
    // adds a fresh third replicate per partition
    let threshold = 0.02;
    let expected = schedule_global_search(
        &mut rng,
        &mut registry,
        &chosen,
        3,
        threshold,
        &training,
        &mut cache,
        &queue,
    );
    assert_eq!(expected, 3 * 3);
    assert_eq!(drain_round(&queue, &mut registry, &mut worker), expected);
    let mut n_rounds = 1;
    loop {
        let expected = schedule_global_search(
            &mut rng,
            &mut registry,
            &chosen,
            3,
            threshold,
            &training,
            &mut cache,
            &queue,
        );
        if expected == 0 {
            break;
        }
        assert_eq!(drain_round(&queue, &mut registry, &mut worker), expected);
        n_rounds += 1;
        assert!(n_rounds < 20);
    }
    assert_eq!(registry.len(), 9);
    for job_id in registry.job_ids() {
        let last = registry.last(job_id).unwrap();
        assert!(last.converged);
        assert!(last.score <= threshold);
    }

    // decode one annotated observation under the finalized models
    let finalized = finalize_models(&registry, &chosen);
    assert_eq!(finalized.len(), 3);
    let (seq, mask) = mock_observation(0);
    let fragments = fragment(0, 0, &seq, &mask);
    assert_eq!(fragments.len(), 5);
    let total: usize = fragments.iter().map(|fragment| fragment.len()).sum();
    assert_eq!(total, seq.len());

    let scores = decode_all(&fragments, &finalized, seq.len(), 1);
    assert_eq!(scores.dim(), (seq.len(), 1));
    for fragment in fragments.iter() {
        let order = finalized[&fragment.partition].order;
        let begin = fragment.offset + fragment.start;
        for i in 0..fragment.len() - order {
            let score = scores[[begin + i, 0]];
            assert!(score.is_finite(), "position {} unscored", begin + i);
            assert!(score <= 0.0);
        }
    }
}
