//!
//! mock EM worker and mock genomes for tests and the demo binary
//!
use crate::common::{PartitionLabel, Sequence, Strand};
use crate::fragment::RegionMask;
use crate::random_seq::generate;
use crate::train::{EmWorker, IterationRecord, WorkItem};
use fnv::FnvHashMap;

///
/// EM stand-in that converges after a fixed number of iterations.
///
/// Each step echoes the model unchanged, improves the log-normalization
/// constant by a shrinking increment and reports a score of
/// `1 / iteration^2`, so chains converge monotonically and replicates stay
/// distinguishable through their log norms.
///
#[derive(Clone, Debug)]
pub struct MockEmWorker {
    pub n_iterations_to_converge: usize,
}

impl MockEmWorker {
    pub fn new(n_iterations_to_converge: usize) -> Self {
        assert!(n_iterations_to_converge > 0);
        MockEmWorker {
            n_iterations_to_converge,
        }
    }
}

impl EmWorker for MockEmWorker {
    fn step(&mut self, item: &WorkItem) -> IterationRecord {
        let iteration = item.iteration;
        let log_norm = item.log_norm - 10.0 / iteration as f64;
        let score = 1.0 / (iteration * iteration) as f64;
        let converged = iteration >= self.n_iterations_to_converge;
        IterationRecord::new(iteration, item.model.clone(), log_norm, score, converged)
    }
}

///
/// Three-partition training set of seeded random sequences.
///
pub fn mock_training_sequences(seed: u64) -> FnvHashMap<PartitionLabel, Vec<Sequence>> {
    let mut training = FnvHashMap::default();
    for (i, label) in ["exonic", "periexonic", "intergenic"].iter().enumerate() {
        let base_seed = seed + 100 * i as u64;
        let seqs = (0..3)
            .map(|j| generate(200, base_seed + j))
            .collect();
        training.insert(PartitionLabel::new(label), seqs);
    }
    training
}

///
/// One mock annotated observation: a seeded random sequence with a mask
/// walking through all three partitions on both strands.
///
pub fn mock_observation(seed: u64) -> (Sequence, RegionMask) {
    let runs: [(&str, Strand, usize); 5] = [
        ("intergenic", Strand::Forward, 30),
        ("periexonic", Strand::Forward, 20),
        ("exonic", Strand::Reverse, 40),
        ("periexonic", Strand::Reverse, 20),
        ("intergenic", Strand::Forward, 30),
    ];
    let length = runs.iter().map(|(_, _, run_length)| run_length).sum();
    let seq = generate(length, seed);
    let mut mask = RegionMask::with_capacity(length);
    for (label, strand, run_length) in runs.iter() {
        for _ in 0..*run_length {
            mask.push((PartitionLabel::new(label), *strand));
        }
    }
    (seq, mask)
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::HmmModel;
    use crate::train::JobId;
    use std::sync::Arc;

    #[test]
    fn mock_worker_converges_at_the_configured_iteration() {
        let mut worker = MockEmWorker::new(3);
        let job_id = JobId::new(PartitionLabel::new("exonic"), 2, 0, 0);
        let seqs = Arc::new(vec![crate::coded::encode(b"ACGT", 0)]);
        let mut log_norm = 0.0;
        for iteration in 1..=3 {
            let item = WorkItem::new(
                job_id.clone(),
                iteration,
                HmmModel::uniform(2, 4),
                log_norm,
                seqs.clone(),
            );
            let record = worker.step(&item);
            assert_eq!(record.iteration, iteration);
            assert!(record.log_norm < log_norm);
            assert_eq!(record.converged, iteration == 3);
            log_norm = record.log_norm;
        }
    }
    #[test]
    fn mock_training_sequences_cover_three_partitions() {
        let training = mock_training_sequences(0);
        assert_eq!(training.len(), 3);
        for seqs in training.values() {
            assert_eq!(seqs.len(), 3);
            assert!(seqs.iter().all(|seq| seq.len() == 200));
        }
    }
    #[test]
    fn mock_observation_mask_matches_sequence() {
        let (seq, mask) = mock_observation(1);
        assert_eq!(seq.len(), 140);
        assert_eq!(mask.len(), seq.len());
        assert!(mask.iter().any(|(_, strand)| strand.is_reverse()));
    }
}
