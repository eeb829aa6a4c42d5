//!
//! Fragmenting annotated observations and reassembling decoded scores
//!
//! A full padded observation sequence carries a per-base (partition, strand)
//! mask. Each maximal run of one mask value becomes a `Fragment`, oriented
//! canonically forward, decoded under its partition's finalized model and
//! scattered back into a position x observation score matrix.
//!
use crate::coded::encode;
use crate::common::{revcomp, PartitionLabel, Sequence, Strand};
use crate::hmm::decode::posterior_symbol_likelihoods;
use crate::prob::Prob;
use crate::train::global::FinalizedModelMap;
use ndarray::Array2;
use rayon::prelude::*;

///
/// Per-base annotation of an observation sequence.
///
pub type RegionMask = Vec<(PartitionLabel, Strand)>;

///
/// A maximal same-(partition, strand) run of one observation.
///
/// `seq` is stored in canonical forward orientation; reverse-strand runs are
/// reverse-complemented at construction.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub observation: usize,
    pub offset: usize,
    pub start: usize,
    pub partition: PartitionLabel,
    pub strand: Strand,
    pub seq: Sequence,
}

impl Fragment {
    pub fn len(&self) -> usize {
        self.seq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

///
/// Split one observation into fragments along its mask.
///
/// Fragments are contiguous, non-overlapping and cover the whole sequence.
///
pub fn fragment(
    observation: usize,
    offset: usize,
    seq: &[u8],
    mask: &RegionMask,
) -> Vec<Fragment> {
    assert_eq!(seq.len(), mask.len());
    let mut fragments = Vec::new();
    let mut start = 0;
    while start < mask.len() {
        let (partition, strand) = &mask[start];
        let mut end = start + 1;
        while end < mask.len() && mask[end] == mask[start] {
            end += 1;
        }
        let run = &seq[start..end];
        let canonical = if strand.is_reverse() {
            revcomp(run)
        } else {
            run.to_vec()
        };
        fragments.push(Fragment {
            observation,
            offset,
            start,
            partition: partition.clone(),
            strand: *strand,
            seq: canonical,
        });
        start = end;
    }
    fragments
}

///
/// Decode every fragment under its partition's model and scatter the
/// per-position log-likelihoods into a (position x observation) matrix.
///
/// Reverse-strand results are flipped back into original coordinate order
/// before scattering at `offset + start`. Positions no fragment wrote stay
/// NaN. Fragments touch disjoint regions, so decoding runs in parallel and
/// only the scatter is sequential.
///
pub fn decode_all(
    fragments: &[Fragment],
    models: &FinalizedModelMap,
    n_positions: usize,
    n_observations: usize,
) -> Array2<f64> {
    let decoded: Vec<(usize, usize, Vec<Prob>)> = fragments
        .par_iter()
        .map(|fragment| {
            let finalized = &models[&fragment.partition];
            let coded = encode(&fragment.seq, finalized.order);
            let mut likelihoods = posterior_symbol_likelihoods(&finalized.model, &coded);
            if fragment.strand.is_reverse() {
                likelihoods.reverse();
            }
            (
                fragment.observation,
                fragment.offset + fragment.start,
                likelihoods,
            )
        })
        .collect();
    let mut scores = Array2::from_elem((n_positions, n_observations), f64::NAN);
    for (observation, begin, likelihoods) in decoded {
        for (i, likelihood) in likelihoods.iter().enumerate() {
            scores[[begin + i, observation]] = likelihood.to_log_value();
        }
    }
    scores
}

//
// tests
//
