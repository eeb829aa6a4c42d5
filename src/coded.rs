//!
//! Order-N integer encoding of nucleotide sequences
//!
//! A markov order-N symbol folds the N preceding bases into the current one,
//! so the symbol alphabet grows as `4^(order+1)`. Encoding is the expensive
//! per-partition step and is cached by `(partition, order)`; the coded
//! sequences are shared read-only across all state counts and replicates.
//!
use crate::common::{base_index, PartitionLabel, Sequence};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

///
/// Size of the base alphabet (A/C/G/T)
///
pub const BASE_ALPHABET_SIZE: usize = 4;

///
/// number of order-N symbols `= base_alphabet_size ^ (order + 1)`
///
pub fn symbol_count(base_alphabet_size: usize, order: usize) -> usize {
    base_alphabet_size.pow(order as u32 + 1)
}

///
/// A nucleotide sequence encoded as integer symbols at a markov order.
///
/// `symbols[i]` is the base-4 packing of the `(order+1)`-base window ending
/// at raw position `i + order`; the first `order` raw positions have no
/// complete left context and are dropped.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodedSequence {
    symbols: Vec<usize>,
    order: usize,
    n_symbols: usize,
}

impl CodedSequence {
    pub fn symbols(&self) -> &[usize] {
        &self.symbols
    }
    pub fn order(&self) -> usize {
        self.order
    }
    ///
    /// size of the symbol alphabet
    ///
    pub fn n_symbols(&self) -> usize {
        self.n_symbols
    }
    ///
    /// number of coded positions
    ///
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

///
/// Encode a raw sequence into order-N symbols.
///
pub fn encode(seq: &[u8], order: usize) -> CodedSequence {
    let window = order + 1;
    let n_symbols = symbol_count(BASE_ALPHABET_SIZE, order);
    let symbols = if seq.len() < window {
        Vec::new()
    } else {
        (0..=seq.len() - window)
            .map(|i| {
                seq[i..i + window]
                    .iter()
                    .fold(0, |v, &base| v * BASE_ALPHABET_SIZE + base_index(base))
            })
            .collect()
    };
    CodedSequence {
        symbols,
        order,
        n_symbols,
    }
}

///
/// Cache of coded training sequences keyed by `(partition, order)` only.
///
/// Independent of state count and replicate: however many `(K, replicate)`
/// combinations share a `(partition, order)` pair, the encoding runs once.
///
#[derive(Clone, Debug, Default)]
pub struct CodedSeqCache {
    cache: FnvHashMap<(PartitionLabel, usize), Arc<Vec<CodedSequence>>>,
}

impl CodedSeqCache {
    pub fn new() -> Self {
        CodedSeqCache {
            cache: FnvHashMap::default(),
        }
    }
    ///
    /// Encode `seqs` at `order` for `partition`, or return the shared
    /// already-encoded copy.
    ///
    pub fn get_or_encode(
        &mut self,
        partition: &PartitionLabel,
        order: usize,
        seqs: &[Sequence],
    ) -> Arc<Vec<CodedSequence>> {
        self.cache
            .entry((partition.clone(), order))
            .or_insert_with(|| Arc::new(seqs.iter().map(|seq| encode(seq, order)).collect()))
            .clone()
    }
    pub fn len(&self) -> usize {
        self.cache.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

//
// tests
//
