//!
//! Dense K-state hidden Markov model of background sequence composition
//!
pub mod decode;

use crate::prob::Prob;
use serde::{Deserialize, Serialize};

///
/// A trained (or prior-initialized) model over order-N symbols.
///
/// * `init`: initial state distribution over the K states
/// * `trans`: K x K row-stochastic transition matrix
/// * `emit`: K categorical emission distributions over the symbol alphabet
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HmmModel {
    init: Vec<Prob>,
    trans: Vec<Vec<Prob>>,
    emit: Vec<Vec<Prob>>,
}

impl HmmModel {
    ///
    /// Construct a model, checking dimensions and row-stochasticity.
    ///
    pub fn new(init: Vec<Prob>, trans: Vec<Vec<Prob>>, emit: Vec<Vec<Prob>>) -> Self {
        let n_states = init.len();
        assert!(n_states > 0);
        assert_eq!(trans.len(), n_states);
        assert_eq!(emit.len(), n_states);
        let n_symbols = emit[0].len();
        assert!(n_symbols > 0);
        assert_is_distribution(&init);
        for row in trans.iter() {
            assert_eq!(row.len(), n_states);
            assert_is_distribution(row);
        }
        for row in emit.iter() {
            assert_eq!(row.len(), n_symbols);
            assert_is_distribution(row);
        }
        HmmModel { init, trans, emit }
    }
    ///
    /// Model with uniform initial/transition/emission distributions.
    ///
    pub fn uniform(n_states: usize, n_symbols: usize) -> Self {
        let pi = Prob::from_prob(1.0 / n_states as f64);
        let pe = Prob::from_prob(1.0 / n_symbols as f64);
        HmmModel {
            init: vec![pi; n_states],
            trans: vec![vec![pi; n_states]; n_states],
            emit: vec![vec![pe; n_symbols]; n_states],
        }
    }
    pub fn n_states(&self) -> usize {
        self.init.len()
    }
    pub fn n_symbols(&self) -> usize {
        self.emit[0].len()
    }
    ///
    /// initial probability of state `k`
    ///
    pub fn init_prob(&self, k: usize) -> Prob {
        self.init[k]
    }
    ///
    /// transition probability from state `j` into state `k`
    ///
    pub fn trans_prob(&self, j: usize, k: usize) -> Prob {
        self.trans[j][k]
    }
    ///
    /// emission probability of `symbol` from state `k`
    ///
    pub fn emit_prob(&self, k: usize, symbol: usize) -> Prob {
        self.emit[k][symbol]
    }
}

fn assert_is_distribution(ps: &[Prob]) {
    let total: Prob = ps.iter().sum();
    assert!(
        (total.to_value() - 1.0).abs() < 1e-6,
        "distribution sums to {}",
        total.to_value()
    );
}

impl std::fmt::Display for HmmModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "K={} M={}", self.n_states(), self.n_symbols())?;
        for k in 0..self.n_states() {
            writeln!(f, "init[{}]={}", k, self.init[k])?;
        }
        for j in 0..self.n_states() {
            for k in 0..self.n_states() {
                writeln!(f, "trans[{},{}]={}", j, k, self.trans[j][k])?;
            }
        }
        Ok(())
    }
}

//
// tests
//
