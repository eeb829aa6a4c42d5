//!
//! Posterior symbol-likelihood decoding by forward-backward
//!
//! All recursions run in log space through `Prob`, so zero emission
//! probabilities propagate as `-inf` without underflow or panics.
//!
use super::HmmModel;
use crate::coded::CodedSequence;
use crate::prob::Prob;

///
/// Emission log-likelihood table `ll[t][k] = emit(k, symbols[t])` with one
/// trailing boundary column appended.
///
/// The boundary column is uninformative (`p=1` for every state) so it leaves
/// the recursions unchanged; it exists so the backward pass has a terminal
/// position to anchor on. The corresponding output entry is stripped before
/// returning to the caller.
///
fn emission_table(model: &HmmModel, coded: &CodedSequence) -> Vec<Vec<Prob>> {
    let n_states = model.n_states();
    let mut table: Vec<Vec<Prob>> = coded
        .symbols()
        .iter()
        .map(|&symbol| (0..n_states).map(|k| model.emit_prob(k, symbol)).collect())
        .collect();
    table.push(vec![Prob::one(); n_states]);
    table
}

///
/// Forward table `alpha[t][k] = P(symbols[0..=t], state[t]=k)`.
///
fn forward(model: &HmmModel, ll: &[Vec<Prob>]) -> Vec<Vec<Prob>> {
    let n_states = model.n_states();
    let mut alpha = Vec::with_capacity(ll.len());
    for (t, row) in ll.iter().enumerate() {
        let prev: Option<&Vec<Prob>> = if t == 0 { None } else { alpha.last() };
        let column: Vec<Prob> = (0..n_states)
            .map(|k| {
                let reach = match prev {
                    None => model.init_prob(k),
                    Some(prev) => (0..n_states)
                        .map(|j| prev[j] * model.trans_prob(j, k))
                        .sum(),
                };
                reach * row[k]
            })
            .collect();
        alpha.push(column);
    }
    alpha
}

///
/// Backward table `beta[t][k] = P(symbols[t+1..] | state[t]=k)`.
///
fn backward(model: &HmmModel, ll: &[Vec<Prob>]) -> Vec<Vec<Prob>> {
    let n_states = model.n_states();
    let n_positions = ll.len();
    let mut beta = vec![vec![Prob::one(); n_states]; n_positions];
    for t in (0..n_positions - 1).rev() {
        for k in 0..n_states {
            beta[t][k] = (0..n_states)
                .map(|j| model.trans_prob(k, j) * ll[t + 1][j] * beta[t + 1][j])
                .sum();
        }
    }
    beta
}

///
/// Full sequence probability `P(symbols) = sum_k alpha[0][k] * beta[0][k]`.
///
/// Evaluated at the first position; the same sum at any position gives the
/// same value (up to float error), which the tests assert.
///
fn full_prob(alpha: &[Vec<Prob>], beta: &[Vec<Prob>]) -> Prob {
    alpha[0]
        .iter()
        .zip(beta[0].iter())
        .map(|(&a, &b)| a * b)
        .sum()
}

///
/// Per-position marginal likelihood of the observed symbol:
///
/// ```text
/// out[t] = sum_k gamma[t][k] * emit(k, symbols[t])
/// gamma[t][k] = alpha[t][k] * beta[t][k] / P(symbols)
/// ```
///
/// Returns one `Prob` per coded position. Empty input gives empty output.
///
pub fn posterior_symbol_likelihoods(model: &HmmModel, coded: &CodedSequence) -> Vec<Prob> {
    assert_eq!(model.n_symbols(), coded.n_symbols());
    if coded.is_empty() {
        return Vec::new();
    }
    let ll = emission_table(model, coded);
    let alpha = forward(model, &ll);
    let beta = backward(model, &ll);
    let full = full_prob(&alpha, &beta);
    let n_states = model.n_states();
    // skip the trailing boundary column
    (0..coded.len())
        .map(|t| {
            (0..n_states)
                .map(|k| alpha[t][k] * beta[t][k] / full * ll[t][k])
                .sum()
        })
        .collect()
}

//
// tests
//
