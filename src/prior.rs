//!
//! Dirichlet priors for model initialization
//!
//! Transition rows are drawn with a heavy concentration on the diagonal so
//! that the expected self-transition probability dominates, modelling long
//! contiguous mosaic segments of one compositional regime.
//!
use crate::prob::Prob;
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};

///
/// default dope weight per state (concentration at the diagonal entry)
///
pub const DOPE_WEIGHT_PER_STATE: f64 = 250.0;

///
/// default background weight (concentration at off-diagonal entries)
///
pub const BACKGROUND_WEIGHT: f64 = 0.1;

fn draw_simplex<R: Rng>(rng: &mut R, concentration: &[f64]) -> Vec<Prob> {
    if concentration.len() == 1 {
        return vec![Prob::one()];
    }
    let dirichlet = Dirichlet::new(concentration).unwrap();
    dirichlet
        .sample(rng)
        .into_iter()
        .map(Prob::from_prob)
        .collect()
}

///
/// Draw a K x K row-stochastic transition matrix whose row `k` comes from a
/// Dirichlet with weight `dope_weight` at index `k` and `background_weight`
/// elsewhere.
///
pub fn doped_transition_matrix_with<R: Rng>(
    rng: &mut R,
    n_states: usize,
    dope_weight: f64,
    background_weight: f64,
) -> Vec<Vec<Prob>> {
    assert!(n_states > 0);
    assert!(dope_weight > 0.0 && background_weight > 0.0);
    (0..n_states)
        .map(|k| {
            let mut concentration = vec![background_weight; n_states];
            concentration[k] = dope_weight;
            draw_simplex(rng, &concentration)
        })
        .collect()
}

///
/// `doped_transition_matrix_with` with the default weights
/// (`dope = n_states * 250`, `background = 0.1`).
///
pub fn doped_transition_matrix<R: Rng>(rng: &mut R, n_states: usize) -> Vec<Vec<Prob>> {
    doped_transition_matrix_with(
        rng,
        n_states,
        n_states as f64 * DOPE_WEIGHT_PER_STATE,
        BACKGROUND_WEIGHT,
    )
}

///
/// Draw a categorical emission distribution over `n_symbols` symbols from a
/// symmetric Dirichlet with concentration `alpha`.
///
pub fn emission_distribution_with<R: Rng>(rng: &mut R, n_symbols: usize, alpha: f64) -> Vec<Prob> {
    assert!(n_symbols > 0);
    assert!(alpha > 0.0);
    draw_simplex(rng, &vec![alpha; n_symbols])
}

///
/// Uninformative (symmetric, alpha=1) emission distribution draw.
///
pub fn emission_distribution<R: Rng>(rng: &mut R, n_symbols: usize) -> Vec<Prob> {
    emission_distribution_with(rng, n_symbols, 1.0)
}

///
/// Uninformative initial state distribution draw over `n_states` states.
///
pub fn initial_distribution<R: Rng>(rng: &mut R, n_states: usize) -> Vec<Prob> {
    assert!(n_states > 0);
    draw_simplex(rng, &vec![1.0; n_states])
}

//
// tests
//
