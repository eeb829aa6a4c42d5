pub mod cli;
pub mod coded;
pub mod common;
pub mod fragment;
pub mod hmm;
pub mod mocks;
pub mod prior;
pub mod prob;
pub mod queue;
pub mod random_seq;
pub mod train;

#[macro_use]
extern crate approx;
