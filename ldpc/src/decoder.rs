//! Sum-product belief propagation over the Tanner graph of a parity matrix.
//!
//! Beliefs are probabilities that a digit is 1. A received `0` starts at the
//! channel error probability, a received `1` at its complement. Internally
//! every belief is held as a log-likelihood ratio `ln(p / (1 - p))` so that
//! long products of probabilities become sums and cannot underflow.
//!
//! A decode is a [`DecodeState`] driven through:
//!
//! 1. [`BeliefPropagation::init_beliefs`]: variable-to-check messages set to
//!    the channel belief, check-to-variable messages neutral (0.5).
//! 2. Any number of iterations, each one
//!    [`BeliefPropagation::step_variable_to_check`] followed by
//!    [`BeliefPropagation::step_check_to_variable`].
//! 3. [`BeliefPropagation::marginalize`]: one posterior per digit.
//!
//! Each pass reads one message buffer and overwrites the other, so no edge
//! ever sees a value written in the same pass.

use crate::tanner::{EdgeBeliefs, TannerGraph};
use crate::LdpcError;
use log::{debug, trace};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Magnitude cap on every log-likelihood ratio; beyond it a belief is
/// treated as certain.
pub const LLR_LIMIT: f64 = 1000.0;

fn clamp_llr(llr: f64) -> f64 {
    llr.clamp(-LLR_LIMIT, LLR_LIMIT)
}

pub fn probability_to_llr(p: f64) -> f64 {
    clamp_llr((p / (1.0 - p)).ln())
}

pub fn llr_to_probability(llr: f64) -> f64 {
    if llr >= 0.0 {
        1.0 / (1.0 + (-llr).exp())
    } else {
        let e = llr.exp();
        e / (1.0 + e)
    }
}

/// Combine independent estimates that a bit is 1:
/// `prod(p) / (prod(p) + prod(1 - p))`, evaluated as a sum of log-likelihood
/// ratios. Contradicting certainties (a 0 and a 1) cancel to 0.5.
pub fn normalized_combine(probabilities: &[f64]) -> f64 {
    let llr: f64 = probabilities.iter().map(|&p| probability_to_llr(p)).sum();
    llr_to_probability(clamp_llr(llr))
}

/// Probability that the XOR of independent bits is 1, given each bit's
/// probability of being 1: `0.5 - 0.5 * prod(1 - 2p)`.
pub fn parity_combine(probabilities: &[f64]) -> f64 {
    let product: f64 = probabilities.iter().map(|&p| 1.0 - 2.0 * p).product();
    0.5 - 0.5 * product
}

/// Log-domain [`parity_combine`]. An empty input is a parity that is
/// certainly 0.
pub(crate) fn parity_combine_llr<I: IntoIterator<Item = f64>>(llrs: I) -> f64 {
    // With L = -llr, tanh(L_out / 2) = prod tanh(L_i / 2)
    match llrs.into_iter().map(|llr| -llr).reduce(boxplus) {
        Some(folded) => clamp_llr(-folded),
        None => -LLR_LIMIT,
    }
}

/// `2 atanh(tanh(a / 2) tanh(b / 2))` without leaving the log domain
fn boxplus(a: f64, b: f64) -> f64 {
    let sign = if (a < 0.0) != (b < 0.0) { -1.0 } else { 1.0 };
    sign * a.abs().min(b.abs()) + (-(a + b).abs()).exp().ln_1p() - (-(a - b).abs()).exp().ln_1p()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeState {
    /// channel belief per digit
    priors: Vec<f64>,
    to_check: EdgeBeliefs,
    to_variable: EdgeBeliefs,
    iterations: usize,
}

impl DecodeState {
    /// Channel-observation probability per digit
    pub fn channel_probabilities(&self) -> Vec<f64> {
        self.priors.iter().map(|&llr| llr_to_probability(llr)).collect()
    }

    /// Messages from digits to checks, one per edge
    pub fn variable_messages(&self) -> &EdgeBeliefs {
        &self.to_check
    }

    /// Messages from checks to digits, one per edge
    pub fn check_messages(&self) -> &EdgeBeliefs {
        &self.to_variable
    }

    /// Completed check-to-variable passes
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Belief propagation decoder for one parity matrix and channel.
#[derive(Debug, Clone)]
pub struct BeliefPropagation {
    graph: TannerGraph,
    error_probability: f64,
}

impl BeliefPropagation {
    pub fn new(graph: TannerGraph, error_probability: f64) -> Result<Self, LdpcError> {
        if !(0.0..=1.0).contains(&error_probability) {
            return Err(LdpcError::InvalidProbability(error_probability));
        }
        Ok(Self {
            graph,
            error_probability,
        })
    }

    pub fn graph(&self) -> &TannerGraph {
        &self.graph
    }

    pub fn error_probability(&self) -> f64 {
        self.error_probability
    }

    /// Start a decode from received symbols; any nonzero symbol is a 1.
    pub fn init_beliefs(&self, received: &[u8]) -> Result<DecodeState, LdpcError> {
        if received.len() != self.graph.digits() {
            return Err(LdpcError::LengthMismatch {
                expected: self.graph.digits(),
                actual: received.len(),
            });
        }

        let one_llr = probability_to_llr(1.0 - self.error_probability);
        let priors: Vec<f64> = received
            .iter()
            .map(|&bit| if bit != 0 { one_llr } else { -one_llr })
            .collect();

        let mut to_check = EdgeBeliefs::filled(self.graph.edge_count(), 0.0);
        for (edge, llr) in to_check.llrs_mut().iter_mut().enumerate() {
            *llr = priors[self.graph.edge(edge).1];
        }

        Ok(DecodeState {
            priors,
            to_check,
            to_variable: EdgeBeliefs::filled(self.graph.edge_count(), 0.0),
            iterations: 0,
        })
    }

    /// Each edge gets the digit's channel belief combined with the messages
    /// from every other check on that digit.
    pub fn step_variable_to_check(&self, state: &mut DecodeState) -> Result<(), LdpcError> {
        self.check_state(state)?;
        let graph = &self.graph;
        let priors = &state.priors;
        let incoming = state.to_variable.llrs();

        update_edges(state.to_check.llrs_mut(), |edge| {
            let digit = graph.edge(edge).1;
            let extrinsic: f64 = graph
                .digit_edges(digit)
                .iter()
                .filter(|&&other| other != edge)
                .map(|&other| incoming[other])
                .sum();
            clamp_llr(priors[digit] + extrinsic)
        });
        Ok(())
    }

    /// Each edge gets the parity of the messages from every other digit on
    /// the same check.
    pub fn step_check_to_variable(&self, state: &mut DecodeState) -> Result<(), LdpcError> {
        self.check_state(state)?;
        let graph = &self.graph;
        let incoming = state.to_check.llrs();

        update_edges(state.to_variable.llrs_mut(), |edge| {
            let check = graph.edge(edge).0;
            parity_combine_llr(
                graph
                    .check_edges(check)
                    .iter()
                    .filter(|&&other| other != edge)
                    .map(|&other| incoming[other]),
            )
        });
        state.iterations += 1;
        Ok(())
    }

    /// One round: variable-to-check then check-to-variable.
    pub fn iterate(&self, state: &mut DecodeState) -> Result<(), LdpcError> {
        self.step_variable_to_check(state)?;
        self.step_check_to_variable(state)?;
        trace!("belief propagation round {} done", state.iterations);
        Ok(())
    }

    /// Posterior probability per digit: channel belief combined with every
    /// incoming check message.
    pub fn marginalize(&self, state: &DecodeState) -> Result<Vec<f64>, LdpcError> {
        self.check_state(state)?;
        Ok((0..self.graph.digits())
            .map(|digit| {
                let llr = self
                    .graph
                    .digit_edges(digit)
                    .iter()
                    .fold(state.priors[digit], |acc, &edge| {
                        acc + state.to_variable.llr(edge)
                    });
                llr_to_probability(clamp_llr(llr))
            })
            .collect())
    }

    /// Run a full decode of `iterations` rounds and return the posteriors.
    pub fn decode(&self, received: &[u8], iterations: usize) -> Result<Vec<f64>, LdpcError> {
        let mut state = self.init_beliefs(received)?;
        for _ in 0..iterations {
            self.iterate(&mut state)?;
        }
        debug!(
            "decoded {} digits over {} edges in {} rounds",
            self.graph.digits(),
            self.graph.edge_count(),
            iterations
        );
        self.marginalize(&state)
    }

    /// A state only fits the decoder whose graph started it.
    fn check_state(&self, state: &DecodeState) -> Result<(), LdpcError> {
        if state.priors.len() != self.graph.digits() {
            return Err(LdpcError::LengthMismatch {
                expected: self.graph.digits(),
                actual: state.priors.len(),
            });
        }
        if state.to_check.len() != self.graph.edge_count() {
            return Err(LdpcError::LengthMismatch {
                expected: self.graph.edge_count(),
                actual: state.to_check.len(),
            });
        }
        Ok(())
    }
}

/// Overwrite every edge value from a function of the edge index.
fn update_edges<F>(values: &mut [f64], update: F)
where
    F: Fn(usize) -> f64 + Send + Sync,
{
    #[cfg(feature = "parallel")]
    values
        .par_iter_mut()
        .enumerate()
        .for_each(|(edge, value)| *value = update(edge));

    #[cfg(not(feature = "parallel"))]
    values
        .iter_mut()
        .enumerate()
        .for_each(|(edge, value)| *value = update(edge));
}
