//! Pseudo-Random Bit Sequence (PRBS) generation.
//!
//! The shift register is a plain value: [`PrbsState::step`] consumes a state
//! and returns the emitted bit together with the next state, so identical
//! inputs always produce identical sequences.

use serde::{Deserialize, Serialize};

/// Supported PRBS polynomials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PrbsOrder {
    /// x^7 + x^6 + 1
    #[default]
    Prbs7,
    /// x^9 + x^5 + 1
    Prbs9,
    /// x^11 + x^9 + 1
    Prbs11,
    /// x^15 + x^14 + 1
    Prbs15,
    /// x^23 + x^18 + 1
    Prbs23,
    /// x^31 + x^28 + 1
    Prbs31,
}

impl PrbsOrder {
    /// Register length in bits.
    pub fn bits(&self) -> u8 {
        match self {
            Self::Prbs7 => 7,
            Self::Prbs9 => 9,
            Self::Prbs11 => 11,
            Self::Prbs15 => 15,
            Self::Prbs23 => 23,
            Self::Prbs31 => 31,
        }
    }

    /// Register cell XORed with the last cell to form the feedback bit.
    fn tap(&self) -> u8 {
        match self {
            Self::Prbs7 => 0,
            Self::Prbs9 => 3,
            Self::Prbs11 => 1,
            Self::Prbs15 => 0,
            Self::Prbs23 => 4,
            Self::Prbs31 => 2,
        }
    }

    /// Sequence period (2^order - 1).
    pub fn period(&self) -> u64 {
        (1u64 << self.bits()) - 1
    }
}

impl TryFrom<u8> for PrbsOrder {
    type Error = String;

    fn try_from(order: u8) -> Result<Self, Self::Error> {
        match order {
            7 => Ok(Self::Prbs7),
            9 => Ok(Self::Prbs9),
            11 => Ok(Self::Prbs11),
            15 => Ok(Self::Prbs15),
            23 => Ok(Self::Prbs23),
            31 => Ok(Self::Prbs31),
            _ => Err(format!(
                "Unsupported PRBS order: {order}. Use 7, 9, 11, 15, 23, or 31"
            )),
        }
    }
}

impl From<PrbsOrder> for u8 {
    fn from(order: PrbsOrder) -> Self {
        order.bits()
    }
}

/// Linear feedback shift register state.
///
/// Register cell `k` is stored in bit `k`. Each step emits the last cell,
/// moves every cell one position up, and loads `cell[tap] XOR cell[last]`
/// into cell 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrbsState {
    register: u32,
    order: PrbsOrder,
}

impl PrbsState {
    /// Register seeded to all ones.
    pub fn seeded(order: PrbsOrder) -> Self {
        Self {
            register: mask(order),
            order,
        }
    }

    pub fn order(&self) -> PrbsOrder {
        self.order
    }

    /// Emit one bit and advance.
    #[must_use]
    pub fn step(self) -> (u8, Self) {
        let last = self.order.bits() - 1;
        let out = (self.register >> last) & 1;
        let feedback = ((self.register >> self.order.tap()) & 1) ^ out;
        let register = ((self.register << 1) & mask(self.order)) | feedback;
        (out as u8, Self { register, ..self })
    }
}

fn mask(order: PrbsOrder) -> u32 {
    ((1u64 << order.bits()) - 1) as u32
}

/// Generate `n` bits starting from `state`, returning the bits and the final state.
pub fn generate_bits(state: PrbsState, n: usize) -> (Vec<u8>, PrbsState) {
    let mut bits = Vec::with_capacity(n);
    let mut state = state;
    for _ in 0..n {
        let (bit, next) = state.step();
        bits.push(bit);
        state = next;
    }
    (bits, state)
}

/// Map bits `{0, 1}` to NRZ symbols `{-1, +1}`.
pub fn to_nrz(bits: &[u8]) -> Vec<f64> {
    bits.iter()
        .map(|&b| if b == 1 { 1.0 } else { -1.0 })
        .collect()
}

/// NRZ sequence of `num_bits` symbols from an all-ones seed.
pub fn prbs_symbols(order: PrbsOrder, num_bits: usize) -> Vec<f64> {
    let (bits, _) = generate_bits(PrbsState::seeded(order), num_bits);
    to_nrz(&bits)
}

/// Upsample symbols by sample-and-hold repetition.
pub fn hold_upsample(symbols: &[f64], samples_per_bit: usize) -> Vec<f64> {
    symbols
        .iter()
        .flat_map(|&v| std::iter::repeat(v).take(samples_per_bit))
        .collect()
}

/// Calculate run-length statistics for a bit sequence.
pub fn run_length_stats(bits: &[u8]) -> RunLengthStats {
    let mut stats = RunLengthStats::default();

    let Some((&first, rest)) = bits.split_first() else {
        return stats;
    };

    let mut current_run = 1usize;
    let mut current_bit = first;

    for &bit in rest {
        if bit == current_bit {
            current_run += 1;
        } else {
            stats.record(current_bit, current_run);
            current_run = 1;
            current_bit = bit;
        }
    }
    stats.record(current_bit, current_run);

    stats
}

/// Run-length statistics.
#[derive(Debug, Default)]
pub struct RunLengthStats {
    pub ones_runs: Vec<usize>,
    pub zeros_runs: Vec<usize>,
}

impl RunLengthStats {
    fn record(&mut self, bit: u8, run: usize) {
        if bit == 1 {
            self.ones_runs.push(run);
        } else {
            self.zeros_runs.push(run);
        }
    }

    /// Maximum run of ones.
    pub fn max_ones_run(&self) -> usize {
        self.ones_runs.iter().copied().max().unwrap_or(0)
    }

    /// Maximum run of zeros.
    pub fn max_zeros_run(&self) -> usize {
        self.zeros_runs.iter().copied().max().unwrap_or(0)
    }
}
