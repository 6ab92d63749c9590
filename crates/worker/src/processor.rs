//! PrimeFactors - the per-item workload
//!
//! Counts prime factors by trial division. Emulates a CPU-bound workload.

use contracts::{BatchError, Item, ItemProcessor};

/// Domain policy for inputs below 2, which have no prime factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BelowTwoPolicy {
    /// Return the sentinel value -1
    #[default]
    Sentinel,
    /// Return 0
    Zero,
}

/// Counts the prime factors of an item, with multiplicity.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimeFactors {
    below_two: BelowTwoPolicy,
}

impl PrimeFactors {
    /// Processor with the default sentinel policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Processor with an explicit below-2 policy
    pub fn with_policy(below_two: BelowTwoPolicy) -> Self {
        Self { below_two }
    }

    /// Count of prime factors of `number`, with multiplicity
    pub fn count_of_factors(&self, number: i64) -> i64 {
        if number < 2 {
            return match self.below_two {
                BelowTwoPolicy::Sentinel => -1,
                BelowTwoPolicy::Zero => 0,
            };
        }
        let mut remainder = number;
        let mut divisor = 2i64;
        let mut count = 0i64;
        while remainder > 1 {
            while remainder % divisor == 0 {
                count += 1;
                remainder /= divisor;
            }
            divisor += 1;
        }
        count
    }
}

impl ItemProcessor for PrimeFactors {
    fn process(&self, item: Item) -> Result<i64, BatchError> {
        Ok(self.count_of_factors(item))
    }
}
