//! # Manager Configuration
//!
//! Growth policy and start capacity for an entity manager.
//!
//! Configuration is loaded once at startup, either built in code or parsed
//! from TOML:
//!
//! ```toml
//! start_capacity = 42
//!
//! [growth]
//! grow_amount = 5
//! grow_mul_num = 2
//! grow_mul_den = 1
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EcsError, EcsResult};

/// Geometric growth policy.
///
/// When the active range is full the manager grows to
/// `ceil((capacity + grow_amount) * grow_mul_num / grow_mul_den)` slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthOptions {
    /// Slots added before multiplying.
    pub grow_amount: usize,
    /// Multiplier numerator.
    pub grow_mul_num: usize,
    /// Multiplier denominator.
    pub grow_mul_den: usize,
}

impl GrowthOptions {
    /// Creates a growth policy of `(capacity + amount) * num / den`.
    #[inline]
    #[must_use]
    pub const fn new(grow_amount: usize, grow_mul_num: usize, grow_mul_den: usize) -> Self {
        Self {
            grow_amount,
            grow_mul_num,
            grow_mul_den,
        }
    }

    /// Checks that the multiplier is a ratio of at least one.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the denominator is zero or the
    /// ratio is below one.
    pub fn validate(&self) -> EcsResult<()> {
        if self.grow_mul_den == 0 {
            warn!("rejected growth options with a zero multiplier denominator");
            return Err(EcsError::InvalidConfig(
                "grow_mul_den must be greater than zero".to_string(),
            ));
        }
        if self.grow_mul_num < self.grow_mul_den {
            warn!(
                num = self.grow_mul_num,
                den = self.grow_mul_den,
                "rejected growth options with a shrinking multiplier"
            );
            return Err(EcsError::InvalidConfig(format!(
                "grow multiplier {}/{} is below 1",
                self.grow_mul_num, self.grow_mul_den
            )));
        }
        Ok(())
    }

    /// Returns the capacity that follows `current`.
    ///
    /// The result is always strictly greater than `current`, even for a
    /// policy of zero amount and unit multiplier.
    ///
    /// # Returns
    ///
    /// `None` if the computation overflows `usize`.
    #[must_use]
    pub fn next_capacity(&self, current: usize) -> Option<usize> {
        let scaled = current
            .checked_add(self.grow_amount)?
            .checked_mul(self.grow_mul_num)?;
        let next = scaled.div_ceil(self.grow_mul_den.max(1));
        Some(next.max(current.checked_add(1)?))
    }

    /// Returns the multiplier as a float, for display.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn multiplier(&self) -> f64 {
        self.grow_mul_num as f64 / self.grow_mul_den.max(1) as f64
    }
}

impl Default for GrowthOptions {
    fn default() -> Self {
        Self::new(5, 2, 1)
    }
}

/// Configuration of a single entity manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Slots allocated when the manager is built.
    pub start_capacity: usize,
    /// Growth policy once the start capacity is exhausted.
    pub growth: GrowthOptions,
}

impl ManagerConfig {
    /// Default number of pre-allocated slots.
    pub const DEFAULT_START_CAPACITY: usize = 42;

    /// Returns this configuration with a different start capacity.
    #[inline]
    #[must_use]
    pub const fn with_start_capacity(mut self, start_capacity: usize) -> Self {
        self.start_capacity = start_capacity;
        self
    }

    /// Returns this configuration with a different growth policy.
    #[inline]
    #[must_use]
    pub const fn with_growth(mut self, growth: GrowthOptions) -> Self {
        self.growth = growth;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the growth policy is invalid.
    pub fn validate(&self) -> EcsResult<()> {
        self.growth.validate()
    }

    /// Parses and validates a TOML configuration.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the text is not valid TOML for
    /// this structure or the growth policy is invalid.
    pub fn from_toml_str(text: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            start_capacity: Self::DEFAULT_START_CAPACITY,
            growth: GrowthOptions::default(),
        }
    }
}
