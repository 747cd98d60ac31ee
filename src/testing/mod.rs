use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod correction;
pub mod effect;
pub mod inference;

pub mod utils;

/// Multiple testing correction applied across features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Correction {
    Bonferroni,
    Holm,
    BenjaminiHochberg,
    BenjaminiYekutieli,
}

/// Reason a statistic could not be computed from finite, well-posed quantities.
///
/// Results carrying a degeneracy still hold the raw value (often NaN or
/// infinite); the marker tells the analyst not to read it as a normal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degeneracy {
    /// Every observation equals the grand mean.
    ZeroTotalVariance,
    /// Observations equal their group means exactly (perfect fit).
    ZeroErrorVariance,
    /// As many groups as observations, n - k = 0.
    ZeroErrorDegreesOfFreedom,
    /// Too few observations for the selected test.
    InsufficientObservations,
    /// All residuals are identical.
    ConstantResiduals,
    /// The regressor has no spread, so no slope can be fitted.
    ConstantRegressor,
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Degeneracy::ZeroTotalVariance => "zero total variance",
            Degeneracy::ZeroErrorVariance => "zero error variance",
            Degeneracy::ZeroErrorDegreesOfFreedom => "zero error degrees of freedom",
            Degeneracy::InsufficientObservations => "insufficient observations",
            Degeneracy::ConstantResiduals => "constant residuals",
            Degeneracy::ConstantRegressor => "constant regressor",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// The test statistic value (e.g., F statistic, W statistic)
    pub statistic: T,
    /// The p-value of the test
    pub p_value: T,
    /// Degrees of freedom (for parametric inference)
    pub degrees_of_freedom: Option<T>,
    /// Effect size measurement
    pub effect_size: Option<T>,
    /// Set when the statistic comes from degenerate input
    pub degeneracy: Option<Degeneracy>,
    /// Additional test-specific information
    pub metadata: HashMap<String, T>,
}

impl<T> TestResult<T>
where
    T: Float,
{
    /// Create a new test result with minimal information
    pub fn new(statistic: T, p_value: T) -> Self {
        TestResult {
            statistic,
            p_value,
            degrees_of_freedom: None,
            effect_size: None,
            degeneracy: None,
            metadata: HashMap::new(),
        }
    }

    /// Create a new test result with effect size
    pub fn with_effect_size(statistic: T, p_value: T, effect_size: T) -> Self {
        TestResult {
            effect_size: Some(effect_size),
            ..TestResult::new(statistic, p_value)
        }
    }

    /// A result that could not be computed; statistic and p-value are NaN.
    pub fn degenerate(reason: Degeneracy) -> Self {
        TestResult::new(T::nan(), T::nan()).with_degeneracy(reason)
    }

    /// Add degrees of freedom to the result
    pub fn with_degrees_of_freedom(mut self, df: T) -> Self {
        self.degrees_of_freedom = Some(df);
        self
    }

    /// Mark the result as degenerate while keeping its raw values
    pub fn with_degeneracy(mut self, reason: Degeneracy) -> Self {
        self.degeneracy = Some(reason);
        self
    }

    /// Add additional metadata
    pub fn with_metadata(mut self, key: &str, value: T) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn is_degenerate(&self) -> bool {
        self.degeneracy.is_some()
    }

    /// Check if the result is statistically significant at the given threshold.
    ///
    /// Degenerate results are never significant.
    pub fn is_significant(&self, alpha: T) -> bool {
        !self.is_degenerate() && self.p_value < alpha
    }
}

#[derive(Debug, Clone)]
pub struct MultipleTestResults<T> {
    /// Test statistics for each feature
    pub statistics: Vec<T>,
    /// Raw (unadjusted) p-values
    pub p_values: Vec<T>,
    /// Adjusted p-values (after multiple testing correction)
    pub adjusted_p_values: Option<Vec<T>>,
    /// Effect sizes (if calculated)
    pub effect_sizes: Option<Vec<T>>,
    /// Global metadata about the test
    pub global_metadata: HashMap<String, String>,
}

impl<T> MultipleTestResults<T>
where
    T: Float,
{
    /// Create a new results object from p-values
    pub fn new(statistics: Vec<T>, p_values: Vec<T>) -> Self {
        MultipleTestResults {
            statistics,
            p_values,
            adjusted_p_values: None,
            effect_sizes: None,
            global_metadata: HashMap::new(),
        }
    }

    /// Add adjusted p-values to the results
    pub fn with_adjusted_p_values(mut self, adjusted_p_values: Vec<T>) -> Self {
        self.adjusted_p_values = Some(adjusted_p_values);
        self
    }

    /// Add effect sizes to the results
    pub fn with_effect_sizes(mut self, effect_sizes: Vec<T>) -> Self {
        self.effect_sizes = Some(effect_sizes);
        self
    }

    /// Add global metadata about the test
    pub fn with_global_metadata(mut self, key: &str, value: &str) -> Self {
        self.global_metadata
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Get indices of significant features at the given threshold
    pub fn significant_indices(&self, alpha: T) -> Vec<usize> {
        let p_values = match &self.adjusted_p_values {
            Some(adj_p) => adj_p,
            None => &self.p_values,
        };
        p_values
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| if p < alpha { Some(i) } else { None })
            .collect()
    }

    /// Get the number of significant features at the given threshold
    pub fn num_significant(&self, alpha: T) -> usize {
        self.significant_indices(alpha).len()
    }

    /// Get top n features by p-value, NaN p-values last
    pub fn top_features(&self, n: usize) -> Vec<usize> {
        let p_values = match &self.adjusted_p_values {
            Some(adj_p) => adj_p,
            None => &self.p_values,
        };

        let mut indices: Vec<usize> = (0..p_values.len()).collect();
        indices.sort_by(|&a, &b| {
            let (pa, pb) = (p_values[a], p_values[b]);
            match (pa.is_nan(), pb.is_nan()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                (false, false) => pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal),
            }
        });
        indices.truncate(n);
        indices
    }
}
