//! One-way analysis of variance over the numeric features of a [`Table`].
//!
//! The pipeline runs in three stages: [`sum_of_squares`] partitions the variability
//! of each feature by the grouping column, [`diagnostics`] checks the normality and
//! homoscedasticity of the residuals, and [`f_test`] turns the partition into an
//! F-statistic with eta-squared and a p-value. [`compute`] chains them.

use crate::table::Table;
use crate::testing::Correction;
use crate::testing::inference::normality::NormalitySelection;
use serde::{Deserialize, Serialize};

pub mod decomposition;
pub mod diagnostics;

pub use decomposition::{DegreesOfFreedom, FeatureSumOfSquares, SumOfSquaresResult, sum_of_squares};
pub use diagnostics::{Assumption, AssumptionViolation, DiagnosticsResult, diagnostics};
pub use f_test::{FTestResult, f_test};

/// Options of a [`compute_with`] run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnovaConfig {
    /// Strategy choosing the normality test from the observation count
    pub normality: NormalitySelection,
    /// Multiple-testing adjustment of the F-test p-values across features
    pub correction: Option<Correction>,
    /// Evaluate features on the rayon pool
    pub parallel: bool,
    /// Level below which a diagnostic p-value is logged as an assumption violation
    pub significance_level: f64,
}

impl Default for AnovaConfig {
    fn default() -> Self {
        AnovaConfig {
            normality: NormalitySelection::default(),
            correction: None,
            parallel: false,
            significance_level: 0.05,
        }
    }
}

impl AnovaConfig {
    pub fn with_normality(mut self, normality: NormalitySelection) -> Self {
        self.normality = normality;
        self
    }

    pub fn with_correction(mut self, correction: Correction) -> Self {
        self.correction = Some(correction);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_significance_level(mut self, alpha: f64) -> Self {
        self.significance_level = alpha;
        self
    }
}

/// The three tables of one ANOVA run.
#[derive(Debug, Clone)]
pub struct AnovaResult {
    pub sum_of_squares: SumOfSquaresResult,
    pub diagnostics: DiagnosticsResult,
    pub f_test: FTestResult,
}

impl AnovaResult {
    pub fn into_parts(self) -> (SumOfSquaresResult, DiagnosticsResult, FTestResult) {
        (self.sum_of_squares, self.diagnostics, self.f_test)
    }
}

/// One-way ANOVA of `features` grouped by `group_column`, with default options.
///
/// See [`compute_with`].
pub fn compute<S: AsRef<str> + Sync>(
    table: &Table,
    features: &[S],
    group_column: &str,
) -> anyhow::Result<AnovaResult> {
    compute_with(table, features, group_column, &AnovaConfig::default())
}

/// One-way ANOVA of `features` grouped by `group_column`.
///
/// The column selection is validated before any arithmetic; invalid input fails
/// with an [`InputError`](crate::error::InputError). Numeric degeneracies never fail
/// the call, they are marked on the affected test results. Assumption violations
/// at `config.significance_level` are logged and returned, not corrected.
pub fn compute_with<S: AsRef<str> + Sync>(
    table: &Table,
    features: &[S],
    group_column: &str,
    config: &AnovaConfig,
) -> anyhow::Result<AnovaResult> {
    let grouping = decomposition::validate_selection(table, features, group_column)?;
    tracing::debug!(
        n = table.n_rows(),
        k = grouping.classes.len(),
        features = features.len(),
        group_column,
        "one-way ANOVA"
    );

    let sum_of_squares = decomposition::decompose(table, features, grouping, config.parallel)?;
    let diagnostics = diagnostics(&sum_of_squares, config.normality, config.parallel)?;
    let f_test = f_test(&sum_of_squares, config.correction)?;

    for violation in diagnostics.violations(config.significance_level) {
        tracing::warn!(
            feature = %violation.feature,
            assumption = %violation.assumption,
            p_value = violation.p_value,
            "ANOVA assumption rejected"
        );
    }

    Ok(AnovaResult {
        sum_of_squares,
        diagnostics,
        f_test,
    })
}
