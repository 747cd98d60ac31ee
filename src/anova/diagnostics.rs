use crate::anova::decomposition::SumOfSquaresResult;
use crate::testing::TestResult;
use crate::testing::inference::ResidualMatrixTests;
use crate::testing::inference::normality::{NormalitySelection, NormalityTest};
use std::fmt;

/// ANOVA assumption checked by a diagnostic test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assumption {
    /// Residuals are normally distributed
    Normality,
    /// Residual variance is constant across groups
    Homoscedasticity,
}

impl fmt::Display for Assumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assumption::Normality => f.write_str("normality"),
            Assumption::Homoscedasticity => f.write_str("homoscedasticity"),
        }
    }
}

/// An assumption whose test rejected its null hypothesis.
#[derive(Debug, Clone, PartialEq)]
pub struct AssumptionViolation {
    pub feature: String,
    pub assumption: Assumption,
    pub p_value: f64,
}

#[derive(Debug, Clone)]
pub struct DiagnosticsResult {
    pub features: Vec<String>,
    /// Normality test that was selected for the sample size
    pub normality_test: NormalityTest,
    pub normality: Vec<TestResult<f64>>,
    /// Breusch-Pagan results, squared residuals against group means
    pub homoscedasticity: Vec<TestResult<f64>>,
}

impl DiagnosticsResult {
    pub fn normality_p_value(&self, feature: usize) -> f64 {
        self.normality[feature].p_value
    }

    pub fn homoscedasticity_p_value(&self, feature: usize) -> f64 {
        self.homoscedasticity[feature].p_value
    }

    /// Assumptions rejected at `alpha`, feature by feature. Degenerate tests are skipped.
    pub fn violations(&self, alpha: f64) -> Vec<AssumptionViolation> {
        let mut violations = Vec::new();
        for (j, feature) in self.features.iter().enumerate() {
            let checks = [
                (Assumption::Normality, &self.normality[j]),
                (Assumption::Homoscedasticity, &self.homoscedasticity[j]),
            ];
            for (assumption, test) in checks {
                if test.is_significant(alpha) {
                    violations.push(AssumptionViolation {
                        feature: feature.clone(),
                        assumption,
                        p_value: test.p_value,
                    });
                }
            }
        }
        violations
    }
}

/// Normality and homoscedasticity diagnostics on the residuals of a decomposition.
///
/// The normality test is picked once from the total observation count through
/// `selection`. Homoscedasticity is a Breusch-Pagan test of squared residuals on the
/// group-mean vector. Low p-values are reported, never corrected for.
pub fn diagnostics(
    sum_of_squares: &SumOfSquaresResult,
    selection: NormalitySelection,
    parallel: bool,
) -> anyhow::Result<DiagnosticsResult> {
    let residuals = &sum_of_squares.residuals;
    let normality_test = selection.select(residuals.nrows());

    let normality = residuals.normality_tests(NormalitySelection::Fixed(normality_test), parallel)?;
    let homoscedasticity =
        residuals.breusch_pagan_tests(&sum_of_squares.group_means, parallel)?;

    for (feature, (norm, homo)) in sum_of_squares
        .features
        .iter()
        .zip(normality.iter().zip(&homoscedasticity))
    {
        for (assumption, test) in [
            (Assumption::Normality, norm),
            (Assumption::Homoscedasticity, homo),
        ] {
            if let Some(reason) = test.degeneracy {
                tracing::warn!(feature = %feature.feature, %assumption, %reason, "degenerate diagnostic");
            }
        }
    }

    Ok(DiagnosticsResult {
        features: sum_of_squares.feature_names(),
        normality_test,
        normality,
        homoscedasticity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anova::decomposition::sum_of_squares;
    use crate::table::Table;

    fn spread_table() -> Table {
        // "even" has the same spread in every group, "fanning" grows with the group mean
        Table::new()
            .with_numeric(
                "even",
                [1.0, 2.0, 3.0, 2.0, 11.0, 12.0, 13.0, 12.0, 21.0, 22.0, 23.0, 22.0]
                    .map(Some)
                    .to_vec(),
            )
            .unwrap()
            .with_numeric(
                "fanning",
                [1.9, 2.1, 1.9, 2.1, 8.0, 12.0, 8.0, 12.0, 0.0, 40.0, 0.0, 40.0]
                    .map(Some)
                    .to_vec(),
            )
            .unwrap()
            .with_categorical("g", ["a", "a", "a", "a", "b", "b", "b", "b", "c", "c", "c", "c"])
            .unwrap()
    }

    #[test]
    fn test_diagnostics_shape_and_selection() {
        let ss = sum_of_squares(&spread_table(), &["even", "fanning"], "g").unwrap();
        let result = diagnostics(&ss, NormalitySelection::default(), false).unwrap();

        assert_eq!(result.features, vec!["even", "fanning"]);
        assert_eq!(result.normality_test, NormalityTest::ShapiroWilk);
        assert_eq!(result.normality.len(), 2);
        assert_eq!(result.homoscedasticity.len(), 2);
        for j in 0..2 {
            assert!((0.0..=1.0).contains(&result.normality_p_value(j)));
            assert!((0.0..=1.0).contains(&result.homoscedasticity_p_value(j)));
        }
    }

    #[test]
    fn test_unequal_spread_is_flagged() {
        let ss = sum_of_squares(&spread_table(), &["even", "fanning"], "g").unwrap();
        let result = diagnostics(&ss, NormalitySelection::default(), false).unwrap();

        assert!(result.homoscedasticity[0].statistic.abs() < 1e-9);
        assert!(result.homoscedasticity_p_value(1) < result.homoscedasticity_p_value(0));
        assert!(result.homoscedasticity_p_value(1) < 0.05);

        let violations = result.violations(0.05);
        assert!(violations.iter().any(|v| v.feature == "fanning"
            && v.assumption == Assumption::Homoscedasticity));
        assert!(!violations.iter().any(|v| v.feature == "even"
            && v.assumption == Assumption::Homoscedasticity));
    }

    #[test]
    fn test_large_sample_branch() {
        let ss = sum_of_squares(&spread_table(), &["even"], "g").unwrap();
        let selection = NormalitySelection::Auto {
            large_sample_threshold: 12,
        };
        let result = diagnostics(&ss, selection, false).unwrap();
        assert_eq!(result.normality_test, NormalityTest::DAgostinoPearson);
        assert_eq!(result.normality[0].degrees_of_freedom, Some(2.0));
    }
}
