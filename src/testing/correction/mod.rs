//! Multiple testing correction methods, applied when one ANOVA is run for many
//! features at once and the per-feature p-values are read together.

use crate::testing::Correction;
use anyhow::{Result, anyhow};
use std::cmp::Ordering;

/// Adjust p-values with the given method.
///
/// # Example
/// ```
/// use eda_anova::testing::Correction;
/// use eda_anova::testing::correction::adjust_p_values;
///
/// let adjusted = adjust_p_values(&[0.01, 0.03, 0.05], Correction::Bonferroni).unwrap();
/// assert!((adjusted[0] - 0.03).abs() < 1e-12);
/// ```
pub fn adjust_p_values(p_values: &[f64], method: Correction) -> Result<Vec<f64>> {
    match method {
        Correction::Bonferroni => bonferroni_correction(p_values),
        Correction::Holm => holm_bonferroni_correction(p_values),
        Correction::BenjaminiHochberg => benjamini_hochberg_correction(p_values),
        Correction::BenjaminiYekutieli => benjamini_yekutieli_correction(p_values),
    }
}

/// Adjust only the finite p-values, leaving NaN entries (degenerate tests) untouched.
///
/// The family size is the number of finite p-values. Returns all NaN when none are finite.
pub fn adjust_finite_p_values(p_values: &[f64], method: Correction) -> Result<Vec<f64>> {
    let finite: Vec<(usize, f64)> = p_values
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_finite())
        .map(|(i, &p)| (i, p))
        .collect();

    let mut adjusted = vec![f64::NAN; p_values.len()];
    if finite.is_empty() {
        return Ok(adjusted);
    }

    let values: Vec<f64> = finite.iter().map(|&(_, p)| p).collect();
    let corrected = adjust_p_values(&values, method)?;
    for (&(idx, _), p) in finite.iter().zip(corrected) {
        adjusted[idx] = p;
    }
    Ok(adjusted)
}

fn validate_p_values(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }
    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }
    Ok(())
}

fn sorted_ascending(p_values: &[f64]) -> Vec<(usize, f64)> {
    let mut indexed_p_values: Vec<(usize, f64)> =
        p_values.iter().enumerate().map(|(i, &p)| (i, p)).collect();
    indexed_p_values.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    indexed_p_values
}

/// Apply Bonferroni correction to p-values
///
/// Bonferroni correction is a simple but conservative method that multiplies
/// each p-value by the number of tests.
pub fn bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();

    // Multiply each p-value by n, capping at 1.0
    let adjusted = p_values.iter().map(|&p| (p * n as f64).min(1.0)).collect();

    Ok(adjusted)
}

/// Apply Benjamini-Hochberg (BH) procedure for controlling false discovery rate
///
/// The BH procedure controls the false discovery rate (FDR), which is the expected
/// proportion of false positives among all rejected null hypotheses.
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    Ok(step_up(p_values, 1.0))
}

/// Apply Benjamini-Yekutieli (BY) procedure for controlling false discovery rate under dependence
///
/// Features measured on the same observations are rarely independent, which is the
/// setting BY stays valid in.
pub fn benjamini_yekutieli_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let c_n: f64 = (1..=n).map(|i| 1.0 / i as f64).sum();
    Ok(step_up(p_values, c_n))
}

// Shared BH/BY step-up pass, `factor` is 1 for BH and the harmonic sum for BY
fn step_up(p_values: &[f64], factor: f64) -> Vec<f64> {
    let n = p_values.len();
    let indexed_p_values = sorted_ascending(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut current_min = 1.0;

    // Process from largest to smallest p-value
    for i in (0..n).rev() {
        let (orig_idx, p_val) = indexed_p_values[i];
        let rank = i + 1;

        let adjustment = (p_val * factor * n as f64 / rank as f64).min(1.0);
        current_min = adjustment.min(current_min);
        adjusted_p_values[orig_idx] = current_min;
    }

    adjusted_p_values
}

/// Apply Holm-Bonferroni (step-down) method for controlling family-wise error rate
///
/// Uniformly more powerful than plain Bonferroni while controlling the same error rate.
pub fn holm_bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let indexed_p_values = sorted_ascending(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut running_max: f64 = 0.0;

    for (i, &(idx, p_val)) in indexed_p_values.iter().enumerate() {
        let adjusted_p = (p_val * (n - i) as f64).min(1.0);
        running_max = running_max.max(adjusted_p);
        adjusted_p_values[idx] = running_max;
    }

    Ok(adjusted_p_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_relative_eq(a: &[f64], b: &[f64], epsilon: f64) {
        assert_eq!(a.len(), b.len(), "Vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            if (x - y).abs() > epsilon {
                panic!("Vectors differ at index {}: {} != {}", i, x, y);
            }
        }
    }

    #[test]
    fn test_bonferroni() {
        let p_values = vec![0.01, 0.02, 0.03, 0.1, 0.2];
        let expected = vec![0.05, 0.1, 0.15, 0.5, 1.0];
        let adjusted = bonferroni_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_benjamini_hochberg_empty_input() {
        let result = benjamini_hochberg_correction(&[]);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "Empty p-value array");
    }

    #[test]
    fn test_benjamini_hochberg_invalid_pvalues() {
        let result = benjamini_hochberg_correction(&[0.01, -0.5, 0.03]);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid p-value at index 1")
        );

        let result = benjamini_hochberg_correction(&[0.01, 1.5, 0.03]);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid p-value at index 1")
        );
    }

    #[test]
    fn test_benjamini_hochberg_unordered_pvalues() {
        let p_values = vec![0.05, 0.01, 0.1, 0.04, 0.02];
        let expected = vec![0.0625, 0.05, 0.1, 0.0625, 0.05];
        let adjusted = benjamini_hochberg_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_benjamini_hochberg_real_example() {
        let pvalues = vec![0.1, 0.2, 0.3, 0.4, 0.1];
        let expected = [0.25, 0.3333333333333333, 0.375, 0.4, 0.25];
        let adjusted = benjamini_hochberg_correction(&pvalues).unwrap();

        for (a, e) in adjusted.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *e, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_benjamini_yekutieli_is_more_conservative() {
        let p_values = vec![0.01, 0.02, 0.03];
        let bh = benjamini_hochberg_correction(&p_values).unwrap();
        let by = benjamini_yekutieli_correction(&p_values).unwrap();
        for (b, y) in bh.iter().zip(by.iter()) {
            assert!(y >= b);
        }
        // c(3) = 1 + 1/2 + 1/3
        assert_relative_eq!(by[2], 0.03 * (11.0 / 6.0), epsilon = 1e-12);
    }

    #[test]
    fn test_holm_bonferroni() {
        let p_values = vec![0.01, 0.02, 0.03];
        // 0.01*3, max(0.02*2, 0.03), max(0.03*1, 0.04)
        let expected = vec![0.03, 0.04, 0.04];
        let adjusted = holm_bonferroni_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_adjust_finite_skips_nan() {
        let p_values = vec![0.01, f64::NAN, 0.04];
        let adjusted = adjust_finite_p_values(&p_values, Correction::Bonferroni).unwrap();
        assert_relative_eq!(adjusted[0], 0.02, epsilon = 1e-12);
        assert!(adjusted[1].is_nan());
        assert_relative_eq!(adjusted[2], 0.08, epsilon = 1e-12);

        let all_nan = adjust_finite_p_values(&[f64::NAN], Correction::Holm).unwrap();
        assert!(all_nan[0].is_nan());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(bonferroni_correction(&[]).is_err());
        assert!(holm_bonferroni_correction(&[]).is_err());
        assert!(benjamini_yekutieli_correction(&[]).is_err());

        let invalid_p = vec![-0.1, 0.5, 1.1];
        assert!(adjust_p_values(&invalid_p, Correction::Bonferroni).is_err());
        assert!(adjust_p_values(&invalid_p, Correction::BenjaminiHochberg).is_err());
    }
}
