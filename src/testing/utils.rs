use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::collections::HashMap;

/// Distinct labels in order of first appearance, plus the class index of every row.
pub fn extract_groups_in_order(labels: &[String]) -> (Vec<String>, Vec<usize>) {
    let mut classes: Vec<String> = Vec::new();
    let mut lookup: HashMap<&str, usize> = HashMap::new();
    let mut assignment = Vec::with_capacity(labels.len());

    for label in labels {
        let idx = *lookup.entry(label.as_str()).or_insert_with(|| {
            classes.push(label.clone());
            classes.len() - 1
        });
        assignment.push(idx);
    }

    (classes, assignment)
}

/// Upper tail of the chi-squared distribution; NaN when it cannot be evaluated.
pub fn chi_squared_sf(statistic: f64, df: f64) -> f64 {
    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic == f64::INFINITY {
        return 0.0;
    }
    match ChiSquared::new(df) {
        Ok(chi_dist) => chi_dist.sf(statistic.max(0.0)),
        Err(_) => f64::NAN,
    }
}
