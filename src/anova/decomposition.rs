use crate::error::InputError;
use crate::table::Table;
use crate::testing::inference::map_columns;
use crate::testing::utils::extract_groups_in_order;
use ndarray::{Array1, Array2};
use std::collections::HashSet;

/// Degrees of freedom of the one-way partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreesOfFreedom {
    /// n - 1
    pub total: usize,
    /// k - 1
    pub model: usize,
    /// n - k
    pub error: usize,
}

/// Sum-of-squares partition of one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSumOfSquares {
    pub feature: String,
    pub total: f64,
    pub model: f64,
    pub error: f64,
    /// Mean of the observed values, also used to fill the missing ones
    pub mean: f64,
    /// Number of missing values replaced by `mean`
    pub imputed: usize,
    /// Mean per class, in the order of `SumOfSquaresResult::classes`
    pub class_means: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SumOfSquaresResult {
    pub degrees_of_freedom: DegreesOfFreedom,
    /// Group labels in order of first appearance
    pub classes: Vec<String>,
    pub class_sizes: Vec<usize>,
    pub features: Vec<FeatureSumOfSquares>,
    /// Observation value minus its group mean (observations × features)
    pub residuals: Array2<f64>,
    /// Group mean of each observation (observations × features)
    pub group_means: Array2<f64>,
}

impl SumOfSquaresResult {
    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.feature.clone()).collect()
    }

    pub fn n_observations(&self) -> usize {
        self.residuals.nrows()
    }
}

/// Grouping of the table rows, produced by [`validate_selection`].
#[derive(Debug, Clone)]
pub(crate) struct Grouping {
    pub classes: Vec<String>,
    pub assignment: Vec<usize>,
    pub sizes: Vec<usize>,
}

/// Check the column selection against the table before any arithmetic runs.
pub(crate) fn validate_selection<S: AsRef<str>>(
    table: &Table,
    features: &[S],
    group_column: &str,
) -> anyhow::Result<Grouping> {
    let labels = table.categorical(group_column)?;

    if features.is_empty() {
        return Err(InputError::EmptyFeatureList.into());
    }
    if table.n_rows() == 0 {
        return Err(InputError::EmptyTable.into());
    }

    let mut seen = HashSet::new();
    for feature in features {
        let name = feature.as_ref();
        if !seen.insert(name) {
            return Err(InputError::DuplicateFeature(name.to_string()).into());
        }
        let values = table.numeric(name)?;
        if values.iter().all(Option::is_none) {
            return Err(InputError::NoObservedValues(name.to_string()).into());
        }
    }

    let (classes, assignment) = extract_groups_in_order(labels);
    if classes.len() < 2 {
        return Err(InputError::TooFewGroups {
            column: group_column.to_string(),
            found: classes.len(),
        }
        .into());
    }

    let mut sizes = vec![0usize; classes.len()];
    for &class in &assignment {
        sizes[class] += 1;
    }

    Ok(Grouping {
        classes,
        assignment,
        sizes,
    })
}

struct FeatureColumns {
    summary: FeatureSumOfSquares,
    residuals: Vec<f64>,
    group_means: Vec<f64>,
}

/// Mean taken as an offset from the first value, exact for constant input.
fn shifted_mean<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> f64 {
    let mut values = values.into_iter();
    let Some(&first) = values.next() else {
        return f64::NAN;
    };
    let (offset, count) = values.fold((0.0, 1usize), |(sum, count), &v| {
        (sum + (v - first), count + 1)
    });
    first + offset / count as f64
}

fn decompose_feature(name: &str, values: &[Option<f64>], grouping: &Grouping) -> FeatureColumns {
    let observed_count = values.iter().flatten().count();
    let mean = shifted_mean(values.iter().flatten());
    let imputed = values.len() - observed_count;

    let filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(mean)).collect();

    let mut members: Vec<Vec<f64>> = grouping
        .sizes
        .iter()
        .map(|&size| Vec::with_capacity(size))
        .collect();
    for (&y, &class) in filled.iter().zip(&grouping.assignment) {
        members[class].push(y);
    }
    let class_means: Vec<f64> = members.iter().map(|m| shifted_mean(m)).collect();

    let group_means: Vec<f64> = grouping
        .assignment
        .iter()
        .map(|&class| class_means[class])
        .collect();
    let residuals: Vec<f64> = filled
        .iter()
        .zip(&group_means)
        .map(|(&y, &g)| y - g)
        .collect();

    let ss_total: f64 = filled.iter().map(|&y| (y - mean).powi(2)).sum();
    let ss_model: f64 = grouping
        .sizes
        .iter()
        .zip(&class_means)
        .map(|(&size, &class_mean)| size as f64 * (class_mean - mean).powi(2))
        .sum::<f64>()
        .min(ss_total);
    // Within-group scatter straight from the residuals, never negative
    let ss_error: f64 = residuals.iter().map(|r| r * r).sum();

    if imputed > 0 {
        tracing::warn!(
            feature = name,
            imputed,
            mean,
            "missing values replaced by the column mean before the decomposition"
        );
    }
    tracing::debug!(feature = name, ss_total, ss_model, ss_error, "sum of squares");

    FeatureColumns {
        summary: FeatureSumOfSquares {
            feature: name.to_string(),
            total: ss_total,
            model: ss_model,
            error: ss_error,
            mean,
            imputed,
            class_means,
        },
        residuals,
        group_means,
    }
}

pub(crate) fn decompose<S: AsRef<str> + Sync>(
    table: &Table,
    features: &[S],
    grouping: Grouping,
    parallel: bool,
) -> anyhow::Result<SumOfSquaresResult> {
    let n = table.n_rows();
    let k = grouping.classes.len();

    let columns = map_columns(features.len(), parallel, |j| {
        let name = features[j].as_ref();
        let values = table.numeric(name)?;
        Ok(decompose_feature(name, values, &grouping))
    })?;

    let mut residuals = Array2::zeros((n, columns.len()));
    let mut group_means = Array2::zeros((n, columns.len()));
    let mut summaries = Vec::with_capacity(columns.len());
    for (j, column) in columns.into_iter().enumerate() {
        residuals
            .column_mut(j)
            .assign(&Array1::from(column.residuals));
        group_means
            .column_mut(j)
            .assign(&Array1::from(column.group_means));
        summaries.push(column.summary);
    }

    Ok(SumOfSquaresResult {
        degrees_of_freedom: DegreesOfFreedom {
            total: n - 1,
            model: k - 1,
            error: n - k,
        },
        classes: grouping.classes,
        class_sizes: grouping.sizes,
        features: summaries,
        residuals,
        group_means,
    })
}

/// Sum-of-squares decomposition of every feature by the grouping column.
///
/// Missing feature values are replaced by the feature's mean before anything is
/// computed; the count of replaced values is kept in
/// [`FeatureSumOfSquares::imputed`]. Classes are taken in order of first appearance
/// and residuals keep the row order of the table.
///
/// # Errors
///
/// An [`InputError`] when the grouping column is absent or not categorical, the
/// feature list is empty, a feature is absent, not numeric, or entirely missing,
/// or fewer than two groups are present.
pub fn sum_of_squares<S: AsRef<str> + Sync>(
    table: &Table,
    features: &[S],
    group_column: &str,
) -> anyhow::Result<SumOfSquaresResult> {
    let grouping = validate_selection(table, features, group_column)?;
    decompose(table, features, grouping, false)
}
