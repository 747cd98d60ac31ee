//! Strongly-typed in-memory tables.
//!
//! A [`Table`] is an ordered list of named columns of equal length. Numeric columns
//! are nullable (`None` marks a missing value, and NaN is stored as `None`);
//! categorical columns are not.

use crate::error::InputError;

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<String>),
}

impl Column {
    pub fn categorical<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Column::Categorical(values.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// NaN cells of a numeric column become missing values.
    fn nan_as_missing(self) -> Self {
        match self {
            Column::Numeric(values) => Column::Numeric(
                values
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect(),
            ),
            categorical => categorical,
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Numeric(values) => values.iter().filter(|v| v.is_none()).count(),
            Column::Categorical(_) => 0,
        }
    }
}

/// Missing-value summary of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingSummary {
    pub column: String,
    pub missing: usize,
    /// Percentage of missing rows, rounded to one decimal
    pub ratio_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Column)>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Append a column; every column must have the same number of rows.
    ///
    /// NaN numeric values are stored as missing, so they are counted by
    /// [`Table::na_count`] and imputed like any other missing value.
    pub fn push_column(&mut self, name: &str, column: Column) -> anyhow::Result<()> {
        if self.columns.iter().any(|(existing, _)| existing == name) {
            return Err(InputError::DuplicateColumn(name.to_string()).into());
        }
        if let Some((_, first)) = self.columns.first() {
            if first.len() != column.len() {
                return Err(InputError::LengthMismatch {
                    column: name.to_string(),
                    expected: first.len(),
                    found: column.len(),
                }
                .into());
            }
        }
        self.columns.push((name.to_string(), column.nan_as_missing()));
        Ok(())
    }

    pub fn with_column(mut self, name: &str, column: Column) -> anyhow::Result<Self> {
        self.push_column(name, column)?;
        Ok(self)
    }

    pub fn with_numeric(self, name: &str, values: Vec<Option<f64>>) -> anyhow::Result<Self> {
        self.with_column(name, Column::Numeric(values))
    }

    pub fn with_categorical<I, S>(self, name: &str, values: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_column(name, Column::categorical(values))
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, column)| column)
    }

    /// Values of a numeric column, or an `InputError` naming the problem.
    pub fn numeric(&self, name: &str) -> anyhow::Result<&[Option<f64>]> {
        match self.column(name) {
            Some(Column::Numeric(values)) => Ok(values),
            Some(Column::Categorical(_)) => Err(InputError::NotNumeric(name.to_string()).into()),
            None => Err(InputError::MissingColumn(name.to_string()).into()),
        }
    }

    /// Labels of a categorical column, or an `InputError` naming the problem.
    pub fn categorical(&self, name: &str) -> anyhow::Result<&[String]> {
        match self.column(name) {
            Some(Column::Categorical(values)) => Ok(values),
            Some(Column::Numeric(_)) => Err(InputError::NotCategorical(name.to_string()).into()),
            None => Err(InputError::MissingColumn(name.to_string()).into()),
        }
    }

    /// Number and share of missing values for every column, in column order.
    ///
    /// The ratio of an empty table is reported as 0.
    pub fn na_count(&self) -> Vec<MissingSummary> {
        let n = self.n_rows();
        self.columns
            .iter()
            .map(|(name, column)| {
                let missing = column.null_count();
                let ratio_percent = if n == 0 {
                    0.0
                } else {
                    (missing as f64 / n as f64 * 1000.0).round() / 10.0
                };
                MissingSummary {
                    column: name.clone(),
                    missing,
                    ratio_percent,
                }
            })
            .collect()
    }
}
