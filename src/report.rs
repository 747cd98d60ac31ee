//! Plain-text renderings of the ANOVA tables.
//!
//! Each result renders as a grid with one row per quantity and one column per
//! feature. Values of a degenerate test are suffixed with `*` and explained in a
//! footnote under the grid.

use crate::anova::{DiagnosticsResult, FTestResult, FeatureSumOfSquares, SumOfSquaresResult};
use crate::testing::{Degeneracy, TestResult};
use std::fmt;

const MIN_CELL_WIDTH: usize = 10;

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if value == 0.0 || (1e-4..1e6).contains(&value.abs()) {
        format!("{:.4}", value)
    } else {
        format!("{:.4e}", value)
    }
}

fn marked(value: f64, degeneracy: Option<Degeneracy>) -> String {
    match degeneracy {
        Some(_) => format!("{}*", format_value(value)),
        None => format_value(value),
    }
}

fn marked_cells(tests: &[TestResult<f64>], value: impl Fn(usize) -> f64) -> Vec<String> {
    tests
        .iter()
        .enumerate()
        .map(|(j, t)| marked(value(j), t.degeneracy))
        .collect()
}

/// Row labels on the left, one right-aligned column per header.
struct Grid {
    header: Vec<String>,
    rows: Vec<(String, Vec<String>)>,
    footnotes: Vec<String>,
}

impl Grid {
    fn new(header: Vec<String>) -> Self {
        Grid {
            header,
            rows: Vec::new(),
            footnotes: Vec::new(),
        }
    }

    fn row(&mut self, label: &str, cells: Vec<String>) {
        self.rows.push((label.to_string(), cells));
    }

    fn note_degeneracies<'a, I>(&mut self, features: &[String], label: &str, tests: I)
    where
        I: IntoIterator<Item = &'a TestResult<f64>>,
    {
        for (feature, test) in features.iter().zip(tests) {
            if let Some(reason) = test.degeneracy {
                self.footnotes.push(format!("* {} ({}): {}", feature, label, reason));
            }
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self.rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
        let widths: Vec<usize> = (0..self.header.len())
            .map(|j| {
                self.rows
                    .iter()
                    .map(|(_, cells)| cells[j].len())
                    .chain(std::iter::once(self.header[j].len()))
                    .max()
                    .unwrap_or(0)
                    .max(MIN_CELL_WIDTH)
            })
            .collect();

        write!(f, "{:label_width$}", "")?;
        for (name, width) in self.header.iter().zip(&widths) {
            write!(f, "  {:>width$}", name, width = *width)?;
        }
        writeln!(f)?;

        for (label, cells) in &self.rows {
            write!(f, "{:<label_width$}", label)?;
            for (cell, width) in cells.iter().zip(&widths) {
                write!(f, "  {:>width$}", cell, width = *width)?;
            }
            writeln!(f)?;
        }

        for note in &self.footnotes {
            writeln!(f, "{}", note)?;
        }
        Ok(())
    }
}

impl fmt::Display for SumOfSquaresResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = vec!["DL".to_string()];
        header.extend(self.feature_names());
        let mut grid = Grid::new(header);

        let df = self.degrees_of_freedom;
        let rows: [(&str, usize, fn(&FeatureSumOfSquares) -> f64); 3] = [
            ("SS_total", df.total, |ss| ss.total),
            ("SS_model", df.model, |ss| ss.model),
            ("SS_error", df.error, |ss| ss.error),
        ];
        for (label, dof, value) in rows {
            let mut cells = vec![dof.to_string()];
            cells.extend(self.features.iter().map(|ss| format_value(value(ss))));
            grid.row(label, cells);
        }

        for ss in self.features.iter().filter(|ss| ss.imputed > 0) {
            grid.footnotes.push(format!(
                "{}: {} missing value(s) replaced by the mean {}",
                ss.feature,
                ss.imputed,
                format_value(ss.mean)
            ));
        }
        write!(f, "{}", grid)
    }
}

impl fmt::Display for DiagnosticsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid = Grid::new(self.features.clone());
        let normality_label = format!("normality ({})", self.normality_test.name());

        grid.row(
            &normality_label,
            marked_cells(&self.normality, |j| self.normality_p_value(j)),
        );
        grid.row(
            "homoscedasticity (Breusch-Pagan)",
            marked_cells(&self.homoscedasticity, |j| self.homoscedasticity_p_value(j)),
        );

        grid.note_degeneracies(&self.features, "normality", &self.normality);
        grid.note_degeneracies(&self.features, "homoscedasticity", &self.homoscedasticity);
        write!(f, "{}", grid)
    }
}

impl fmt::Display for FTestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid = Grid::new(self.features.clone());

        grid.row("eta_2", marked_cells(&self.tests, |j| self.eta_squared(j)));
        grid.row("omega_2", marked_cells(&self.tests, |j| self.omega_squared(j)));
        grid.row("F", marked_cells(&self.tests, |j| self.f_statistic(j)));
        grid.row("p", marked_cells(&self.tests, |j| self.p_value(j)));
        if self.summary.adjusted_p_values.is_some() {
            grid.row(
                "p_adj",
                marked_cells(&self.tests, |j| {
                    self.adjusted_p_value(j).unwrap_or(f64::NAN)
                }),
            );
        }

        grid.note_degeneracies(&self.features, "F-test", &self.tests);
        write!(f, "{}", grid)
    }
}
