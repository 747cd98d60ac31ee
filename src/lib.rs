//! # eda-anova
//!
//! One-way analysis of variance for exploratory data analysis over strongly-typed,
//! in-memory tables.
//!
//! Given numeric feature columns and one categorical grouping column, the crate
//! partitions the variability of every feature into between-group and within-group
//! sums of squares, runs the F-test with eta-squared and omega-squared effect sizes,
//! and checks the ANOVA assumptions on the residuals (Shapiro-Wilk or
//! D'Agostino-Pearson for normality, Breusch-Pagan for homoscedasticity).
//!
//! ## Core Features
//!
//! - **Sum-of-Squares Decomposition**: SS_total, SS_model, SS_error with degrees of freedom
//! - **F-Test**: upper-tail p-values, optional multiple testing correction across features
//! - **Assumption Diagnostics**: normality test chosen by sample size, Breusch-Pagan test
//! - **Degeneracy Markers**: perfect fits and empty error terms are flagged, not hidden
//!
//! ## Quick Start
//!
//! Build a [`Table`], then call [`compute`] with the feature names and the grouping
//! column. The three result tables implement `Display` for console output.
//!
//! ```
//! use eda_anova::{compute, Table};
//!
//! let table = Table::new()
//!     .with_numeric("y", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)])?
//!     .with_categorical("g", ["A", "A", "A", "B", "B", "B"])?;
//!
//! let (ss, diagnostics, f_test) = compute(&table, &["y"], "g")?.into_parts();
//! assert!((ss.features[0].model - 13.5).abs() < 1e-12);
//! assert!((f_test.f_statistic(0) - 13.5).abs() < 1e-9);
//! println!("{ss}\n{diagnostics}\n{f_test}");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! - **[`table`]**: Typed columns, missing-value summary
//! - **[`anova`]**: Decomposition, F-test, diagnostics and the [`compute`] pipeline
//! - **[`testing`]**: Test results, hypothesis tests, effect sizes and multiple testing correction
//! - **[`report`]**: Plain-text rendering of the result tables
//! - **[`error`]**: Input validation errors

pub mod anova;
pub mod error;
pub mod report;
pub mod table;
pub mod testing;

pub use anova::{AnovaConfig, AnovaResult, compute, compute_with};
pub use error::InputError;
pub use table::{Column, Table};
