use crate::testing::TestResult;
use ndarray::{Array2, ArrayView1, Axis};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

pub mod heteroscedasticity;

pub mod normality;

pub mod parametric;

use normality::NormalitySelection;

/// Column-wise assumption tests over a residual matrix (observations × features).
pub trait ResidualMatrixTests {
    /// Normality test per column; the test is chosen once from the row count.
    fn normality_tests(
        &self,
        selection: NormalitySelection,
        parallel: bool,
    ) -> anyhow::Result<Vec<TestResult<f64>>>;

    /// Breusch-Pagan test per column against the matching column of `regressors`.
    fn breusch_pagan_tests(
        &self,
        regressors: &Array2<f64>,
        parallel: bool,
    ) -> anyhow::Result<Vec<TestResult<f64>>>;
}

impl ResidualMatrixTests for Array2<f64> {
    fn normality_tests(
        &self,
        selection: NormalitySelection,
        parallel: bool,
    ) -> anyhow::Result<Vec<TestResult<f64>>> {
        let test = selection.select(self.nrows());
        tracing::debug!(n = self.nrows(), test = test.name(), "selected normality test");

        map_columns(self.ncols(), parallel, |j| {
            test.run(&column_vec(self.column(j)))
        })
    }

    fn breusch_pagan_tests(
        &self,
        regressors: &Array2<f64>,
        parallel: bool,
    ) -> anyhow::Result<Vec<TestResult<f64>>> {
        if self.dim() != regressors.dim() {
            return Err(anyhow::anyhow!(
                "Residual matrix {:?} and regressor matrix {:?} must have the same shape",
                self.dim(),
                regressors.dim()
            ));
        }

        map_columns(self.ncols(), parallel, |j| {
            heteroscedasticity::breusch_pagan(
                &column_vec(self.column(j)),
                &column_vec(regressors.index_axis(Axis(1), j)),
            )
        })
    }
}

fn column_vec(column: ArrayView1<'_, f64>) -> Vec<f64> {
    column.iter().copied().collect()
}

/// Apply `f` to every column index, in order, optionally on the rayon pool.
pub(crate) fn map_columns<R, F>(ncols: usize, parallel: bool, f: F) -> anyhow::Result<Vec<R>>
where
    R: Send,
    F: Fn(usize) -> anyhow::Result<R> + Sync + Send,
{
    if parallel {
        (0..ncols).into_par_iter().map(f).collect()
    } else {
        (0..ncols).map(f).collect()
    }
}
