// End-to-end tests of the ANOVA pipeline through the public API.

#[cfg(test)]
mod integration_tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use eda_anova::anova::DegreesOfFreedom;
    use eda_anova::testing::Correction;
    use eda_anova::{AnovaConfig, InputError, Table, compute, compute_with};
    use tracing_subscriber::EnvFilter;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn worked_example() -> Table {
        Table::new()
            .with_numeric(
                "y",
                vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)],
            )
            .unwrap()
            .with_categorical("g", ["A", "A", "A", "B", "B", "B"])
            .unwrap()
    }

    /// Two groups with identical within-group spread, group B shifted by `shift`.
    fn shifted_groups(shift: f64) -> Table {
        let base = [0.3, -1.2, 0.8, 0.1, -0.5, 1.4];
        let values: Vec<Option<f64>> = base
            .iter()
            .map(|&v| Some(v))
            .chain(base.iter().map(|&v| Some(v + shift)))
            .collect();
        let groups: Vec<&str> = std::iter::repeat_n("A", 6)
            .chain(std::iter::repeat_n("B", 6))
            .collect();
        Table::new()
            .with_numeric("y", values)
            .unwrap()
            .with_categorical("g", groups)
            .unwrap()
    }

    #[test]
    fn test_worked_example_end_to_end() {
        init_tracing();
        let result = compute(&worked_example(), &["y"], "g").unwrap();

        let ss = &result.sum_of_squares;
        assert_abs_diff_eq!(ss.features[0].mean, 3.5, epsilon = 1e-12);
        assert_abs_diff_eq!(ss.features[0].total, 17.5, epsilon = 1e-12);
        assert_abs_diff_eq!(ss.features[0].model, 13.5, epsilon = 1e-12);
        assert_abs_diff_eq!(ss.features[0].error, 4.0, epsilon = 1e-12);
        assert_eq!(ss.features[0].class_means, vec![2.0, 5.0]);
        assert_eq!(
            ss.degrees_of_freedom,
            DegreesOfFreedom {
                total: 5,
                model: 1,
                error: 4
            }
        );

        let f_test = &result.f_test;
        assert_abs_diff_eq!(f_test.f_statistic(0), 13.5, epsilon = 1e-9);
        assert_abs_diff_eq!(f_test.eta_squared(0), 13.5 / 17.5, epsilon = 1e-12);
        assert_abs_diff_eq!(f_test.p_value(0), 0.021312, epsilon = 1e-5);
        assert!(f_test.tests[0].degeneracy.is_none());

        let diagnostics = &result.diagnostics;
        assert!((0.0..=1.0).contains(&diagnostics.normality_p_value(0)));
        assert!((0.0..=1.0).contains(&diagnostics.homoscedasticity_p_value(0)));
    }

    #[test]
    fn test_degrees_of_freedom_identity() {
        let result = compute(&shifted_groups(1.0), &["y"], "g").unwrap();
        let df = result.sum_of_squares.degrees_of_freedom;
        let n = result.sum_of_squares.n_observations();
        assert_eq!(df.total, df.model + df.error);
        assert_eq!(df.total, n - 1);
    }

    #[test]
    fn test_separation_increases_f_and_decreases_p() {
        let mut previous: Option<(f64, f64)> = None;
        for shift in [0.5, 1.0, 2.0, 4.0] {
            let result = compute(&shifted_groups(shift), &["y"], "g").unwrap();
            let f = result.f_test.f_statistic(0);
            let p = result.f_test.p_value(0);
            // Within-group spread does not depend on the shift
            assert_relative_eq!(
                result.sum_of_squares.features[0].error,
                2.0 * 4.255,
                max_relative = 1e-9
            );
            if let Some((f_prev, p_prev)) = previous {
                assert!(f > f_prev);
                assert!(p < p_prev);
            }
            previous = Some((f, p));
        }
    }

    #[test]
    fn test_imputed_row_behaves_like_the_column_mean() {
        init_tracing();
        let missing = Table::new()
            .with_numeric("y", vec![Some(2.0), Some(4.0), None, Some(7.0), Some(9.0), Some(8.0)])
            .unwrap()
            .with_categorical("g", ["A", "A", "A", "B", "B", "B"])
            .unwrap();
        let filled = Table::new()
            .with_numeric("y", vec![Some(2.0), Some(4.0), Some(6.0), Some(7.0), Some(9.0), Some(8.0)])
            .unwrap()
            .with_categorical("g", ["A", "A", "A", "B", "B", "B"])
            .unwrap();

        let a = compute(&missing, &["y"], "g").unwrap();
        let b = compute(&filled, &["y"], "g").unwrap();
        assert_eq!(a.sum_of_squares.features[0].imputed, 1);
        assert_abs_diff_eq!(
            a.sum_of_squares.features[0].total,
            b.sum_of_squares.features[0].total,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(a.f_test.f_statistic(0), b.f_test.f_statistic(0), epsilon = 1e-9);
    }

    #[test]
    fn test_nan_cells_are_imputed_like_missing_ones() {
        let with_nan = Table::new()
            .with_numeric("y", vec![Some(1.0), Some(f64::NAN), Some(3.0), Some(4.0), Some(5.0), Some(6.0)])
            .unwrap()
            .with_categorical("g", ["A", "A", "A", "B", "B", "B"])
            .unwrap();
        let with_none = Table::new()
            .with_numeric("y", vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0), Some(6.0)])
            .unwrap()
            .with_categorical("g", ["A", "A", "A", "B", "B", "B"])
            .unwrap();

        let a = compute(&with_nan, &["y"], "g").unwrap();
        let b = compute(&with_none, &["y"], "g").unwrap();
        assert_eq!(a.sum_of_squares.features[0].imputed, 1);
        assert_eq!(a.sum_of_squares, b.sum_of_squares);
        assert!(a.f_test.f_statistic(0).is_finite());
        assert!(a.f_test.p_value(0).is_finite());
        assert!(a.f_test.tests[0].degeneracy.is_none());
        assert!(a.diagnostics.homoscedasticity_p_value(0).is_finite());
        assert!(a.sum_of_squares.residuals.iter().all(|r| r.is_finite()));
    }

    #[test]
    fn test_input_errors_fail_fast() {
        let table = worked_example();

        let err = compute(&table, &["y"], "species").unwrap_err();
        assert_eq!(
            err.downcast_ref::<InputError>(),
            Some(&InputError::MissingColumn("species".into()))
        );

        let none: [&str; 0] = [];
        let err = compute(&table, &none, "g").unwrap_err();
        assert_eq!(err.downcast_ref::<InputError>(), Some(&InputError::EmptyFeatureList));

        let single = Table::new()
            .with_numeric("y", vec![Some(1.0), Some(5.0), Some(3.0)])
            .unwrap()
            .with_categorical("g", ["A", "A", "A"])
            .unwrap();
        let err = compute(&single, &["y"], "g").unwrap_err();
        assert_eq!(
            err.downcast_ref::<InputError>(),
            Some(&InputError::TooFewGroups {
                column: "g".into(),
                found: 1
            })
        );
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_running_twice_is_bit_identical() {
        let table = shifted_groups(1.5);
        let config = AnovaConfig::default().with_correction(Correction::Bonferroni);
        let a = compute_with(&table, &["y"], "g", &config).unwrap();
        let b = compute_with(&table, &["y"], "g", &config).unwrap();

        assert_eq!(a.sum_of_squares, b.sum_of_squares);
        assert_eq!(a.f_test.to_string(), b.f_test.to_string());
        assert_eq!(a.diagnostics.to_string(), b.diagnostics.to_string());
        assert_eq!(
            a.f_test.adjusted_p_value(0).map(f64::to_bits),
            b.f_test.adjusted_p_value(0).map(f64::to_bits)
        );
    }

    #[test]
    fn test_missing_value_summary() {
        let table = Table::new()
            .with_numeric("a", vec![Some(1.0), None, None, Some(4.0), Some(5.0), Some(6.0)])
            .unwrap()
            .with_numeric("b", vec![Some(1.0); 6])
            .unwrap()
            .with_categorical("g", ["x", "x", "x", "y", "y", "y"])
            .unwrap();

        let summary = table.na_count();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].missing, 2);
        assert_eq!(summary[0].ratio_percent, 33.3);
        assert_eq!(summary[1].missing, 0);
        assert_eq!(summary[2].ratio_percent, 0.0);
    }
}
