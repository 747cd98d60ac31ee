use num_traits::Float;

/// Eta-squared: share of the total sum of squares explained by group membership.
///
/// NaN when `ss_total` is zero. Clamped to [0, 1] against rounding in the sums.
pub fn eta_squared<T>(ss_model: T, ss_total: T) -> T
where
    T: Float,
{
    if ss_total <= T::zero() {
        return T::nan();
    }
    (ss_model / ss_total).max(T::zero()).min(T::one())
}

/// Omega-squared: a less biased estimate of explained variance than eta-squared.
///
/// `(SS_model - df_model * MS_error) / (SS_total + MS_error)`, which can be slightly
/// negative when the group effect is smaller than chance.
pub fn omega_squared<T>(ss_model: T, ss_total: T, df_model: T, ms_error: T) -> T
where
    T: Float,
{
    let denominator = ss_total + ms_error;
    if denominator <= T::zero() {
        return T::nan();
    }
    (ss_model - df_model * ms_error) / denominator
}
