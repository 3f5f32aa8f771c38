// Descriptive statistics and hypothesis tests used by the analyzer and the ETL diagnostics.
use crate::model::StatsError;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal};

/// `describe()`-style summary of a numeric sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareResult {
    pub chi2: f64,
    pub p_value: f64,
    pub dof: usize,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Undefined below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Linear-interpolated quantile of an already sorted slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile(&sorted, 0.5)
}

pub fn describe(values: &[f64]) -> Option<Summary> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(Summary {
        count: sorted.len(),
        mean: mean(&sorted)?,
        std: sample_std(&sorted),
        min: *sorted.first()?,
        q1: quantile(&sorted, 0.25)?,
        median: quantile(&sorted, 0.5)?,
        q3: quantile(&sorted, 0.75)?,
        max: *sorted.last()?,
    })
}

/// Calculates the Pearson correlation coefficient between two slices.
/// Returns None if slices have different lengths, are empty, or either is constant.
pub fn compute_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.is_empty() {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let numerator: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| (xi - mean_x) * (yi - mean_y)).sum();
    let denominator_x: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    let denominator_y: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
    let denominator = (denominator_x * denominator_y).sqrt();
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Point-biserial correlation: Pearson between a 0/1 flag and a continuous variable.
pub fn point_biserial(flags: &[bool], values: &[f64]) -> Option<f64> {
    let encoded: Vec<f64> = flags.iter().map(|&f| if f { 1.0 } else { 0.0 }).collect();
    compute_correlation(&encoded, values)
}

/// One-way ANOVA over independent groups. Empty groups are ignored.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Result<AnovaResult, StatsError> {
    let groups: Vec<&Vec<f64>> = groups.iter().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    if k < 2 {
        return Err(StatsError::NotEnoughGroups(k));
    }
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if n <= k {
        return Err(StatsError::NotEnoughObservations { groups: k, observations: n });
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;
    let mut between = 0.0;
    let mut within = 0.0;
    for group in &groups {
        let group_mean = group.iter().sum::<f64>() / group.len() as f64;
        between += group.len() as f64 * (group_mean - grand_mean).powi(2);
        within += group.iter().map(|v| (v - group_mean).powi(2)).sum::<f64>();
    }
    if within == 0.0 {
        return Err(StatsError::ZeroVariance);
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let f_statistic = (between / df_between) / (within / df_within);
    let distribution = FisherSnedecor::new(df_between, df_within)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;

    Ok(AnovaResult {
        f_statistic,
        p_value: distribution.sf(f_statistic),
    })
}

/// Chi-square test of independence on a contingency table of observed counts.
/// Applies the Yates correction when there is exactly one degree of freedom.
pub fn chi2_contingency(observed: &[Vec<f64>]) -> Result<ChiSquareResult, StatsError> {
    let rows = observed.len();
    let cols = observed.first().map(|r| r.len()).unwrap_or(0);
    if rows == 0 || cols == 0 {
        return Err(StatsError::EmptySample);
    }

    let row_totals: Vec<f64> = observed.iter().map(|r| r.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..cols)
        .map(|j| observed.iter().map(|r| r.get(j).copied().unwrap_or(0.0)).sum())
        .collect();
    let total: f64 = row_totals.iter().sum();
    if total == 0.0 {
        return Err(StatsError::EmptySample);
    }

    let dof = (rows - 1) * (cols - 1);
    if dof == 0 {
        return Ok(ChiSquareResult { chi2: 0.0, p_value: 1.0, dof });
    }

    let mut chi2 = 0.0;
    for (i, row) in observed.iter().enumerate() {
        for (j, &cell) in row.iter().enumerate() {
            let expected = row_totals[i] * col_totals[j] / total;
            if expected == 0.0 {
                return Err(StatsError::Distribution("zero expected frequency".to_string()));
            }
            let mut diff = cell - expected;
            if dof == 1 {
                let magnitude = diff.abs().min(0.5);
                diff -= magnitude * diff.signum();
            }
            chi2 += diff * diff / expected;
        }
    }

    let distribution =
        ChiSquared::new(dof as f64).map_err(|e| StatsError::Distribution(e.to_string()))?;
    Ok(ChiSquareResult {
        chi2,
        p_value: distribution.sf(chi2),
        dof,
    })
}

/// Two-sided z quantile for a confidence level, e.g. 1.96 for 0.95.
pub fn z_quantile(confidence: f64) -> Result<f64, StatsError> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| StatsError::Distribution(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + confidence / 2.0))
}

/// Half-width of a normal-approximation confidence interval around a sample mean.
pub fn normal_ci_half_width(std: f64, count: usize, confidence: f64) -> Result<f64, StatsError> {
    if count == 0 {
        return Err(StatsError::EmptySample);
    }
    Ok(z_quantile(confidence)? * std / (count as f64).sqrt())
}

/// Gaussian kernel density evaluated on `grid`, bandwidth by Silverman's rule.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let Some(summary) = describe(values) else {
        return vec![0.0; grid.len()];
    };
    let n = summary.count as f64;
    let spread = match summary.std {
        Some(std) if summary.q3 > summary.q1 => std.min((summary.q3 - summary.q1) / 1.34),
        Some(std) => std,
        None => 0.0,
    };
    let bandwidth = if spread > 0.0 { 0.9 * spread * n.powf(-0.2) } else { 1e-3 };
    let norm = n * bandwidth * (2.0 * std::f64::consts::PI).sqrt();

    grid.iter()
        .map(|&y| {
            values
                .iter()
                .map(|&x| (-0.5 * ((y - x) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                / norm
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {} to be within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn mean_and_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_close(sample_std(&values).unwrap(), 2.138089935, 1e-9);
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let summary = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert_close(summary.q1, 1.75, 1e-12);
        assert_close(summary.median, 2.5, 1e-12);
        assert_close(summary.q3, 3.25, 1e-12);
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn correlation_of_linear_data_is_one() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert_close(compute_correlation(&x, &y).unwrap(), 1.0, 1e-12);
        assert_eq!(compute_correlation(&x, &[1.0, 1.0, 1.0, 1.0]), None);
        assert_eq!(compute_correlation(&x, &[1.0]), None);
    }

    #[test]
    fn point_biserial_is_negative_when_flag_lowers_values() {
        let r = point_biserial(&[false, false, true, true], &[80.0, 70.0, 40.0, 30.0]).unwrap();
        assert!(r < 0.0);
        assert_close(r, -40.0 / 1700f64.sqrt(), 1e-12);
    }

    #[test]
    fn anova_matches_reference_values() {
        // F = 13.5 on (1, 4) degrees of freedom
        let result = one_way_anova(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_close(result.f_statistic, 13.5, 1e-9);
        assert_close(result.p_value, 0.021311641128756713, 1e-6);
    }

    #[test]
    fn anova_rejects_degenerate_input() {
        assert_eq!(
            one_way_anova(&[vec![1.0, 2.0]]),
            Err(StatsError::NotEnoughGroups(1))
        );
        assert_eq!(
            one_way_anova(&[vec![1.0], vec![2.0]]),
            Err(StatsError::NotEnoughObservations { groups: 2, observations: 2 })
        );
        assert_eq!(
            one_way_anova(&[vec![1.0, 1.0], vec![2.0, 2.0]]),
            Err(StatsError::ZeroVariance)
        );
    }

    #[test]
    fn chi_square_with_yates_correction() {
        // corrected deviations are all 33/14 against expected 900/70, 1200/70, 1200/70, 1600/70
        let result = chi2_contingency(&[vec![10.0, 20.0], vec![20.0, 20.0]]).unwrap();
        assert_eq!(result.dof, 1);
        assert_close(result.chi2, 1.3234375, 1e-9);
        assert_close(result.p_value, 0.24997, 1e-3);
    }

    #[test]
    fn chi_square_without_correction_for_larger_tables() {
        // expected counts are all 10, so chi2 = (25 + 25 + 0 + 0 + 25 + 25) / 10
        let observed = vec![vec![15.0, 5.0], vec![10.0, 10.0], vec![5.0, 15.0]];
        let result = chi2_contingency(&observed).unwrap();
        assert_eq!(result.dof, 2);
        assert_close(result.chi2, 10.0, 1e-9);
        assert_close(result.p_value, (-5.0f64).exp(), 1e-9);
    }

    #[test]
    fn chi_square_single_column_has_no_freedom() {
        let result = chi2_contingency(&[vec![3.0], vec![4.0]]).unwrap();
        assert_eq!(result, ChiSquareResult { chi2: 0.0, p_value: 1.0, dof: 0 });
        assert_eq!(chi2_contingency(&[]), Err(StatsError::EmptySample));
    }

    #[test]
    fn confidence_interval_uses_normal_quantile() {
        assert_close(z_quantile(0.95).unwrap(), 1.959963984540054, 1e-6);
        let half = normal_ci_half_width(10.0, 25, 0.95).unwrap();
        assert_close(half, 1.959963984540054 * 2.0, 1e-5);
        assert_eq!(normal_ci_half_width(1.0, 0, 0.95), Err(StatsError::EmptySample));
    }

    #[test]
    fn kde_peaks_near_the_data() {
        let values = [3.0, 3.1, 2.9, 3.05, 2.95];
        let density = gaussian_kde(&values, &[1.0, 3.0, 5.0]);
        assert!(density[1] > density[0]);
        assert!(density[1] > density[2]);
    }
}
