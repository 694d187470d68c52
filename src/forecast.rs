/// A model fitted to evenly spaced observations that can extrapolate forward.
pub trait TrendModel: Sized {
    /// Fit to `points`, where `points[i]` is the observation at index `i`.
    /// Returns `None` when there is nothing to fit.
    fn fit(points: &[f64]) -> Option<Self>;

    /// Values for the next `n` indices after the fitted range.
    fn predict(&self, n: usize) -> Vec<f64>;
}

/// Ordinary least-squares line `value = slope * index + intercept`.
///
/// A single observation cannot determine a slope, so it fits a flat line
/// through that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    len: usize,
}

impl TrendModel for LinearTrend {
    fn fit(points: &[f64]) -> Option<Self> {
        let len = points.len();
        match len {
            0 => None,
            1 => Some(Self {
                slope: 0.0,
                intercept: points[0],
                len,
            }),
            _ => {
                let n = len as f64;
                let mean_x = (n - 1.0) / 2.0;
                let mean_y = points.iter().sum::<f64>() / n;
                let (mut sxy, mut sxx) = (0.0f64, 0.0f64);
                for (i, y) in points.iter().enumerate() {
                    let dx = i as f64 - mean_x;
                    sxy += dx * (y - mean_y);
                    sxx += dx * dx;
                }
                let slope = sxy / sxx;
                Some(Self {
                    slope,
                    intercept: mean_y - slope * mean_x,
                    len,
                })
            }
        }
    }

    fn predict(&self, n: usize) -> Vec<f64> {
        (self.len..self.len + n)
            .map(|i| self.slope * i as f64 + self.intercept)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn test_linear_series_extrapolates_exactly() {
        let model = LinearTrend::fit(&[10.0, 20.0, 30.0]).unwrap();
        assert_close(&model.predict(3), &[40.0, 50.0, 60.0]);
    }

    #[test]
    fn test_noisy_series_uses_least_squares() {
        // Best fit through (0,1) (1,3) (2,2) (3,6) is y = 1.4x + 1.0
        let model = LinearTrend::fit(&[1.0, 3.0, 2.0, 6.0]).unwrap();
        assert!((model.slope - 1.4).abs() < 1e-9);
        assert!((model.intercept - 1.0).abs() < 1e-9);
        assert_close(&model.predict(1), &[8.0]);
    }

    #[test]
    fn test_single_point_projects_flat() {
        let model = LinearTrend::fit(&[75.0]).unwrap();
        assert_close(&model.predict(3), &[75.0, 75.0, 75.0]);
    }

    #[test]
    fn test_empty_input_has_no_model() {
        assert!(LinearTrend::fit(&[]).is_none());
    }

    #[test]
    fn test_decreasing_series_can_go_negative() {
        let model = LinearTrend::fit(&[30.0, 10.0]).unwrap();
        assert_close(&model.predict(2), &[-10.0, -30.0]);
    }
}
