use formats::geojson::FeatureCollection;

pub struct Statistics;

impl Statistics {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        Some(sum / values.len() as f64)
    }

    pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
        let first = *values.first()?;
        let mut min = first;
        let mut max = first;
        for &v in values.iter().skip(1) {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    /// Numeric values of `metric` across the collection, in feature order.
    /// Features without a numeric value are skipped.
    pub fn metric_values(points: &FeatureCollection, metric: &str) -> Vec<f64> {
        points
            .features
            .iter()
            .filter_map(|f| f.property(metric).and_then(|v| v.as_f64()))
            .collect()
    }

    /// `[min, max]` of `metric`, usable directly as an encoding domain.
    pub fn metric_domain(points: &FeatureCollection, metric: &str) -> Option<[f64; 2]> {
        let (min, max) = Self::min_max(&Self::metric_values(points, metric))?;
        Some([min, max])
    }
}
