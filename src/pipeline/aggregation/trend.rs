use crate::models::SentimentTrend;

/// Slope magnitude below which the trend counts as flat.
const TREND_THRESHOLD: f64 = 0.1;

/// Least-squares slope of `scores` against their index. `None` for fewer
/// than two points.
pub fn least_squares_slope(scores: &[f64]) -> Option<f64> {
    if scores.len() < 2 {
        return None;
    }
    let n = scores.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = scores.iter().sum::<f64>() / n;

    let (num, den) = scores
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        });
    Some(num / den)
}

/// Direction of a chronologically ordered sentiment series.
pub fn compute_sentiment_trend(scores: &[f64]) -> SentimentTrend {
    match least_squares_slope(scores) {
        Some(slope) if slope > TREND_THRESHOLD => SentimentTrend::Improving,
        Some(slope) if slope < -TREND_THRESHOLD => SentimentTrend::Declining,
        _ => SentimentTrend::Stable,
    }
}
