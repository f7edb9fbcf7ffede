use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Trailing simple moving average over `values`.
///
/// Entries are `None` until `period` values have been seen, so the output
/// always has the same length as the input.
pub fn simple_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let Ok(mut sma) = SimpleMovingAverage::new(period) else {
        return vec![None; values.len()];
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let mean = sma.next(value);
            (i + 1 >= period).then_some(mean)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_until_window_is_full() {
        let out = simple_moving_average(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn short_series_has_no_values() {
        let closes: Vec<f64> = (1..=10).map(f64::from).collect();
        assert!(simple_moving_average(&closes, 20).iter().all(Option::is_none));
    }

    #[test]
    fn zero_period_yields_nothing() {
        assert_eq!(simple_moving_average(&[1.0, 2.0], 0), vec![None, None]);
    }
}
