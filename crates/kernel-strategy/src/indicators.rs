//! Pure technical-indicator functions over a price sequence: SMA, EMA, RSI,
//! Bollinger bands. Every indicator returns an empty result when the input
//! is shorter than `period`, no panics, no partial windows.

use kernel_core::types::Decimal;
use rust_decimal_macros::dec;

/// Simple moving average over a trailing window of `period`. Returns one
/// value per input index once the window fills, i.e. `len - period + 1`
/// values (empty if `prices.len() < period`).
pub fn sma(prices: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(prices.len() - period + 1);
    let mut window_sum: Decimal = prices[..period].iter().sum();
    out.push(window_sum / Decimal::from(period));
    for i in period..prices.len() {
        window_sum += prices[i] - prices[i - period];
        out.push(window_sum / Decimal::from(period));
    }
    out
}

/// Exponential moving average, seeded with the SMA of the first `period`
/// values, then smoothed with `alpha = 2 / (period + 1)`.
pub fn ema(prices: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }
    let alpha = dec!(2) / Decimal::from(period + 1);
    let seed: Decimal = prices[..period].iter().sum::<Decimal>() / Decimal::from(period);
    let mut out = Vec::with_capacity(prices.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for price in &prices[period..] {
        let value = (*price - prev) * alpha + prev;
        out.push(value);
        prev = value;
    }
    out
}

/// Relative Strength Index via Wilder smoothing: the first value is a
/// simple average of gains/losses over `period`, subsequent values are an
/// exponential moving average with smoothing factor `1/period`.
pub fn rsi(prices: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || prices.len() < period + 1 {
        return Vec::new();
    }
    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);
    for window in prices.windows(2) {
        let change = window[1] - window[0];
        if change.is_sign_positive() {
            gains.push(change);
            losses.push(Decimal::ZERO);
        } else {
            gains.push(Decimal::ZERO);
            losses.push(-change);
        }
    }

    let mut avg_gain: Decimal = gains[..period].iter().sum::<Decimal>() / Decimal::from(period);
    let mut avg_loss: Decimal = losses[..period].iter().sum::<Decimal>() / Decimal::from(period);

    let mut out = Vec::with_capacity(gains.len() - period + 1);
    out.push(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * Decimal::from(period - 1) + gains[i]) / Decimal::from(period);
        avg_loss = (avg_loss * Decimal::from(period - 1) + losses[i]) / Decimal::from(period);
        out.push(rsi_from_averages(avg_gain, avg_loss));
    }
    out
}

fn rsi_from_averages(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return dec!(100);
    }
    let rs = avg_gain / avg_loss;
    dec!(100) - (dec!(100) / (Decimal::ONE + rs))
}

/// One Bollinger band reading: the middle SMA band plus the upper and lower
/// bands at `num_std_dev` standard deviations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBand {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

/// Bollinger bands: a trailing SMA with `num_std_dev` standard-deviation
/// bands around it, one reading per filled window.
pub fn bollinger_bands(prices: &[Decimal], period: usize, num_std_dev: Decimal) -> Vec<BollingerBand> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(prices.len() - period + 1);
    for window in prices.windows(period) {
        let mean: Decimal = window.iter().sum::<Decimal>() / Decimal::from(period);
        let variance: Decimal =
            window.iter().map(|p| (*p - mean) * (*p - mean)).sum::<Decimal>() / Decimal::from(period);
        let std_dev = sqrt_decimal(variance);
        out.push(BollingerBand {
            upper: mean + std_dev * num_std_dev,
            middle: mean,
            lower: mean - std_dev * num_std_dev,
        });
    }
    out
}

/// `rust_decimal` has no built-in sqrt; Newton's method converges in a
/// handful of iterations at the decimal precision indicators need.
fn sqrt_decimal(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = value / dec!(2);
    for _ in 0..40 {
        if guess.is_zero() {
            break;
        }
        guess = (guess + value / guess) / dec!(2);
    }
    guess
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::from(*v)).collect()
    }

    #[test]
    fn test_sma_shorter_than_period_is_empty() {
        assert!(sma(&series(&[1, 2]), 5).is_empty());
    }

    #[test]
    fn test_sma_basic() {
        let values = sma(&series(&[1, 2, 3, 4, 5]), 3);
        assert_eq!(values, vec![dec!(2), dec!(3), dec!(4)]);
    }

    #[test]
    fn test_ema_seeds_with_sma() {
        let values = ema(&series(&[1, 2, 3, 4, 5]), 3);
        assert_eq!(values[0], dec!(2));
    }

    #[test]
    fn test_rsi_shorter_than_period_plus_one_is_empty() {
        assert!(rsi(&series(&[1, 2, 3]), 5).is_empty());
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let values = rsi(&series(&[1, 2, 3, 4, 5, 6]), 5);
        assert_eq!(values[0], dec!(100));
    }

    #[test]
    fn test_bollinger_bands_shorter_than_period_is_empty() {
        assert!(bollinger_bands(&series(&[1, 2]), 5, dec!(2)).is_empty());
    }

    #[test]
    fn test_bollinger_bands_flat_series_has_zero_width() {
        let bands = bollinger_bands(&series(&[5, 5, 5, 5]), 4, dec!(2));
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].upper, bands[0].lower);
        assert_eq!(bands[0].middle, dec!(5));
    }
}
