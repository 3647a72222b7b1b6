// =============================================================================
// Simple Daily Returns
// =============================================================================
//
// The simple return over one step:
//   r_t = (close_t / close_{t-1}) - 1
//
// The first observation has no predecessor and therefore no return, so the
// output is always one element shorter than the input.

/// Compute simple returns for consecutive closing prices.
///
/// Returns a vector of length `closes.len() - 1`, or empty when there are
/// fewer than two prices. A zero predecessor yields a 0.0 return rather than
/// a division blow-up.
pub fn simple_returns(closes: &[f64]) -> Vec<f64> {
    if closes.len() < 2 {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(closes.len() - 1);
    for i in 1..closes.len() {
        let prev = closes[i - 1];
        if prev == 0.0 {
            result.push(0.0);
        } else {
            result.push(closes[i] / prev - 1.0);
        }
    }
    result
}
