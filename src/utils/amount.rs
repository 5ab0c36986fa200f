/// Render a fixed-point `amount` with `decimals` fractional digits.
pub fn format_amount(amount: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = amount / scale;
    if decimals == 0 {
        return whole.to_string();
    }
    format!(
        "{}.{:0width$}",
        whole,
        amount % scale,
        width = decimals as usize
    )
}

/// `numerator / denominator` as a float, `None` when the denominator is zero.
pub fn ratio(numerator: u128, denominator: u128) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_padding() {
        assert_eq!(format_amount(1_000_500, 6), "1.000500");
        assert_eq!(format_amount(42, 0), "42");
    }

    #[test]
    fn ratio_rejects_zero_denominator() {
        assert_eq!(ratio(3, 0), None);
        assert_eq!(ratio(3, 2), Some(1.5));
    }
}
