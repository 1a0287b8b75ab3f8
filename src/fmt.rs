/// Render a ledger amount for display: grouped thousands, two decimals,
/// sign ahead of the dollar sign (-$1,234.50 for an expense).
pub fn money(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if amount < 0.0 {
        format!("-${grouped}.{cents}")
    } else {
        format!("${grouped}.{cents}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_groups_thousands() {
        assert_eq!(money(2995.5), "$2,995.50");
        assert_eq!(money(123456.789), "$123,456.79");
        assert_eq!(money(1000000.0), "$1,000,000.00");
    }

    #[test]
    fn test_money_signs_expenses() {
        assert_eq!(money(-4.5), "-$4.50");
        assert_eq!(money(-2500.0), "-$2,500.00");
    }

    #[test]
    fn test_money_small_values() {
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(999.0), "$999.00");
    }
}
