mod plan_csv;

use serde::Serialize;

pub use plan_csv::{EXPORT_FILE_NAME, export_plan_csv};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Currency {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

pub const CURRENCIES: [Currency; 4] = [
    Currency {
        code: "ILS",
        symbol: "₪",
        name: "Israeli Shekel",
    },
    Currency {
        code: "USD",
        symbol: "$",
        name: "US Dollar",
    },
    Currency {
        code: "EUR",
        symbol: "€",
        name: "Euro",
    },
    Currency {
        code: "GBP",
        symbol: "£",
        name: "British Pound",
    },
];

pub fn default_currency() -> Currency {
    CURRENCIES[0]
}

pub fn find_currency(code: &str) -> Option<Currency> {
    CURRENCIES
        .iter()
        .copied()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Whole currency units with comma grouping, e.g. `$1,234,567`.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    if !amount.is_finite() {
        return format!("{symbol}{amount}");
    }

    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{symbol}{sign}{grouped}")
}

pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}
