//! Monetary amount parsing.
//!
//! Source sheets mix conventions (`1,234.56`, `1.234,56`, `Bs 1 000`, `(500)`), so the
//! decimal separator is inferred per value.

use std::str::FromStr;

use rust_decimal::Decimal;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¤'];

fn is_noise(ch: char) -> bool {
    ch.is_alphabetic() || ch.is_whitespace() || CURRENCY_SYMBOLS.contains(&ch)
}

/// Strips currency codes, symbols and whitespace around the number.
/// A dot directly after a letter (`Bs.`) is part of the currency label.
fn strip_noise(value: &str) -> &str {
    let mut start = 0;
    let mut previous_alpha = false;
    for (index, ch) in value.char_indices() {
        if is_noise(ch) || (ch == '.' && previous_alpha) {
            previous_alpha = ch.is_alphabetic();
            start = index + ch.len_utf8();
        } else {
            break;
        }
    }
    let mut rest = &value[start..];
    loop {
        let mut chars = rest.chars().rev();
        let Some(last) = chars.next() else {
            break;
        };
        let dot_after_letter = last == '.' && chars.next().is_some_and(char::is_alphabetic);
        if is_noise(last) || dot_after_letter {
            rest = &rest[..rest.len() - last.len_utf8()];
        } else {
            break;
        }
    }
    rest
}

/// Parse a monetary amount.
///
/// Handles:
/// - Currency codes and symbols: "Bs 1.500", "$1,500", "1500 USD"
/// - Negatives: "-500", "(500)", "($500)"
/// - Both separator conventions: "1,234.56", "1.234,56"
/// - A lone separator before exactly three digits is a thousands separator: "1,000"
/// - Grouping with spaces or apostrophes: "1 000 000", "1'000"
///
/// Returns None if the value is empty or not a number.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let mut body = strip_noise(value.trim());
    let mut negative = false;
    if let Some(inner) = body
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        negative = true;
        body = strip_noise(inner);
    }
    if let Some(rest) = body.strip_prefix('-') {
        negative = !negative;
        body = strip_noise(rest);
    }

    let compact: String = body
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '\'')
        .collect();
    if !compact.chars().any(|ch| ch.is_ascii_digit())
        || !compact
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == ',' || ch == '.')
    {
        return None;
    }

    let plain = resolve_separators(&compact)?;
    let amount = Decimal::from_str(&plain).ok()?;
    Some(if negative { -amount } else { amount })
}

/// Rewrites digits with `,`/`.` separators into `123456.78` form.
fn resolve_separators(value: &str) -> Option<String> {
    let last_comma = value.rfind(',');
    let last_dot = value.rfind('.');
    let decimal = match (last_comma, last_dot) {
        (None, None) => return Some(value.to_string()),
        (Some(comma), Some(dot)) => {
            let (sep, index) = if comma > dot { (',', comma) } else { ('.', dot) };
            if value.matches(sep).count() > 1 {
                return None;
            }
            Some(index)
        }
        (Some(index), None) | (None, Some(index)) => {
            let sep = if last_comma.is_some() { ',' } else { '.' };
            let groups: Vec<&str> = value.split(sep).collect();
            if groups.len() > 2 {
                // Repeated separators only make sense as thousands grouping.
                let grouped =
                    !groups[0].is_empty() && groups[1..].iter().all(|group| group.len() == 3);
                if !grouped {
                    return None;
                }
                None
            } else {
                let integer = groups[0];
                let fraction = groups[1];
                let thousands =
                    fraction.len() == 3 && !integer.trim_start_matches('0').is_empty();
                if thousands { None } else { Some(index) }
            }
        }
    };

    let mut out = String::with_capacity(value.len());
    for (index, ch) in value.char_indices() {
        match ch {
            ',' | '.' if Some(index) == decimal => out.push('.'),
            ',' | '.' => {}
            digit => out.push(digit),
        }
    }
    if out.starts_with('.') {
        out.insert(0, '0');
    }
    if out.ends_with('.') {
        out.pop();
    }
    Some(out)
}
