//! English number-word parsing.
//!
//! Turns text such as `"two"`, `"twenty-one"`, `"one hundred and five"`,
//! `"three point five"` or `"1.5 million"` into a number. Plain digit strings
//! are rejected: there is nothing to translate, so the caller keeps the
//! original text.

/// Role a token plays in a cardinal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Start,
    Digits,
    Unit,
    Teen,
    Tens,
    Hundred,
    Scale,
}

const UNITS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

const TEENS: [&str; 10] = [
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 8] = [
    "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [(&str, f64); 3] = [
    ("thousand", 1e3),
    ("million", 1e6),
    ("billion", 1e9),
];

fn classify(token: &str) -> Option<(Kind, f64)> {
    if let Some(pos) = UNITS.iter().position(|w| *w == token) {
        return Some((Kind::Unit, pos as f64));
    }
    if let Some(pos) = TEENS.iter().position(|w| *w == token) {
        return Some((Kind::Teen, (pos + 10) as f64));
    }
    if let Some(pos) = TENS.iter().position(|w| *w == token) {
        return Some((Kind::Tens, ((pos + 2) * 10) as f64));
    }
    if token == "hundred" {
        return Some((Kind::Hundred, 100.0));
    }
    if let Some((_, scale)) = SCALES.iter().find(|(w, _)| *w == token) {
        return Some((Kind::Scale, *scale));
    }
    if token.chars().all(|c| c.is_ascii_digit() || c == '.')
        && let Ok(value) = token.parse::<f64>()
        && value.is_finite()
    {
        return Some((Kind::Digits, value));
    }
    None
}

/// Parse the part of a numeral before `point`.
fn parse_cardinal(tokens: &[&str]) -> Option<f64> {
    let mut total = 0.0;
    let mut current = 0.0;
    let mut prev = Kind::Start;
    let mut last_scale = f64::INFINITY;
    let mut after_and = false;

    for (i, token) in tokens.iter().enumerate() {
        if *token == "and" {
            let has_next = i + 1 < tokens.len();
            if after_and || !has_next || !matches!(prev, Kind::Hundred | Kind::Scale) {
                return None;
            }
            after_and = true;
            continue;
        }
        after_and = false;

        let (kind, value) = classify(token)?;
        match kind {
            Kind::Digits => {
                if prev != Kind::Start {
                    return None;
                }
                current = value;
            }
            Kind::Unit => {
                if value == 0.0 {
                    if tokens.len() != 1 {
                        return None;
                    }
                } else if !matches!(
                    prev,
                    Kind::Start | Kind::Tens | Kind::Hundred | Kind::Scale
                ) {
                    return None;
                }
                current += value;
            }
            Kind::Teen | Kind::Tens => {
                if !matches!(prev, Kind::Start | Kind::Hundred | Kind::Scale) {
                    return None;
                }
                current += value;
            }
            Kind::Hundred => {
                if !matches!(prev, Kind::Digits | Kind::Unit | Kind::Teen | Kind::Tens)
                    || current <= 0.0
                    || current >= 100.0
                {
                    return None;
                }
                current *= value;
            }
            Kind::Scale => {
                if prev == Kind::Start || prev == Kind::Scale || current <= 0.0 {
                    return None;
                }
                if value >= last_scale {
                    return None;
                }
                total += current * value;
                current = 0.0;
                last_scale = value;
            }
            Kind::Start => return None,
        }
        prev = kind;
    }

    if prev == Kind::Start {
        return None;
    }
    Some(total + current)
}

/// Parse the digits after `point`, one number word per digit.
fn parse_fraction(tokens: &[&str]) -> Option<f64> {
    if tokens.is_empty() {
        return None;
    }
    let digits = tokens
        .iter()
        .map(|token| UNITS.iter().position(|w| w == token))
        .collect::<Option<Vec<usize>>>()?;
    let rendered: String = digits.iter().map(|d| d.to_string()).collect();
    format!("0.{}", rendered).parse::<f64>().ok()
}

/// Parse an English numeral into a number.
///
/// Returns `None` when the text is not a numeral, including when it is
/// already a plain digit string.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(parse_numeral("twenty-one"), Some(21.0));
/// assert_eq!(parse_numeral("3.0"), None);
/// ```
pub fn parse_numeral(text: &str) -> Option<f64> {
    let lowered = text.trim().to_lowercase();
    let mut tokens: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|t| !t.is_empty())
        .collect();

    let negative = matches!(tokens.first(), Some(&"minus") | Some(&"negative"));
    if negative {
        tokens.remove(0);
    }
    if tokens.is_empty() {
        return None;
    }

    let (integer_tokens, fraction_tokens) = match tokens.iter().position(|t| *t == "point") {
        Some(idx) => (&tokens[..idx], Some(&tokens[idx + 1..])),
        None => (&tokens[..], None),
    };

    let has_words = integer_tokens
        .iter()
        .any(|t| !matches!(classify(t), Some((Kind::Digits, _))));
    if !negative && fraction_tokens.is_none() && !has_words {
        return None;
    }

    let integer = if integer_tokens.is_empty() {
        if fraction_tokens.is_none() {
            return None;
        }
        0.0
    } else {
        parse_cardinal(integer_tokens)?
    };

    let fraction = match fraction_tokens {
        Some(tokens) => {
            // A digit-string integer part ("3 point five") stays valid; a
            // fractional one ("1.5 point two") does not.
            if integer.fract() != 0.0 {
                return None;
            }
            parse_fraction(tokens)?
        }
        None => 0.0,
    };

    let value = integer + fraction;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_words() {
        assert_eq!(parse_numeral("zero"), Some(0.0));
        assert_eq!(parse_numeral("two"), Some(2.0));
        assert_eq!(parse_numeral("Five"), Some(5.0));
        assert_eq!(parse_numeral("fourteen"), Some(14.0));
        assert_eq!(parse_numeral("ninety"), Some(90.0));
    }

    #[test]
    fn test_compounds() {
        assert_eq!(parse_numeral("twenty-one"), Some(21.0));
        assert_eq!(parse_numeral("twenty one"), Some(21.0));
        assert_eq!(parse_numeral("one hundred and five"), Some(105.0));
        assert_eq!(parse_numeral("two thousand three hundred"), Some(2300.0));
        assert_eq!(parse_numeral("one hundred thousand"), Some(100_000.0));
        assert_eq!(
            parse_numeral("one million two thousand and seven"),
            Some(1_002_007.0)
        );
    }

    #[test]
    fn test_decimals_and_sign() {
        assert_eq!(parse_numeral("three point five"), Some(3.5));
        assert_eq!(parse_numeral("zero point two five"), Some(0.25));
        assert_eq!(parse_numeral("point five"), Some(0.5));
        assert_eq!(parse_numeral("minus four"), Some(-4.0));
    }

    #[test]
    fn test_mixed_digits_and_words() {
        assert_eq!(parse_numeral("2 thousand"), Some(2000.0));
        assert_eq!(parse_numeral("1.5 million"), Some(1_500_000.0));
        assert_eq!(parse_numeral("3 hundred"), Some(300.0));
    }

    #[test]
    fn test_plain_digits_are_not_numerals() {
        assert_eq!(parse_numeral("5"), None);
        assert_eq!(parse_numeral("5.0"), None);
        assert_eq!(parse_numeral("  12 "), None);
    }

    #[test]
    fn test_rejects_malformed_sequences() {
        assert_eq!(parse_numeral(""), None);
        assert_eq!(parse_numeral("ERROR"), None);
        assert_eq!(parse_numeral("one two"), None);
        assert_eq!(parse_numeral("twenty twenty"), None);
        assert_eq!(parse_numeral("hundred"), None);
        assert_eq!(parse_numeral("one thousand one million"), None);
        assert_eq!(parse_numeral("five and"), None);
        assert_eq!(parse_numeral("point"), None);
        assert_eq!(parse_numeral("two point ten"), None);
        assert_eq!(parse_numeral("minus"), None);
        assert_eq!(parse_numeral("zero one"), None);
    }
}
