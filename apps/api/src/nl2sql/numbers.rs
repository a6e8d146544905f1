//! Integer thresholds from Russian numeric text: `100000`, `100 000`, `100к`, `2.5 млн`.

use crate::nl2sql::query::Comparator;

/// Magnitude words accepted right after a number, matched as whole words.
const SUFFIXES: &[(&str, u64)] = &[
    ("к", 1_000),
    ("k", 1_000),
    ("тыс", 1_000),
    ("тысяча", 1_000),
    ("тысячи", 1_000),
    ("тысяч", 1_000),
    ("млн", 1_000_000),
    ("миллион", 1_000_000),
    ("миллиона", 1_000_000),
    ("миллионов", 1_000_000),
    ("млрд", 1_000_000_000),
    ("миллиард", 1_000_000_000),
    ("миллиарда", 1_000_000_000),
    ("миллиардов", 1_000_000_000),
];

/// Fraction digits beyond this are dropped before rounding.
const MAX_FRACTION_DIGITS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberOutcome {
    Found(i64),
    NotFound,
}

impl NumberOutcome {
    pub fn value(self) -> Option<i64> {
        match self {
            NumberOutcome::Found(v) => Some(v),
            NumberOutcome::NotFound => None,
        }
    }
}

/// A numeric token located in the text. `value` is `None` when it does not fit in i64
/// or is a decimal without a magnitude suffix ("2.5").
#[derive(Debug, Clone, PartialEq, Eq)]
struct NumberToken {
    start: usize,
    end: usize,
    value: Option<i64>,
}

/// Extracts the threshold number from normalized text.
///
/// The token right after (or, failing that, right before) a comparison phrase wins;
/// otherwise the first token is used. A winning token that overflows i64, or a decimal
/// with no magnitude suffix, yields `NotFound`.
pub fn extract_number(text: &str) -> NumberOutcome {
    let tokens = scan_tokens(text);
    if tokens.is_empty() {
        return NumberOutcome::NotFound;
    }

    let chosen = adjacent_to_comparison(text, &tokens).unwrap_or(&tokens[0]);
    match chosen.value {
        Some(v) => NumberOutcome::Found(v),
        None => NumberOutcome::NotFound,
    }
}

fn adjacent_to_comparison<'a>(text: &str, tokens: &'a [NumberToken]) -> Option<&'a NumberToken> {
    for span in Comparator::spans(text) {
        let after = skip_filler(text, span.end);
        if let Some(token) = tokens.iter().find(|t| t.start == after) {
            return Some(token);
        }
        let before = text[..span.start].trim_end().len();
        if let Some(token) = tokens.iter().find(|t| t.end == before) {
            return Some(token);
        }
    }
    None
}

/// Skips whitespace, commas and "чем" between a comparison phrase and its number.
fn skip_filler(text: &str, mut at: usize) -> usize {
    loop {
        let rest = &text[at..];
        let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        at += rest.len() - trimmed.len();
        match trimmed.strip_prefix("чем") {
            Some(after) if after.is_empty() || after.starts_with(char::is_whitespace) => {
                at += "чем".len();
            }
            _ => return at,
        }
    }
}

fn scan_tokens(text: &str) -> Vec<NumberToken> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map_or(text.len(), |&(b, _)| b);
    let char_at = |i: usize| chars.get(i).map(|&(_, c)| c);
    let is_digit = |i: usize| char_at(i).is_some_and(|c| c.is_ascii_digit());
    let is_alnum = |i: usize| char_at(i).is_some_and(char::is_alphanumeric);
    let is_word = |i: usize| char_at(i).is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_');

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if !is_digit(i) {
            i += 1;
            continue;
        }
        // Digits glued to a word (hex ids, uuid segments, "x5") are not numbers.
        if i > 0 && is_word(i - 1) {
            while is_word(i) {
                i += 1;
            }
            continue;
        }

        let start = i;
        let mut integer = String::new();
        while is_digit(i) {
            integer.push(chars[i].1);
            i += 1;
        }

        // Thousands groups: a separator followed by exactly three digits.
        let leading = integer.len();
        let mut period_groups = Vec::new();
        if integer.len() <= 3 {
            while matches!(char_at(i), Some(' ' | '.'))
                && (1..=3).all(|k| is_digit(i + k))
                && !is_digit(i + 4)
            {
                let group: String = chars[i + 1..i + 4].iter().map(|&(_, c)| c).collect();
                if chars[i].1 == '.' {
                    period_groups.push(group.clone());
                }
                integer.push_str(&group);
                i += 4;
            }
        }

        let mut fraction = String::new();
        if matches!(char_at(i), Some('.' | ',')) && is_digit(i + 1) {
            i += 1;
            while is_digit(i) {
                fraction.push(chars[i].1);
                i += 1;
            }
        }

        let digits_end = i;
        let (multiplier, end) = match read_suffix(&chars, digits_end) {
            Some((multiplier, next)) => (Some(multiplier), next),
            None => (None, digits_end),
        };

        if multiplier.is_none() && is_alnum(digits_end) {
            while is_word(i) {
                i += 1;
            }
            continue;
        }

        // "1.500 млн" reads as one and a half million, not 1500 million.
        if multiplier.is_some()
            && fraction.is_empty()
            && period_groups.len() == 1
            && integer.len() == leading + 3
        {
            integer.truncate(leading);
            fraction = period_groups.remove(0);
        }

        // A fraction is only meaningful before a magnitude suffix.
        let value = match multiplier {
            Some(multiplier) => compute_value(&integer, &fraction, multiplier),
            None if fraction.is_empty() => compute_value(&integer, "", 1),
            None => None,
        };

        tokens.push(NumberToken {
            start: byte_at(start),
            end: byte_at(end),
            value,
        });
        i = end;
    }
    tokens
}

/// Matches a magnitude word starting at `from` (optionally after one space).
/// Returns the multiplier and the index just past the word (and a trailing dot).
fn read_suffix(chars: &[(usize, char)], from: usize) -> Option<(u64, usize)> {
    let mut i = from;
    if chars.get(i).is_some_and(|&(_, c)| c == ' ') {
        i += 1;
    }
    let word_start = i;
    while chars.get(i).is_some_and(|&(_, c)| c.is_alphabetic()) {
        i += 1;
    }
    if i == word_start || chars.get(i).is_some_and(|&(_, c)| c.is_alphanumeric()) {
        return None;
    }
    let word: String = chars[word_start..i].iter().map(|&(_, c)| c).collect();
    let multiplier = SUFFIXES
        .iter()
        .find(|(name, _)| *name == word)
        .map(|&(_, m)| m)?;
    if chars.get(i).is_some_and(|&(_, c)| c == '.') {
        i += 1;
    }
    Some((multiplier, i))
}

/// `integer.fraction * multiplier`, rounded half-up. `None` on i64 overflow.
fn compute_value(integer: &str, fraction: &str, multiplier: u64) -> Option<i64> {
    let whole: u128 = integer.parse().ok()?;
    let mut value = whole.checked_mul(u128::from(multiplier))?;

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let numerator: u128 = fraction.parse::<u128>().ok()? * u128::from(multiplier);
        let denominator = 10u128.pow(fraction.len() as u32);
        let mut part = numerator / denominator;
        if (numerator % denominator) * 2 >= denominator {
            part += 1;
        }
        value = value.checked_add(part)?;
    }

    i64::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> NumberOutcome {
        extract_number(text)
    }

    #[test]
    fn test_plain_digits() {
        assert_eq!(num("100000"), NumberOutcome::Found(100_000));
    }

    #[test]
    fn test_magnitude_suffixes() {
        assert_eq!(num("100к"), NumberOutcome::Found(100_000));
        assert_eq!(num("100 к"), NumberOutcome::Found(100_000));
        assert_eq!(num("5 тыс."), NumberOutcome::Found(5_000));
        assert_eq!(num("2млн"), NumberOutcome::Found(2_000_000));
        assert_eq!(num("3 миллиона"), NumberOutcome::Found(3_000_000));
        assert_eq!(num("1 млрд"), NumberOutcome::Found(1_000_000_000));
    }

    #[test]
    fn test_grouped_digits() {
        assert_eq!(num("100 000"), NumberOutcome::Found(100_000));
        assert_eq!(num("1 000 000"), NumberOutcome::Found(1_000_000));
        assert_eq!(num("100.000"), NumberOutcome::Found(100_000));
    }

    #[test]
    fn test_decimal_with_suffix_rounds_half_up() {
        assert_eq!(num("2.5млн"), NumberOutcome::Found(2_500_000));
        assert_eq!(num("2,5 млн"), NumberOutcome::Found(2_500_000));
        assert_eq!(num("1.5 к"), NumberOutcome::Found(1_500));
        assert_eq!(num("1.0005к"), NumberOutcome::Found(1_001));
        assert_eq!(num("1.500 млн"), NumberOutcome::Found(1_500_000));
    }

    #[test]
    fn test_decimal_without_suffix_is_not_a_threshold() {
        assert_eq!(num("2.5"), NumberOutcome::NotFound);
        assert_eq!(num("больше 2.5 лайков"), NumberOutcome::NotFound);
        assert_eq!(num("больше 2,4"), NumberOutcome::NotFound);
    }

    #[test]
    fn test_word_after_number_is_not_a_suffix() {
        assert_eq!(num("100 комментариев"), NumberOutcome::Found(100));
        assert_eq!(num("10 лайков"), NumberOutcome::Found(10));
    }

    #[test]
    fn test_digits_inside_ids_are_ignored() {
        assert_eq!(num("автор aca1061a9d324ecf8c3fa2bb32d7be63"), NumberOutcome::NotFound);
        assert_eq!(num("id 3fa2b и 7"), NumberOutcome::Found(7));
        assert_eq!(
            num("видео 3fa85f64-5717-4562-b3fc-2c963f66afa6"),
            NumberOutcome::NotFound
        );
    }

    #[test]
    fn test_overflow_is_not_found() {
        assert_eq!(num("больше 99999999999999999999"), NumberOutcome::NotFound);
        assert_eq!(num("больше 10000000000 млрд"), NumberOutcome::NotFound);
        assert_eq!(
            num("9223372036854775807"),
            NumberOutcome::Found(i64::MAX)
        );
    }

    #[test]
    fn test_no_number() {
        assert_eq!(num("сколько всего видео"), NumberOutcome::NotFound);
    }

    #[test]
    fn test_number_after_comparison_beats_earlier_numbers() {
        assert_eq!(
            num("сколько видео, вышедших 28 ноября 2025, набрали больше 100к просмотров"),
            NumberOutcome::Found(100_000)
        );
        assert_eq!(
            num("у 3 видео лайков не менее 50"),
            NumberOutcome::Found(50)
        );
        assert_eq!(num("больше, чем 1 000"), NumberOutcome::Found(1_000));
    }

    #[test]
    fn test_participle_before_number_is_not_a_comparison() {
        assert_eq!(
            num("сколько вышедших 28 ноября 2025 видео набрали ровно 10 лайков"),
            NumberOutcome::Found(10)
        );
        assert_eq!(
            num("видео, вышедших в ноябре 2025, набрали меньше 1000 лайков"),
            NumberOutcome::Found(1_000)
        );
    }

    #[test]
    fn test_number_before_comparison_phrase() {
        assert_eq!(
            num("видео за 28 ноября с 500 и более просмотров"),
            NumberOutcome::Found(500)
        );
    }

    #[test]
    fn test_first_token_without_comparison() {
        assert_eq!(num("5 видео и 7 авторов"), NumberOutcome::Found(5));
    }

    #[test]
    fn test_year_does_not_merge_with_following_number() {
        assert_eq!(num("2025 100"), NumberOutcome::Found(2025));
    }
}
