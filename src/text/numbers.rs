//! German number-to-words conversion, used by the Text Normalizer (time
//! patterns, number ranges) and the Prosody Preparer (bare integers).

const ONES: &[&str] = &[
    "null", "eins", "zwei", "drei", "vier", "fünf", "sechs", "sieben", "acht", "neun", "zehn",
    "elf", "zwölf", "dreizehn", "vierzehn", "fünfzehn", "sechzehn", "siebzehn", "achtzehn",
    "neunzehn",
];
const TENS: &[&str] = &[
    "", "", "zwanzig", "dreißig", "vierzig", "fünfzig", "sechzig", "siebzig", "achtzig",
    "neunzig",
];

/// Converts a non-negative integer 0..=9999 to its German word form.
/// Values outside that range pass through as decimal digits, matching the
/// original source's fallback.
pub fn number_to_german(n: i64) -> String {
    if !(0..=9999).contains(&n) {
        return n.to_string();
    }
    let n = n as u32;
    compose(n)
}

fn compose(n: u32) -> String {
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    if n < 100 {
        let tens = n / 10;
        let ones = n % 10;
        if ones == 0 {
            return TENS[tens as usize].to_string();
        }
        let ones_word = if ones == 1 { "ein" } else { ONES[ones as usize] };
        return format!("{}und{}", ones_word, TENS[tens as usize]);
    }
    if n < 1000 {
        let hundreds = n / 100;
        let rest = n % 100;
        let hundred_word = if hundreds == 1 {
            "einhundert".to_string()
        } else {
            format!("{}hundert", ONES[hundreds as usize])
        };
        if rest == 0 {
            return hundred_word;
        }
        return format!("{}{}", hundred_word, compose(rest));
    }
    let thousands = n / 1000;
    let rest = n % 1000;
    let thousand_word = if thousands == 1 {
        "eintausend".to_string()
    } else {
        format!("{}tausend", ONES[thousands as usize])
    };
    if rest == 0 {
        thousand_word
    } else {
        format!("{}{}", thousand_word, compose(rest))
    }
}

/// Converts an `HH:MM` clock time to spoken German: "14:30" → "vierzehn Uhr
/// dreißig"; a zero minutes component is omitted entirely.
pub fn time_to_german(hours: i64, minutes: i64) -> String {
    let hour_word = number_to_german(hours);
    if minutes == 0 {
        format!("{} Uhr", hour_word)
    } else {
        format!("{} Uhr {}", hour_word, number_to_german(minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_numbers() {
        assert_eq!(number_to_german(0), "null");
        assert_eq!(number_to_german(1), "eins");
        assert_eq!(number_to_german(7), "sieben");
        assert_eq!(number_to_german(12), "zwölf");
        assert_eq!(number_to_german(19), "neunzehn");
    }

    #[test]
    fn tens() {
        assert_eq!(number_to_german(20), "zwanzig");
        assert_eq!(number_to_german(21), "einundzwanzig");
        assert_eq!(number_to_german(42), "zweiundvierzig");
        assert_eq!(number_to_german(99), "neunundneunzig");
    }

    #[test]
    fn hundreds() {
        assert_eq!(number_to_german(100), "einhundert");
        assert_eq!(number_to_german(123), "einhundertdreiundzwanzig");
        assert_eq!(number_to_german(700), "siebenhundert");
    }

    #[test]
    fn thousands() {
        assert_eq!(number_to_german(1000), "eintausend");
        assert_eq!(number_to_german(7), "sieben");
        assert_eq!(
            number_to_german(1999),
            "eintausendneunhundertneunundneunzig"
        );
        assert_eq!(number_to_german(3), "drei");
    }

    #[test]
    fn out_of_range_passes_through() {
        assert_eq!(number_to_german(-5), "-5");
        assert_eq!(number_to_german(10_000), "10000");
    }

    #[test]
    fn time_formatting() {
        assert_eq!(time_to_german(14, 30), "vierzehn Uhr dreißig");
        assert_eq!(time_to_german(9, 0), "neun Uhr");
        assert_eq!(time_to_german(1, 5), "eins Uhr fünf");
    }
}
