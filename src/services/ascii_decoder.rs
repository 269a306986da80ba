//! ASCII heuristic decoder for identifiers that encode text as octets.
//!
//! Some vendors publish device names as dotted identifiers where each token
//! is a character code, preceded by a short discriminator run such as
//! `1.16` (e.g. `FortiAP-1.16.70.80.50.51.49...`). The decoder drops that run,
//! keeps printable ASCII tokens as characters and silently skips the rest.

/// Printable ASCII range kept by the decoder.
const PRINTABLE: std::ops::RangeInclusive<u64> = 32..=126;

/// Rule for recognizing a leading discriminator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixRule {
    /// Skip `1.N` when `N` is below the bound and at least one token follows.
    LeadingOneBelow(u64),
    /// Skip this exact leading token sequence.
    Exact(Vec<u64>),
}

impl PrefixRule {
    /// Number of leading tokens this rule strips from `tokens`, if it applies.
    fn skip_len(&self, tokens: &[u64]) -> Option<usize> {
        match self {
            Self::LeadingOneBelow(bound) => match tokens {
                [1, n, _, ..] if n < bound => Some(2),
                _ => None,
            },
            Self::Exact(prefix) => {
                (tokens.len() > prefix.len() && tokens.starts_with(prefix)).then_some(prefix.len())
            }
        }
    }
}

/// Deterministic octet-to-text decoder with configurable prefix rules.
#[derive(Debug, Clone)]
pub struct AsciiDecoder {
    prefixes: Vec<PrefixRule>,
}

impl Default for AsciiDecoder {
    fn default() -> Self {
        Self::new(vec![PrefixRule::LeadingOneBelow(20)])
    }
}

impl AsciiDecoder {
    pub fn new(prefixes: Vec<PrefixRule>) -> Self {
        Self { prefixes }
    }

    /// Decode an identifier, trying the prefix-stripped form first.
    ///
    /// Returns `None` when no printable character survives either with or
    /// without the prefix, or when a token is not a decimal integer.
    pub fn decode(&self, identifier: &str) -> Option<String> {
        let tokens = parse_tokens(identifier)?;

        if let Some(skip) = self.prefixes.iter().find_map(|rule| rule.skip_len(&tokens)) {
            if let Some(decoded) = printable(&tokens[skip..]) {
                return Some(decoded);
            }
        }

        printable(&tokens)
    }
}

/// Parse dotted decimal tokens. Values too large for `u64` are kept as
/// `u64::MAX` so they are skipped as non-printable rather than rejected.
fn parse_tokens(identifier: &str) -> Option<Vec<u64>> {
    identifier
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some(part.parse::<u64>().unwrap_or(u64::MAX))
        })
        .collect()
}

fn printable(tokens: &[u64]) -> Option<String> {
    let decoded: String = tokens
        .iter()
        .filter_map(|&n| PRINTABLE.contains(&n).then(|| char::from(n as u8)))
        .collect();

    (!decoded.is_empty()).then_some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fortiap_serial_with_prefix_skipped() {
        let decoded = AsciiDecoder::default()
            .decode("1.16.70.80.50.51.49.70.84.70.50.48.48.50.51.48.52.51");
        assert_eq!(decoded.as_deref(), Some("FP231FTF20023043"));
    }

    #[test]
    fn standard_oid_decodes_to_nothing() {
        assert_eq!(AsciiDecoder::default().decode("1.3.6.1.2.1.1.1.0"), None);
    }

    #[test]
    fn out_of_range_tokens_are_skipped() {
        let decoded = AsciiDecoder::default().decode("70.300.80.7.50.99999999999999999999999");
        assert_eq!(decoded.as_deref(), Some("FP2"));
    }

    #[test]
    fn falls_back_to_full_identifier_when_prefix_leaves_nothing() {
        assert_eq!(AsciiDecoder::default().decode("1.16.3"), None);
        // Discriminator above the bound is not a prefix: 65 and 66 decode.
        assert_eq!(AsciiDecoder::default().decode("1.65.66").as_deref(), Some("AB"));
    }

    #[test]
    fn two_token_identifier_is_not_prefix_stripped() {
        assert_eq!(AsciiDecoder::default().decode("1.72"), Some("H".to_string()));
    }

    #[test]
    fn non_numeric_tokens_are_rejected() {
        assert_eq!(AsciiDecoder::default().decode("1.16.abc"), None);
        assert_eq!(AsciiDecoder::default().decode("1..16"), None);
        assert_eq!(AsciiDecoder::default().decode(""), None);
    }

    #[test]
    fn exact_prefix_rule() {
        let decoder = AsciiDecoder::new(vec![PrefixRule::Exact(vec![1, 3, 6, 1, 4, 1])]);
        assert_eq!(decoder.decode("1.3.6.1.4.1.72.73").as_deref(), Some("HI"));
        // Without a matching prefix the whole string is decoded.
        assert_eq!(decoder.decode("72.73").as_deref(), Some("HI"));
    }
}
