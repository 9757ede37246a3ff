//! Line tokenizer and number syntax.
//!
//! A line is up to three whitespace-separated fields after stripping a
//! trailing `;` or `#` comment. Numbers are `$` followed by hex digits, with
//! an optional `0x` after the `$`.

use crate::errors::AssembleErrorKind;

/// Removes a trailing `;` or `#` comment.
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    line.find([';', '#']).map_or(line, |index| &line[..index])
}

/// Splits a source line into its fields, comments removed.
#[must_use]
pub fn tokenize(line: &str) -> Vec<&str> {
    strip_comment(line).split_whitespace().collect()
}

/// Parses a `$`-prefixed hex number.
///
/// Returns `Ok(None)` for tokens that are not numbers at all (symbols,
/// mnemonics).
///
/// # Errors
///
/// Returns [`AssembleErrorKind::MalformedNumber`] when the token starts with
/// `$` but is not a 16-bit hex value.
pub fn parse_number(token: &str) -> Result<Option<u16>, AssembleErrorKind> {
    let Some(rest) = token.strip_prefix('$') else {
        return Ok(None);
    };
    let digits = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .unwrap_or(rest);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AssembleErrorKind::MalformedNumber(token.to_owned()));
    }
    u16::from_str_radix(digits, 16)
        .map(Some)
        .map_err(|_| AssembleErrorKind::MalformedNumber(token.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::{parse_number, strip_comment, tokenize};
    use crate::errors::AssembleErrorKind;

    #[test]
    fn comments_end_at_either_marker() {
        assert_eq!(strip_comment("literal $5 ; five"), "literal $5 ");
        assert_eq!(strip_comment("# whole line"), "");
        assert_eq!(strip_comment("nop"), "nop");
    }

    #[test]
    fn tokenize_splits_on_any_whitespace() {
        assert_eq!(tokenize("  store\t$f00  # out"), vec!["store", "$f00"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn numbers_accept_optional_0x() {
        assert_eq!(parse_number("$0f00"), Ok(Some(0x0F00)));
        assert_eq!(parse_number("$0xFFFF"), Ok(Some(0xFFFF)));
        assert_eq!(parse_number("$a"), Ok(Some(0xA)));
        assert_eq!(parse_number("loop"), Ok(None));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        for token in ["$", "$0x", "$12g", "$10000", "$+1"] {
            assert_eq!(
                parse_number(token),
                Err(AssembleErrorKind::MalformedNumber(token.to_owned())),
                "{token}"
            );
        }
    }
}
