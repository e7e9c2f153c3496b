//! Template document scanner.
//!
//! One pass over the document classifies every byte into a span. Marker
//! names are taken up to the first following `}` and are not restricted
//! to identifier characters. An unterminated `${` is literal text.

/// Marker opener.
const MARKER_OPEN: &str = "${";

/// Marker closer.
const MARKER_CLOSE: char = '}';

/// Inclusion marker prefix, inside the braces.
const INCLUSION_OPEN: &str = "file(";

/// Inclusion marker suffix, inside the braces.
const INCLUSION_CLOSE: char = ')';

/// A classified span of a template document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    /// Text outside any marker, emitted verbatim.
    Literal(&'a str),
    /// A `${file(<path>)}` inclusion marker.
    Inclusion {
        /// The path between the parentheses.
        path: &'a str,
        /// The full marker text, for verbatim re-emission.
        raw: &'a str,
    },
    /// A `${<name>}` substitution marker.
    Variable {
        /// The name between the braces.
        name: &'a str,
        /// The full marker text, for verbatim re-emission.
        raw: &'a str,
    },
}

impl Span<'_> {
    /// The source text of this span, exactly as it appeared.
    #[must_use]
    pub const fn raw(&self) -> &str {
        match *self {
            Span::Literal(text) => text,
            Span::Inclusion { raw, .. } | Span::Variable { raw, .. } => raw,
        }
    }
}

/// Scans a document into classified spans.
///
/// Joining the `raw` text of every span reproduces the input byte for
/// byte, which is what makes unresolved markers pass through untouched.
#[must_use]
pub fn scan(document: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut rest = document;

    while let Some(open) = rest.find(MARKER_OPEN) {
        let Some(close) = rest[open + MARKER_OPEN.len()..].find(MARKER_CLOSE) else {
            // Unterminated marker, the remainder is literal.
            break;
        };
        let close = open + MARKER_OPEN.len() + close;

        if open > 0 {
            spans.push(Span::Literal(&rest[..open]));
        }

        let raw = &rest[open..=close];
        let inner = &rest[open + MARKER_OPEN.len()..close];
        spans.push(classify(inner, raw));

        rest = &rest[close + MARKER_CLOSE.len_utf8()..];
    }

    if !rest.is_empty() {
        spans.push(Span::Literal(rest));
    }

    spans
}

fn classify<'a>(inner: &'a str, raw: &'a str) -> Span<'a> {
    inner
        .strip_prefix(INCLUSION_OPEN)
        .and_then(|tail| tail.strip_suffix(INCLUSION_CLOSE))
        .map_or(Span::Variable { name: inner, raw }, |path| Span::Inclusion {
            path,
            raw,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_variables_and_literals() {
        let spans = scan("Hello ${projectName}!");

        assert_eq!(
            spans,
            vec![
                Span::Literal("Hello "),
                Span::Variable {
                    name: "projectName",
                    raw: "${projectName}"
                },
                Span::Literal("!"),
            ]
        );
    }

    #[test]
    fn test_classifies_inclusions() {
        let spans = scan("${file(policies/read.json)}");

        assert_eq!(
            spans,
            vec![Span::Inclusion {
                path: "policies/read.json",
                raw: "${file(policies/read.json)}"
            }]
        );
    }

    #[test]
    fn test_adjacent_markers_stay_separate() {
        let spans = scan("${ab}-${a}");

        assert_eq!(
            spans,
            vec![
                Span::Variable { name: "ab", raw: "${ab}" },
                Span::Literal("-"),
                Span::Variable { name: "a", raw: "${a}" },
            ]
        );
    }

    #[test]
    fn test_names_allow_arbitrary_characters() {
        let spans = scan("${vpc.subnets.public}");

        assert_eq!(
            spans,
            vec![Span::Variable {
                name: "vpc.subnets.public",
                raw: "${vpc.subnets.public}"
            }]
        );
    }

    #[test]
    fn test_unterminated_marker_is_literal() {
        let spans = scan("prefix ${unclosed");

        assert_eq!(spans, vec![Span::Literal("prefix ${unclosed")]);
    }

    #[test]
    fn test_raw_join_reproduces_input() {
        let input = "a ${x} ${file(f.txt)} b ${unclosed";
        let joined: String = scan(input).iter().map(Span::raw).collect();

        assert_eq!(joined, input);
    }
}
