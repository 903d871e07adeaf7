// Quoted literal
// The HTML export rewritten as one single-quoted string expression in which
// every newline is a separate '\n' operand of the `+` operator.

use std::sync::LazyLock;

use regex::Regex;

use crate::richtext::document_tree::Document;

use super::html_dialect::to_html_dialect;

const QUOTE: char = '\'';
const CONCAT: &str = "' + '";
const NEWLINE_TOKEN: &str = "\\n";

static NEWLINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("newline pattern is valid"));

pub fn to_quoted_literal(doc: &Document) -> String {
    encode(&to_html_dialect(doc))
}

/// Encode arbitrary HTML-dialect text. The HTML export never contains a raw
/// `'`, so the only quotes in the result are the delimiters and the
/// concatenation operators.
pub fn encode(html: &str) -> String {
    let escaped = html.replace('\\', "\\\\");
    let body = NEWLINE_RUN.replace_all(&escaped, |caps: &regex::Captures| {
        let run = caps[0].len();
        format!("{CONCAT}{}{CONCAT}", vec![NEWLINE_TOKEN; run].join(CONCAT))
    });
    format!("{QUOTE}{body}{QUOTE}")
}

/// Invert [`encode`]. Returns `None` for text it could not have produced.
pub fn unquote_literal(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix(QUOTE)?.strip_suffix(QUOTE)?;
    let joined = inner.split(CONCAT).collect::<String>();

    let mut out = String::with_capacity(joined.len());
    let mut chars = joined.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                '\\' => out.push('\\'),
                _ => return None,
            },
            QUOTE => return None,
            c => out.push(c),
        }
    }
    Some(out)
}
