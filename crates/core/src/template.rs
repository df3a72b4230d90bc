//! `$`-delimited text templates with inline default values.
//!
//! Used to build the plain-text input files handed to the engine. The
//! placeholder forms are:
//!
//! - `$name` and `${name}`: a value must be supplied (or substitution fails)
//! - `${name|default}`: `default` is used when no value is supplied; it may
//!   be empty, which is distinct from having no default at all
//! - `$$`: a literal `$`
//!
//! Any other `$` is an invalid placeholder. Templates tolerate invalid
//! placeholders until they are rendered.
//!
//! ```
//! use deblib_core::params::Params;
//! use deblib_core::template::Template;
//!
//! let template = Template::new("${a} ${b|ten}").unwrap();
//! assert_eq!(template.substitute(&Params::new().with("a", 1)).unwrap(), "1 ten");
//! assert_eq!(template.safe_substitute(&Params::new()).unwrap(), "${a} ten");
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::TemplateError;
use crate::params::{value_text, Params};

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Identifier pattern shared by every placeholder form.
pub const IDENTIFIER_PATTERN: &str = r"[_a-zA-Z][_a-zA-Z0-9]*";

/// Delimiter introducing a placeholder.
pub const DELIMITER: char = '$';

/// Canonical scanner: `$$`, `$name`, `${name}`, or an invalid `$`.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\$(?:(?P<escaped>\$)|(?P<named>{IDENTIFIER_PATTERN})|\{{(?P<braced>{IDENTIFIER_PATTERN})\}}|(?P<invalid>))"
    ))
    .expect("valid regex")
});

/// Defaults scanner: `${name|default}`. Escapes are matched too so that the
/// text following a `$$` is never mistaken for a placeholder.
static DEFAULTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\$(?:(?P<escaped>\$)|\{{(?P<name>{IDENTIFIER_PATTERN})\|(?P<default>[^}}]*)\}})"
    ))
    .expect("valid regex")
});

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// The parsed form of template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    text: String,
    identifiers: Vec<String>,
    defaults: HashMap<String, String>,
}

impl ParsedTemplate {
    /// Template text with every `${name|default}` rewritten to `${name}`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Placeholder identifiers in first-occurrence order.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// The declared default for `name`, if any.
    pub fn default_for(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).map(String::as_str)
    }
}

/// Parse template text, extracting inline defaults and discovering identifiers.
///
/// The first declared default wins when an identifier carries several.
pub fn parse(text: &str) -> Result<ParsedTemplate, TemplateError> {
    let mut defaults: HashMap<String, String> = HashMap::new();

    let normalized = DEFAULTS_RE
        .replace_all(text, |caps: &Captures| match caps.name("name") {
            Some(name) => {
                let default = caps.name("default").map_or("", |m| m.as_str());
                defaults
                    .entry(name.as_str().to_string())
                    .or_insert_with(|| default.to_string());
                format!("${{{}}}", name.as_str())
            }
            None => caps[0].to_string(),
        })
        .into_owned();

    let identifiers = scan_identifiers(&normalized)?;

    Ok(ParsedTemplate {
        text: normalized,
        identifiers,
        defaults,
    })
}

/// List the `$name` / `${name}` identifiers of canonical template text.
///
/// Returns identifiers in first-occurrence order, without duplicates.
/// Escapes and invalid placeholders are skipped.
pub fn scan_identifiers(text: &str) -> Result<Vec<String>, TemplateError> {
    let mut identifiers: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(text) {
        match placeholder_of(&caps) {
            Placeholder::Named(name) => {
                if !identifiers.iter().any(|id| id == name) {
                    identifiers.push(name.to_string());
                }
            }
            Placeholder::Escaped | Placeholder::Invalid => {}
            Placeholder::Unrecognized => {
                return Err(TemplateError::UnrecognizedGroup {
                    offset: match_start(&caps),
                });
            }
        }
    }
    Ok(identifiers)
}

/// The kind of a single scanner match.
enum Placeholder<'t> {
    Named(&'t str),
    Escaped,
    Invalid,
    Unrecognized,
}

fn placeholder_of<'t>(caps: &Captures<'t>) -> Placeholder<'t> {
    if let Some(name) = caps.name("named").or_else(|| caps.name("braced")) {
        Placeholder::Named(name.as_str())
    } else if caps.name("escaped").is_some() {
        Placeholder::Escaped
    } else if caps.name("invalid").is_some() {
        Placeholder::Invalid
    } else {
        Placeholder::Unrecognized
    }
}

fn match_start(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.start())
}

/// Build the invalid-placeholder error for the `$` at byte `offset`.
fn invalid_placeholder(text: &str, offset: usize) -> TemplateError {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    TemplateError::InvalidPlaceholder { line, column }
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// How unresolved identifiers are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Safe,
}

/// Render parsed template text.
///
/// Values resolve from `overrides`, then `mapping`, then the template
/// defaults.
fn render(
    parsed: &ParsedTemplate,
    mapping: &Params,
    overrides: &Params,
    mode: Mode,
) -> Result<String, TemplateError> {
    let text = parsed.text();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        last = whole.end();

        match placeholder_of(&caps) {
            Placeholder::Named(name) => {
                let value = overrides
                    .get(name)
                    .or_else(|| mapping.get(name))
                    .map(value_text)
                    .or_else(|| parsed.default_for(name).map(str::to_string));
                match (value, mode) {
                    (Some(value), _) => out.push_str(&value),
                    (None, Mode::Strict) => {
                        return Err(TemplateError::MissingIdentifier(name.to_string()));
                    }
                    (None, Mode::Safe) => out.push_str(whole.as_str()),
                }
            }
            Placeholder::Escaped => out.push(DELIMITER),
            Placeholder::Invalid => return Err(invalid_placeholder(text, whole.start())),
            Placeholder::Unrecognized => {
                return Err(TemplateError::UnrecognizedGroup {
                    offset: whole.start(),
                });
            }
        }
    }

    out.push_str(&text[last..]);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// An immutable, parsed template, reusable across many substitutions.
///
/// The source text may be absent; that only surfaces as
/// [`TemplateError::MissingSource`] when the template is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: Option<String>,
    parsed: Option<ParsedTemplate>,
}

impl Template {
    /// Parse `text` into a template.
    pub fn new(text: impl Into<String>) -> Result<Self, TemplateError> {
        let source = text.into();
        let parsed = parse(&source)?;
        Ok(Self {
            source: Some(source),
            parsed: Some(parsed),
        })
    }

    /// Parse optional text. `None` yields a template that fails on rendering.
    pub fn from_optional(text: Option<&str>) -> Result<Self, TemplateError> {
        match text {
            Some(text) => Self::new(text),
            None => Ok(Self {
                source: None,
                parsed: None,
            }),
        }
    }

    /// The text this template was built from.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The normalized template text (defaults syntax removed).
    pub fn text(&self) -> Option<&str> {
        self.parsed.as_ref().map(ParsedTemplate::text)
    }

    /// Placeholder identifiers in first-occurrence order.
    pub fn identifiers(&self) -> &[String] {
        match &self.parsed {
            Some(parsed) => parsed.identifiers(),
            None => &[],
        }
    }

    /// The declared default for `name`, if any.
    pub fn default_for(&self, name: &str) -> Option<&str> {
        self.parsed.as_ref()?.default_for(name)
    }

    /// Every identifier paired with its declared default (`None` when the
    /// caller must supply a value).
    pub fn identifiers_and_defaults(&self) -> Vec<(String, Option<String>)> {
        self.identifiers()
            .iter()
            .map(|id| (id.clone(), self.default_for(id).map(str::to_string)))
            .collect()
    }

    /// Identifiers without a declared default.
    pub fn required_identifiers(&self) -> Vec<&str> {
        self.identifiers()
            .iter()
            .filter(|id| self.default_for(id).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Render the template, failing on any identifier without a value or default.
    pub fn substitute(&self, params: &Params) -> Result<String, TemplateError> {
        self.substitute_with(params, &Params::new())
    }

    /// Strict rendering where `overrides` take precedence over `mapping`.
    pub fn substitute_with(
        &self,
        mapping: &Params,
        overrides: &Params,
    ) -> Result<String, TemplateError> {
        render(self.parsed()?, mapping, overrides, Mode::Strict)
    }

    /// Render the template, leaving unresolved placeholders in place.
    pub fn safe_substitute(&self, params: &Params) -> Result<String, TemplateError> {
        self.safe_substitute_with(params, &Params::new())
    }

    /// Lenient rendering where `overrides` take precedence over `mapping`.
    pub fn safe_substitute_with(
        &self,
        mapping: &Params,
        overrides: &Params,
    ) -> Result<String, TemplateError> {
        render(self.parsed()?, mapping, overrides, Mode::Safe)
    }

    fn parsed(&self) -> Result<&ParsedTemplate, TemplateError> {
        self.parsed.as_ref().ok_or(TemplateError::MissingSource)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::Value;

    use super::*;

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn ids_and_defaults(pairs: &[(&str, Option<&str>)]) -> Vec<(String, Option<String>)> {
        pairs
            .iter()
            .map(|(id, def)| (id.to_string(), def.map(str::to_string)))
            .collect()
    }

    /// Both rendering modes, for cases where they must agree.
    fn render_both(template: &Template, mapping: &Params) -> [String; 2] {
        [
            template.substitute(mapping).expect("substitute"),
            template.safe_substitute(mapping).expect("safe_substitute"),
        ]
    }

    // -- parse --

    #[test]
    fn parse_discovers_identifiers_and_defaults() {
        let cases: &[(&str, &[(&str, Option<&str>)])] = &[
            ("", &[]),
            ("text only", &[]),
            ("$$escapeddollar", &[]),
            ("invalid single --> $", &[]),
            ("$a ${b}ty", &[("a", None), ("b", None)]),
            ("${a} ${b}ty", &[("a", None), ("b", None)]),
            ("${a}${b}ty", &[("a", None), ("b", None)]),
            ("${a}\n${b}ty", &[("a", None), ("b", None)]),
            ("${a} ${b} invalid--> $\n{c}", &[("a", None), ("b", None)]),
            ("${a|} ${b}ty", &[("a", Some("")), ("b", None)]),
            ("${a|ha} ${b}ty", &[("a", Some("ha")), ("b", None)]),
            ("$a ${b|}ty", &[("a", None), ("b", Some(""))]),
            ("$a ${b|mis}ty", &[("a", None), ("b", Some("mis"))]),
            ("${a|} ${b|mis}ty", &[("a", Some("")), ("b", Some("mis"))]),
            ("$a|not-default ${b}ty", &[("a", None), ("b", None)]),
        ];

        for (text, expected) in cases {
            let template = Template::new(*text).expect("parse");
            assert_eq!(
                template.identifiers_and_defaults(),
                ids_and_defaults(expected),
                "template text '{text}'"
            );
            let ids: Vec<&str> = expected.iter().map(|(id, _)| *id).collect();
            assert_eq!(template.identifiers(), ids.as_slice(), "template text '{text}'");
        }
    }

    #[test]
    fn parse_rewrites_defaults_to_canonical_form() {
        let parsed = parse("${a|1} and ${b|} and $c").expect("parse");
        assert_eq!(parsed.text(), "${a} and ${b} and $c");
        assert_eq!(parsed.default_for("a"), Some("1"));
        assert_eq!(parsed.default_for("b"), Some(""));
        assert_eq!(parsed.default_for("c"), None);
    }

    #[test]
    fn parse_first_default_wins_and_duplicates_collapse() {
        let template = Template::new("${x|first} ${y} ${x|second} $x").expect("parse");
        assert_eq!(template.identifiers(), ["x", "y"]);
        assert_eq!(template.default_for("x"), Some("first"));
        assert_eq!(template.substitute(&Params::new().with("y", 0)).unwrap(), "first 0 first first");
    }

    #[test]
    fn parse_leaves_escaped_defaults_syntax_literal() {
        let template = Template::new("$${a|b} ${c|d}").expect("parse");
        assert_eq!(template.identifiers(), ["c"]);
        assert_eq!(template.default_for("a"), None);
        assert_eq!(template.substitute(&Params::new()).unwrap(), "${a|b} d");
    }

    #[test]
    fn parse_keeps_invalid_text_for_later() {
        for text in ["a single $ is bad", "a single $\na over newline is bad too"] {
            let template = Template::new(text).expect("construction tolerates invalid text");
            assert_eq!(template.source(), Some(text));
            assert_eq!(template.text(), Some(text));
            assert!(template.identifiers().is_empty());
        }
    }

    #[test]
    fn absent_source_is_preserved() {
        let template = Template::from_optional(None).expect("construct");
        assert_eq!(template.source(), None);
        assert!(template.identifiers().is_empty());
        assert_eq!(
            template.substitute(&Params::new()),
            Err(TemplateError::MissingSource)
        );
        assert_eq!(
            template.safe_substitute(&Params::new()),
            Err(TemplateError::MissingSource)
        );
    }

    #[test]
    fn required_identifiers_excludes_defaulted() {
        let template = Template::new("$a ${b|} ${c|x} ${d}").expect("parse");
        assert_eq!(template.required_identifiers(), vec!["a", "d"]);
    }

    // -- substitute / safe_substitute agreement --

    #[test]
    fn both_apply_complete_mappings() {
        let cases: Vec<(&str, Params, &str)> = vec![
            ("", params(&[]), ""),
            ("none", params(&[]), "none"),
            ("still none", params(&[("a", "ignored".into())]), "still none"),
            ("${a} ${b}ty", params(&[("a", 1.into()), ("b", "ten".into())]), "1 tenty"),
            ("${a} ${b}ty", params(&[("b", "twen".into()), ("a", 2.into())]), "2 twenty"),
            (
                "\n$a\n${b}ty\n$c\n",
                params(&[("a", 3.into()), ("b", "thir".into()), ("c", "boo".into())]),
                "\n3\nthirty\nboo\n",
            ),
            (
                "$a ${b}ty",
                params(&[("a", 4.into()), ("b", "for".into()), ("c", "ignored".into())]),
                "4 forty",
            ),
            ("$a ${b|}ty", params(&[("a", 5.into()), ("b", "fif".into())]), "5 fifty"),
            ("$a ${b|mis}ty", params(&[("a", 6.into()), ("b", "six".into())]), "6 sixty"),
            ("$a ${b|}", params(&[("a", 7.into()), ("b", "seven".into())]), "7 seven"),
            ("$a ${b|mis}", params(&[("a", 8.into()), ("b", "eight".into())]), "8 eight"),
        ];

        for (text, mapping, expected) in cases {
            let template = Template::new(text).expect("parse");
            // Mapping as explicit argument and as overrides must agree.
            for rendered in render_both(&template, &mapping) {
                assert_eq!(rendered, expected, "template text '{text}'");
            }
            assert_eq!(
                template.substitute_with(&Params::new(), &mapping).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn overrides_take_precedence_over_mapping() {
        let cases: Vec<(&str, Params, Params, &str)> = vec![
            (" none ", params(&[("a", 1.into())]), params(&[("b", "B".into())]), " none "),
            ("$a ${b}", params(&[("a", 1.into())]), params(&[("b", "B".into())]), "1 B"),
            ("${a} ${b}", params(&[("a", 2.into())]), params(&[("b", "B".into())]), "2 B"),
            (
                "${a} ${b}",
                params(&[("a", 3.into()), ("b", "b".into())]),
                params(&[("b", "B".into())]),
                "3 B",
            ),
            (
                "${a} ${b}",
                params(&[("a", 5.into()), ("c", "c".into())]),
                params(&[("b", "B".into()), ("c", "C".into())]),
                "5 B",
            ),
            (
                "${a|} ${b|bee}",
                params(&[("a", 11.into()), ("b", "b".into())]),
                params(&[("b", "B".into())]),
                "11 B",
            ),
            (
                "${a|} ${b|bee}",
                params(&[("a", 13.into())]),
                params(&[("b", "B".into()), ("c", "C".into())]),
                "13 B",
            ),
        ];

        for (text, mapping, overrides, expected) in cases {
            let template = Template::new(text).expect("parse");
            assert_eq!(template.substitute_with(&mapping, &overrides).unwrap(), expected);
            assert_eq!(
                template.safe_substitute_with(&mapping, &overrides).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn defaults_fill_missing_values() {
        let cases: Vec<(&str, Params, &str)> = vec![
            ("${a} ${b|}ty", params(&[("a", 1.into())]), "1 ty"),
            ("$a ${b|}ty", params(&[("a", 2.into())]), "2 ty"),
            ("$a ${b|mis}ty", params(&[("a", 3.into())]), "3 misty"),
            (
                "$a ${b|mis}ty ${c|default}",
                params(&[("a", 4.into()), ("b", "for".into())]),
                "4 forty default",
            ),
        ];

        for (text, mapping, expected) in cases {
            let template = Template::new(text).expect("parse");
            for rendered in render_both(&template, &mapping) {
                assert_eq!(rendered, expected, "template text '{text}'");
            }
        }
    }

    #[test]
    fn escaped_delimiters_become_single_dollars() {
        let cases: Vec<(&str, Params, &str)> = vec![
            ("$$ 0 $$ $$$$ nought $$", params(&[]), "$ 0 $ $$ nought $"),
            ("$a $$ ${b} $$", params(&[("a", 1.into()), ("b", "one".into())]), "1 $ one $"),
            ("$a$$ ${b}$$", params(&[("a", 2.into()), ("b", "two".into())]), "2$ two$"),
            ("$$$a $$${b}", params(&[("a", 3.into()), ("b", "three".into())]), "$3 $three"),
            (
                "$a$$dog ${b}$$cat",
                params(&[("a", 4.into()), ("b", "four".into())]),
                "4$dog four$cat",
            ),
        ];

        for (text, mapping, expected) in cases {
            let template = Template::new(text).expect("parse");
            for rendered in render_both(&template, &mapping) {
                assert_eq!(rendered, expected, "template text '{text}'");
            }
        }
    }

    #[test]
    fn values_are_stringified() {
        let template = Template::new("$i $f $s $b").expect("parse");
        let mapping = Params::new()
            .with("i", 90)
            .with("f", 0.25)
            .with("s", "quad")
            .with("b", true);
        assert_eq!(template.substitute(&mapping).unwrap(), "90 0.25 quad true");
    }

    // -- strict vs lenient --

    #[test]
    fn substitute_names_missing_identifier() {
        let cases: Vec<(Params, &str)> = vec![
            (params(&[("a", "a".into())]), "b"),
            (params(&[("a", "a".into()), ("B", "B".into())]), "b"),
            (params(&[("a", "a".into()), ("c", "c".into())]), "b"),
            (params(&[("b", "b".into())]), "a"),
        ];

        let template = Template::new("$a ${b}ty").expect("parse");
        for (mapping, missing) in cases {
            let err = template.substitute(&mapping).unwrap_err();
            assert_eq!(err.missing_identifier(), Some(missing));
            assert!(err.to_string().contains(missing));
        }
    }

    #[test]
    fn safe_substitute_leaves_placeholders() {
        let cases: Vec<(Params, &str)> = vec![
            (params(&[("a", 1.into())]), "1 ${b}ty"),
            (params(&[("a", 2.into()), ("B", "B".into())]), "2 ${b}ty"),
            (params(&[("a", 3.into()), ("c", "c".into())]), "3 ${b}ty"),
            (params(&[("b", "for".into())]), "$a forty"),
        ];

        let template = Template::new("$a ${b}ty").expect("parse");
        for (mapping, expected) in cases {
            assert_eq!(template.safe_substitute(&mapping).unwrap(), expected);
        }
    }

    #[test]
    fn end_to_end_default_scenarios() {
        let template = Template::new("${a} ${b|ten}").expect("parse");
        assert_eq!(
            template.substitute(&Params::new().with("a", 1)).unwrap(),
            "1 ten"
        );
        assert_eq!(template.safe_substitute(&Params::new()).unwrap(), "${a} ten");
    }

    #[test]
    fn invalid_placeholders_fail_both_modes() {
        let cases = [
            ("a single $ is bad", 1, 10),
            ("a single $\na over newline is bad too", 1, 10),
            ("ok\nthen $1 fails", 2, 6),
            ("trailing $", 1, 10),
            ("${unclosed", 1, 1),
        ];

        for (text, line, column) in cases {
            let template = Template::new(text).expect("parse");
            for result in [
                template.substitute(&Params::new()),
                template.safe_substitute(&Params::new()),
            ] {
                let err = result.unwrap_err();
                assert_matches!(
                    err,
                    TemplateError::InvalidPlaceholder { line: l, column: c } if l == line && c == column,
                    "template text '{text}'"
                );
                assert!(err.to_string().contains("Invalid placeholder"));
            }
        }
    }
}
