//! `key=value` attribute arguments for the admin CLI
//!
//! Values are one of:
//! - `"quoted text"`, where `_` stands for a space and `\"` for a quote
//! - an integer, e.g. `max_guest=4`
//! - a float, e.g. `latitude=37.77`
//!
//! Anything else is skipped and reported back to the caller.

use crate::entity::{Attributes, Scalar};
use regex::Regex;
use std::sync::OnceLock;

fn param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(?P<key>[A-Za-z_][A-Za-z0-9_]*)=(?:"(?P<text>(?:[^"\\]|\\.)*)"|(?P<float>-?\d+\.\d+)|(?P<int>-?\d+))$"#)
            .expect("parameter pattern is valid")
    })
}

/// Parse one `key=value` argument
pub fn parse_param(arg: &str) -> Option<(String, Scalar)> {
    let caps = param_regex().captures(arg.trim())?;
    let key = caps.name("key")?.as_str().to_string();

    let value = if let Some(text) = caps.name("text") {
        Scalar::Text(text.as_str().replace("\\\"", "\"").replace('_', " "))
    } else if let Some(float) = caps.name("float") {
        Scalar::Float(float.as_str().parse().ok()?)
    } else {
        Scalar::Integer(caps.name("int")?.as_str().parse().ok()?)
    };

    Some((key, value))
}

/// Parse all arguments, returning the attributes and the arguments that were skipped
pub fn parse_params<S: AsRef<str>>(args: &[S]) -> (Attributes, Vec<String>) {
    let mut attrs = Attributes::new();
    let mut skipped = Vec::new();

    for arg in args {
        match parse_param(arg.as_ref()) {
            Some((key, value)) => {
                attrs.insert(key, value);
            }
            None => {
                tracing::debug!("Skipping parameter '{}'", arg.as_ref());
                skipped.push(arg.as_ref().to_string());
            }
        }
    }

    (attrs, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_text_with_underscores() {
        let (key, value) = parse_param(r#"name="San_Francisco""#).unwrap();
        assert_eq!(key, "name");
        assert_eq!(value, Scalar::Text("San Francisco".to_string()));

        let (_, value) = parse_param(r#"text="say_\"hi\"""#).unwrap();
        assert_eq!(value, Scalar::Text("say \"hi\"".to_string()));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_param("max_guest=4").unwrap().1, Scalar::Integer(4));
        assert_eq!(parse_param("longitude=-122.43").unwrap().1, Scalar::Float(-122.43));
    }

    #[test]
    fn test_skips_malformed() {
        let (attrs, skipped) = parse_params(&["name=unquoted", "rooms=3", "=5", "price=1.2.3", r#"x="open"#]);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("rooms"), Some(&Scalar::Integer(3)));
        assert_eq!(skipped.len(), 4);
    }

    #[test]
    fn test_account_password_must_be_quoted() {
        use crate::entity::Account;
        use crate::Error;

        let (mut attrs, _) = parse_params(&[r#"email="a@b""#, "password=1234"]);
        assert!(matches!(
            Account::hash_password_attribute(&mut attrs),
            Err(Error::InvalidAttribute(_))
        ));

        let (mut attrs, _) = parse_params(&[r#"email="a@b""#, r#"password="1234""#]);
        Account::hash_password_attribute(&mut attrs).unwrap();
        assert_eq!(attrs.get("password_hash").and_then(Scalar::as_str).map(str::len), Some(64));
    }
}
