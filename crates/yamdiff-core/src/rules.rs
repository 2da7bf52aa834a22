//! Identity rules for matching sequence items across two documents
//!
//! A rule names an array (by its immediate parent key), the field whose
//! value identifies an item, and optionally a condition restricting the
//! rule to items of a given shape. On the command line a rule is written
//! `ARRAY:FIELD` or `ARRAY:FIELD:WHEN_FIELD=WHEN_VALUE`; literal `:`,
//! `=` and `\` are escaped with a backslash.

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRule {
    /// Immediate parent key of the array this rule applies to
    /// (case-sensitive)
    pub array_name: String,
    /// Field whose scalar value identifies an item
    pub identity_field: String,
    /// Condition field; when set the rule only applies to items whose
    /// mapping carries this field with exactly `when_value`
    pub when_field: Option<String>,
    /// Condition value, compared against the canonical scalar text
    pub when_value: Option<String>,
}

impl IdentityRule {
    /// Unconditional rule: every item of `array_name` is identified by
    /// `identity_field`.
    pub fn new(array_name: impl Into<String>, identity_field: impl Into<String>) -> Result<Self> {
        let rule = Self {
            array_name: array_name.into(),
            identity_field: identity_field.into(),
            when_field: None,
            when_value: None,
        };
        rule.check()?;
        Ok(rule)
    }

    /// Conditional rule: applies only to items where `when_field`
    /// equals `when_value`.
    pub fn conditional(
        array_name: impl Into<String>,
        identity_field: impl Into<String>,
        when_field: impl Into<String>,
        when_value: impl Into<String>,
    ) -> Result<Self> {
        let rule = Self {
            array_name: array_name.into(),
            identity_field: identity_field.into(),
            when_field: Some(when_field.into()),
            when_value: Some(when_value.into()),
        };
        rule.check()?;
        Ok(rule)
    }

    pub fn is_conditional(&self) -> bool {
        self.when_field.is_some()
    }

    /// Parse the CLI string form `ARRAY:FIELD[:WHEN_FIELD=WHEN_VALUE]`.
    pub fn parse(spec: &str) -> Result<Self> {
        let parts = split_keep_escapes(spec, ':');
        match parts.as_slice() {
            [array, field] => IdentityRule::new(unescape(array), unescape(field))
                .map_err(|e| rephrase(spec, e)),
            [array, field, when] => {
                let when_parts = split_keep_escapes(when, '=');
                match when_parts.as_slice() {
                    [when_field, when_value] => IdentityRule::conditional(
                        unescape(array),
                        unescape(field),
                        unescape(when_field),
                        unescape(when_value),
                    )
                    .map_err(|e| rephrase(spec, e)),
                    _ => Err(bad(spec, "condition must have the form WHEN_FIELD=WHEN_VALUE")),
                }
            }
            _ => Err(bad(
                spec,
                "expected ARRAY:FIELD or ARRAY:FIELD:WHEN_FIELD=WHEN_VALUE",
            )),
        }
    }

    fn check(&self) -> Result<()> {
        if self.array_name.is_empty() {
            return Err(bad(&self.describe(), "array name must not be empty"));
        }
        if self.identity_field.is_empty() {
            return Err(bad(&self.describe(), "identity field must not be empty"));
        }
        if let Some(when_field) = &self.when_field {
            if when_field.is_empty() {
                return Err(bad(&self.describe(), "condition field must not be empty"));
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match (&self.when_field, &self.when_value) {
            (Some(f), Some(v)) => {
                format!("{}:{}:{}={}", self.array_name, self.identity_field, f, v)
            }
            _ => format!("{}:{}", self.array_name, self.identity_field),
        }
    }
}

fn bad(rule: &str, message: &str) -> CoreError {
    CoreError::BadIdentityRule {
        rule: rule.to_string(),
        message: message.to_string(),
    }
}

fn rephrase(spec: &str, err: CoreError) -> CoreError {
    match err {
        CoreError::BadIdentityRule { message, .. } => bad(spec, &message),
        other => other,
    }
}

/// Split on an unescaped separator. The escape for the separator itself
/// is consumed; every other escape sequence is kept for a later pass.
fn split_keep_escapes(input: &str, sep: char) -> Vec<String> {
    let mut parts = vec![String::new()];
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(n) if n == sep => parts.last_mut().unwrap().push(sep),
                Some(n) => {
                    let part = parts.last_mut().unwrap();
                    part.push('\\');
                    part.push(n);
                }
                None => parts.last_mut().unwrap().push('\\'),
            }
        } else if c == sep {
            parts.push(String::new());
        } else {
            parts.last_mut().unwrap().push(c);
        }
    }
    parts
}

fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(n) => out.push(n),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
