use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{AdminError, Result};
use crate::query::coerce;
use crate::resource::Params;

/// Encode set for a value substituted into a single path segment.
/// Unreserved characters pass through, everything else is escaped,
/// including '/' so a value can never extend the path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Expand a URL path template containing `{name}` placeholders.
///
/// Placeholders are resolved left to right against `params`; each
/// substituted value is percent-encoded as a path segment. A placeholder
/// with no matching parameter fails with
/// [`AdminError::MissingPathParameter`] before any network I/O. Repeated
/// placeholders all resolve to the value of the first lookup.
pub fn resolve(template: &str, params: &Params) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut resolved: HashMap<&str, String> = HashMap::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let end = tail.find('}').ok_or_else(|| AdminError::MalformedTemplate {
            template: template.to_string(),
            detail: "unterminated placeholder".to_string(),
        })?;
        let name = &tail[..end];

        if !resolved.contains_key(name) {
            let value = params
                .get(name)
                .and_then(coerce)
                .ok_or_else(|| AdminError::MissingPathParameter {
                    name: name.to_string(),
                })?;
            resolved.insert(name, value);
        }
        let value = &resolved[name];
        out.push_str(&utf8_percent_encode(value, PATH_SEGMENT).to_string());

        rest = &tail[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

/// Validate a path template without resolving it.
///
/// Run once per descriptor when the registry is built so malformed
/// templates never reach runtime dispatch.
pub fn validate(template: &str) -> Result<()> {
    let malformed = |detail: &str| AdminError::MalformedTemplate {
        template: template.to_string(),
        detail: detail.to_string(),
    };

    let mut placeholder: Option<String> = None;
    for c in template.chars() {
        match c {
            '{' => {
                if placeholder.is_some() {
                    return Err(malformed("nested '{'"));
                }
                placeholder = Some(String::new());
            }
            '}' => match placeholder.take() {
                None => return Err(malformed("unmatched '}'")),
                Some(name) if name.is_empty() => {
                    return Err(malformed("empty placeholder"));
                }
                Some(_) => {}
            },
            c => {
                if let Some(name) = placeholder.as_mut() {
                    if !c.is_ascii_alphanumeric() && c != '_' {
                        return Err(malformed("invalid placeholder character"));
                    }
                    name.push(c);
                }
            }
        }
    }
    if placeholder.is_some() {
        return Err(malformed("unterminated placeholder"));
    }

    Ok(())
}
