//! Member signature descriptors.
//!
//! Callable references carry a parenthesised, language-agnostic parameter
//! list written as JVM-style descriptors, e.g. `(I[Lcom/acme/Foo;Z)`.
//! The single-parameter form `(*)` stands for "any overload".

use crate::error::{Result, ScriptRefError};

/// Signature text meaning "callable with any parameter list".
pub const ANY_SIGNATURE: &str = "(*)";

/// A parsed member signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    /// `(*)`: matches every overload.
    Any,
    /// Explicit parameter list.
    Params(Vec<SignatureParam>),
}

/// One parameter inside a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParam {
    /// Primitive, or array of primitives.
    Primitive,
    /// Object parameter, possibly an array of objects.
    Object {
        /// The `L...;` element descriptor, without array dimensions.
        descriptor: String,
        /// Character offset of `descriptor` within the signature text.
        offset: usize,
    },
}

/// Parse a signature such as `(ILjava/lang/String;)`.
///
/// # Errors
/// Returns `MalformedSignature` if the text is not parenthesised, contains
/// an unknown descriptor character, or an unterminated object descriptor.
pub fn parse_signature(signature: &str) -> Result<Signature> {
    let fail = |reason: &str| ScriptRefError::MalformedSignature {
        signature: signature.to_string(),
        reason: reason.to_string(),
    };

    let inner = signature
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| fail("signature must be enclosed in parentheses"))?;

    if inner == "*" {
        return Ok(Signature::Any);
    }

    let chars: Vec<char> = inner.chars().collect();
    let mut params = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i] == '[' {
            i += 1;
        }

        let element_start = i;
        match chars.get(i) {
            Some('Z' | 'B' | 'C' | 'S' | 'I' | 'J' | 'F' | 'D') => {
                i += 1;
                params.push(SignatureParam::Primitive);
            }
            Some('L') => {
                let end = chars[i..]
                    .iter()
                    .position(|&c| c == ';')
                    .map(|pos| i + pos)
                    .ok_or_else(|| fail("unterminated object descriptor"))?;
                if end == i + 1 {
                    return Err(fail("empty object descriptor"));
                }
                i = end + 1;
                params.push(SignatureParam::Object {
                    descriptor: chars[element_start..i].iter().collect(),
                    // +1 for the opening parenthesis
                    offset: element_start + 1,
                });
            }
            Some(other) => {
                return Err(fail(&format!("unknown descriptor character '{}'", other)));
            }
            None => return Err(fail("array dimension without element type")),
        }
    }

    Ok(Signature::Params(params))
}
