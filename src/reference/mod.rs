//! Reference records found inside embedded native script blocks.
//!
//! A record describes one occurrence of a host-language program element
//! mentioned from script code. Two variants exist:
//! - **Member reference**: `@com.acme.Outer$Inner::method(I)`, a type
//!   optionally followed by a field, method or constructor.
//! - **Parameter-type reference**: a type appearing inside another
//!   reference's signature, e.g. `Lcom/acme/Foo;`.
//!
//! Records are immutable. Every field is fixed at construction, so the
//! hash and equality used by the index can never drift.

pub mod signature;

use crate::error::{Result, ScriptRefError};
use signature::{parse_signature, Signature, SignatureParam};

/// Leading marker of member reference text.
pub const REFERENCE_MARKER: char = '@';

/// Separator between class and member in reference text.
pub const MEMBER_SEPARATOR: &str = "::";

/// Member name used for constructor references.
pub const CONSTRUCTOR_NAME: &str = "new";

/// Discriminator for the concrete record variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordVariant {
    /// Type or member reference.
    Member,
    /// Parameter type inside another reference's signature.
    ParamType,
}

impl RecordVariant {
    /// Stable identifier for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordVariant::Member => "member",
            RecordVariant::ParamType => "param_type",
        }
    }
}

/// Member part of a member reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberPart {
    name: String,
    signature: Option<String>,
    offset: usize,
}

impl MemberPart {
    /// A field reference: name only.
    pub fn field(name: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            signature: None,
            offset,
        }
    }

    /// A method or constructor reference: name plus parenthesised signature.
    pub fn callable(name: impl Into<String>, signature: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            signature: Some(signature.into()),
            offset,
        }
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signature for callables, `None` for fields.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Character offset of the member-name token.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether this names a method or constructor.
    pub fn is_callable(&self) -> bool {
        self.signature.is_some()
    }
}

/// Reference to a type, or to a member of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberReference {
    source_file: String,
    class_offset: usize,
    raw_class_name: String,
    class_name: String,
    member: Option<MemberPart>,
}

impl MemberReference {
    /// Construct a reference from its parts.
    ///
    /// # Errors
    /// Returns `MalformedReference` if the class name cannot be normalized
    /// or the member name is not an identifier, and `MalformedSignature`
    /// if a callable's signature is not a valid descriptor list.
    pub fn new(
        source_file: impl Into<String>,
        class_offset: usize,
        raw_class_name: &str,
        member: Option<MemberPart>,
    ) -> Result<Self> {
        let class_name = normalize_class_name(raw_class_name)?;

        if let Some(part) = &member {
            if !is_identifier(&part.name) {
                return Err(ScriptRefError::malformed(
                    &part.name,
                    "member name is not an identifier",
                ));
            }
            if let Some(sig) = &part.signature {
                parse_signature(sig)?;
            }
        }

        Ok(Self {
            source_file: source_file.into(),
            class_offset,
            raw_class_name: raw_class_name.to_string(),
            class_name,
            member,
        })
    }

    /// Parse reference text of the form `@class[::member[(signature)]]`.
    ///
    /// `member_offset` must be given exactly when the text names a member.
    ///
    /// # Errors
    /// Returns `MalformedReference` on unparseable text or an offset/member
    /// mismatch.
    pub fn parse(
        text: &str,
        source_file: impl Into<String>,
        class_offset: usize,
        member_offset: Option<usize>,
    ) -> Result<Self> {
        let body = text.strip_prefix(REFERENCE_MARKER).unwrap_or(text);

        let (class_part, member_text) = match body.split_once(MEMBER_SEPARATOR) {
            Some((class_part, member_text)) => (class_part, Some(member_text)),
            None => (body, None),
        };

        let member = match (member_text, member_offset) {
            (None, None) => None,
            (Some(member_text), Some(offset)) => Some(parse_member(text, member_text, offset)?),
            (Some(_), None) => {
                return Err(ScriptRefError::malformed(
                    text,
                    "member reference without a member offset",
                ))
            }
            (None, Some(_)) => {
                return Err(ScriptRefError::malformed(
                    text,
                    "member offset given for a type-only reference",
                ))
            }
        };

        Self::new(source_file, class_offset, class_part, member)
    }

    /// Workspace-relative path of the containing file.
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Character offset of the type-name token.
    pub fn class_offset(&self) -> usize {
        self.class_offset
    }

    /// Type name as written.
    pub fn raw_class_name(&self) -> &str {
        &self.raw_class_name
    }

    /// Type name in normalized dotted form.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Member part, if this is not a type-only reference.
    pub fn member(&self) -> Option<&MemberPart> {
        self.member.as_ref()
    }

    /// Render the literal reference text.
    pub fn to_reference_text(&self) -> String {
        let mut text = format!("{}{}", REFERENCE_MARKER, self.raw_class_name);
        if let Some(part) = &self.member {
            text.push_str(MEMBER_SEPARATOR);
            text.push_str(&part.name);
            if let Some(sig) = &part.signature {
                text.push_str(sig);
            }
        }
        text
    }

    /// Derive one parameter-type record per object-typed parameter.
    ///
    /// Offsets assume the signature directly follows the member name in
    /// the source text. Fields, type-only references and `(*)` signatures
    /// yield nothing.
    pub fn parameter_types(&self) -> Vec<ParamTypeReference> {
        let Some(part) = &self.member else {
            return Vec::new();
        };
        let Some(sig) = &part.signature else {
            return Vec::new();
        };
        let Ok(Signature::Params(params)) = parse_signature(sig) else {
            return Vec::new();
        };

        let sig_start = part.offset + part.name.chars().count();
        params
            .into_iter()
            .filter_map(|param| match param {
                SignatureParam::Object { descriptor, offset } => ParamTypeReference::parse(
                    &descriptor,
                    self.source_file.clone(),
                    sig_start + offset,
                )
                .ok(),
                SignatureParam::Primitive => None,
            })
            .collect()
    }
}

/// A parameter type appearing inside another reference's signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamTypeReference {
    source_file: String,
    offset: usize,
    raw_class_name: String,
    class_name: String,
}

impl ParamTypeReference {
    /// Parse a dotted name or object descriptor (`Lcom/acme/Foo;`).
    ///
    /// # Errors
    /// Returns `MalformedReference` if the name cannot be normalized.
    pub fn parse(text: &str, source_file: impl Into<String>, offset: usize) -> Result<Self> {
        let raw = text.trim();
        let class_name = normalize_class_name(raw)?;
        Ok(Self {
            source_file: source_file.into(),
            offset,
            raw_class_name: raw.to_string(),
            class_name,
        })
    }

    /// Workspace-relative path of the containing file.
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Character offset of the type token.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Type as written.
    pub fn raw_class_name(&self) -> &str {
        &self.raw_class_name
    }

    /// Type in normalized dotted form.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// An indexed reference occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceRecord {
    /// Type or member reference.
    Member(MemberReference),
    /// Parameter type inside a signature.
    ParamType(ParamTypeReference),
}

impl ReferenceRecord {
    /// Concrete variant of this record.
    pub fn variant(&self) -> RecordVariant {
        match self {
            ReferenceRecord::Member(_) => RecordVariant::Member,
            ReferenceRecord::ParamType(_) => RecordVariant::ParamType,
        }
    }

    /// Workspace-relative path of the containing file.
    pub fn source_file(&self) -> &str {
        match self {
            ReferenceRecord::Member(r) => r.source_file(),
            ReferenceRecord::ParamType(r) => r.source_file(),
        }
    }

    /// Character offset of the type-name token.
    pub fn class_offset(&self) -> usize {
        match self {
            ReferenceRecord::Member(r) => r.class_offset(),
            ReferenceRecord::ParamType(r) => r.offset(),
        }
    }

    /// Character offset of the member-name token, if any.
    pub fn member_offset(&self) -> Option<usize> {
        self.member().map(MemberPart::offset)
    }

    /// Type name as written.
    pub fn raw_class_name(&self) -> &str {
        match self {
            ReferenceRecord::Member(r) => r.raw_class_name(),
            ReferenceRecord::ParamType(r) => r.raw_class_name(),
        }
    }

    /// Type name in normalized dotted form.
    pub fn class_name(&self) -> &str {
        match self {
            ReferenceRecord::Member(r) => r.class_name(),
            ReferenceRecord::ParamType(r) => r.class_name(),
        }
    }

    /// Member part; always `None` for parameter-type records.
    pub fn member(&self) -> Option<&MemberPart> {
        match self {
            ReferenceRecord::Member(r) => r.member(),
            ReferenceRecord::ParamType(_) => None,
        }
    }

    /// Member name, if this is a member reference.
    pub fn member_name(&self) -> Option<&str> {
        self.member().map(MemberPart::name)
    }

    /// Member signature, if this is a callable reference.
    pub fn member_signature(&self) -> Option<&str> {
        self.member().and_then(MemberPart::signature)
    }

    /// Literal reference text, sufficient to rebuild the record.
    pub fn to_reference_text(&self) -> String {
        match self {
            ReferenceRecord::Member(r) => r.to_reference_text(),
            ReferenceRecord::ParamType(r) => r.raw_class_name().to_string(),
        }
    }
}

impl From<MemberReference> for ReferenceRecord {
    fn from(r: MemberReference) -> Self {
        ReferenceRecord::Member(r)
    }
}

impl From<ParamTypeReference> for ReferenceRecord {
    fn from(r: ParamTypeReference) -> Self {
        ReferenceRecord::ParamType(r)
    }
}

/// Normalize a type name to dotted form.
///
/// Accepts `com.acme.Outer$Inner`, `com.acme.Outer.Inner` and descriptor
/// forms such as `Lcom/acme/Outer$Inner;` or `[[Lcom/acme/Foo;`. Array
/// dimensions are dropped; nested types always use `.`.
///
/// # Errors
/// Returns `MalformedReference` on empty names or empty segments.
pub fn normalize_class_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_start_matches('[');

    let dotted = match trimmed
        .strip_prefix('L')
        .and_then(|s| s.strip_suffix(';'))
    {
        Some(internal) => internal.replace('/', "."),
        None => trimmed.to_string(),
    };
    let normalized = dotted.replace('$', ".");

    if normalized.is_empty() {
        return Err(ScriptRefError::malformed(raw, "empty type name"));
    }
    if !normalized.split('.').all(is_identifier) {
        return Err(ScriptRefError::malformed(raw, "invalid type name segment"));
    }

    Ok(normalized)
}

/// Simple (last-segment) name of a dotted type name.
pub fn simple_name(class_name: &str) -> &str {
    class_name
        .rsplit_once('.')
        .map_or(class_name, |(_, simple)| simple)
}

fn parse_member(text: &str, member_text: &str, offset: usize) -> Result<MemberPart> {
    match member_text.find('(') {
        Some(paren) => {
            let (name, sig) = member_text.split_at(paren);
            if !sig.ends_with(')') {
                return Err(ScriptRefError::malformed(text, "unterminated signature"));
            }
            Ok(MemberPart::callable(name, sig, offset))
        }
        None => Ok(MemberPart::field(member_text, offset)),
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
