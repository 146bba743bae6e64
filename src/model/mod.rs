//! Program model boundary.
//!
//! The host-language front end is an external collaborator. This module
//! defines what the index needs from it: a description of a queried
//! program element and a way to resolve a reference record back to the
//! element it denotes. [`TypeTable`] is an in-memory model with
//! inheritance-aware member lookup.

use crate::reference::{ReferenceRecord, CONSTRUCTOR_NAME};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Kinds of program elements that can be searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Class or interface.
    Type,
    /// Field.
    Field,
    /// Method.
    Method,
    /// Constructor.
    Constructor,
}

impl ElementKind {
    /// Whether this kind is a method or constructor.
    pub fn is_callable(&self) -> bool {
        matches!(self, ElementKind::Method | ElementKind::Constructor)
    }

    /// Convert kind to string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Type => "type",
            ElementKind::Field => "field",
            ElementKind::Method => "method",
            ElementKind::Constructor => "constructor",
        }
    }
}

/// A resolved program element.
///
/// For types, `declaring_type` is the type's own qualified name and
/// `name` its simple name. Members carry the qualified name of the type
/// that declares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramElement {
    /// Element kind.
    pub kind: ElementKind,
    /// Qualified (dotted) name of the declaring type.
    pub declaring_type: String,
    /// Simple name (`new` for constructors).
    pub name: String,
    /// Parameter signature for callables.
    pub signature: Option<String>,
}

impl ProgramElement {
    /// A type element.
    pub fn type_element(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let name = crate::reference::simple_name(&qualified_name).to_string();
        Self {
            kind: ElementKind::Type,
            declaring_type: qualified_name,
            name,
            signature: None,
        }
    }

    /// A field element.
    pub fn field(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Field,
            declaring_type: declaring_type.into(),
            name: name.into(),
            signature: None,
        }
    }

    /// A method element.
    pub fn method(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            kind: ElementKind::Method,
            declaring_type: declaring_type.into(),
            name: name.into(),
            signature: Some(signature.into()),
        }
    }

    /// A constructor element.
    pub fn constructor(declaring_type: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Constructor,
            declaring_type: declaring_type.into(),
            name: CONSTRUCTOR_NAME.to_string(),
            signature: Some(signature.into()),
        }
    }

    /// Fully qualified name of the element itself.
    pub fn qualified_name(&self) -> String {
        match self.kind {
            ElementKind::Type => self.declaring_type.clone(),
            _ => format!("{}.{}", self.declaring_type, self.name),
        }
    }
}

/// Live program model supplied by the host front end.
pub trait ProgramModel: Send + Sync {
    /// Resolve a reference to the element it denotes, following
    /// inheritance to the declaring type. `None` when the reference no
    /// longer resolves (deleted file, renamed element, ...).
    fn resolve(&self, record: &ReferenceRecord) -> Option<ProgramElement>;
}

#[derive(Debug, Clone, Default)]
struct TypeEntry {
    supertypes: Vec<String>,
    fields: HashSet<String>,
    callables: HashSet<(String, String)>,
}

/// In-memory program model.
///
/// Members are looked up on the referenced type first, then on its
/// supertypes breadth-first; a match resolves to the type that declares
/// the member. Signatures `(*)` match any declared overload when exactly
/// one exists.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: HashMap<String, TypeEntry>,
}

impl TypeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type with its direct supertypes.
    pub fn add_type(&mut self, qualified_name: &str, supertypes: &[&str]) {
        let entry = self.types.entry(qualified_name.to_string()).or_default();
        entry.supertypes = supertypes.iter().map(|s| s.to_string()).collect();
    }

    /// Declare a field on a registered (or new) type.
    pub fn add_field(&mut self, declaring_type: &str, name: &str) {
        self.types
            .entry(declaring_type.to_string())
            .or_default()
            .fields
            .insert(name.to_string());
    }

    /// Declare a method or constructor (`name == "new"`).
    pub fn add_callable(&mut self, declaring_type: &str, name: &str, signature: &str) {
        self.types
            .entry(declaring_type.to_string())
            .or_default()
            .callables
            .insert((name.to_string(), signature.to_string()));
    }

    /// Remove a type and everything it declares.
    pub fn remove_type(&mut self, qualified_name: &str) {
        self.types.remove(qualified_name);
    }

    /// Whether a type is registered.
    pub fn contains_type(&self, qualified_name: &str) -> bool {
        self.types.contains_key(qualified_name)
    }

    /// Types to search for a member: the type, then supertypes breadth-first.
    fn lookup_order(&self, start: &str) -> Vec<&str> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            let Some((name, entry)) = self.types.get_key_value(current) else {
                continue;
            };
            order.push(name.as_str());
            queue.extend(entry.supertypes.iter().map(String::as_str));
        }

        order
    }

    fn resolve_field(&self, class_name: &str, field: &str) -> Option<ProgramElement> {
        self.lookup_order(class_name)
            .into_iter()
            .find(|ty| self.types[*ty].fields.contains(field))
            .map(|ty| ProgramElement::field(ty, field))
    }

    fn resolve_callable(
        &self,
        class_name: &str,
        name: &str,
        signature: &str,
    ) -> Option<ProgramElement> {
        // Constructors are not inherited.
        let order = if name == CONSTRUCTOR_NAME {
            self.types
                .get_key_value(class_name)
                .map(|(k, _)| vec![k.as_str()])
                .unwrap_or_default()
        } else {
            self.lookup_order(class_name)
        };

        for ty in order {
            let callables = &self.types[ty].callables;
            let found = if signature == crate::reference::signature::ANY_SIGNATURE {
                let mut overloads = callables.iter().filter(|(n, _)| n == name);
                match (overloads.next(), overloads.next()) {
                    (Some((_, sig)), None) => Some(sig.clone()),
                    _ => None,
                }
            } else if callables.contains(&(name.to_string(), signature.to_string())) {
                Some(signature.to_string())
            } else {
                None
            };

            if let Some(sig) = found {
                return Some(if name == CONSTRUCTOR_NAME {
                    ProgramElement::constructor(ty, sig)
                } else {
                    ProgramElement::method(ty, name, sig)
                });
            }
        }

        None
    }
}

impl ProgramModel for TypeTable {
    fn resolve(&self, record: &ReferenceRecord) -> Option<ProgramElement> {
        let class_name = record.class_name();
        match record.member() {
            None => self
                .contains_type(class_name)
                .then(|| ProgramElement::type_element(class_name)),
            Some(member) => match member.signature() {
                None => self.resolve_field(class_name, member.name()),
                Some(sig) => self.resolve_callable(class_name, member.name(), sig),
            },
        }
    }
}
