//! Element key derivation.
//!
//! Type references are keyed by their qualified name and by every
//! enclosing-type prefix. Member references additionally get a member key
//! that carries neither the declaring type nor the parameter list:
//!
//! | Reference                  | Keys                                   |
//! |----------------------------|----------------------------------------|
//! | `@com.acme.Outer$Inner`    | `com.acme.Outer.Inner`, `com.acme.Outer`, `com.acme` |
//! | `@A.B::count`              | `A.B`, `A`, `::count`                  |
//! | `@A.B::go(I)`              | `A.B`, `A`, `::go(...)`                |

use crate::reference::ReferenceRecord;

/// Prefix marking a member key.
pub const MEMBER_KEY_PREFIX: &str = "::";

/// Suffix marking a callable member key ("any parameter list").
pub const CALLABLE_KEY_SUFFIX: &str = "(...)";

/// Keys for a normalized type name: the name itself, then each prefix
/// obtained by dropping trailing segments while the dropped segment starts
/// with an uppercase character.
pub fn type_keys(class_name: &str) -> Vec<String> {
    let mut keys = vec![class_name.to_string()];
    let mut current = class_name;

    while let Some((parent, last)) = current.rsplit_once('.') {
        if !last.chars().next().is_some_and(char::is_uppercase) {
            break;
        }
        keys.push(parent.to_string());
        current = parent;
    }

    keys
}

/// Member key for a field (`callable == false`) or a method/constructor.
pub fn member_key(name: &str, callable: bool) -> String {
    if callable {
        format!("{}{}{}", MEMBER_KEY_PREFIX, name, CALLABLE_KEY_SUFFIX)
    } else {
        format!("{}{}", MEMBER_KEY_PREFIX, name)
    }
}

/// Whether `key` is a member key (as opposed to a type key).
pub fn is_member_key(key: &str) -> bool {
    key.starts_with(MEMBER_KEY_PREFIX)
}

/// Whether `key` is a callable member key.
pub fn is_callable_key(key: &str) -> bool {
    is_member_key(key) && key.ends_with(CALLABLE_KEY_SUFFIX)
}

/// Every element-index key a record is stored under.
pub fn element_keys(record: &ReferenceRecord) -> Vec<String> {
    let mut keys = type_keys(record.class_name());
    if let Some(member) = record.member() {
        keys.push(member_key(member.name(), member.is_callable()));
    }
    keys
}
