//! Identifier rules for variable type names and target types.
//!
//! A name must work as a type reference in generated source and as a file
//! name stem, so the rules follow the target language's identifier grammar:
//! plain identifiers, dotted qualified names, and trailing `[]` groups.

/// Keywords of the target language that are legal here as type names.
pub const PRIMITIVE_ALIASES: &[&str] = &[
    "bool", "byte", "sbyte", "char", "decimal", "double", "float", "int", "uint", "long", "ulong",
    "object", "short", "ushort", "string",
];

/// Reserved keywords of the target language.
const RESERVED_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class",
    "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event",
    "explicit", "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace", "new",
    "null", "object", "operator", "out", "override", "params", "private", "protected", "public",
    "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static",
    "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong",
    "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
];

const ARRAY_SUFFIX: &str = "[]";

/// Whether `name` is usable as both a type reference and a file name stem.
pub fn is_valid(name: &str) -> bool {
    let base = strip_array_suffixes(name);
    if base.is_empty() {
        return false;
    }
    if PRIMITIVE_ALIASES.contains(&base) {
        return true;
    }
    base.split('.').all(is_plain_identifier)
}

/// True for a single identifier segment that is not a reserved keyword.
pub fn is_plain_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return false;
    }
    !RESERVED_KEYWORDS.contains(&segment)
}

/// Remove every trailing `[]` group.
fn strip_array_suffixes(mut name: &str) -> &str {
    while let Some(stripped) = name.strip_suffix(ARRAY_SUFFIX) {
        name = stripped;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_aliases_are_valid() {
        for alias in PRIMITIVE_ALIASES {
            assert!(is_valid(alias), "{alias}");
            assert!(is_valid(&format!("{alias}[]")), "{alias}[]");
        }
    }

    #[test]
    fn test_plain_identifiers() {
        assert!(is_valid("man1"));
        assert!(is_valid("_private"));
        assert!(is_valid("Vector3"));
        assert!(!is_valid("1man"));
        assert!(!is_valid(""));
    }

    #[test]
    fn test_keywords_rejected() {
        assert!(!is_valid("if"));
        assert!(!is_valid("public"));
        assert!(!is_valid("void"));
        assert!(!is_valid("class"));
    }

    #[test]
    fn test_qualified_names() {
        assert!(is_valid("Some.Specific.Class"));
        assert!(!is_valid("Some.int.Class"));
        assert!(!is_valid("Some..Class"));
        assert!(!is_valid(".Leading"));
        assert!(!is_valid("Trailing."));
    }

    #[test]
    fn test_array_suffixes() {
        assert!(is_valid("welp[]"));
        assert!(is_valid("welp[][]"));
        assert!(is_valid("UnityEngine.Transform[]"));
        assert!(!is_valid("welp[[]]"));
        assert!(!is_valid("hi[].welp"));
        assert!(!is_valid("[]"));
        assert!(!is_valid("welp[1]"));
    }

    #[test]
    fn test_whitespace_and_punctuation() {
        assert!(!is_valid("my var"));
        assert!(!is_valid(" int"));
        assert!(!is_valid("a-b"));
        assert!(!is_valid("List<int>"));
        assert!(!is_valid("@Name"));
    }
}
