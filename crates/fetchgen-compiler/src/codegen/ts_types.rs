//! TypeScript naming and type-expression helpers.

use serde_json::Value;

/// The dynamic type used wherever a schema has no usable shape.
pub const ANY_TYPE: &str = "any";

/// Type of an object schema that declares no properties at all.
pub const EMPTY_OBJECT_TYPE: &str = "Record<string, never>";

/// The `null` type.
pub const NULL_TYPE: &str = "null";

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with",
];

/// Splits a name into words on separators and lowercase-to-uppercase boundaries.
fn words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower_or_digit = false;

    for c in s.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower_or_digit = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower_or_digit && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower_or_digit = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Converts a name to PascalCase, keeping the casing inside each word.
pub fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .map(capitalize)
        .collect()
}

/// Converts a name to camelCase.
pub fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Converts a value such as `inProgress` or `in-progress` to `IN_PROGRESS`.
pub fn to_upper_snake_case(s: &str) -> String {
    words(s)
        .iter()
        .map(|w| w.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Whether `s` can be used as a bare identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Makes `s` usable as a variable or parameter name.
pub fn safe_identifier(s: &str) -> String {
    let camel = to_camel_case(s);
    let ident = if camel.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{}", camel)
    } else if camel.is_empty() {
        "_".to_string()
    } else {
        camel
    };
    if RESERVED_WORDS.contains(&ident.as_str()) {
        format!("{}_", ident)
    } else {
        ident
    }
}

/// Enum member identifier for a string value.
pub fn enum_member_name(value: &str) -> String {
    let name = to_upper_snake_case(value);
    if name.is_empty() {
        "_".to_string()
    } else if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{}", name)
    } else {
        name
    }
}

/// Quotes a string as a single-quoted TypeScript literal.
pub fn string_literal(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("'{}'", escaped)
}

/// Property key, quoted when it is not a valid identifier.
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        string_literal(name)
    }
}

/// Literal type for a `const` value.
pub fn literal_type(value: &Value) -> String {
    match value {
        Value::String(s) => string_literal(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => NULL_TYPE.to_string(),
        Value::Array(_) | Value::Object(_) => ANY_TYPE.to_string(),
    }
}

/// Whether a type expression has a `|` or `&` outside any brackets.
pub fn has_top_level_operator(type_expr: &str) -> bool {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for c in type_expr.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '<' | '{' | '[' => depth += 1,
            ')' | '>' | '}' | ']' => depth -= 1,
            '|' | '&' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// Wraps a type expression as an array type.
pub fn to_array_type(element: &str) -> String {
    if has_top_level_operator(element) {
        format!("({})[]", element)
    } else {
        format!("{}[]", element)
    }
}

/// Joins member types with a composition operator, always parenthesized.
pub fn join_types(members: &[String], separator: &str) -> String {
    if members.is_empty() {
        return ANY_TYPE.to_string();
    }
    format!("({})", members.join(separator))
}

/// Adds `| null` unless the expression already admits null.
pub fn with_null(type_expr: &str) -> String {
    if type_expr == NULL_TYPE || type_expr == ANY_TYPE || type_expr.ends_with("| null") {
        type_expr.to_string()
    } else {
        format!("{} | {}", type_expr, NULL_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_pascal_case("todo_item"), "TodoItem");
        assert_eq!(to_pascal_case("AiMessage"), "AiMessage");
        assert_eq!(to_pascal_case("order-item"), "OrderItem");
        assert_eq!(to_camel_case("todo_item"), "todoItem");
        assert_eq!(to_camel_case("Profile"), "profile");
    }

    #[test]
    fn test_upper_snake_case() {
        assert_eq!(to_upper_snake_case("CREATED"), "CREATED");
        assert_eq!(to_upper_snake_case("inProgress"), "IN_PROGRESS");
        assert_eq!(to_upper_snake_case("in-progress"), "IN_PROGRESS");
        assert_eq!(to_upper_snake_case("a.b c"), "A_B_C");
        assert_eq!(enum_member_name("1st"), "_1ST");
    }

    #[test]
    fn test_array_type_parenthesization() {
        assert_eq!(to_array_type("A"), "A[]");
        assert_eq!(to_array_type("A|B"), "(A|B)[]");
        assert_eq!(to_array_type("A & B"), "(A & B)[]");
        assert_eq!(to_array_type("(A | B)"), "(A | B)[]");
        assert_eq!(to_array_type("Record<string, A | B>"), "Record<string, A | B>[]");
        assert_eq!(to_array_type("'a|b'"), "'a|b'[]");
    }

    #[test]
    fn test_nested_array() {
        assert_eq!(to_array_type(&to_array_type("string")), "string[][]");
    }

    #[test]
    fn test_literals() {
        assert_eq!(string_literal("it's"), "'it\\'s'");
        assert_eq!(literal_type(&json!("A")), "'A'");
        assert_eq!(literal_type(&json!(3)), "3");
        assert_eq!(literal_type(&json!(true)), "true");
        assert_eq!(literal_type(&json!({ "a": 1 })), "any");
    }

    #[test]
    fn test_property_keys() {
        assert_eq!(property_key("name"), "name");
        assert_eq!(property_key("content-type"), "'content-type'");
        assert_eq!(property_key("1a"), "'1a'");
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(safe_identifier("tenant-id"), "tenantId");
        assert_eq!(safe_identifier("default"), "default_");
        assert_eq!(safe_identifier("2fa"), "_2fa");
    }

    #[test]
    fn test_join_and_null() {
        let members = vec!["A".to_string(), "B".to_string()];
        assert_eq!(join_types(&members, " | "), "(A | B)");
        assert_eq!(join_types(&members[..1], " | "), "(A)");
        assert_eq!(to_array_type(&join_types(&members[..1], " & ")), "(A)[]");
        assert_eq!(with_null("string"), "string | null");
        assert_eq!(with_null("null"), "null");
        assert_eq!(with_null("any"), "any");
    }
}
