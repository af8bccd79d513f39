//! Case conversion and identifier helpers shared by every target.

use std::sync::LazyLock;

use heck::ToPascalCase;
use regex::Regex;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("non-word pattern is valid"));

/// Splits on `-`, `_` and `.` and capitalizes each token, leaving the rest of
/// every token untouched (`fetch_testURL` → `FetchTestURL`).
pub fn to_upper_camel_case(input: &str) -> String {
    input
        .split(['-', '_', '.'])
        .map(capitalize)
        .collect()
}

/// Upper camel case with the leading word or abbreviation folded to lower
/// case (`URLValue` → `urlValue`, `FetchTest` → `fetchTest`).
pub fn to_lower_camel_case(input: &str) -> String {
    lowercase_initial_word_or_abbreviation(&to_upper_camel_case(input))
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercases the leading run of upper case characters.
///
/// Folding stops at the first character already in lower case. When the run
/// is an abbreviation followed by a word, the last capital starts that word
/// and is kept (`IDValue` → `idValue`), so abbreviations later in the
/// identifier are never touched (`UserID` → `userID`).
pub fn lowercase_initial_word_or_abbreviation(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut result = String::with_capacity(input.len());
    let mut folding = true;

    for (i, ch) in chars.iter().enumerate() {
        if !folding {
            result.push(*ch);
            continue;
        }
        if !ch.is_uppercase() {
            folding = false;
            result.push(*ch);
            continue;
        }
        let next_is_lower = chars.get(i + 1).is_some_and(|next| next.is_lowercase());
        if i > 0 && next_is_lower {
            folding = false;
            result.push(*ch);
        } else {
            result.extend(ch.to_lowercase());
        }
    }
    result
}

/// Hyphenates before every capital preceded by a letter, then lowercases
/// (`ImplementModel` → `implement-model`).
pub fn camel_case_to_kebab_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 4);
    let mut previous: Option<char> = None;
    for ch in input.chars() {
        if ch.is_ascii_uppercase() && previous.is_some_and(|p| p.is_ascii_alphabetic()) {
            result.push('-');
        }
        result.extend(ch.to_lowercase());
        previous = Some(ch);
    }
    result
}

/// Enum member identifier for a literal value: split on non-word runs,
/// capitalize each piece and join (`in-progress` → `InProgress`).
pub fn enum_case_name(literal: &str) -> String {
    let joined: String = NON_WORD
        .split(literal)
        .filter(|piece| !piece.is_empty())
        .map(capitalize)
        .collect();
    let name = to_upper_camel_case(&joined);
    if name.is_empty() {
        return "Empty".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("Value{name}");
    }
    name
}

/// Synthesized type name for an inline shape: the scope segments joined in
/// upper camel case.
pub fn synthesized_name<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|segment| to_upper_camel_case(segment.as_ref()))
        .collect()
}

/// Appends `_` to identifiers that collide with a reserved word.
pub fn legal_identifier(name: &str, reserved: &[&str]) -> String {
    let sanitized = sanitize_identifier(name);
    if reserved.contains(&sanitized.as_str()) {
        format!("{sanitized}_")
    } else {
        sanitized
    }
}

/// First of `base`, `base2`, `base3`, ... that `taken` rejects.
pub fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2usize..)
        .map(|counter| format!("{base}{counter}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Method name for an operation declared without one, from its HTTP method
/// and the literal segments of its path. A path ending in a template
/// variable addresses one item, so its last resource is singular.
///
/// `GET /pets` is `listPets`, `GET /pets/{petId}` is `getPet`, and
/// `DELETE /owners/{id}/pets` is `deleteOwnersPets`.
pub fn route_to_name(method: &str, path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let is_variable = |segment: &str| segment.starts_with('{') && segment.ends_with('}');
    let single_item = segments.last().is_some_and(|last| is_variable(*last));
    let resources: Vec<&str> = segments.into_iter().filter(|s| !is_variable(*s)).collect();

    let method = method.to_ascii_lowercase();
    let mut name = match (method.as_str(), single_item) {
        ("get", true) => "get".to_string(),
        ("get", false) => "list".to_string(),
        ("post", _) => "create".to_string(),
        ("put", _) => "update".to_string(),
        (other, _) => other.to_string(),
    };
    for (index, resource) in resources.iter().enumerate() {
        let word = if single_item && index + 1 == resources.len() {
            singular(resource)
        } else {
            resource.to_string()
        };
        name.push_str(&word.to_pascal_case());
    }
    name
}

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies").filter(|stem| !stem.is_empty()) {
        return format!("{stem}y");
    }
    for suffix in ["ses", "xes", "zes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{}", &suffix[..1]);
        }
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() && !word.ends_with("ss") => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Joins the word runs of `name` with `_`; a leading digit gets a `_` prefix.
pub fn sanitize_identifier(name: &str) -> String {
    let joined = NON_WORD
        .split(name)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    match joined.chars().next() {
        None => "unnamed".to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{joined}"),
        Some(_) => joined,
    }
}
