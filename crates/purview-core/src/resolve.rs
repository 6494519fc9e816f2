//! Identity resolution for gazette text fragments.
//!
//! Gazette documents address the same entities in many spellings: column
//! codes appear as digits or roman numerals, minister numbers with or without
//! parentheses and zero-padding, items with or without their printed number
//! prefix. Every normalization rule lives here; callers never parse gazette
//! text themselves.

use crate::item::Category;

/// Map a column code to its category.
///
/// Accepts digits `1`/`2`/`3` or roman `I`/`II`/`III` (case-insensitive),
/// scanning noisy strings such as `" Column I "`. Returns `None` when no code
/// matches; callers must skip the record rather than guess.
pub fn normalize_column(raw: &str) -> Option<Category> {
  // Digits take precedence: the first 1-3 anywhere decides.
  for c in raw.chars() {
    match c {
      '1' => return Some(Category::Function),
      '2' => return Some(Category::Department),
      '3' => return Some(Category::Law),
      _ => {}
    }
  }
  for word in raw.split(|c: char| !c.is_alphanumeric()) {
    let category = match word.to_ascii_uppercase().as_str() {
      "I" => Category::Function,
      "II" => Category::Department,
      "III" => Category::Law,
      _ => continue,
    };
    return Some(category);
  }
  None
}

/// First integer substring of `text`, e.g. `"item 3"` → `3`.
/// `None` signals "match by name only".
pub fn extract_item_number(text: &str) -> Option<u32> {
  let mut digits = String::new();
  for c in text.chars() {
    if c.is_ascii_digit() {
      digits.push(c);
    } else if !digits.is_empty() {
      break;
    }
  }
  digits.parse().ok()
}

/// Canonicalize a minister heading number.
///
/// Strips parentheses and whitespace, drops a leading `"No."` marker, and
/// zero-pads single digits to width 2 so `"4"`, `"(04)"`, and `"04"` all
/// resolve to `"04"`. Anything non-numeric passes through otherwise
/// unchanged.
pub fn normalize_minister_key(raw: &str) -> String {
  let mut key: String = raw
    .chars()
    .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
    .collect();
  if let Some(prefix) = key.get(..3)
    && prefix.eq_ignore_ascii_case("no.")
  {
    key.drain(..3);
  }
  if key.len() == 1 && key.chars().all(|c| c.is_ascii_digit()) {
    key.insert(0, '0');
  }
  key
}

/// Strip a leading `"<number>. "`, `"<number>) "`, or bare `"<number> "`
/// prefix (decimal sub-numbers such as `"5.1"` included) and return the
/// remaining descriptive text.
pub fn clean_item_text(raw: &str) -> String {
  let s = raw.trim();
  let rest = s.trim_start_matches(|c: char| c.is_ascii_digit());
  if rest.len() == s.len() {
    return s.to_owned();
  }
  let mut rest = rest;
  if let Some(tail) = rest.strip_prefix('.')
    && tail.starts_with(|c: char| c.is_ascii_digit())
  {
    rest = tail.trim_start_matches(|c: char| c.is_ascii_digit());
  }
  let rest = rest.trim_start();
  let rest = rest.strip_prefix(['.', ')']).unwrap_or(rest);
  rest.trim_start().to_owned()
}

/// Split a gazette cell into its printed item number and descriptive text.
///
/// The number is taken only when it is a true prefix set off by `.`, `)`,
/// whitespace, or end of string — `"18. Registration"` splits, while
/// `"19th Amendment"` and law titles with embedded act numbers do not.
pub fn split_item(raw: &str) -> (Option<u32>, String) {
  let s = raw.trim();
  let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
  if digits.is_empty() {
    return (None, s.to_owned());
  }
  let mut rest = &s[digits.len()..];
  if let Some(tail) = rest.strip_prefix('.')
    && tail.starts_with(|c: char| c.is_ascii_digit())
  {
    rest = tail.trim_start_matches(|c: char| c.is_ascii_digit());
  }
  let delimited = match rest.chars().next() {
    None => true,
    Some('.') | Some(')') => true,
    Some(c) => c.is_whitespace(),
  };
  if !delimited {
    return (None, s.to_owned());
  }
  match digits.parse() {
    Ok(number) => (Some(number), clean_item_text(s)),
    Err(_) => (None, s.to_owned()),
  }
}
