//! # Naming Strategies
//!
//! A naming strategy converts property names to and from the key style of
//! the data source. `ToSource` is used when looking up input keys and when
//! writing output keys; `FromSource` goes the other way.
//!
//! Conversions split a name into words at underscores, hyphens and case
//! boundaries. A run of capitals is one word (`userID` → `user_id`,
//! `HTTPServer` → `http_server`).
//!
//! The run-of-capitals rule means single-letter words do not survive a trip
//! through camelCase: `a_b_c` becomes `aBC`, which splits back as `a_bc`.

use std::fmt;

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Property name to source key.
    ToSource,
    /// Source key to property name.
    FromSource,
}

/// Pluggable key conversion.
pub trait NamingStrategy: Send + Sync + fmt::Debug {
    fn convert(&self, name: &str, direction: Direction) -> String;

    fn name(&self) -> &'static str;
}

/// Leaves names untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl NamingStrategy for Identity {
    fn convert(&self, name: &str, _direction: Direction) -> String {
        name.to_string()
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// `firstName` ↔ `first_name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCase;

impl NamingStrategy for SnakeCase {
    fn convert(&self, name: &str, direction: Direction) -> String {
        match direction {
            Direction::ToSource => to_snake(name),
            Direction::FromSource => to_camel(name),
        }
    }

    fn name(&self) -> &'static str {
        "snake_case"
    }
}

/// `first_name` ↔ `firstName`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCase;

impl NamingStrategy for CamelCase {
    fn convert(&self, name: &str, direction: Direction) -> String {
        match direction {
            Direction::ToSource => to_camel(name),
            Direction::FromSource => to_snake(name),
        }
    }

    fn name(&self) -> &'static str {
        "camelCase"
    }
}

/// `firstName` ↔ `first-name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KebabCase;

impl NamingStrategy for KebabCase {
    fn convert(&self, name: &str, direction: Direction) -> String {
        match direction {
            Direction::ToSource => words(name).join("-"),
            Direction::FromSource => to_camel(name),
        }
    }

    fn name(&self) -> &'static str {
        "kebab-case"
    }
}

/// Lowercase words of an identifier.
fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut out = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // Boundary before a capital that follows a lowercase/digit, or
            // that starts a new word after an acronym (`HTTPServer`).
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn to_snake(name: &str) -> String {
    words(name).join("_")
}

fn to_camel(name: &str) -> String {
    let mut out = String::new();
    for (i, word) in words(name).iter().enumerate() {
        if i == 0 {
            out.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
