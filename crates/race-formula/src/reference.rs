//! Anchoring and glob expansion for `col::row` reference patterns.
//!
//! Column and row ids are flat paths rooted at `/` (`/c1`, `/r7`). `.`
//! denotes the exact current id; a pattern beginning with `..` is resolved
//! against the root, so `../c{1,2}` from any column reaches siblings
//! `/c1`, `/c2`. Anything else is matched as an absolute glob directly.

use race_common::GlobPath;

pub fn anchor(pattern: &str, current: &str) -> String {
    if pattern == "." {
        return current.to_string();
    }
    if !(pattern == ".." || pattern.starts_with("../") || pattern.starts_with("./")) {
        return pattern.to_string();
    }
    let mut stack: Vec<&str> = Vec::new();
    for seg in pattern.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    format!("/{}", stack.join("/"))
}

pub fn expand<'a, I>(pattern: &str, current: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let anchored = anchor(pattern, current);
    GlobPath::compile(&anchored).expand(candidates)
}
