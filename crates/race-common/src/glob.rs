//! UNIX-style path glob matching shared by the XML path-stack predicates
//! (`hasParent`, compiled glob-path match) and the formula compiler's
//! cell-reference pattern expansion (`*`, `**`, `{a,b}`).

/// A single path-segment pattern: either a literal, a single-element
/// wildcard (`*`), a brace alternation (`{a,b,c}`), an any-depth
/// wildcard (`**`, only meaningful between segments), or a segment with
/// one or more `*`s embedded in otherwise-literal text (`sensor*`,
/// `*-east`), matched by splitting on `*` and requiring each fragment to
/// appear in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Star,
    DoubleStar,
    Alternation(Vec<String>),
    Glob(Vec<String>),
}

/// Matches `text` against a segment pattern already split on `*` into
/// `fragments` (e.g. `"sensor*"` -> `["sensor", ""]`, `"*-east"` ->
/// `["", "-east"]`). The first fragment must prefix `text`, the last must
/// suffix it, and the fragments in between must occur in order somewhere
/// in the remaining middle.
fn glob_fragments_match(fragments: &[String], text: &str) -> bool {
    let Some((first, rest)) = fragments.split_first() else { return text.is_empty() };
    let Some(text) = text.strip_prefix(first.as_str()) else { return false };
    let Some((last, middle)) = rest.split_last() else { return true };
    let Some(mut text) = text.strip_suffix(last.as_str()) else { return false };
    for frag in middle {
        if frag.is_empty() {
            continue;
        }
        match text.find(frag.as_str()) {
            Some(idx) => text = &text[idx + frag.len()..],
            None => return false,
        }
    }
    true
}

/// A compiled path pattern: `/a/b/c`, `*`, `**`, `{a,b}` segments joined by
/// `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPath {
    segments: Vec<Segment>,
}

impl GlobPath {
    pub fn compile(pattern: &str) -> Self {
        let segments = pattern
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Self::compile_segment)
            .collect();
        Self { segments }
    }

    fn compile_segment(seg: &str) -> Segment {
        if seg == "**" {
            Segment::DoubleStar
        } else if seg == "*" {
            Segment::Star
        } else if seg.starts_with('{') && seg.ends_with('}') {
            let inner = &seg[1..seg.len() - 1];
            Segment::Alternation(inner.split(',').map(|s| s.to_string()).collect())
        } else if seg.contains('*') {
            Segment::Glob(seg.split('*').map(|s| s.to_string()).collect())
        } else {
            Segment::Literal(seg.to_string())
        }
    }

    /// Match a concrete `/`-joined path against this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
        Self::match_from(&self.segments, &parts)
    }

    fn match_from(pattern: &[Segment], parts: &[&str]) -> bool {
        match pattern.split_first() {
            None => parts.is_empty(),
            Some((Segment::DoubleStar, rest)) => {
                // ** matches zero or more path elements.
                if Self::match_from(rest, parts) {
                    return true;
                }
                if parts.is_empty() {
                    return false;
                }
                Self::match_from(pattern, &parts[1..])
            }
            Some((seg, rest)) => {
                let Some((&head, tail)) = parts.split_first() else {
                    return false;
                };
                let ok = match seg {
                    Segment::Literal(lit) => lit == head,
                    Segment::Star => true,
                    Segment::Alternation(alts) => alts.iter().any(|a| a == head),
                    Segment::Glob(fragments) => glob_fragments_match(fragments, head),
                    Segment::DoubleStar => unreachable!("handled above"),
                };
                ok && Self::match_from(rest, tail)
            }
        }
    }

    /// Enumerate every concrete path from `candidates` that this pattern
    /// matches, preserving the candidate order.
    pub fn expand<'a, I>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates
            .into_iter()
            .filter(|c| self.matches(c))
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_path_matches_itself_only() {
        let g = GlobPath::compile("/a/b/c");
        assert!(g.matches("/a/b/c"));
        assert!(!g.matches("/a/b/d"));
        assert!(!g.matches("/a/b"));
    }

    #[test]
    fn single_star_matches_one_element() {
        let g = GlobPath::compile("/a/*/c");
        assert!(g.matches("/a/x/c"));
        assert!(!g.matches("/a/x/y/c"));
    }

    #[test]
    fn double_star_matches_any_depth() {
        let g = GlobPath::compile("/a/**/c");
        assert!(g.matches("/a/c"));
        assert!(g.matches("/a/x/c"));
        assert!(g.matches("/a/x/y/c"));
        assert!(!g.matches("/a/x/y/d"));
    }

    #[test]
    fn brace_alternation_matches_any_listed() {
        let g = GlobPath::compile("/a/{x,y,z}");
        assert!(g.matches("/a/x"));
        assert!(g.matches("/a/y"));
        assert!(!g.matches("/a/w"));
    }

    #[test]
    fn embedded_wildcard_matches_by_prefix() {
        let g = GlobPath::compile("sensor*");
        assert!(g.matches("sensor7"));
        assert!(g.matches("sensor"));
        assert!(!g.matches("other7"));
        assert!(!g.matches("xsensor7"));
    }

    #[test]
    fn embedded_wildcard_matches_by_suffix() {
        let g = GlobPath::compile("*-east");
        assert!(g.matches("us-east"));
        assert!(!g.matches("us-west"));
    }

    #[test]
    fn update_filter_style_path_matches_prefixed_originator_and_row() {
        let originator = GlobPath::compile("sensor*");
        let row = GlobPath::compile("/r*");
        assert!(originator.matches("sensor7"));
        assert!(row.matches("/r42"));
        assert!(!row.matches("/s42"));
    }

    #[test]
    fn expand_filters_candidate_list() {
        let g = GlobPath::compile("/c{1,2}");
        let expanded = g.expand(["/c1", "/c2", "/c3"]);
        assert_eq!(expanded, vec!["/c1".to_string(), "/c2".to_string()]);
    }
}
