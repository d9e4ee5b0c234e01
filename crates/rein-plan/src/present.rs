use std::collections::BTreeMap;

/// Marker placed before the predicate fingerprint in a constraint comment.
pub const FINGERPRINT_COMMENT_PREFIX: &str = "rein:";

/// CHECK constraints currently present on a table.
///
/// Each name maps to the predicate fingerprint recorded when it was added,
/// or `None` when the constraint carries no recognizable fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentConstraints {
    entries: BTreeMap<String, Option<String>>,
}

impl PresentConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names only, without fingerprints.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: names
                .into_iter()
                .map(|name| (name.into(), None))
                .collect(),
        }
    }

    /// Parse a listing with one `name` or `name<TAB>fingerprint` per line.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub fn parse_listing(text: &str) -> Self {
        let mut present = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once(char::is_whitespace) {
                Some((name, fingerprint)) => {
                    let fingerprint = fingerprint.trim();
                    let fingerprint =
                        (!fingerprint.is_empty()).then(|| fingerprint.to_string());
                    present.insert(name, fingerprint);
                }
                None => present.insert(line, None),
            }
        }
        present
    }

    pub fn insert(&mut self, name: impl Into<String>, fingerprint: Option<String>) {
        self.entries.insert(name.into(), fingerprint);
    }

    pub fn with(mut self, name: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        self.insert(name, Some(fingerprint.into()));
        self
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// `None` when absent, `Some(None)` when present without a fingerprint.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.entries.get(name).map(Option::as_deref)
    }

    /// Names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<String> for PresentConstraints {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|name| (name, None)).collect(),
        }
    }
}

impl FromIterator<(String, Option<String>)> for PresentConstraints {
    fn from_iter<T: IntoIterator<Item = (String, Option<String>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Comment text recording a predicate fingerprint.
pub fn fingerprint_comment(fingerprint: &str) -> String {
    format!("{FINGERPRINT_COMMENT_PREFIX}{fingerprint}")
}

/// Extract the fingerprint from a constraint comment, if it carries one.
pub fn parse_fingerprint_comment(comment: &str) -> Option<String> {
    comment
        .trim()
        .strip_prefix(FINGERPRINT_COMMENT_PREFIX)
        .map(str::trim)
        .filter(|fingerprint| {
            !fingerprint.is_empty() && fingerprint.chars().all(|ch| ch.is_ascii_hexdigit())
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_accepts_names_with_optional_fingerprints() {
        let present = PresentConstraints::parse_listing(
            "# current checks\nrein_books_state_incl\tabc123\n\nbooks_legacy_check\n",
        );
        assert_eq!(present.len(), 2);
        assert_eq!(present.get("rein_books_state_incl"), Some(Some("abc123")));
        assert_eq!(present.get("books_legacy_check"), Some(None));
        assert_eq!(present.get("missing"), None);
    }

    #[test]
    fn fingerprint_comments_round_trip() {
        let comment = fingerprint_comment("0123abcd");
        assert_eq!(comment, "rein:0123abcd");
        assert_eq!(parse_fingerprint_comment(&comment).as_deref(), Some("0123abcd"));
        assert_eq!(parse_fingerprint_comment("hand written note"), None);
        assert_eq!(parse_fingerprint_comment("rein:"), None);
    }
}
