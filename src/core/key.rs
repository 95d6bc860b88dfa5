//! Flattened dotted-path addresses for hierarchical states.

/// Separator between levels of a flattened key.
pub const KEY_SEPARATOR: char = '.';

/// A parsed `"Parent.Child"` address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatKey {
    /// First segment: the root state's key
    pub parent: String,
    /// Everything below the root, still dotted; `None` for a single segment
    pub child: Option<String>,
    /// All segments from root to leaf
    pub parts: Vec<String>,
}

impl FlatKey {
    /// Key of the deepest level.
    pub fn leaf(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or(&self.parent)
    }

    pub fn depth(&self) -> usize {
        self.parts.len()
    }
}

/// Join per-level keys into a dotted address.
pub fn join_key<I, S>(keys: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            joined.push(KEY_SEPARATOR);
        }
        joined.push_str(key.as_ref());
    }
    joined
}

/// Parse a dotted address back into its levels.
pub fn parse_key(key: &str) -> FlatKey {
    let parts: Vec<String> = key.split(KEY_SEPARATOR).map(str::to_string).collect();
    let child = key
        .split_once(KEY_SEPARATOR)
        .map(|(_, rest)| rest.to_string());
    FlatKey {
        parent: parts[0].clone(),
        child,
        parts,
    }
}
