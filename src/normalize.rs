use zhconv::{Variant, zhconv};

/// Converts text to the script used in the rendered output.
pub trait ScriptNormalizer {
    fn normalize(&self, text: &str) -> String;
}

/// Traditional → simplified conversion backed by the zhconv rule tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplifier;

impl ScriptNormalizer for Simplifier {
    fn normalize(&self, text: &str) -> String {
        zhconv(text, Variant::ZhHans)
    }
}

/// Deterministic per-character table used in tests.
#[cfg(test)]
pub struct TableNormalizer(pub std::collections::HashMap<char, char>);

#[cfg(test)]
impl TableNormalizer {
    pub fn with_pairs(pairs: &[(char, char)]) -> Self {
        Self(pairs.iter().copied().collect())
    }
}

#[cfg(test)]
impl ScriptNormalizer for TableNormalizer {
    fn normalize(&self, text: &str) -> String {
        text.chars()
            .map(|c| self.0.get(&c).copied().unwrap_or(c))
            .collect()
    }
}
