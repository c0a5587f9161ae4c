use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ── Poem identifier ──────────────────────────────────────────────────────

/// Identifier shared by a poem record and its strain record.
///
/// The public corpus uses UUID strings, older dumps use integers. Both are
/// kept in their textual form so `1` and `"1"` name the same poem. Floats
/// with no fractional part (`1.0`) are read as the integer they equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PoemId(String);

impl fmt::Display for PoemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for PoemId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for PoemId {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Int(i64),
            Uint(u64),
            Float(f64),
        }

        Ok(match Repr::deserialize(de)? {
            Repr::Text(s) => Self(s),
            Repr::Int(n) => Self(n.to_string()),
            Repr::Uint(n) => Self(n.to_string()),
            Repr::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 9.0e15 => {
                Self((x as i64).to_string())
            }
            Repr::Float(x) => Self(x.to_string()),
        })
    }
}

// ── Tonal patterns ───────────────────────────────────────────────────────

/// One element of a per-line strains list.
#[derive(Debug, Clone, PartialEq)]
pub enum StrainLine {
    /// `{"line": …, "strains": …}` – either key may be absent
    Pair {
        line: Option<Value>,
        strains: Option<Value>,
    },
    /// Anything else, usually a bare pattern string like "平平仄仄平"
    Raw(Value),
}

/// Tonal-pattern data attached to a poem, kept as it came from the file.
#[derive(Debug, Clone, PartialEq)]
pub enum Strains {
    Lines(Vec<StrainLine>),
    /// Not a list: carried through but renders no lines
    Opaque(Value),
}

impl Strains {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Lines(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut map) => StrainLine::Pair {
                            line: map.remove("line"),
                            strains: map.remove("strains"),
                        },
                        other => StrainLine::Raw(other),
                    })
                    .collect(),
            ),
            other => Self::Opaque(other),
        }
    }
}

impl<'de> Deserialize<'de> for Strains {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        Value::deserialize(de).map(Self::from_value)
    }
}

/// Text form of a JSON value as it appears in rendered output:
/// strings verbatim, null as empty, everything else compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A record from a strains file.
#[derive(Debug, Clone, Deserialize)]
pub struct StrainRecord {
    pub id: PoemId,
    pub strains: Strains,
}

// ── Dynasty ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dynasty {
    /// 唐朝
    Tang,
    /// 宋朝
    Song,
    /// Not inferable from the file name
    Unknown,
}

impl Dynasty {
    /// Infer the dynasty from a source file name ("poet.tang.0.json",
    /// "Song_Ci.json"). Only Tang and Song are ever recognised.
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("tang") {
            Self::Tang
        } else if lower.contains("song") {
            Self::Song
        } else {
            Self::Unknown
        }
    }

    pub fn as_chinese(&self) -> &'static str {
        match self {
            Self::Tang => "唐朝",
            Self::Song => "宋朝",
            Self::Unknown => "",
        }
    }
}

// ── Poems ────────────────────────────────────────────────────────────────

/// The text fields of a poem as stored in a source file. Every field is
/// optional here: presence is checked when the poem is enriched, not when the
/// file is read. The id is read separately, before the strain lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcePoem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub paragraphs: Option<Vec<String>>,
}

/// A poem with normalized text, dynasty and strains attached, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Poem {
    pub id: PoemId,
    pub title: String,
    pub author: String,
    pub dynasty: Dynasty,
    pub paragraphs: Vec<String>,
    pub strains: Strains,
}
