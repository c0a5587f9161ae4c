use poem_types::{Dynasty, Poem, PoemId, SourcePoem};
use serde_json::Value;

use crate::error::RecordError;
use crate::normalize::ScriptNormalizer;
use crate::render::render_markdown;
use crate::strains::StrainIndex;

/// A poem that was reported and left out of the output.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedPoem {
    /// Position of the record in its source file
    pub position: usize,
    /// None when the record has no usable id
    pub id: Option<PoemId>,
    pub reason: RecordError,
}

/// Rendered output for one source file.
#[derive(Debug, Default)]
pub struct Transformed {
    /// Markdown fragments in source order
    pub fragments: Vec<String>,
    pub dropped: Vec<DroppedPoem>,
}

impl Transformed {
    pub fn converted(&self) -> usize {
        self.fragments.len()
    }

    fn drop_poem(&mut self, file: &str, position: usize, id: Option<PoemId>, reason: RecordError) {
        let shown = id.as_ref().map(ToString::to_string).unwrap_or_default();
        match &reason {
            RecordError::MissingField(field) => {
                tracing::warn!(file, position, id = %shown, field = *field, "poem missing field");
            }
            RecordError::Malformed { .. } => {
                tracing::warn!(file, position, id = %shown, error = %reason, "poem dropped");
            }
        }
        self.dropped.push(DroppedPoem { position, id, reason });
    }
}

/// Pull the id out of a raw record without requiring the rest to be valid.
fn record_id(record: &Value) -> Result<PoemId, RecordError> {
    let Value::Object(map) = record else {
        return Err(RecordError::Malformed {
            message: format!("expected an object, found {record}"),
        });
    };
    match map.get("id") {
        None | Some(Value::Null) => Err(RecordError::MissingField("id")),
        Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| RecordError::Malformed {
            message: format!("unusable id {raw}: {e}"),
        }),
    }
}

/// Normalize text fields and attach dynasty and strains.
///
/// Field presence is checked here, in title, author, paragraphs order.
pub fn enrich(
    source: SourcePoem,
    id: PoemId,
    index: &StrainIndex,
    dynasty: Dynasty,
    normalizer: &dyn ScriptNormalizer,
) -> Result<Poem, RecordError> {
    let strains = index
        .get(&id)
        .cloned()
        .ok_or(RecordError::MissingField("strains"))?;
    let title = source.title.ok_or(RecordError::MissingField("title"))?;
    let author = source.author.ok_or(RecordError::MissingField("author"))?;
    let paragraphs = source
        .paragraphs
        .ok_or(RecordError::MissingField("paragraphs"))?;

    Ok(Poem {
        id,
        title: normalizer.normalize(&title),
        author: normalizer.normalize(&author),
        dynasty,
        paragraphs: paragraphs.iter().map(|p| normalizer.normalize(p)).collect(),
        strains,
    })
}

/// Turn one source file's records into Markdown fragments.
///
/// Records whose id has no strain entry are skipped without comment.
/// Records without a usable id, and matching records that cannot be
/// enriched, are dropped with a warning.
pub fn transform_file(
    records: Vec<Value>,
    file_name: &str,
    index: &StrainIndex,
    normalizer: &dyn ScriptNormalizer,
    include_counts: bool,
) -> Transformed {
    let dynasty = Dynasty::from_file_name(file_name);
    let mut out = Transformed::default();

    for (position, record) in records.into_iter().enumerate() {
        let id = match record_id(&record) {
            Ok(id) => id,
            Err(reason) => {
                out.drop_poem(file_name, position, None, reason);
                continue;
            }
        };
        if !index.contains(&id) {
            continue;
        }

        let source: SourcePoem = match serde_json::from_value(record) {
            Ok(p) => p,
            Err(e) => {
                let reason = RecordError::Malformed {
                    message: e.to_string(),
                };
                out.drop_poem(file_name, position, Some(id), reason);
                continue;
            }
        };

        match enrich(source, id.clone(), index, dynasty, normalizer) {
            Ok(poem) => out.fragments.push(render_markdown(&poem, include_counts)),
            Err(reason) => out.drop_poem(file_name, position, Some(id), reason),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::TableNormalizer;
    use poem_types::Strains;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn index_with(ids: &[&str]) -> StrainIndex {
        let mut index = StrainIndex::default();
        for id in ids {
            index.insert(
                PoemId::from(*id),
                Strains::from_value(json!([{"line": "床前明月光", "strains": "平平平仄平"}])),
            );
        }
        index
    }

    fn normalizer() -> TableNormalizer {
        TableNormalizer::with_pairs(&[('靜', '静'), ('牀', '床')])
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    /// Run `f` with a subscriber that records WARN and above into a buffer.
    fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, buffer.text())
    }

    #[test]
    fn test_unmatched_poems_skipped_silently() {
        let index = index_with(&["1"]);
        let records = vec![
            json!({"id": 1, "title": "靜夜思", "author": "李白", "paragraphs": ["牀前明月光"]}),
            json!({"id": 2, "title": "春曉", "author": "孟浩然", "paragraphs": ["春眠不覺曉"]}),
            json!({"id": 3, "author": "王維"}),
        ];

        let (out, logs) = capture_warnings(|| {
            transform_file(records, "Tang_300.json", &index, &normalizer(), false)
        });
        assert_eq!(out.converted(), 1);
        assert!(out.dropped.is_empty());
        assert!(logs.is_empty(), "unexpected warnings: {logs}");
        let md = &out.fragments[0];
        assert!(md.starts_with("# 静夜思\n**作者**\n李白\n**朝代**\n唐朝\n"));
        assert!(md.contains("床前明月光\n**声韵**\n床前明月光: 平平平仄平\n"));
    }

    #[test]
    fn test_record_without_usable_id_reported() {
        let index = index_with(&["1"]);
        let records = vec![
            json!({"title": "無題", "author": "佚名", "paragraphs": ["一"]}),
            json!({"id": {"k": 1}, "title": "無題", "author": "佚名", "paragraphs": []}),
            json!("not a poem"),
            json!({"id": 1, "title": "題", "author": "甲", "paragraphs": []}),
        ];

        let (out, logs) =
            capture_warnings(|| transform_file(records, "x.json", &index, &normalizer(), false));
        assert_eq!(out.converted(), 1);
        assert_eq!(out.dropped.len(), 3);
        assert_eq!(
            out.dropped[0],
            DroppedPoem {
                position: 0,
                id: None,
                reason: RecordError::MissingField("id"),
            }
        );
        assert_eq!(out.dropped[1].position, 1);
        assert!(matches!(out.dropped[1].reason, RecordError::Malformed { .. }));
        assert_eq!(out.dropped[2].position, 2);
        assert!(matches!(out.dropped[2].reason, RecordError::Malformed { .. }));

        assert!(logs.contains("poem missing field"));
        assert!(logs.contains("id"));
        assert_eq!(logs.matches("poem dropped").count(), 2);
    }

    #[test]
    fn test_missing_field_dropped_batch_continues() {
        let index = index_with(&["a", "b", "c"]);
        let records = vec![
            json!({"id": "a", "author": "李白", "paragraphs": []}),
            json!({"id": "b", "title": "題", "author": "杜甫", "paragraphs": ["一"]}),
            json!({"id": "c", "title": "題", "author": "王維"}),
        ];

        let (out, logs) = capture_warnings(|| {
            transform_file(records, "Song_Ci.json", &index, &normalizer(), false)
        });
        assert_eq!(out.converted(), 1);
        assert!(out.fragments[0].contains("**朝代**\n宋朝\n"));
        assert_eq!(
            out.dropped,
            vec![
                DroppedPoem {
                    position: 0,
                    id: Some(PoemId::from("a")),
                    reason: RecordError::MissingField("title"),
                },
                DroppedPoem {
                    position: 2,
                    id: Some(PoemId::from("c")),
                    reason: RecordError::MissingField("paragraphs"),
                },
            ]
        );

        let warnings: Vec<&str> = logs.lines().filter(|l| l.contains("WARN")).collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("title"));
        assert!(warnings[1].contains("paragraphs"));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let index = index_with(&["a", "b"]);
        let records = vec![
            json!({"id": "a", "title": 7, "author": "李白", "paragraphs": []}),
            json!({"id": "b", "title": "題", "author": "杜甫", "paragraphs": ["一"]}),
        ];

        let out = transform_file(records, "x.json", &index, &normalizer(), false);
        assert_eq!(out.converted(), 1);
        assert_eq!(out.dropped.len(), 1);
        assert_eq!(out.dropped[0].id, Some(PoemId::from("a")));
        assert!(matches!(out.dropped[0].reason, RecordError::Malformed { .. }));
    }

    #[test]
    fn test_order_preserved() {
        let index = index_with(&["1", "2", "3"]);
        let records = ["3", "1", "2"]
            .iter()
            .map(|id| json!({"id": id, "title": format!("t{id}"), "author": "a", "paragraphs": []}))
            .collect();

        let out = transform_file(records, "Yuan_poems.json", &index, &normalizer(), false);
        let titles: Vec<&str> = out
            .fragments
            .iter()
            .map(|f| f.lines().next().unwrap())
            .collect();
        assert_eq!(titles, ["# t3", "# t1", "# t2"]);
        assert!(out.fragments[0].contains("**朝代**\n\n"));
    }
}
