use serde_json::Value;
use std::fmt::Display;

/// A parsed path into a nested document: an ordered, non-empty sequence of
/// segment names. The wire/descriptive form is segments joined by `.`
/// (`"message.event"`); that join is purely a presentation concern, not part
/// of the path's identity, so `Path` stores the already-split segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(Vec<String>);

impl Path {
    /// Parses a dot-joined path description, e.g. `"message.Bodies.Name"`.
    pub fn from_dotted(s: &str) -> Path {
        Path(s.split('.').map(str::to_string).collect())
    }

    /// Evaluates `pred` against every value this path can existentially
    /// resolve to, short-circuiting on the first that satisfies it. Per
    /// §4.1's central algorithm, an array doesn't consume a path segment:
    /// the same remaining segments are retried against each element, so
    /// "found" means *some* branch both resolves and satisfies `pred`.
    pub fn test(&self, doc: &Value, pred: &mut dyn FnMut(&Value) -> bool) -> bool {
        test_segments(&self.0, doc, pred)
    }
}

fn test_segments(segments: &[String], doc: &Value, pred: &mut dyn FnMut(&Value) -> bool) -> bool {
    match segments.split_first() {
        None => pred(doc),
        Some((head, rest)) => match doc {
            Value::Object(map) => map
                .get(head)
                .is_some_and(|child| test_segments(rest, child, pred)),
            Value::Array(items) => items.iter().any(|item| test_segments(segments, item, pred)),
            _ => false,
        },
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::from_dotted(s)
    }
}
