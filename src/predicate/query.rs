//! Translation of a [`Predicate`] tree to an equivalent `bson::Document`
//! query fragment, for the retention store's query path. See SPEC_FULL.md
//! §4.1's translation table; this must agree with [`Predicate::matches`]
//! for any document the store actually persists (§8).

use super::Predicate;
use bson::{doc, Bson, Document};

/// Translates a predicate into a MongoDB query document.
pub fn to_query(predicate: &Predicate) -> Document {
    match predicate {
        Predicate::Exists { path } => doc! { path.to_string(): { "$exists": true } },

        Predicate::Exact { path, value } => {
            let bson_value = bson::to_bson(value).unwrap_or(Bson::Null);
            doc! { path.to_string(): bson_value }
        }

        Predicate::Regex { path, pattern } => {
            doc! { path.to_string(): { "$regex": pattern.as_str() } }
        }

        Predicate::Range { path, min, max } => {
            doc! { path.to_string(): bounds_doc(*min, *max) }
        }

        Predicate::DateRange { path, min, max } => {
            let min = min.map(bson::DateTime::from_chrono);
            let max = max.map(bson::DateTime::from_chrono);
            doc! { path.to_string(): bounds_doc(min, max) }
        }

        Predicate::All(children) => combine("$and", children),
        Predicate::Any(children) => combine("$or", children),
        Predicate::Not(children) => combine("$nor", children),
    }
}

fn bounds_doc<T: Into<Bson>>(min: Option<T>, max: Option<T>) -> Document {
    let mut inner = Document::new();
    if let Some(min) = min {
        inner.insert("$gte", min);
    }
    if let Some(max) = max {
        inner.insert("$lte", max);
    }
    inner
}

fn combine(op: &str, children: &[Predicate]) -> Document {
    if children.is_empty() {
        return Document::new();
    }
    let fragments: Vec<Document> = children.iter().map(to_query).collect();
    doc! { op: fragments }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::predicate::Predicate;
    use serde_json::json;

    fn build(desc: serde_json::Value) -> Predicate {
        Predicate::from_description(&desc).unwrap()
    }

    #[test]
    fn test_exists_translation() {
        let p = build(json!({"type": "exists", "path": "a.b"}));
        assert_eq!(to_query(&p), doc! {"a.b": {"$exists": true}});
    }

    #[test]
    fn test_exact_translation() {
        let p = build(json!({"type": "exact", "path": "a.b", "value": 3}));
        assert_eq!(to_query(&p), doc! {"a.b": 3});
    }

    #[test]
    fn test_regex_translation() {
        let p = build(json!({"type": "regex", "path": "a", "pattern": "^x"}));
        assert_eq!(to_query(&p), doc! {"a": {"$regex": "^x"}});
    }

    #[test]
    fn test_range_translation_partial_bounds() {
        let p = build(json!({"type": "range", "path": "a", "min_value": 1.0}));
        assert_eq!(to_query(&p), doc! {"a": {"$gte": 1.0}});
    }

    #[test]
    fn test_all_empty_is_empty_document() {
        let p = Predicate::All(vec![]);
        assert_eq!(to_query(&p), Document::new());
    }

    #[test]
    fn test_any_and_not_combinators() {
        let child = build(json!({"type": "exists", "path": "a"}));
        let any = Predicate::Any(vec![child.clone()]);
        let not = Predicate::Not(vec![child]);
        assert_eq!(
            to_query(&any),
            doc! {"$or": [{"a": {"$exists": true}}]}
        );
        assert_eq!(
            to_query(&not),
            doc! {"$nor": [{"a": {"$exists": true}}]}
        );
    }
}
