//! Fixture reading and per-document preparation
//!
//! raw bytes → JSON → shape resolution → normalization → `_id` handling

use docseed_common::config::EntitySpec;
use docseed_common::extended_json::normalize_json;
use docseed_common::shape::{resolve_shape, Shape};
use docseed_common::value::ID_FIELD;
use docseed_common::{Document, Error, Result, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What happens to a source document's `_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Remove it so the store assigns a fresh identifier
    #[default]
    Strip,
    /// Keep it as the stored primary key
    Preserve,
}

/// One entity's fixture, parsed and ready to insert
#[derive(Debug, Clone)]
pub struct PreparedFixture {
    pub entity: EntitySpec,
    pub path: PathBuf,
    pub documents: Vec<Value>,
}

/// Read and parse a fixture file
///
/// A leading UTF-8 byte order mark is ignored.
pub async fn read_fixture(path: &Path) -> Result<serde_json::Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::FixtureIo {
            path: path.to_path_buf(),
            source,
        })?;

    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    serde_json::from_str(text).map_err(|source| Error::MalformedFixture {
        path: path.to_path_buf(),
        source,
    })
}

/// Normalize one raw document and apply the id policy
///
/// `null` entries become empty documents.
pub fn prepare_document(raw: serde_json::Value, id_policy: IdPolicy) -> Value {
    let value = match raw {
        serde_json::Value::Null => Value::Document(Document::new()),
        other => normalize_json(other),
    };

    match (value, id_policy) {
        (Value::Document(mut doc), IdPolicy::Strip) => {
            doc.remove(ID_FIELD);
            Value::Document(doc)
        }
        (value, _) => value,
    }
}

/// Read one entity's fixture and prepare its documents
pub async fn load_fixture(
    entity: &EntitySpec,
    data_dir: &Path,
    id_policy: IdPolicy,
) -> Result<PreparedFixture> {
    let path = entity.fixture_path(data_dir);
    debug!("Reading fixture for {}: {}", entity.name, path.display());

    let json = read_fixture(&path).await?;
    let shape = resolve_shape(json, &entity.keys);
    match &shape {
        Shape::Sequence(items) => debug!("{}: array of {} documents", entity.name, items.len()),
        Shape::SingleDocument(_) => debug!("{}: single document", entity.name),
        Shape::Empty => warn!(
            "{}: no documents found in {} (expected an array or an object)",
            entity.name,
            path.display()
        ),
    }

    let documents: Vec<Value> = shape
        .into_vec()
        .into_iter()
        .map(|raw| prepare_document(raw, id_policy))
        .collect();

    Ok(PreparedFixture {
        entity: entity.clone(),
        path,
        documents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseed_common::ObjectId;
    use serde_json::json;

    #[test]
    fn test_strip_removes_id() {
        let v = prepare_document(
            json!({ "_id": { "$oid": "507f1f77bcf86cd799439011" }, "name": "a" }),
            IdPolicy::Strip,
        );
        let doc = v.as_document().unwrap();
        assert!(!doc.contains_key("_id"));
        assert_eq!(doc.get("name"), Some(&Value::from("a")));
    }

    #[test]
    fn test_strip_without_id_is_noop() {
        let v = prepare_document(json!({ "name": "a" }), IdPolicy::Strip);
        assert_eq!(v.as_document().unwrap().len(), 1);
    }

    #[test]
    fn test_preserve_keeps_normalized_id() {
        let v = prepare_document(
            json!({ "_id": { "$oid": "507f1f77bcf86cd799439011" } }),
            IdPolicy::Preserve,
        );
        assert_eq!(
            v.as_document().unwrap().get("_id"),
            Some(&Value::ObjectId(ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap()))
        );
    }

    #[test]
    fn test_null_becomes_empty_document() {
        let v = prepare_document(json!(null), IdPolicy::Strip);
        assert_eq!(v, Value::Document(Document::new()));
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(prepare_document(json!(7), IdPolicy::Strip), Value::Int(7));
    }

    #[tokio::test]
    async fn test_read_fixture_errors_carry_path() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        match read_fixture(&missing).await {
            Err(Error::FixtureIo { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected FixtureIo, got {:?}", other),
        }

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "[{\"name\": ").unwrap();
        match read_fixture(&broken).await {
            Err(err @ Error::MalformedFixture { .. }) => {
                assert!(err.to_string().contains("broken.json"), "message: {}", err)
            }
            other => panic!("expected MalformedFixture, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_fixture_ignores_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.json");
        std::fs::write(&path, "\u{feff}[1, 2]").unwrap();

        assert_eq!(read_fixture(&path).await.unwrap(), json!([1, 2]));
    }

    #[tokio::test]
    async fn test_load_fixture_wrapped_shape() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("hotels.json"),
            r#"{ "properties": [
                { "_id": { "$oid": "507f1f77bcf86cd799439011" }, "stars": { "$numberInt": "4" } },
                null
            ] }"#,
        )
        .unwrap();

        let entity = EntitySpec::new("hotels", "hotels.json", &["hotels", "hotel", "properties"]);
        let fixture = load_fixture(&entity, dir.path(), IdPolicy::Strip).await.unwrap();

        assert_eq!(fixture.documents.len(), 2);
        let first = fixture.documents[0].as_document().unwrap();
        assert!(!first.contains_key("_id"));
        assert_eq!(first.get("stars"), Some(&Value::Int(4)));
        assert_eq!(fixture.documents[1], Value::Document(Document::new()));
    }

    #[tokio::test]
    async fn test_load_fixture_scalar_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.json"), "42").unwrap();

        let entity = EntitySpec::new("users", "users.json", &["users"]);
        let fixture = load_fixture(&entity, dir.path(), IdPolicy::Strip).await.unwrap();
        assert!(fixture.documents.is_empty());
    }
}
