use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::Result;
use crate::error::ApiError;

use super::property::{PropValue, Property};
use super::schema::{EntityKind, EntitySchema, RelationSpec};
use super::session::Session;

/// One cached relation slot. `Resolved` with an empty collection means the
/// server answered and there was nothing; only `Unresolved` triggers a
/// follow-up fetch.
#[derive(Debug)]
pub enum Relation<'a> {
    Unresolved,
    Resolved(Vec<Entity<'a>>),
}

/// A typed local copy of one remote record.
///
/// Two independent fetches of the same remote record produce two
/// independent local instances; there is no identity map, and relation
/// caches resolve to freshly built children.
#[derive(Debug)]
pub struct Entity<'a> {
    session: &'a Session,
    kind: EntityKind,
    id: Option<String>,
    props: BTreeMap<&'static str, Property>,
    relations: BTreeMap<&'static str, Relation<'a>>,
}

impl<'a> Entity<'a> {
    /// Build an entity from a raw field mapping as delivered by the
    /// server. Fields the schema does not recognize are dropped; the
    /// server may well be newer than this client. Embedded relation
    /// payloads carrying full records are parsed right away.
    pub(crate) fn from_record(
        session: &'a Session,
        kind: EntityKind,
        record: &Map<String, Value>,
    ) -> Result<Self> {
        let schema = kind.schema();

        let mut props = BTreeMap::new();
        for (name, raw) in record {
            if let Some(spec) = schema.field(name) {
                props.insert(spec.name, Property::from_raw(spec, raw)?);
            }
        }
        let id = props.get(schema.id_field).and_then(Property::as_text);

        let mut relations = BTreeMap::new();
        for relation in schema.relations {
            relations.insert(
                relation.name,
                parse_embedded(session, relation, record.get(relation.name))?,
            );
        }

        Ok(Self {
            session,
            kind,
            id,
            props,
            relations,
        })
    }

    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    pub const fn schema(&self) -> &'static EntitySchema {
        self.kind.schema()
    }

    /// The identifier as its wire string, or `None` when the record did
    /// not carry the schema's identifier field. Without an identifier the
    /// entity stays readable, but id-scoped lookups are impossible.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn prop(&self, name: &str) -> Option<&Property> {
        self.props.get(name)
    }

    pub fn prop_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.props.get_mut(name)
    }

    pub fn props(&self) -> impl Iterator<Item = &Property> {
        self.props.values()
    }

    /// Non-fetching view of a relation slot; `None` for names the schema
    /// does not declare.
    pub fn relation(&self, name: &str) -> Option<&Relation<'a>> {
        self.relations.get(name)
    }

    pub(crate) fn session(&self) -> &'a Session {
        self.session
    }

    /// Related entities under `name`, fetching on first access.
    ///
    /// Returns `Ok(None)` for a relation name this kind does not declare,
    /// so callers check instead of assuming. The first access of an
    /// unresolved slot issues one `target.get` scoped by this entity's
    /// id; every later access is a cache hit.
    ///
    /// # Errors
    ///
    /// Fetch failures, and `InvalidValue` when the entity has no
    /// identifier to scope the fetch by.
    pub fn related(&mut self, name: &str) -> Result<Option<&[Entity<'a>]>> {
        let schema = self.kind.schema();
        let Some(relation) = schema.relation(name) else {
            return Ok(None);
        };

        if matches!(self.relations.get(relation.name), Some(Relation::Unresolved)) {
            let id = self.id.as_deref().ok_or(ApiError::InvalidValue {
                field: schema.id_field,
                message: "entity has no identifier to resolve relations by".to_string(),
            })?;
            let params = json!({ (schema.id_param()): id });
            let children = self.session.fetch(relation.target, params)?;
            self.relations
                .insert(relation.name, Relation::Resolved(children));
        }

        match self.relations.get(relation.name) {
            Some(Relation::Resolved(children)) => Ok(Some(children.as_slice())),
            _ => Ok(None),
        }
    }

    /// Push every dirty property to the server in one `update` call.
    ///
    /// Nothing is sent when no property is dirty. On success the dirty
    /// flags of the sent properties are cleared; on failure they all stay
    /// set.
    ///
    /// # Errors
    ///
    /// Call failures, and `InvalidValue` when the entity has no
    /// identifier.
    pub fn save(&mut self) -> Result<()> {
        let schema = self.kind.schema();
        let id = self.id.as_deref().ok_or(ApiError::InvalidValue {
            field: schema.id_field,
            message: "entity has no identifier to update by".to_string(),
        })?;

        let mut params = Map::new();
        let mut sent = Vec::new();
        for (name, prop) in &self.props {
            if prop.dirty() {
                if let Some(value) = prop.value() {
                    params.insert((*name).to_string(), value.to_param_json());
                    sent.push(*name);
                }
            }
        }
        if sent.is_empty() {
            return Ok(());
        }
        params.insert(schema.id_field.to_string(), Value::String(id.to_string()));

        self.session
            .call(&format!("{}.update", schema.api_name), Value::Object(params))?;

        for name in sent {
            if let Some(prop) = self.props.get_mut(name) {
                prop.clear_dirty();
            }
        }
        Ok(())
    }

    /// All properties plus any resolved relations, as display JSON.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (name, prop) in &self.props {
            out.insert(
                (*name).to_string(),
                prop.value().map_or(Value::Null, PropValue::to_display_json),
            );
        }
        for (name, relation) in &self.relations {
            if let Relation::Resolved(children) = relation {
                out.insert(
                    (*name).to_string(),
                    Value::Array(children.iter().map(Self::to_json).collect()),
                );
            }
        }
        Value::Object(out)
    }
}

/// Parse an embedded relation payload. Only an array whose every element
/// is a record carrying the target kind's distinguishing field counts as
/// inlined data; bare id lists and counts leave the slot unresolved.
fn parse_embedded<'a>(
    session: &'a Session,
    relation: &'static RelationSpec,
    raw: Option<&Value>,
) -> Result<Relation<'a>> {
    let Some(Value::Array(rows)) = raw else {
        return Ok(Relation::Unresolved);
    };
    let text_field = relation.target.schema().text_field;
    let inlined = rows
        .iter()
        .all(|row| matches!(row, Value::Object(record) if record.contains_key(text_field)));
    if !inlined {
        return Ok(Relation::Unresolved);
    }

    let mut children = Vec::with_capacity(rows.len());
    for row in rows {
        if let Value::Object(record) = row {
            children.push(Entity::from_record(session, relation.target, record)?);
        }
    }
    Ok(Relation::Resolved(children))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::{Map, Value, json};
    use url::Url;

    use crate::api::schema::EntityKind;
    use crate::api::session::Session;

    use super::{Entity, Relation};

    // Nothing here goes on the wire; the port only needs to parse.
    fn offline_session() -> Session {
        Session::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            Duration::from_millis(250),
            Duration::from_millis(250),
            true,
        )
        .unwrap()
    }

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("test record must be an object, got {other}"),
        }
    }

    #[test]
    fn unrecognized_fields_are_dropped() {
        let session = offline_session();
        let raw = record(json!({
            "groupid": "45",
            "name": "MyGroup",
            "uuid_v9": "whatever the server grew this week",
        }));
        let group = Entity::from_record(&session, EntityKind::Group, &raw).unwrap();
        assert_eq!(group.id(), Some("45"));
        assert!(group.prop("uuid_v9").is_none());
        assert_eq!(group.prop("name").unwrap().as_text().as_deref(), Some("MyGroup"));
    }

    #[test]
    fn missing_identifier_leaves_id_absent() {
        let session = offline_session();
        let raw = record(json!({ "name": "orphan" }));
        let group = Entity::from_record(&session, EntityKind::Group, &raw).unwrap();
        assert_eq!(group.id(), None);
    }

    #[test]
    fn embedded_full_records_resolve_at_construction() {
        let session = offline_session();
        let raw = record(json!({
            "groupid": "45",
            "name": "MyGroup",
            "hosts": [
                { "hostid": "1", "name": "web-01" },
                { "hostid": "2", "name": "web-02" },
            ],
        }));
        let mut group = Entity::from_record(&session, EntityKind::Group, &raw).unwrap();
        // The session cannot reach anything, so this passing proves the
        // data came from the embedded payload.
        let hosts = group.related("hosts").unwrap().unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[1].id(), Some("2"));
    }

    #[test]
    fn bare_id_payloads_stay_unresolved() {
        let session = offline_session();
        let raw = record(json!({
            "groupid": "45",
            "name": "MyGroup",
            "hosts": [ { "hostid": "1" } ],
        }));
        let group = Entity::from_record(&session, EntityKind::Group, &raw).unwrap();
        assert!(matches!(group.relation("hosts"), Some(Relation::Unresolved)));
    }

    #[test]
    fn embedded_empty_collections_resolve_empty() {
        let session = offline_session();
        let raw = record(json!({
            "groupid": "45",
            "name": "MyGroup",
            "hosts": [],
        }));
        let mut group = Entity::from_record(&session, EntityKind::Group, &raw).unwrap();
        assert_eq!(group.related("hosts").unwrap().unwrap().len(), 0);
    }

    #[test]
    fn undeclared_relation_names_yield_none() {
        let session = offline_session();
        let raw = record(json!({ "groupid": "45", "name": "MyGroup" }));
        let mut group = Entity::from_record(&session, EntityKind::Group, &raw).unwrap();
        assert!(group.related("items").unwrap().is_none());
        assert!(group.relation("items").is_none());
    }

    #[test]
    fn to_json_renders_timestamps_readably() {
        let session = offline_session();
        let raw = record(json!({
            "hostid": "7",
            "name": "web-01",
            "errors_from": "1388867607",
        }));
        let host = Entity::from_record(&session, EntityKind::Host, &raw).unwrap();
        let rendered = host.to_json();
        assert_eq!(rendered["errors_from"], json!("2014-01-04T20:33:27+00:00"));
        assert_eq!(rendered["name"], json!("web-01"));
    }
}
