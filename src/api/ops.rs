use std::ops::{Deref, DerefMut};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value, json};

use crate::Result;
use crate::error::ApiError;

use super::entity::Entity;
use super::property::Property;
use super::schema::EntityKind;
use super::session::Session;

macro_rules! entity_wrapper {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name<'a>(Entity<'a>);

        impl<'a> $name<'a> {
            pub(crate) const fn from_entity(entity: Entity<'a>) -> Self {
                Self(entity)
            }

            pub fn into_entity(self) -> Entity<'a> {
                self.0
            }
        }

        impl<'a> Deref for $name<'a> {
            type Target = Entity<'a>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl<'a> DerefMut for $name<'a> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}

entity_wrapper!(
    /// A monitored host.
    Host
);
entity_wrapper!(
    /// A host group.
    Group
);
entity_wrapper!(
    /// A configuration template.
    Template
);
entity_wrapper!(
    /// A collected metric.
    Item
);
entity_wrapper!(
    /// A problem-detection rule.
    Trigger
);
entity_wrapper!(
    /// A maintenance window.
    Maintenance
);
entity_wrapper!(
    /// An application grouping of items.
    Application
);

fn require_id<'e>(entity: &'e Entity<'_>) -> Result<&'e str> {
    entity.id().ok_or_else(|| {
        ApiError::InvalidValue {
            field: entity.schema().id_field,
            message: "entity has no identifier".to_string(),
        }
        .into()
    })
}

impl<'a> Host<'a> {
    /// Problems currently open against this host.
    ///
    /// # Errors
    ///
    /// Fetch failures, or a host with no identifier.
    pub fn problems(&self) -> Result<Vec<Problem<'a>>> {
        let id = require_id(&self.0)?;
        let session = self.0.session();
        session
            .fetch_records(EntityKind::Problem, json!({ "hostids": id }))?
            .iter()
            .map(|record| Problem::from_record(session, record))
            .collect()
    }
}

impl<'a> Group<'a> {
    /// Create a group and return the new identifier.
    ///
    /// # Errors
    ///
    /// Call failures, or a create result carrying no id.
    pub fn create(session: &Session, name: &str) -> Result<String> {
        let result = session.call("hostgroup.create", json!({ "name": name }))?;
        result
            .get("groupids")
            .and_then(|ids| ids.get(0))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::InvalidReply {
                    message: "hostgroup.create result carries no group id".to_string(),
                }
                .into()
            })
    }

    /// Mass-add hosts to this group by identifier list.
    ///
    /// The remote result is returned verbatim; local relation caches are
    /// NOT updated. A host the result's id list omits was not added,
    /// whatever the call's status. Re-fetch to observe membership.
    ///
    /// # Errors
    ///
    /// Call failures, or a group/host with no identifier.
    pub fn add_hosts(&self, hosts: &[Host<'_>]) -> Result<Value> {
        let group_id = require_id(&self.0)?;
        let host_refs = host_id_objects(hosts)?;
        let params = json!({
            "groups": [{ "groupid": group_id }],
            "hosts": host_refs,
        });
        self.0.session().call("hostgroup.massadd", params)
    }

    /// Mass-remove hosts from this group. Same cache caveats as
    /// [`Group::add_hosts`].
    ///
    /// # Errors
    ///
    /// Call failures, or a group/host with no identifier.
    pub fn remove_hosts(&self, hosts: &[Host<'_>]) -> Result<Value> {
        let group_id = require_id(&self.0)?;
        let mut host_ids = Vec::with_capacity(hosts.len());
        for host in hosts {
            host_ids.push(require_id(host)?.to_string());
        }
        let params = json!({
            "groupids": [group_id],
            "hostids": host_ids,
        });
        self.0.session().call("hostgroup.massremove", params)
    }
}

fn host_id_objects(hosts: &[Host<'_>]) -> Result<Vec<Value>> {
    let mut refs = Vec::with_capacity(hosts.len());
    for host in hosts {
        refs.push(json!({ "hostid": require_id(host)? }));
    }
    Ok(refs)
}

/// Bounds for one history retrieval. Newest points come first; the limit
/// defaults to 10.
#[derive(Clone, Copy, Debug)]
pub struct HistoryQuery {
    pub from: Option<DateTime<Utc>>,
    pub till: Option<DateTime<Utc>>,
    pub limit: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            from: None,
            till: None,
            limit: 10,
        }
    }
}

/// One stored sample, typed by the owning item's value type.
#[derive(Clone, Debug, PartialEq)]
pub enum HistoryValue {
    Float(f64),
    Int(i64),
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryPoint {
    pub clock: DateTime<Utc>,
    pub value: HistoryValue,
}

impl Item<'_> {
    pub const VALUE_TYPE_FLOAT: i64 = 0;
    pub const VALUE_TYPE_CHAR: i64 = 1;
    pub const VALUE_TYPE_LOG: i64 = 2;
    pub const VALUE_TYPE_UINT: i64 = 3;
    pub const VALUE_TYPE_TEXT: i64 = 4;

    /// Latest stored samples for this item, newest first.
    ///
    /// The history store is selected by the item's declared `value_type`,
    /// and values come back typed accordingly: float as real numbers,
    /// unsigned as whole numbers, everything else as text.
    ///
    /// # Errors
    ///
    /// Call failures, an item with no identifier or value type, or
    /// history rows that do not parse under the declared type.
    pub fn history(&self, query: &HistoryQuery) -> Result<Vec<HistoryPoint>> {
        let id = require_id(&self.0)?;
        let value_type = self
            .0
            .prop("value_type")
            .and_then(Property::as_int)
            .ok_or(ApiError::InvalidValue {
                field: "value_type",
                message: "item carries no value type".to_string(),
            })?;

        let mut params = json!({
            "output": "extend",
            "history": value_type,
            "itemids": id,
            "limit": query.limit,
            "sortfield": "clock",
            "sortorder": "DESC",
        });
        if let Some(from) = query.from {
            params["time_from"] = json!(from.timestamp());
        }
        if let Some(till) = query.till {
            params["time_till"] = json!(till.timestamp());
        }

        let result = self.0.session().call("history.get", params)?;
        let Value::Array(rows) = result else {
            return Err(ApiError::InvalidReply {
                message: "history.get result is not a list".to_string(),
            }
            .into());
        };

        let mut points = Vec::with_capacity(rows.len());
        for row in &rows {
            let clock = epoch_field(row, "clock")?;
            let raw = row.get("value").ok_or_else(|| ApiError::InvalidReply {
                message: "history row carries no value".to_string(),
            })?;
            points.push(HistoryPoint {
                clock,
                value: typed_history_value(value_type, raw)?,
            });
        }
        Ok(points)
    }
}

fn typed_history_value(value_type: i64, raw: &Value) -> Result<HistoryValue> {
    let text = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ApiError::InvalidReply {
                message: format!("history value is not scalar: {other}"),
            }
            .into());
        }
    };
    let value = if value_type == Item::VALUE_TYPE_FLOAT {
        HistoryValue::Float(text.parse::<f64>().map_err(|err| ApiError::InvalidReply {
            message: format!("history value {text:?}: {err}"),
        })?)
    } else if value_type == Item::VALUE_TYPE_UINT {
        HistoryValue::Int(text.parse::<i64>().map_err(|err| ApiError::InvalidReply {
            message: format!("history value {text:?}: {err}"),
        })?)
    } else {
        HistoryValue::Text(text)
    };
    Ok(value)
}

fn epoch_field(row: &Value, field: &'static str) -> Result<DateTime<Utc>> {
    let secs = match row.get(field) {
        Some(Value::String(s)) => s.parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
    .ok_or(ApiError::InvalidReply {
        message: format!("history row carries no usable {field}"),
    })?;
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| {
            ApiError::InvalidReply {
                message: format!("{secs} is not a valid epoch timestamp"),
            }
            .into()
        })
}

enum TriggerSlot<'a> {
    Unresolved,
    Resolved(Option<Box<Trigger<'a>>>),
}

enum EventSlot<'a> {
    Unresolved,
    Resolved(Option<Box<Event<'a>>>),
}

/// Something that happened: a trigger firing or recovering, a discovery,
/// an internal state change.
pub struct Event<'a> {
    entity: Entity<'a>,
    trigger: TriggerSlot<'a>,
}

impl<'a> Event<'a> {
    pub(crate) fn from_record(session: &'a Session, record: &Map<String, Value>) -> Result<Self> {
        let entity = Entity::from_record(session, EntityKind::Event, record)?;
        let mut trigger = TriggerSlot::Unresolved;
        if related_object_is_trigger(&entity) {
            if let Some(Value::Object(related)) = record.get("relatedObject") {
                if related.contains_key(EntityKind::Trigger.schema().text_field) {
                    let inner = Entity::from_record(session, EntityKind::Trigger, related)?;
                    trigger = TriggerSlot::Resolved(Some(Box::new(Trigger::from_entity(inner))));
                }
            }
        }
        Ok(Self { entity, trigger })
    }

    pub fn into_entity(self) -> Entity<'a> {
        self.entity
    }

    /// The trigger behind this event. Yields `None` without a remote
    /// call when the related object is not a trigger.
    ///
    /// # Errors
    ///
    /// Fetch failures while resolving a trigger-backed event lazily.
    pub fn trigger(&mut self) -> Result<Option<&Trigger<'a>>> {
        if !related_object_is_trigger(&self.entity) {
            return Ok(None);
        }
        if matches!(self.trigger, TriggerSlot::Unresolved) {
            self.trigger = TriggerSlot::Resolved(fetch_related_trigger(&self.entity)?);
        }
        match &self.trigger {
            TriggerSlot::Resolved(trigger) => Ok(trigger.as_deref()),
            TriggerSlot::Unresolved => Ok(None),
        }
    }
}

impl<'a> Deref for Event<'a> {
    type Target = Entity<'a>;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

impl<'a> DerefMut for Event<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entity
    }
}

/// An unresolved problem, keyed by the event that opened it.
pub struct Problem<'a> {
    entity: Entity<'a>,
    event: EventSlot<'a>,
    trigger: TriggerSlot<'a>,
}

impl<'a> Problem<'a> {
    pub(crate) fn from_record(session: &'a Session, record: &Map<String, Value>) -> Result<Self> {
        let entity = Entity::from_record(session, EntityKind::Problem, record)?;
        Ok(Self {
            entity,
            event: EventSlot::Unresolved,
            trigger: TriggerSlot::Unresolved,
        })
    }

    pub fn into_entity(self) -> Entity<'a> {
        self.entity
    }

    /// The event that opened this problem, fetched lazily and cached.
    ///
    /// # Errors
    ///
    /// Fetch failures, or a problem with no identifier.
    pub fn event(&mut self) -> Result<Option<&Event<'a>>> {
        if matches!(self.event, EventSlot::Unresolved) {
            let id = require_id(&self.entity)?.to_string();
            let session = self.entity.session();
            let fetched = match session.fetch_one_record(EntityKind::Event, &id)? {
                Some(record) => Some(Box::new(Event::from_record(session, &record)?)),
                None => None,
            };
            self.event = EventSlot::Resolved(fetched);
        }
        match &self.event {
            EventSlot::Resolved(event) => Ok(event.as_deref()),
            EventSlot::Unresolved => Ok(None),
        }
    }

    /// The trigger behind this problem. Yields `None` without a remote
    /// call when the related object is not a trigger.
    ///
    /// # Errors
    ///
    /// Fetch failures while resolving lazily.
    pub fn trigger(&mut self) -> Result<Option<&Trigger<'a>>> {
        if !related_object_is_trigger(&self.entity) {
            return Ok(None);
        }
        if matches!(self.trigger, TriggerSlot::Unresolved) {
            self.trigger = TriggerSlot::Resolved(fetch_related_trigger(&self.entity)?);
        }
        match &self.trigger {
            TriggerSlot::Resolved(trigger) => Ok(trigger.as_deref()),
            TriggerSlot::Unresolved => Ok(None),
        }
    }
}

impl<'a> Deref for Problem<'a> {
    type Target = Entity<'a>;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

impl<'a> DerefMut for Problem<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entity
    }
}

fn related_object_is_trigger(entity: &Entity<'_>) -> bool {
    entity.prop("object").and_then(Property::as_int) == Some(0)
}

fn fetch_related_trigger<'a>(entity: &Entity<'a>) -> Result<Option<Box<Trigger<'a>>>> {
    let Some(object_id) = entity.prop("objectid").and_then(Property::as_text) else {
        return Ok(None);
    };
    Ok(entity
        .session()
        .fetch_one(EntityKind::Trigger, &object_id)?
        .map(|inner| Box::new(Trigger::from_entity(inner))))
}

impl Session {
    /// `Host` by id or name.
    ///
    /// # Errors
    ///
    /// Fetch failures; `AmbiguousFilter` when several hosts match.
    pub fn host(&self, key: &str) -> Result<Option<Host<'_>>> {
        Ok(self.fetch_one(EntityKind::Host, key)?.map(Host::from_entity))
    }

    /// Hosts matching `params`.
    ///
    /// # Errors
    ///
    /// Fetch failures.
    pub fn hosts(&self, params: Value) -> Result<Vec<Host<'_>>> {
        Ok(self
            .fetch(EntityKind::Host, params)?
            .into_iter()
            .map(Host::from_entity)
            .collect())
    }

    /// `Group` by id or name.
    ///
    /// # Errors
    ///
    /// Fetch failures; `AmbiguousFilter` when several groups match.
    pub fn group(&self, key: &str) -> Result<Option<Group<'_>>> {
        Ok(self
            .fetch_one(EntityKind::Group, key)?
            .map(Group::from_entity))
    }

    /// Groups matching `params`.
    ///
    /// # Errors
    ///
    /// Fetch failures.
    pub fn groups(&self, params: Value) -> Result<Vec<Group<'_>>> {
        Ok(self
            .fetch(EntityKind::Group, params)?
            .into_iter()
            .map(Group::from_entity)
            .collect())
    }

    /// Create a host group, returning the new id.
    ///
    /// # Errors
    ///
    /// Call failures.
    pub fn group_create(&self, name: &str) -> Result<String> {
        Group::create(self, name)
    }

    /// `Template` by id or name.
    ///
    /// # Errors
    ///
    /// Fetch failures; `AmbiguousFilter` when several templates match.
    pub fn template(&self, key: &str) -> Result<Option<Template<'_>>> {
        Ok(self
            .fetch_one(EntityKind::Template, key)?
            .map(Template::from_entity))
    }

    /// Templates matching `params`.
    ///
    /// # Errors
    ///
    /// Fetch failures.
    pub fn templates(&self, params: Value) -> Result<Vec<Template<'_>>> {
        Ok(self
            .fetch(EntityKind::Template, params)?
            .into_iter()
            .map(Template::from_entity)
            .collect())
    }

    /// `Item` by id or name.
    ///
    /// # Errors
    ///
    /// Fetch failures; `AmbiguousFilter` when several items match.
    pub fn item(&self, key: &str) -> Result<Option<Item<'_>>> {
        Ok(self.fetch_one(EntityKind::Item, key)?.map(Item::from_entity))
    }

    /// Items matching `params`.
    ///
    /// # Errors
    ///
    /// Fetch failures.
    pub fn items(&self, params: Value) -> Result<Vec<Item<'_>>> {
        Ok(self
            .fetch(EntityKind::Item, params)?
            .into_iter()
            .map(Item::from_entity)
            .collect())
    }

    /// `Trigger` by id.
    ///
    /// # Errors
    ///
    /// Fetch failures; `AmbiguousFilter` when several triggers match.
    pub fn trigger(&self, id: &str) -> Result<Option<Trigger<'_>>> {
        Ok(self
            .fetch_one(EntityKind::Trigger, id)?
            .map(Trigger::from_entity))
    }

    /// Triggers matching `params`.
    ///
    /// # Errors
    ///
    /// Fetch failures.
    pub fn triggers(&self, params: Value) -> Result<Vec<Trigger<'_>>> {
        Ok(self
            .fetch(EntityKind::Trigger, params)?
            .into_iter()
            .map(Trigger::from_entity)
            .collect())
    }

    /// `Event` by id.
    ///
    /// # Errors
    ///
    /// Fetch failures; `AmbiguousFilter` when several events match.
    pub fn event(&self, id: &str) -> Result<Option<Event<'_>>> {
        match self.fetch_one_record(EntityKind::Event, id)? {
            Some(record) => Ok(Some(Event::from_record(self, &record)?)),
            None => Ok(None),
        }
    }

    /// Events matching `params`.
    ///
    /// # Errors
    ///
    /// Fetch failures.
    pub fn events(&self, params: Value) -> Result<Vec<Event<'_>>> {
        self.fetch_records(EntityKind::Event, params)?
            .iter()
            .map(|record| Event::from_record(self, record))
            .collect()
    }

    /// Problems matching `params`.
    ///
    /// # Errors
    ///
    /// Fetch failures.
    pub fn problems(&self, params: Value) -> Result<Vec<Problem<'_>>> {
        self.fetch_records(EntityKind::Problem, params)?
            .iter()
            .map(|record| Problem::from_record(self, record))
            .collect()
    }

    /// Maintenance windows matching `params`.
    ///
    /// # Errors
    ///
    /// Fetch failures.
    pub fn maintenances(&self, params: Value) -> Result<Vec<Maintenance<'_>>> {
        Ok(self
            .fetch(EntityKind::Maintenance, params)?
            .into_iter()
            .map(Maintenance::from_entity)
            .collect())
    }

    /// Applications matching `params`.
    ///
    /// # Errors
    ///
    /// Fetch failures.
    pub fn applications(&self, params: Value) -> Result<Vec<Application<'_>>> {
        Ok(self
            .fetch(EntityKind::Application, params)?
            .into_iter()
            .map(Application::from_entity)
            .collect())
    }
}
