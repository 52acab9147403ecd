pub(crate) mod entity;
pub(crate) mod ops;
pub(crate) mod property;
pub(crate) mod rpc;
pub(crate) mod schema;
pub(crate) mod session;

pub use entity::{Entity, Relation};
pub use ops::{
    Application, Event, Group, HistoryPoint, HistoryQuery, HistoryValue, Host, Item, Maintenance,
    Problem, Template, Trigger,
};
pub use property::{Kind, PropValue, Property};
pub use schema::{EntityKind, EntitySchema, FieldSpec, RelationSpec};
pub use session::Session;
