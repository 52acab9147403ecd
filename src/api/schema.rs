use std::fmt::{self, Display};
use std::str::FromStr;

use super::property::Kind;

/// Closed set of entity kinds the client models. Each resolves to a static
/// [`EntitySchema`]; nothing is registered or reflected at runtime.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntityKind {
    Host,
    Group,
    Template,
    Item,
    Trigger,
    Event,
    Problem,
    Maintenance,
    Application,
    Service,
}

impl EntityKind {
    pub const fn schema(self) -> &'static EntitySchema {
        match self {
            Self::Host => &HOST,
            Self::Group => &GROUP,
            Self::Template => &TEMPLATE,
            Self::Item => &ITEM,
            Self::Trigger => &TRIGGER,
            Self::Event => &EVENT,
            Self::Problem => &PROBLEM,
            Self::Maintenance => &MAINTENANCE,
            Self::Application => &APPLICATION,
            Self::Service => &SERVICE,
        }
    }

    /// Name used in API method names, e.g. `hostgroup` in `hostgroup.get`.
    pub const fn api_name(self) -> &'static str {
        self.schema().api_name
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "host" => Ok(Self::Host),
            "group" | "hostgroup" => Ok(Self::Group),
            "template" => Ok(Self::Template),
            "item" => Ok(Self::Item),
            "trigger" => Ok(Self::Trigger),
            "event" => Ok(Self::Event),
            "problem" => Ok(Self::Problem),
            "maintenance" => Ok(Self::Maintenance),
            "application" => Ok(Self::Application),
            "service" | "itservice" => Ok(Self::Service),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// Static declaration of one field: semantic kind, mutability, and the
/// optional enumeration of legal values.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub doc: &'static str,
    pub kind: Kind,
    pub id: bool,
    pub readonly: bool,
    pub vals: Option<&'static [(i64, &'static str)]>,
}

impl FieldSpec {
    const fn new(name: &'static str, doc: &'static str, kind: Kind) -> Self {
        Self {
            name,
            doc,
            kind,
            id: false,
            readonly: false,
            vals: None,
        }
    }

    const fn text(name: &'static str, doc: &'static str) -> Self {
        Self::new(name, doc, Kind::Text)
    }

    const fn int(name: &'static str, doc: &'static str) -> Self {
        Self::new(name, doc, Kind::Int)
    }

    const fn float(name: &'static str, doc: &'static str) -> Self {
        Self::new(name, doc, Kind::Float)
    }

    const fn time(name: &'static str, doc: &'static str) -> Self {
        Self::new(name, doc, Kind::Time)
    }

    /// Identifier fields are always read-only wire strings.
    const fn id_field(name: &'static str, doc: &'static str) -> Self {
        let mut spec = Self::new(name, doc, Kind::Text);
        spec.id = true;
        spec.readonly = true;
        spec
    }

    const fn ro(mut self) -> Self {
        self.readonly = true;
        self
    }

    const fn vals(mut self, vals: &'static [(i64, &'static str)]) -> Self {
        self.vals = Some(vals);
        self
    }
}

/// A relation the entity may expose: the raw payload key it arrives under,
/// the kind it resolves to, the `selectXxx` request flag, and whether that
/// flag is sent by default when fetching the owning kind.
#[derive(Debug)]
pub struct RelationSpec {
    pub name: &'static str,
    pub target: EntityKind,
    pub select: &'static str,
    pub eager: bool,
}

impl RelationSpec {
    const fn eager(name: &'static str, target: EntityKind, select: &'static str) -> Self {
        Self {
            name,
            target,
            select,
            eager: true,
        }
    }

    const fn lazy(name: &'static str, target: EntityKind, select: &'static str) -> Self {
        Self {
            name,
            target,
            select,
            eager: false,
        }
    }
}

/// Static per-kind declaration: API naming, identifier field, display
/// field, field table, and declared relations.
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub api_name: &'static str,
    pub id_field: &'static str,
    /// The distinguishing display field. Embedded relation records are
    /// only treated as full records when they carry this field.
    pub text_field: &'static str,
    pub fields: &'static [FieldSpec],
    pub relations: &'static [RelationSpec],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&'static RelationSpec> {
        self.relations.iter().find(|spec| spec.name == name)
    }

    /// Plural id parameter, e.g. `hostids`, used both as a fetch selector
    /// and as the foreign-key filter when resolving relations.
    pub fn id_param(&self) -> String {
        format!("{}s", self.id_field)
    }
}

const AVAILABILITY: &[(i64, &str)] = &[
    (0, "unknown (default)"),
    (1, "available"),
    (2, "unavailable"),
];

const MAINTENANCE_TYPES: &[(i64, &str)] = &[
    (0, "with data collection (default)"),
    (1, "without data collection"),
];

const SEVERITIES: &[(i64, &str)] = &[
    (0, "not classified (default)"),
    (1, "information"),
    (2, "warning"),
    (3, "average"),
    (4, "high"),
    (5, "disaster"),
];

static HOST: EntitySchema = EntitySchema {
    kind: EntityKind::Host,
    api_name: "host",
    id_field: "hostid",
    text_field: "name",
    fields: &[
        FieldSpec::id_field("hostid", "ID of the host."),
        FieldSpec::text("host", "Technical name of the host."),
        FieldSpec::int("available", "Availability of the agent.")
            .ro()
            .vals(AVAILABILITY),
        FieldSpec::time(
            "disable_until",
            "The next polling time of an unavailable agent.",
        )
        .ro(),
        FieldSpec::text("error", "Error text if the agent is unavailable.").ro(),
        FieldSpec::time("errors_from", "Time when the agent became unavailable.").ro(),
        FieldSpec::int("flags", "Origin of the host.")
            .ro()
            .vals(&[(0, "a plain host"), (4, "a discovered host")]),
        FieldSpec::int("inventory_mode", "Host inventory population mode.").vals(&[
            (-1, "disabled"),
            (0, "manual (default)"),
            (1, "automatic"),
        ]),
        FieldSpec::int("ipmi_authtype", "IPMI authentication algorithm.").vals(&[
            (-1, "default (default)"),
            (0, "none"),
            (1, "MD2"),
            (2, "MD5"),
            (4, "straight"),
            (5, "OEM"),
            (6, "RMCP+"),
        ]),
        FieldSpec::int("ipmi_available", "Availability of IPMI agent.")
            .ro()
            .vals(AVAILABILITY),
        FieldSpec::time(
            "ipmi_disable_until",
            "The next polling time of an unavailable IPMI agent.",
        )
        .ro(),
        FieldSpec::text("ipmi_error", "Error text if the IPMI agent is unavailable.").ro(),
        FieldSpec::time(
            "ipmi_errors_from",
            "Time when the IPMI agent became unavailable.",
        )
        .ro(),
        FieldSpec::text("ipmi_password", "IPMI password."),
        FieldSpec::int("ipmi_privilege", "IPMI privilege level.").vals(&[
            (1, "callback"),
            (2, "user (default)"),
            (3, "operator"),
            (4, "admin"),
            (5, "OEM"),
        ]),
        FieldSpec::text("ipmi_username", "IPMI username."),
        FieldSpec::int("jmx_available", "Availability of JMX agent.")
            .ro()
            .vals(AVAILABILITY),
        FieldSpec::time(
            "jmx_disable_until",
            "The next polling time of an unavailable JMX agent.",
        )
        .ro(),
        FieldSpec::text("jmx_error", "Error text if the JMX agent is unavailable.").ro(),
        FieldSpec::time(
            "jmx_errors_from",
            "Time when the JMX agent became unavailable.",
        )
        .ro(),
        FieldSpec::time("maintenance_from", "Starting time of the effective maintenance.").ro(),
        FieldSpec::int("maintenance_status", "Effective maintenance status.")
            .ro()
            .vals(&[
                (0, "no maintenance (default)"),
                (1, "maintenance in effect"),
            ]),
        FieldSpec::int("maintenance_type", "Effective maintenance type.")
            .ro()
            .vals(MAINTENANCE_TYPES),
        FieldSpec::text(
            "maintenanceid",
            "ID of the maintenance that is currently in effect on the host.",
        )
        .ro(),
        FieldSpec::text("name", "Visible name of the host, defaults to the technical name."),
        FieldSpec::text("proxy_hostid", "ID of the proxy that is used to monitor the host."),
        FieldSpec::int("snmp_available", "Availability of SNMP agent.")
            .ro()
            .vals(AVAILABILITY),
        FieldSpec::time(
            "snmp_disable_until",
            "The next polling time of an unavailable SNMP agent.",
        )
        .ro(),
        FieldSpec::text("snmp_error", "Error text if the SNMP agent is unavailable.").ro(),
        FieldSpec::time(
            "snmp_errors_from",
            "Time when the SNMP agent became unavailable.",
        )
        .ro(),
        FieldSpec::int("status", "Status and function of the host.").vals(&[
            (0, "monitored host (default)"),
            (1, "unmonitored host"),
        ]),
        FieldSpec::int("tls_connect", "Connections to host.").vals(&[
            (1, "no encryption (default)"),
            (2, "pre-shared key (PSK)"),
            (4, "certificate"),
        ]),
        FieldSpec::int("tls_accept", "Connections from host.").vals(&[
            (1, "no encryption (default)"),
            (2, "pre-shared key (PSK)"),
            (4, "certificate"),
        ]),
        FieldSpec::text("tls_issuer", "Certificate issuer."),
        FieldSpec::text("tls_subject", "Certificate subject."),
        FieldSpec::text(
            "tls_psk_identity",
            "PSK identity. Required if either tls_connect or tls_accept has PSK enabled.",
        ),
        FieldSpec::text(
            "tls_psk",
            "The preshared key, at least 32 hex digits. Required if either tls_connect or tls_accept has PSK enabled.",
        ),
    ],
    relations: &[
        RelationSpec::eager("groups", EntityKind::Group, "selectGroups"),
        RelationSpec::eager("applications", EntityKind::Application, "selectApplications"),
        RelationSpec::lazy("templates", EntityKind::Template, "selectParentTemplates"),
        RelationSpec::lazy("items", EntityKind::Item, "selectItems"),
        RelationSpec::lazy("triggers", EntityKind::Trigger, "selectTriggers"),
    ],
};

static GROUP: EntitySchema = EntitySchema {
    kind: EntityKind::Group,
    api_name: "hostgroup",
    id_field: "groupid",
    text_field: "name",
    fields: &[
        FieldSpec::id_field("groupid", "ID of the host group."),
        FieldSpec::text("name", "Name of the host group."),
        FieldSpec::int("flags", "Origin of the host group.")
            .ro()
            .vals(&[(0, "a plain host group"), (4, "a discovered host group")]),
        FieldSpec::int(
            "internal",
            "Whether the group is used internally by the system. An internal group cannot be deleted.",
        )
        .ro()
        .vals(&[(0, "not internal (default)"), (1, "internal")]),
    ],
    relations: &[
        RelationSpec::eager("hosts", EntityKind::Host, "selectHosts"),
        RelationSpec::eager("templates", EntityKind::Template, "selectTemplates"),
    ],
};

static TEMPLATE: EntitySchema = EntitySchema {
    kind: EntityKind::Template,
    api_name: "template",
    id_field: "templateid",
    text_field: "name",
    fields: &[
        FieldSpec::id_field("templateid", "ID of the template."),
        FieldSpec::text("template", "Technical name of the template."),
        FieldSpec::text("description", "Description of the template."),
        FieldSpec::text(
            "name",
            "Visible name of the template, defaults to the technical name.",
        ),
    ],
    relations: &[
        RelationSpec::eager("hosts", EntityKind::Host, "selectHosts"),
        RelationSpec::eager("groups", EntityKind::Group, "selectGroups"),
        RelationSpec::eager("items", EntityKind::Item, "selectItems"),
        RelationSpec::eager("triggers", EntityKind::Trigger, "selectTriggers"),
    ],
};

static ITEM: EntitySchema = EntitySchema {
    kind: EntityKind::Item,
    api_name: "item",
    id_field: "itemid",
    text_field: "name",
    fields: &[
        FieldSpec::id_field("itemid", "ID of the item."),
        FieldSpec::text(
            "delay",
            "Update interval of the item. Units: s=seconds (default), m=minutes, h=hours, d=days.",
        ),
        FieldSpec::text("hostid", "ID of the host that the item belongs to."),
        FieldSpec::text("interfaceid", "ID of the item's host interface."),
        FieldSpec::text("key_", "Item key."),
        FieldSpec::text("name", "Name of the item."),
        FieldSpec::int("type", "Type of the item.").vals(&[
            (0, "Zabbix agent"),
            (1, "SNMPv1 agent"),
            (2, "Zabbix trapper"),
            (3, "simple check"),
            (4, "SNMPv2 agent"),
            (5, "Zabbix internal"),
            (6, "SNMPv3 agent"),
            (7, "Zabbix agent (active)"),
            (8, "Zabbix aggregate"),
            (9, "web item"),
            (10, "external check"),
            (11, "database monitor"),
            (12, "IPMI agent"),
            (13, "SSH agent"),
            (14, "TELNET agent"),
            (15, "calculated"),
            (16, "JMX agent"),
            (17, "SNMP trap"),
        ]),
        FieldSpec::int("value_type", "Type of information of the item.").vals(&[
            (0, "numeric float"),
            (1, "character"),
            (2, "log"),
            (3, "numeric unsigned"),
            (4, "text"),
        ]),
        FieldSpec::int("authtype", "SSH authentication method. Used only by SSH agent items.")
            .vals(&[(0, "password (default)"), (1, "public key")]),
        FieldSpec::int("data_type", "Data type of the item.").vals(&[
            (0, "decimal (default)"),
            (1, "octal"),
            (2, "hexadecimal"),
            (3, "boolean"),
        ]),
        FieldSpec::text("delay_flex", "Flexible intervals as a serialized string."),
        FieldSpec::int("delta", "Value that will be stored.").vals(&[
            (0, "as is (default)"),
            (1, "Delta, speed per second"),
            (2, "Delta, simple change"),
        ]),
        FieldSpec::text("description", "Description of the item."),
        FieldSpec::text("error", "Error text if there are problems updating the item.").ro(),
        FieldSpec::int("flags", "Origin of the item.")
            .ro()
            .vals(&[(0, "a plain item"), (4, "a discovered item")]),
        FieldSpec::text(
            "history",
            "Retention of raw samples. Units: s=seconds (default), m=minutes, h=hours, d=days.",
        ),
        FieldSpec::int(
            "inventory_link",
            "ID of the host inventory field that is populated by the item.",
        ),
        FieldSpec::text("ipmi_sensor", "IPMI sensor. Used only by IPMI items."),
        FieldSpec::time("lastclock", "Time when the item was last updated.").ro(),
        FieldSpec::int("lastns", "Nanoseconds when the item was last updated.").ro(),
        FieldSpec::text("lastvalue", "Last value of the item.").ro(),
        FieldSpec::text("logtimefmt", "Format of the time in log entries. Used only by log items."),
        FieldSpec::time(
            "mtime",
            "Time when the monitored log file was last updated. Used only by log items.",
        ),
        FieldSpec::int("multiplier", "Whether to use a custom multiplier."),
        FieldSpec::text(
            "params",
            "Additional parameters depending on the type of the item.",
        ),
        FieldSpec::text("password", "Password for authentication."),
        FieldSpec::text("port", "Port monitored by the item. Used only by SNMP items."),
        FieldSpec::text("prevvalue", "Previous value of the item.").ro(),
        FieldSpec::text("privatekey", "Name of the private key file."),
        FieldSpec::text("publickey", "Name of the public key file."),
        FieldSpec::text("snmp_community", "SNMP community. Used only by SNMPv1 and SNMPv2 items."),
        FieldSpec::text("snmp_oid", "SNMP OID."),
        FieldSpec::text("snmpv3_authpassphrase", "SNMPv3 auth passphrase."),
        FieldSpec::int("snmpv3_authprotocol", "SNMPv3 authentication protocol.")
            .vals(&[(0, "MD5 (default)"), (1, "SHA")]),
        FieldSpec::text("snmpv3_contextname", "SNMPv3 context name."),
        FieldSpec::text("snmpv3_privpassphrase", "SNMPv3 priv passphrase."),
        FieldSpec::int("snmpv3_privprotocol", "SNMPv3 privacy protocol.")
            .vals(&[(0, "DES (default)"), (1, "AES")]),
        FieldSpec::int("snmpv3_securitylevel", "SNMPv3 security level.").vals(&[
            (0, "noAuthNoPriv"),
            (1, "authNoPriv"),
            (2, "authPriv"),
        ]),
        FieldSpec::text("snmpv3_securityname", "SNMPv3 security name."),
        FieldSpec::int("state", "State of the item.")
            .ro()
            .vals(&[(0, "normal (default)"), (1, "not supported")]),
        FieldSpec::int("status", "Status of the item.").vals(&[
            (0, "enabled item (default)"),
            (1, "disabled item"),
        ]),
        FieldSpec::text("templateid", "ID of the parent template item.").ro(),
        FieldSpec::text("trapper_hosts", "Allowed hosts. Used only by trapper items."),
        FieldSpec::text(
            "trends",
            "Retention of down-sampled data. Units: s=seconds (default), m=minutes, h=hours, d=days.",
        ),
        FieldSpec::text("units", "Value units."),
        FieldSpec::text("username", "Username for authentication."),
        FieldSpec::text("valuemapid", "ID of the associated value map."),
    ],
    relations: &[RelationSpec::lazy("hosts", EntityKind::Host, "selectHosts")],
};

static TRIGGER: EntitySchema = EntitySchema {
    kind: EntityKind::Trigger,
    api_name: "trigger",
    id_field: "triggerid",
    text_field: "description",
    fields: &[
        FieldSpec::id_field("triggerid", "ID of the trigger."),
        FieldSpec::text("description", "Name of the trigger."),
        FieldSpec::text("expression", "Reduced trigger expression."),
        FieldSpec::text("comments", "Additional comments to the trigger."),
        FieldSpec::text(
            "error",
            "Error text if there have been any problems when updating the state of the trigger.",
        )
        .ro(),
        FieldSpec::int("flags", "Origin of the trigger.")
            .ro()
            .vals(&[(0, "a plain trigger (default)"), (4, "a discovered trigger")]),
        FieldSpec::time("lastchange", "Time when the trigger last changed its state.").ro(),
        FieldSpec::int("priority", "Severity of the trigger.").vals(SEVERITIES),
        FieldSpec::int("state", "State of the trigger.").ro().vals(&[
            (0, "trigger state is up to date (default)"),
            (1, "current trigger state is unknown"),
        ]),
        FieldSpec::int("status", "Whether the trigger is enabled or disabled.")
            .vals(&[(0, "enabled (default)"), (1, "disabled")]),
        FieldSpec::text("templateid", "ID of the parent template trigger.").ro(),
        FieldSpec::int(
            "type",
            "Whether the trigger can generate multiple problem events.",
        )
        .vals(&[
            (0, "do not generate multiple events (default)"),
            (1, "generate multiple events"),
        ]),
        FieldSpec::text("url", "URL associated with the trigger."),
        FieldSpec::int("value", "Whether the trigger is in OK or problem state.")
            .ro()
            .vals(&[(0, "ok"), (1, "problem")]),
        FieldSpec::int("recovery_mode", "OK event generation mode.").vals(&[
            (0, "expression (default)"),
            (1, "recovery expression"),
            (2, "none"),
        ]),
        FieldSpec::text("recovery_expression", "Reduced trigger recovery expression."),
        FieldSpec::int("correlation_mode", "OK event closes.").vals(&[
            (0, "all problems (default)"),
            (1, "all problems if tag values match"),
        ]),
        FieldSpec::text("correlation_tag", "Tag for matching."),
        FieldSpec::int("manual_close", "Allow manual close.")
            .vals(&[(0, "no (default)"), (1, "yes")]),
    ],
    relations: &[
        RelationSpec::eager("items", EntityKind::Item, "selectItems"),
        RelationSpec::lazy("hosts", EntityKind::Host, "selectHosts"),
        RelationSpec::lazy("groups", EntityKind::Group, "selectGroups"),
    ],
};

static EVENT: EntitySchema = EntitySchema {
    kind: EntityKind::Event,
    api_name: "event",
    id_field: "eventid",
    text_field: "name",
    fields: &[
        FieldSpec::id_field("eventid", "ID of the event."),
        FieldSpec::int("source", "Type of the event.").ro().vals(&[
            (0, "event created by a trigger"),
            (1, "event created by a discovery rule"),
            (2, "event created by active agent auto-registration"),
            (3, "internal event"),
        ]),
        FieldSpec::int("object", "Type of object that is related to the event.")
            .ro()
            .vals(&[
                (0, "trigger"),
                (1, "discovered host"),
                (2, "discovered service"),
                (3, "auto-registered host"),
                (4, "item"),
                (5, "LLD rule"),
            ]),
        FieldSpec::text("objectid", "ID of the related object.").ro(),
        FieldSpec::text("name", "Resolved event name.").ro(),
        FieldSpec::time("clock", "Time when the event was created.").ro(),
        FieldSpec::int("ns", "Nanoseconds when the event was created.").ro(),
        FieldSpec::int("value", "State of the related object.").ro().vals(&[
            (0, "ok / up / normal"),
            (1, "problem / down / unknown"),
            (2, "discovered"),
            (3, "lost"),
        ]),
        FieldSpec::text("userid", "User ID if the event was manually closed.").ro(),
    ],
    relations: &[RelationSpec::eager("hosts", EntityKind::Host, "selectHosts")],
};

static PROBLEM: EntitySchema = EntitySchema {
    kind: EntityKind::Problem,
    api_name: "problem",
    id_field: "eventid",
    text_field: "name",
    fields: &[
        FieldSpec::id_field("eventid", "ID of the problem event."),
        FieldSpec::int("source", "Type of the problem event.").vals(&[
            (0, "event created by a trigger"),
            (3, "internal event"),
        ]),
        FieldSpec::int(
            "object",
            "Type of object that is related to the problem event.",
        )
        .vals(&[(0, "trigger"), (4, "item"), (5, "LLD rule")]),
        FieldSpec::text("objectid", "ID of the related object.").ro(),
        FieldSpec::time("clock", "Time when the problem event was created.").ro(),
        FieldSpec::int("ns", "Nanoseconds when the problem event was created.").ro(),
        FieldSpec::text("name", "Resolved problem name.").ro(),
        FieldSpec::int("severity", "Current problem severity.")
            .ro()
            .vals(SEVERITIES),
        FieldSpec::int("acknowledged", "Acknowledgement state of the problem.")
            .ro()
            .vals(&[(0, "not acknowledged"), (1, "acknowledged")]),
    ],
    relations: &[],
};

static MAINTENANCE: EntitySchema = EntitySchema {
    kind: EntityKind::Maintenance,
    api_name: "maintenance",
    id_field: "maintenanceid",
    text_field: "name",
    fields: &[
        FieldSpec::id_field("maintenanceid", "ID of the maintenance."),
        FieldSpec::text("name", "Maintenance period name."),
        FieldSpec::text("description", "Description of the maintenance."),
        FieldSpec::int("maintenance_type", "Type of maintenance.").vals(MAINTENANCE_TYPES),
        FieldSpec::time("active_since", "Time when the maintenance becomes active."),
        FieldSpec::time("active_till", "Time when the maintenance stops being active."),
    ],
    relations: &[
        RelationSpec::eager("hosts", EntityKind::Host, "selectHosts"),
        RelationSpec::eager("groups", EntityKind::Group, "selectGroups"),
    ],
};

static APPLICATION: EntitySchema = EntitySchema {
    kind: EntityKind::Application,
    api_name: "application",
    id_field: "applicationid",
    text_field: "name",
    fields: &[
        FieldSpec::id_field("applicationid", "ID of the application."),
        FieldSpec::text("hostid", "ID of the host that the application belongs to."),
        FieldSpec::text("name", "Name of the application."),
        FieldSpec::int("flags", "Origin of the application.")
            .ro()
            .vals(&[(0, "a plain application"), (4, "a discovered application")]),
    ],
    relations: &[
        RelationSpec::lazy("hosts", EntityKind::Host, "selectHosts"),
        RelationSpec::lazy("items", EntityKind::Item, "selectItems"),
    ],
};

static SERVICE: EntitySchema = EntitySchema {
    kind: EntityKind::Service,
    api_name: "service",
    id_field: "serviceid",
    text_field: "name",
    fields: &[
        FieldSpec::id_field("serviceid", "ID of the IT service."),
        FieldSpec::int("algorithm", "Algorithm used to calculate the state of the IT service.")
            .vals(&[
                (0, "do not calculate"),
                (1, "problem, if at least one child has a problem"),
                (2, "problem, if all children have problems"),
            ]),
        FieldSpec::text("name", "Name of the IT service."),
        FieldSpec::int("showsla", "Whether SLA should be calculated.")
            .vals(&[(0, "do not calculate"), (1, "calculate")]),
        FieldSpec::int("sortorder", "Position of the IT service used for sorting."),
        FieldSpec::float(
            "goodsla",
            "Minimum acceptable SLA value. Below it the IT service is considered to be in problem state.",
        ),
        FieldSpec::int("status", "Whether the IT service is in OK or problem state.").ro(),
    ],
    relations: &[],
};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::EntityKind;

    const ALL: &[EntityKind] = &[
        EntityKind::Host,
        EntityKind::Group,
        EntityKind::Template,
        EntityKind::Item,
        EntityKind::Trigger,
        EntityKind::Event,
        EntityKind::Problem,
        EntityKind::Maintenance,
        EntityKind::Application,
        EntityKind::Service,
    ];

    #[test]
    fn every_schema_declares_exactly_one_identifier() {
        for kind in ALL {
            let schema = kind.schema();
            let ids: Vec<_> = schema.fields.iter().filter(|f| f.id).collect();
            assert_eq!(ids.len(), 1, "{kind} should have one id field");
            assert_eq!(ids[0].name, schema.id_field);
            assert!(ids[0].readonly);
        }
    }

    #[test]
    fn declared_text_fields_exist() {
        for kind in ALL {
            let schema = kind.schema();
            assert!(
                schema.field(schema.text_field).is_some(),
                "{kind} text field missing from field table"
            );
        }
    }

    #[test]
    fn kind_names_round_trip() {
        assert_eq!(EntityKind::from_str("hostgroup"), Ok(EntityKind::Group));
        assert_eq!(EntityKind::from_str("Host"), Ok(EntityKind::Host));
        assert_eq!(EntityKind::Group.api_name(), "hostgroup");
        assert!(EntityKind::from_str("screen").is_err());
    }

    #[test]
    fn relation_lookup_is_scoped_to_the_owning_kind() {
        let group = EntityKind::Group.schema();
        assert!(group.relation("hosts").is_some());
        assert!(group.relation("items").is_none());
        assert_eq!(group.id_param(), "groupids");
    }
}
