#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use url::Url;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zbxapi::api::{HistoryQuery, HistoryValue, Relation, Session};
use zbxapi::error::{ApiError, Error};

// The session is blocking, so the mock server runs on a manually driven
// runtime while the calls under test stay on the test thread.
fn start() -> (Runtime, MockServer) {
    let rt = Runtime::new().expect("runtime");
    let server = rt.block_on(MockServer::start());
    (rt, server)
}

fn session(server: &MockServer) -> Session {
    Session::new(
        Url::parse(&server.uri()).expect("valid mock url"),
        Duration::from_secs(2),
        Duration::from_secs(1),
        true,
    )
    .expect("session")
}

fn rpc_result(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": value,
        "id": 0,
    }))
}

fn rpc_error(code: i64, message: &str, data: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message, "data": data },
        "id": 0,
    }))
}

fn mount(rt: &Runtime, server: &MockServer, needle: &str, response: ResponseTemplate) {
    rt.block_on(
        Mock::given(method("POST"))
            .and(body_string_contains(needle))
            .respond_with(response)
            .mount(server),
    );
}

fn request_bodies(rt: &Runtime, server: &MockServer) -> Vec<Value> {
    rt.block_on(server.received_requests())
        .expect("recorded requests")
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("json body"))
        .collect()
}

fn calls_of(bodies: &[Value], method: &str) -> usize {
    bodies
        .iter()
        .filter(|body| body["method"] == json!(method))
        .count()
}

#[test]
fn login_stores_the_token_and_ids_count_up_from_zero() {
    let (rt, server) = start();
    mount(&rt, &server, "user.login", rpc_result(json!("abc123")));
    mount(&rt, &server, "host.get", rpc_result(json!([])));

    let session = session(&server);
    assert!(session.login("user", &SecretString::from("pass")).unwrap());
    assert!(session.hosts(json!({})).unwrap().is_empty());

    let bodies = request_bodies(&rt, &server);
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["jsonrpc"], json!("2.0"));
    assert_eq!(bodies[0]["auth"], Value::Null);
    assert_eq!(bodies[0]["id"], json!(0));
    assert_eq!(bodies[0]["params"], json!({ "user": "user", "password": "pass" }));
    assert_eq!(bodies[1]["auth"], json!("abc123"));
    assert_eq!(bodies[1]["id"], json!(1));
}

#[test]
fn rejected_credentials_mean_false_not_an_error() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "user.login",
        rpc_error(-32602, "Invalid params.", "Login name or password is incorrect."),
    );
    mount(&rt, &server, "host.get", rpc_result(json!([])));

    let session = session(&server);
    assert!(!session.login("user", &SecretString::from("wrong")).unwrap());

    // No token was stored: the next call still authenticates as nobody.
    let _ = session.hosts(json!({})).unwrap();
    let bodies = request_bodies(&rt, &server);
    assert_eq!(bodies[1]["auth"], Value::Null);
}

#[test]
fn other_login_failures_propagate() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "user.login",
        rpc_error(-32000, "Internal error.", ""),
    );

    let session = session(&server);
    let err = session
        .login("user", &SecretString::from("pass"))
        .expect_err("should fail");
    assert!(matches!(
        err,
        Error::Api(ApiError::Remote { code: -32000, .. })
    ));
}

#[test]
fn remote_errors_carry_the_server_fields_verbatim() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "host.get",
        rpc_error(666, "boom", "the details"),
    );

    let session = session(&server);
    let err = session.hosts(json!({})).expect_err("should fail");
    match err {
        Error::Api(ApiError::Remote {
            code,
            message,
            data,
        }) => {
            assert_eq!(code, 666);
            assert_eq!(message, "boom");
            assert_eq!(data, "the details");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_replies_are_invalid() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "host.get",
        ResponseTemplate::new(200).set_body_raw(Vec::new(), "application/json"),
    );

    let session = session(&server);
    let err = session.hosts(json!({})).expect_err("should fail");
    assert!(matches!(err, Error::Api(ApiError::InvalidReply { .. })));
}

#[test]
fn undecodable_replies_are_invalid() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "host.get",
        ResponseTemplate::new(200).set_body_string("<html>maintenance page</html>"),
    );

    let session = session(&server);
    let err = session.hosts(json!({})).expect_err("should fail");
    assert!(matches!(err, Error::Api(ApiError::InvalidReply { .. })));
}

#[test]
fn fetch_one_returns_none_on_zero_matches() {
    let (rt, server) = start();
    mount(&rt, &server, "hostgroup.get", rpc_result(json!([])));

    let session = session(&server);
    assert!(session.group("NoSuchGroup").unwrap().is_none());
}

#[test]
fn fetch_one_returns_the_sole_match_by_name() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "hostgroup.get",
        rpc_result(json!([
            { "groupid": "45", "name": "MyGroup", "internal": "0", "flags": "0" }
        ])),
    );

    let session = session(&server);
    let group = session.group("MyGroup").unwrap().expect("one group");
    assert_eq!(group.id(), Some("45"));
    assert_eq!(group.prop("internal").unwrap().as_int(), Some(0));

    let bodies = request_bodies(&rt, &server);
    assert_eq!(bodies[0]["params"]["filter"], json!({ "name": "MyGroup" }));
}

#[test]
fn fetch_one_selects_by_id_for_digit_keys() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "hostgroup.get",
        rpc_result(json!([
            { "groupid": "45", "name": "MyGroup" }
        ])),
    );

    let session = session(&server);
    let group = session.group("45").unwrap().expect("one group");
    assert_eq!(group.prop("name").unwrap().as_text().as_deref(), Some("MyGroup"));

    let bodies = request_bodies(&rt, &server);
    assert_eq!(bodies[0]["params"]["groupids"], json!("45"));
}

#[test]
fn fetch_one_refuses_ambiguous_matches() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "hostgroup.get",
        rpc_result(json!([
            { "groupid": "1", "name": "dup" },
            { "groupid": "2", "name": "dup" },
        ])),
    );

    let session = session(&server);
    let err = session.group("dup").expect_err("should be ambiguous");
    assert!(matches!(
        err,
        Error::Api(ApiError::AmbiguousFilter { matched: 2 })
    ));
}

#[test]
fn eager_relations_are_selected_unless_the_caller_already_did() {
    let (rt, server) = start();
    mount(&rt, &server, "host.get", rpc_result(json!([])));

    let session = session(&server);
    let _ = session.hosts(json!({})).unwrap();
    let _ = session.hosts(json!({ "selectGroups": "extend" })).unwrap();

    let bodies = request_bodies(&rt, &server);
    assert_eq!(bodies[0]["params"]["selectGroups"], json!(true));
    assert_eq!(bodies[0]["params"]["selectApplications"], json!(true));
    // Items are not eager on hosts.
    assert!(bodies[0]["params"].get("selectItems").is_none());
    // The caller's own selection wins.
    assert_eq!(bodies[1]["params"]["selectGroups"], json!("extend"));
}

#[test]
fn lazy_relations_fetch_once_and_then_hit_the_cache() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "hostgroup.get",
        rpc_result(json!([
            { "groupid": "45", "name": "MyGroup" }
        ])),
    );
    mount(
        &rt,
        &server,
        "host.get",
        rpc_result(json!([
            { "hostid": "7", "name": "web-01", "host": "web-01.example.com" }
        ])),
    );

    let session = session(&server);
    let mut group = session.group("MyGroup").unwrap().expect("group");
    assert!(matches!(group.relation("hosts"), Some(Relation::Unresolved)));

    let first = group.related("hosts").unwrap().expect("declared").len();
    let second = group.related("hosts").unwrap().expect("declared").len();
    assert_eq!((first, second), (1, 1));

    let bodies = request_bodies(&rt, &server);
    assert_eq!(calls_of(&bodies, "host.get"), 1);
    let host_call = bodies
        .iter()
        .find(|body| body["method"] == json!("host.get"))
        .expect("host.get body");
    assert_eq!(host_call["params"]["groupids"], json!("45"));
}

#[test]
fn item_history_is_typed_by_the_value_type() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "item.get",
        rpc_result(json!([
            { "itemid": "1", "key_": "system.cpu.load", "value_type": "3" }
        ])),
    );
    mount(
        &rt,
        &server,
        "history.get",
        rpc_result(json!([
            { "itemid": "1", "clock": "1391709316", "value": "2", "ns": "0" },
            { "itemid": "1", "clock": "1391709315", "value": "1", "ns": "0" },
        ])),
    );

    let session = session(&server);
    let item = session.item("1").unwrap().expect("item");
    let points = item.history(&HistoryQuery::default()).unwrap();

    let values: Vec<_> = points.iter().map(|point| point.value.clone()).collect();
    assert_eq!(values, vec![HistoryValue::Int(2), HistoryValue::Int(1)]);

    let bodies = request_bodies(&rt, &server);
    let history_call = bodies
        .iter()
        .find(|body| body["method"] == json!("history.get"))
        .expect("history.get body");
    assert_eq!(history_call["params"]["history"], json!(3));
    assert_eq!(history_call["params"]["limit"], json!(10));
    assert_eq!(history_call["params"]["sortorder"], json!("DESC"));
}

#[test]
fn mass_add_returns_the_server_result_verbatim() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "hostgroup.get",
        rpc_result(json!([{ "groupid": "14", "name": "g1" }])),
    );
    mount(
        &rt,
        &server,
        "host.get",
        rpc_result(json!([{ "hostid": "45", "name": "h1" }])),
    );
    // The server reports some other host as added; nothing local may
    // pretend h1 made it in.
    mount(
        &rt,
        &server,
        "hostgroup.massadd",
        rpc_result(json!({ "hostids": ["40"] })),
    );

    let session = session(&server);
    let group = session.group("g1").unwrap().expect("group");
    let host = session.host("h1").unwrap().expect("host");

    let result = group.add_hosts(std::slice::from_ref(&host)).unwrap();
    assert_eq!(result, json!({ "hostids": ["40"] }));
    assert!(matches!(group.relation("hosts"), Some(Relation::Unresolved)));

    let bodies = request_bodies(&rt, &server);
    let massadd = bodies
        .iter()
        .find(|body| body["method"] == json!("hostgroup.massadd"))
        .expect("massadd body");
    assert_eq!(
        massadd["params"],
        json!({ "groups": [{ "groupid": "14" }], "hosts": [{ "hostid": "45" }] })
    );
}

#[test]
fn problem_trigger_is_absent_without_a_call_for_non_trigger_objects() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "problem.get",
        rpc_result(json!([
            {
                "eventid": "10",
                "source": "0",
                "object": "4",
                "objectid": "99",
                "clock": "1700000000",
                "name": "Unsupported item",
                "severity": "2",
                "acknowledged": "0"
            }
        ])),
    );

    let session = session(&server);
    let mut problems = session.problems(json!({})).unwrap();
    assert_eq!(problems.len(), 1);
    assert!(problems[0].trigger().unwrap().is_none());

    let bodies = request_bodies(&rt, &server);
    assert_eq!(bodies.len(), 1, "no trigger.get may have been issued");
}

#[test]
fn problem_trigger_resolves_lazily_and_caches() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "problem.get",
        rpc_result(json!([
            {
                "eventid": "10",
                "source": "0",
                "object": "0",
                "objectid": "77",
                "clock": "1700000000",
                "name": "CPU load too high",
                "severity": "4",
                "acknowledged": "0"
            }
        ])),
    );
    mount(
        &rt,
        &server,
        "trigger.get",
        rpc_result(json!([
            { "triggerid": "77", "description": "CPU load too high", "priority": "4" }
        ])),
    );

    let session = session(&server);
    let mut problems = session.problems(json!({})).unwrap();
    let problem = &mut problems[0];

    for _ in 0..2 {
        let trigger = problem.trigger().unwrap().expect("trigger");
        assert_eq!(trigger.id(), Some("77"));
        assert_eq!(trigger.prop("priority").unwrap().label(), Some("high"));
    }

    let bodies = request_bodies(&rt, &server);
    assert_eq!(calls_of(&bodies, "trigger.get"), 1);
}

#[test]
fn embedded_related_objects_seed_the_event_trigger() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "event.get",
        rpc_result(json!([
            {
                "eventid": "5",
                "source": "0",
                "object": "0",
                "objectid": "77",
                "clock": "1700000000",
                "relatedObject": {
                    "triggerid": "77",
                    "description": "Disk full on {HOST.NAME}",
                    "priority": "4"
                }
            }
        ])),
    );

    let session = session(&server);
    let mut events = session.events(json!({})).unwrap();
    let trigger = events[0].trigger().unwrap().expect("embedded trigger");
    assert_eq!(trigger.id(), Some("77"));

    let bodies = request_bodies(&rt, &server);
    assert_eq!(bodies.len(), 1, "the embedded record must be enough");
}

#[test]
fn save_sends_dirty_fields_once_and_clears_them() {
    let (rt, server) = start();
    mount(
        &rt,
        &server,
        "hostgroup.get",
        rpc_result(json!([{ "groupid": "45", "name": "old-name" }])),
    );
    mount(
        &rt,
        &server,
        "hostgroup.update",
        rpc_result(json!({ "groupids": ["45"] })),
    );

    let session = session(&server);
    let mut group = session.group("45").unwrap().expect("group");
    group
        .prop_mut("name")
        .expect("name prop")
        .assign(&json!("new-name"))
        .unwrap();

    group.save().unwrap();
    group.save().unwrap();

    let bodies = request_bodies(&rt, &server);
    assert_eq!(calls_of(&bodies, "hostgroup.update"), 1);
    let update = bodies
        .iter()
        .find(|body| body["method"] == json!("hostgroup.update"))
        .expect("update body");
    assert_eq!(
        update["params"],
        json!({ "groupid": "45", "name": "new-name" })
    );
}

#[test]
fn plain_http_needs_an_explicit_opt_in() {
    let err = Session::new(
        Url::parse("http://monitoring.internal").expect("url"),
        Duration::from_secs(1),
        Duration::from_secs(1),
        false,
    )
    .expect_err("should refuse http");
    assert!(matches!(err, Error::Config(_)));

    assert!(
        Session::new(
            Url::parse("http://monitoring.internal").expect("url"),
            Duration::from_secs(1),
            Duration::from_secs(1),
            true,
        )
        .is_ok()
    );
}
