use std::sync::Arc;

use api::memory::Reply;
use api::{ApiClient, ApiError, Method, Role, ScriptedTransport, Session, SessionContext};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

fn signed_in_client(transport: &ScriptedTransport) -> ApiClient {
    ApiClient::new(
        Arc::new(transport.clone()),
        SessionContext::signed_in(Session::with_role("test-token", Role::Admin)),
    )
}

#[tokio::test]
async fn list_page_sends_bearer_and_query() {
    let transport = ScriptedTransport::new();
    transport.reply(
        Method::Get,
        "/api/groups/paginated",
        Reply::ok(json!([{"id": 1, "name": "B-101"}])),
    );
    let client = signed_in_client(&transport);

    let rows: Vec<Value> = client
        .list_page(
            "groups",
            vec![
                ("page".into(), "2".into()),
                ("page_size".into(), "25".into()),
            ],
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let sent = transport.requests_to(Method::Get, "/api/groups/paginated");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].bearer.as_deref(), Some("test-token"));
    assert_eq!(sent[0].query_param("page"), Some("2"));
    assert_eq!(sent[0].query_param("page_size"), Some("25"));
}

#[tokio::test]
async fn missing_session_sends_nothing() {
    let transport = ScriptedTransport::new();
    let client = ApiClient::new(Arc::new(transport.clone()), SessionContext::new());

    let err = client.list_all::<Value>("cabinets").await.unwrap_err();

    assert_eq!(err, ApiError::Unauthenticated);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn create_maps_structured_validation_errors() {
    let transport = ScriptedTransport::new();
    transport.reply(
        Method::Post,
        "/api/students/",
        Reply::json(
            422,
            json!({"detail": [{"loc": ["body", "user", "birthday"], "msg": "invalid date"}]}),
        ),
    );
    let client = signed_in_client(&transport);

    let err = client
        .create("students", json!({"user": {"birthday": "soon"}}))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "user.birthday: invalid date");
}

#[tokio::test]
async fn update_uses_put_with_id() {
    let transport = ScriptedTransport::new();
    transport.route(Method::Put, "/api/cabinets/4", |request| {
        Reply::ok(request.body.clone().unwrap_or(Value::Null))
    });
    let client = signed_in_client(&transport);

    let echoed = client
        .update("cabinets", 4, json!({"name": "Room 4"}))
        .await
        .unwrap();

    assert_eq!(echoed, json!({"name": "Room 4"}));
}

#[tokio::test]
async fn unauthorized_is_reported_not_retried() {
    let transport = ScriptedTransport::new();
    transport.reply(
        Method::Get,
        "/api/cabinets/",
        Reply::detail(401, "Could not validate credentials"),
    );
    let client = signed_in_client(&transport);

    let err = client.list_all::<Value>("cabinets").await.unwrap_err();

    assert!(err.is_auth_failure());
    assert_eq!(err.user_message(), "Could not validate credentials");
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn transport_failure_and_malformed_body_are_generic() {
    let transport = ScriptedTransport::new();
    transport.reply(
        Method::Get,
        "/api/cabinets/",
        Reply::connection_failure("connection refused"),
    );
    transport.reply(Method::Get, "/api/category_levels/", Reply::raw(200, "not json"));
    let client = signed_in_client(&transport);

    let down = client.list_all::<Value>("cabinets").await.unwrap_err();
    assert!(matches!(down, ApiError::Transport(_)));
    assert_eq!(down.user_message(), "Something went wrong. Please try again.");

    let garbled = client.list_all::<Value>("category_levels").await.unwrap_err();
    assert!(matches!(garbled, ApiError::Malformed(_)));
    assert_eq!(garbled.user_message(), "Something went wrong. Please try again.");
}

#[tokio::test]
async fn batch_action_returns_detail_on_both_outcomes() {
    let transport = ScriptedTransport::new();
    transport.reply(
        Method::Post,
        "/api/group_schedules/create_butch",
        Reply::detail(200, "Created 20 schedules"),
    );
    transport.reply(
        Method::Post,
        "/api/practice_schedules/create_butch",
        Reply::detail(400, "Instructor is busy"),
    );
    let client = signed_in_client(&transport);

    let ok = client
        .post_action("group_schedules/create_butch", json!({"group_id": 1}))
        .await
        .unwrap();
    assert_eq!(ok, "Created 20 schedules");

    let err = client
        .post_action("practice_schedules/create_butch", json!({"student_id": 1}))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Rejected {
            status: 400,
            detail: "Instructor is busy".into()
        }
    );
}

#[tokio::test]
async fn login_stores_session_with_role_claim() {
    let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"director","role":"admin_role"}"#);
    let token = format!("header.{payload}.signature");

    let transport = ScriptedTransport::new();
    let issued = token.clone();
    transport.route(Method::Post, "/api/auth/login", move |request| {
        let body = request.body.clone().unwrap_or(Value::Null);
        if body["username"] == "director" && body["password"] == "pw" {
            Reply::ok(json!({"access_token": issued, "token_type": "bearer"}))
        } else {
            Reply::detail(401, "Incorrect username or password")
        }
    });
    let context = SessionContext::new();
    let client = ApiClient::new(Arc::new(transport.clone()), context.clone());

    let err = client.login("director", "wrong").await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(context.current().is_none());

    let session = client.login("director", "pw").await.unwrap();
    assert_eq!(session.role(), Role::Admin);
    assert_eq!(context.current().map(|s| s.token().to_string()), Some(token));

    let login = &transport.requests()[0];
    assert!(login.bearer.is_none());

    client.logout();
    assert!(context.current().is_none());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let transport = ScriptedTransport::new();
    let client = signed_in_client(&transport);

    let err = client.delete("instructors/1/categories/2").await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Rejected {
            status: 404,
            detail: "Not Found".into()
        }
    );
}
