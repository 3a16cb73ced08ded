//! Task calls over the wire: paths, bodies, unwrap fallbacks and uploads.

mod common;

use std::sync::{Arc, Mutex};

use mockito::{Matcher, Server};
use serde_json::{json, Value};
use tasktrack_core::{Attachment, ProgressFn, TaskInput, TaskQuery};

use common::{client_for, JSON};

#[tokio::test]
async fn test_list_unwraps_tasks_field() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/tasks")
        .with_status(200)
        .with_header("content-type", JSON)
        .with_body(r#"{"tasks": [{"id": 1}, {"id": 2}], "total": 2}"#)
        .create_async()
        .await;

    let (client, _) = client_for(&server, Some("abc"));
    let tasks = client.tasks().list(&TaskQuery::default()).await.unwrap();
    assert_eq!(tasks, json!([{"id": 1}, {"id": 2}]));
}

#[tokio::test]
async fn test_list_returns_bare_array_unchanged() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/tasks")
        .with_status(200)
        .with_body(r#"[{"id": 3}]"#)
        .create_async()
        .await;

    let (client, _) = client_for(&server, Some("abc"));
    let tasks = client.tasks().list(&TaskQuery::default()).await.unwrap();
    assert_eq!(tasks, json!([{"id": 3}]));
}

#[tokio::test]
async fn test_list_sends_filters_as_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/tasks")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("status".into(), "open".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"tasks": []}"#)
        .create_async()
        .await;

    let (client, _) = client_for(&server, Some("abc"));
    let query = TaskQuery {
        status: Some("open".to_string()),
        page: Some(2),
        ..TaskQuery::default()
    };
    assert_eq!(client.tasks().list(&query).await.unwrap(), json!([]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_history_of_empty_object_is_empty_list() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/tasks/9/history")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let (client, _) = client_for(&server, Some("abc"));
    assert_eq!(client.tasks().get_history(9).await.unwrap(), json!([]));
}

#[tokio::test]
async fn test_create_and_update_send_only_set_fields() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/tasks")
        .match_body(Matcher::Json(json!({"title": "Write report", "priority": "high"})))
        .with_status(201)
        .with_body(r#"{"message": "created", "task": {"id": 11}}"#)
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/tasks/11")
        .match_body(Matcher::Json(json!({"status": "done"})))
        .with_status(200)
        .with_body(r#"{"id": 11, "status": "done"}"#)
        .create_async()
        .await;

    let (client, _) = client_for(&server, Some("abc"));
    let input = TaskInput {
        priority: Some("high".to_string()),
        ..TaskInput::titled("Write report")
    };
    assert_eq!(client.tasks().create(&input).await.unwrap(), json!({"id": 11}));

    let changes = TaskInput {
        status: Some("done".to_string()),
        ..TaskInput::default()
    };
    assert_eq!(
        client.tasks().update(11, &changes).await.unwrap(),
        json!({"id": 11, "status": "done"})
    );
    create.assert_async().await;
    update.assert_async().await;
}

#[tokio::test]
async fn test_workflow_endpoints() {
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for (method, path) in [
        ("PUT", "/tasks/4/assign"),
        ("POST", "/tasks/4/accept"),
        ("POST", "/tasks/4/reject"),
        ("POST", "/tasks/4/toggle-status"),
        ("POST", "/tasks/4/seen"),
        ("POST", "/tasks/4/respond"),
        ("POST", "/tasks/4/comments"),
        ("DELETE", "/tasks/4/history/8"),
        ("DELETE", "/attachments/12"),
        ("DELETE", "/tasks/4"),
    ] {
        let mock = server
            .mock(method, path)
            .match_header("authorization", "Bearer abc")
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;
        mocks.push(mock);
    }

    let (client, _) = client_for(&server, Some("abc"));
    let tasks = client.tasks();
    tasks.assign_users(4, &[1, 2]).await.unwrap();
    tasks.accept(4).await.unwrap();
    tasks.reject(4).await.unwrap();
    tasks.toggle_status(4).await.unwrap();
    tasks.mark_as_seen(4).await.unwrap();
    tasks.respond(4, "On it").await.unwrap();
    tasks.comment(4, "Looks good").await.unwrap();
    tasks.delete_history(4, 8).await.unwrap();
    tasks.delete_attachment(12).await.unwrap();
    tasks.delete(4).await.unwrap();

    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_request_bodies() {
    let mut server = Server::new_async().await;
    let assign = server
        .mock("PUT", "/tasks/4/assign")
        .match_body(Matcher::Json(json!({"assigned_users": [1, 2]})))
        .with_status(200)
        .with_body(r#"{"task": {"id": 4}}"#)
        .create_async()
        .await;
    let respond = server
        .mock("POST", "/tasks/4/respond")
        .match_body(Matcher::Json(json!({"response": "On it"})))
        .with_status(200)
        .create_async()
        .await;
    let comment = server
        .mock("POST", "/tasks/4/comments")
        .match_body(Matcher::Json(json!({"comment": "Looks good"})))
        .with_status(200)
        .create_async()
        .await;

    let (client, _) = client_for(&server, Some("abc"));
    assert_eq!(client.tasks().assign_users(4, &[1, 2]).await.unwrap(), json!({"id": 4}));
    client.tasks().respond(4, "On it").await.unwrap();
    client.tasks().comment(4, "Looks good").await.unwrap();
    assign.assert_async().await;
    respond.assert_async().await;
    comment.assert_async().await;
}

#[tokio::test]
async fn test_remind_body_with_and_without_users() {
    let mut server = Server::new_async().await;
    let some = server
        .mock("POST", "/tasks/4/remind")
        .match_body(Matcher::Json(json!({"user_ids": [5]})))
        .with_status(200)
        .create_async()
        .await;
    let all = server
        .mock("POST", "/tasks/4/remind")
        .match_body(Matcher::Json(json!({})))
        .with_status(200)
        .create_async()
        .await;

    let (client, _) = client_for(&server, Some("abc"));
    client.tasks().remind(4, Some(&[5])).await.unwrap();
    client.tasks().remind(4, None).await.unwrap();
    some.assert_async().await;
    all.assert_async().await;
}

#[tokio::test]
async fn test_delete_with_empty_response_returns_null() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/tasks/4")
        .with_status(204)
        .create_async()
        .await;

    let (client, _) = client_for(&server, Some("abc"));
    assert_eq!(client.tasks().delete(4).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_upload_attachments_as_multipart_put_override() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/tasks/4")
        .match_header("authorization", "Bearer abc")
        .match_header("content-type", Matcher::Regex("^multipart/form-data; boundary=".to_string()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="_method"\r\n\r\nPUT\r\n"#.to_string()),
            Matcher::Regex(r#"name="attachments\[\]"; filename="a.txt""#.to_string()),
            Matcher::Regex(r#"name="attachments\[\]"; filename="b.csv""#.to_string()),
            Matcher::Regex("hello".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"task": {"id": 4, "attachments": [{"id": 1}, {"id": 2}]}}"#)
        .create_async()
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let on_progress: ProgressFn = Arc::new(move |p: Option<u8>| sink.lock().unwrap().push(p));

    let files = vec![
        Attachment::new("a.txt", b"hello".to_vec()),
        Attachment::new("b.csv", b"x,y\n".to_vec()).with_mime_type("text/csv"),
    ];

    let (client, _) = client_for(&server, Some("abc"));
    let task = client
        .tasks()
        .upload_attachments(4, files, Some(on_progress))
        .await
        .unwrap();

    assert_eq!(task["attachments"].as_array().map(Vec::len), Some(2));
    mock.assert_async().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], Some(56));
    assert_eq!(seen.last(), Some(&Some(100)));
}
