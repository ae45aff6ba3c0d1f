// Integration tests for `JiraClient` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jira_api::{AssigneeFilter, Error, JiraClient, JiraConfig, Mention, NewIssue};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> JiraConfig {
    JiraConfig {
        base_url: server.uri(),
        email: "dev@example.com".into(),
        api_token: SecretString::from("secret-token".to_string()),
    }
}

async fn setup() -> (MockServer, JiraClient) {
    let server = MockServer::start().await;
    let client = JiraClient::new();
    client.initialize(&config_for(&server)).unwrap();
    (server, client)
}

fn issue_body(key: &str, assignee: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "10001",
        "key": key,
        "fields": {
            "summary": "Fix the flux capacitor",
            "assignee": assignee,
        }
    })
}

// ── Session lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn resource_call_before_initialize_fails() {
    let client = JiraClient::new();
    let result = client.get_boards(0, 50, None).await;
    assert!(matches!(result, Err(Error::NotInitialized)));
}

#[tokio::test]
async fn requests_carry_basic_auth_and_json_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/myself"))
        .and(header(
            "Authorization",
            "Basic ZGV2QGV4YW1wbGUuY29tOnNlY3JldC10b2tlbg==",
        ))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "557058:abc",
            "displayName": "Dev"
        })))
        .mount(&server)
        .await;

    let me = client.get_current_user().await.unwrap();
    assert_eq!(me["accountId"], "557058:abc");
}

#[tokio::test]
async fn test_connection_reports_success_and_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/myself"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    assert!(!client.test_connection().await);

    Mock::given(method("GET"))
        .and(path("/rest/api/3/myself"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accountId": "x"})))
        .mount(&server)
        .await;
    assert!(client.test_connection().await);
}

#[tokio::test]
async fn reset_clears_session_and_cache() {
    let (server, client) = setup().await;

    // Two transport calls expected: pre-reset read + post-reinit read.
    // A surviving cache entry would make the second read a (wrong) hit.
    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"id": 1, "name": "Dev board"}],
            "total": 1,
            "isLast": true
        })))
        .expect(2)
        .mount(&server)
        .await;

    client.get_boards(0, 50, None).await.unwrap();

    client.reset();
    let result = client.get_boards(0, 50, None).await;
    assert!(matches!(result, Err(Error::NotInitialized)));

    client.initialize(&config_for(&server)).unwrap();
    let page = client.get_boards(0, 50, None).await.unwrap();
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn reinitialize_clears_cache() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [], "total": 0, "isLast": true
        })))
        .expect(2)
        .mount(&server)
        .await;

    client.get_boards(0, 50, None).await.unwrap();
    client.initialize(&config_for(&server)).unwrap();
    client.get_boards(0, 50, None).await.unwrap();
}

// ── Caching & deduplication ─────────────────────────────────────────

#[tokio::test]
async fn repeated_board_read_within_ttl_hits_cache() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board"))
        .and(query_param("startAt", "0"))
        .and(query_param("maxResults", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"id": 1, "name": "Dev board", "type": "scrum"}],
            "total": 1,
            "isLast": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let first = client.get_boards(0, 50, None).await.unwrap();
    let second = client.get_boards(0, 50, None).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.items[0]["name"], "Dev board");
    assert_eq!(first.total, 1);
    assert!(first.is_last);
}

#[tokio::test]
async fn concurrent_identical_reads_share_one_transport_call() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(issue_body("PROJ-1", json!(null)))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (a, b, c) = tokio::join!(
        client.get_issue_details("PROJ-1"),
        client.get_issue_details("PROJ-1"),
        client.get_issue_details("PROJ-1"),
    );

    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(a["key"], "PROJ-1");
}

#[tokio::test]
async fn comments_are_always_fetched_fresh() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-1/comment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "comments": [{"id": "100", "body": {}}],
            "total": 1
        })))
        .expect(2)
        .mount(&server)
        .await;

    let first = client.get_issue_comments("PROJ-1").await.unwrap();
    let second = client.get_issue_comments("PROJ-1").await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}

// ── Mutations & invalidation ────────────────────────────────────────

#[tokio::test]
async fn field_update_invalidates_issue_detail() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(issue_body("PROJ-1", json!(null))),
        )
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/PROJ-1"))
        .and(body_json(json!({ "fields": { "summary": "New title" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.get_issue_details("PROJ-1").await.unwrap();

    // Within the 2-minute TTL; only the invalidation forces the refetch.
    client
        .update_issue_field("PROJ-1", json!({ "summary": "New title" }))
        .await
        .unwrap();

    client.get_issue_details("PROJ-1").await.unwrap();
}

#[tokio::test]
async fn unassign_round_trip_reflects_no_assignee() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue_body(
            "PROJ-1",
            json!({"accountId": "557058:abc", "displayName": "Ada"}),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let before = client.get_issue_details("PROJ-1").await.unwrap();
    assert_eq!(before["fields"]["assignee"]["accountId"], "557058:abc");

    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/PROJ-1/assignee"))
        .and(body_json(json!({ "accountId": null })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.assign_issue("PROJ-1", None).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(issue_body("PROJ-1", json!(null))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let after = client.get_issue_details("PROJ-1").await.unwrap();
    assert!(after["fields"]["assignee"].is_null());
}

#[tokio::test]
async fn transition_issue_posts_transition_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-1/transitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transitions": [
                {"id": "21", "name": "In Progress", "to": {"id": "3"}},
                {"id": "31", "name": "Done", "to": {"id": "5"}}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/PROJ-1/transitions"))
        .and(body_json(json!({ "transition": { "id": "31" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let transitions = client.get_available_transitions("PROJ-1").await.unwrap();
    assert_eq!(transitions.len(), 2);

    client.transition_issue("PROJ-1", "31").await.unwrap();
}

// ── Boards & sprints ────────────────────────────────────────────────

#[tokio::test]
async fn board_not_found_resolves_to_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errorMessages": ["Board does not exist or you do not have permission to view it."]
        })))
        .mount(&server)
        .await;

    let board = client.get_board_by_id(999).await.unwrap();
    assert!(board.is_none());
}

#[tokio::test]
async fn sprints_unsupported_board_resolves_to_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board/7/sprint"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorMessages": ["The board does not support sprints"]
        })))
        .mount(&server)
        .await;

    let sprints = client.get_sprints_for_board(7).await.unwrap();
    assert!(sprints.is_empty());
}

#[tokio::test]
async fn backlog_unassigned_filter_maps_to_jql_sentinel() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board/3/backlog"))
        .and(query_param("jql", "assignee is EMPTY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issues": [issue_body("PROJ-9", json!(null))],
            "total": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issues = client
        .get_backlog_issues(3, &AssigneeFilter::Unassigned)
        .await
        .unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["key"], "PROJ-9");
}

#[tokio::test]
async fn sprint_issues_user_filter_quotes_account_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board/3/sprint/42/issue"))
        .and(query_param("jql", "assignee = \"557058:abc\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "issues": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let issues = client
        .get_sprint_issues(3, 42, &AssigneeFilter::User("557058:abc".into()))
        .await
        .unwrap();
    assert!(issues.is_empty());
}

#[tokio::test]
async fn move_to_backlog_clears_sprint_field() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/PROJ-1"))
        .and(body_json(json!({ "fields": { "sprint": null } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.move_issue_to_sprint("PROJ-1", None).await.unwrap();
}

#[tokio::test]
async fn complete_sprint_closes_and_invalidates_sprint_caches() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board/3/sprint"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"id": 42, "state": "active"}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/agile/1.0/sprint/42"))
        .and(body_json(json!({ "state": "closed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42, "state": "closed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.get_sprints_for_board(3).await.unwrap();
    client.complete_sprint(42).await.unwrap();
    // Sprint cache was purged; this read goes back to transport.
    client.get_sprints_for_board(3).await.unwrap();
}

// ── Issue creation ──────────────────────────────────────────────────

#[tokio::test]
async fn create_issue_assembles_field_payload() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .and(body_partial_json(json!({
            "fields": {
                "project": { "id": "10000" },
                "summary": "New widget",
                "issuetype": { "id": "10001" },
                "assignee": { "accountId": "557058:abc" },
                "priority": { "id": "2" },
                "duedate": "2026-09-15"
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "10042", "key": "PROJ-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let input = NewIssue {
        summary: "New widget".into(),
        issue_type_id: "10001".into(),
        description: Some("Build the widget".into()),
        assignee_account_id: Some("557058:abc".into()),
        priority_id: Some("2".into()),
        due_date: Some("2026-09-15".into()),
        sprint_id: None,
    };

    let created = client.create_issue("10000", &input).await.unwrap();
    assert_eq!(created["key"], "PROJ-42");
}

#[tokio::test]
async fn create_issue_sprint_attach_failure_is_swallowed() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "10042", "key": "PROJ-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/agile/1.0/sprint/42/issue"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let input = NewIssue {
        summary: "New widget".into(),
        issue_type_id: "10001".into(),
        sprint_id: Some(42),
        ..NewIssue::default()
    };

    // Sprint attach fails, creation still resolves.
    let created = client.create_issue("10000", &input).await.unwrap();
    assert_eq!(created["key"], "PROJ-42");
}

// ── Comments ────────────────────────────────────────────────────────

#[tokio::test]
async fn add_comment_builds_adf_body_with_mention_and_parent() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/PROJ-1/comment"))
        .and(body_partial_json(json!({
            "parentId": "100",
            "body": {
                "type": "doc",
                "version": 1,
                "content": [{
                    "type": "paragraph",
                    "content": [
                        {
                            "type": "mention",
                            "attrs": { "id": "557058:abc", "text": "@Ada" }
                        },
                        { "type": "text", "text": " agreed, let's do that" }
                    ]
                }]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "101" })))
        .expect(1)
        .mount(&server)
        .await;

    let mention = Mention {
        account_id: "557058:abc".into(),
        display_name: "Ada".into(),
    };
    let created = client
        .add_comment("PROJ-1", "agreed, let's do that", Some("100"), Some(&mention))
        .await
        .unwrap();
    assert_eq!(created["id"], "101");
}

#[tokio::test]
async fn delete_comment_hits_delete_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/api/3/issue/PROJ-1/comment/100"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_comment("PROJ-1", "100").await.unwrap();
}

// ── Supplementary reads ─────────────────────────────────────────────

#[tokio::test]
async fn remote_links_degrade_to_empty_on_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-1/remotelink"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let links = client.get_remote_links("PROJ-1").await.unwrap();
    assert!(links.data.is_empty());
    assert!(links.degraded);
}

#[tokio::test]
async fn issue_links_read_from_issue_fields() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-1"))
        .and(query_param("fields", "issuelinks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "PROJ-1",
            "fields": {
                "issuelinks": [{"id": "500", "type": {"name": "Blocks"}}]
            }
        })))
        .mount(&server)
        .await;

    let links = client.get_issue_links("PROJ-1").await.unwrap();
    assert!(!links.degraded);
    assert_eq!(links.data.len(), 1);
    assert_eq!(links.data[0]["type"]["name"], "Blocks");
}

#[tokio::test]
async fn board_assignees_deduplicate_by_account_id() {
    let (server, client) = setup().await;

    let ada = json!({"accountId": "a1", "displayName": "Ada"});
    let grace = json!({"accountId": "g1", "displayName": "Grace"});

    Mock::given(method("GET"))
        .and(path("/rest/agile/1.0/board/3/issue"))
        .and(query_param("fields", "assignee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issues": [
                {"key": "PROJ-1", "fields": {"assignee": ada}},
                {"key": "PROJ-2", "fields": {"assignee": grace}},
                {"key": "PROJ-3", "fields": {"assignee": ada}},
                {"key": "PROJ-4", "fields": {"assignee": null}},
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let assignees = client.get_board_assignees(3).await.unwrap();
    assert!(!assignees.degraded);
    assert_eq!(assignees.data.len(), 2);
}

#[tokio::test]
async fn priorities_before_initialize_still_fail() {
    let client = JiraClient::new();
    let result = client.get_priorities().await;
    assert!(matches!(result, Err(Error::NotInitialized)));
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn backend_error_messages_are_surfaced() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errorMessages": ["Issue does not exist or you do not have permission to see it."],
            "errors": {}
        })))
        .mount(&server)
        .await;

    let result = client.get_issue_details("PROJ-404").await;
    match result {
        Err(Error::Http {
            status,
            ref messages,
        }) => {
            assert_eq!(status, 404);
            assert_eq!(messages.len(), 1);
            assert!(messages[0].contains("does not exist"));
        }
        other => panic!("expected Http 404, got: {other:?}"),
    }
}

#[tokio::test]
async fn field_errors_map_is_flattened_into_messages() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/PROJ-1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorMessages": [],
            "errors": { "priority": "Priority is required." }
        })))
        .mount(&server)
        .await;

    let result = client
        .update_issue_field("PROJ-1", json!({ "priority": null }))
        .await;
    match result {
        Err(Error::Http { status, messages }) => {
            assert_eq!(status, 400);
            assert_eq!(messages, vec!["priority: Priority is required."]);
        }
        other => panic!("expected Http 400, got: {other:?}"),
    }
}

#[tokio::test]
async fn cancel_pending_requests_aborts_in_flight_calls() {
    let (server, client) = setup().await;
    let client = Arc::new(client);

    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PROJ-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(issue_body("PROJ-1", json!(null)))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let task = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.get_issue_details("PROJ-1").await })
    };

    // Give the request time to get in flight, then abort it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.cancel_pending_requests();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn cancellation_during_body_download_yields_cancelled() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // wiremock delays whole responses only, so stall mid-body by hand:
    // serve the headers plus a partial body, then hold the connection open.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let stalled = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = sock.read(&mut buf).await;
        sock.write_all(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\n\r\n{\"partial\":",
        )
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let client = Arc::new(JiraClient::new());
    client
        .initialize(&JiraConfig {
            base_url,
            email: "dev@example.com".into(),
            api_token: SecretString::from("secret-token".to_string()),
        })
        .unwrap();

    let task = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.get_current_user().await })
    };

    // Headers arrive immediately, so the request is in the body-download
    // phase by now. Aborting here must still surface as Cancelled.
    tokio::time::sleep(Duration::from_millis(200)).await;
    client.cancel_pending_requests();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));
    stalled.abort();
}

// ── Attachments ─────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_attachment_returns_base64_content() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/attachment/content/900"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(b"binary\x00payload".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/attachment/content/900", server.uri());
    let encoded = client.fetch_attachment(&url).await.unwrap();
    // base64("binary\x00payload")
    assert_eq!(encoded, "YmluYXJ5AHBheWxvYWQ=");
}
