// File: tests/client_core.rs
// Wire-level tests for the REST client against a mock server.
use mockito::{Matcher, Server};
use tablo::client::{BoardClient, GatewayError, MoveGateway};
use tablo::model::{CardStatus, Priority};

fn client_for(server: &Server) -> BoardClient {
    BoardClient::new(&server.url(), "user", "pass", None, true)
        .expect("client builds against the mock server")
}

#[tokio::test]
async fn get_boards_parses_the_summary_list() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/boards")
        .with_status(200)
        .with_body(
            r#"[
                {"id": "b1", "name": "Sprint 12", "description": "Current sprint", "members": 4},
                {"_id": "b2", "name": "Backlog"}
            ]"#,
        )
        .create_async()
        .await;

    let boards = client_for(&server)
        .get_boards()
        .await
        .expect("summary list parses");

    m.assert();
    assert_eq!(boards.len(), 2);
    assert_eq!(boards[0].id, "b1");
    assert_eq!(boards[0].members, Some(4));
    // Legacy servers still send Mongo-style "_id".
    assert_eq!(boards[1].id, "b2");
    assert_eq!(boards[1].description, "");
}

#[tokio::test]
async fn get_board_parses_columns_and_cards() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/boards/b1")
        .with_status(200)
        .with_body(
            r#"{
                "id": "b1", "name": "Sprint 12",
                "columns": [
                    {"id": "col-2", "name": "Doing", "order": 1, "cards": []},
                    {"id": "col-1", "name": "To Do", "order": 0, "wip": 3, "cards": [
                        {"id": "card-1", "title": "Write tests", "columnId": "col-1",
                         "priority": "HIGH", "status": "On Track"}
                    ]}
                ]
            }"#,
        )
        .create_async()
        .await;

    let board = client_for(&server)
        .get_board("b1")
        .await
        .expect("board parses");

    m.assert();
    // The client hands back the wire order; sorting is the store's job.
    assert_eq!(board.columns[0].id, "col-2");
    assert_eq!(board.columns[1].wip_limit, Some(3));
    let card = &board.columns[1].cards[0];
    assert_eq!(card.priority, Some(Priority::High));
    assert_eq!(card.status, Some(CardStatus::OnTrack));
}

#[tokio::test]
async fn move_card_patches_the_new_position() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("PATCH", "/cards/card-9/move")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(serde_json::json!({
            "newColumnId": "col-2",
            "newPosition": 3
        })))
        .with_status(200)
        .create_async()
        .await;

    client_for(&server)
        .move_card("card-9", "col-1", "col-2", 3)
        .await
        .expect("move accepted");

    m.assert();
}

#[tokio::test]
async fn server_refusal_carries_status_and_body_snippet() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("PATCH", "/cards/card-9/move")
        .with_status(500)
        .with_body("database on fire")
        .create_async()
        .await;

    let err = client_for(&server)
        .move_card("card-9", "col-1", "col-2", 0)
        .await
        .expect_err("a 500 is an error");

    m.assert();
    match err {
        GatewayError::Http { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("database on fire"));
        }
        other => panic!("expected an http error, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/boards")
        .with_status(200)
        .with_body("<html>proxy login page</html>")
        .create_async()
        .await;

    let err = client_for(&server)
        .get_boards()
        .await
        .expect_err("garbage body cannot parse");

    assert!(matches!(err, GatewayError::Decode(_)));
}

#[tokio::test]
async fn an_offline_client_never_touches_the_network() {
    let client =
        BoardClient::new("", "", "", None, false).expect("empty url builds an offline client");

    assert!(!client.is_online());
    assert!(matches!(
        client.get_boards().await,
        Err(GatewayError::Offline)
    ));
    assert!(matches!(
        client.move_card("card-1", "col-a", "col-b", 0).await,
        Err(GatewayError::Offline)
    ));
}

#[tokio::test]
async fn requests_carry_basic_auth_agent_and_accept() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/boards")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .match_header("user-agent", concat!("tablo/", env!("CARGO_PKG_VERSION")))
        .match_header("accept", "application/json")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    client_for(&server).get_boards().await.expect("list parses");
    m.assert();
}

#[tokio::test]
async fn a_token_switches_auth_to_bearer() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/boards")
        .match_header("authorization", "Bearer sekrit")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = BoardClient::new(&server.url(), "user", "pass", Some("sekrit"), true)
        .expect("client builds");
    client.get_boards().await.expect("list parses");
    m.assert();
}

#[tokio::test]
async fn create_card_posts_into_the_column() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("POST", "/cards/col-1")
        .match_body(Matcher::Json(serde_json::json!({
            "title": "New card",
            "description": ""
        })))
        .with_status(201)
        .with_body(r#"{"id": "card-77", "title": "New card", "columnId": "col-1"}"#)
        .create_async()
        .await;

    let card = client_for(&server)
        .create_card("col-1", "New card")
        .await
        .expect("card created");

    m.assert();
    assert_eq!(card.id, "card-77");
    assert_eq!(card.column_id, "col-1");
}

#[tokio::test]
async fn reorder_columns_puts_the_id_list() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("PUT", "/boards/b1/columns/reorder")
        .match_body(Matcher::Json(serde_json::json!({
            "columnIds": ["col-2", "col-1"]
        })))
        .with_status(200)
        .create_async()
        .await;

    client_for(&server)
        .reorder_columns("b1", &["col-2".to_string(), "col-1".to_string()])
        .await
        .expect("reorder accepted");
    m.assert();
}
