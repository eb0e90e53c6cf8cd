//! Tests for initial header block handling and header validation resets

use h2_stream::{Reason, Received, State};

use crate::support::{fields, request, stream, MockConnection, Sent};

#[tokio::test]
async fn test_valid_request_headers_accepted() {
    let connection = MockConnection::new(65_535);
    let mut stream = stream(&connection);

    let received = stream
        .receive_headers(
            request(&[("accept", "*/*"), ("cookie", "a=1"), ("cookie", "b=2")]),
            true,
        )
        .await;

    match received {
        Some(Received::Headers { end_stream, body }) => {
            assert!(end_stream);
            assert!(body.is_none(), "no body when the block ends the stream");
        }
        other => panic!("Expected Headers, got {:?}", other),
    }

    let headers = stream.headers().unwrap();
    assert_eq!(headers.pseudo(":method"), Some("POST"));
    assert_eq!(headers.get("accept"), Some("*/*"));
    assert_eq!(headers.get_all("cookie").unwrap().len(), 2);
    assert_eq!(stream.state(), State::HasHeaders);
    assert!(connection.sent().is_empty());
}

#[tokio::test]
async fn test_headers_without_end_stream_open_a_body() {
    let connection = MockConnection::new(65_535);
    let mut stream = stream(&connection);

    let received = stream.receive_headers(request(&[]), false).await;

    match received {
        Some(Received::Headers { end_stream, body }) => {
            assert!(!end_stream);
            assert!(body.is_some());
        }
        other => panic!("Expected Headers, got {:?}", other),
    }
    assert!(stream.is_receiving());
}

#[tokio::test]
async fn test_connection_header_resets_stream() {
    let connection = MockConnection::new(65_535);
    let mut stream = stream(&connection);

    let received = stream
        .receive_headers(fields(&[("connection", "keep-alive")]), false)
        .await;

    assert!(received.is_none(), "no headers-received event");
    assert_eq!(connection.sent(), vec![Sent::Reset(Reason::PROTOCOL_ERROR)]);
    assert!(stream.headers().is_none());
    assert!(stream.is_closed());
}

#[tokio::test]
async fn test_upper_case_header_resets_stream() {
    for name in ["Content-Type", "x-Request-Id", "ACCEPT"] {
        let connection = MockConnection::new(65_535);
        let mut stream = stream(&connection);

        let received = stream.receive_headers(fields(&[(name, "text/plain")]), true).await;

        assert!(received.is_none(), "{} should be rejected", name);
        assert_eq!(connection.resets(), vec![Reason::PROTOCOL_ERROR]);
        assert!(stream.headers().is_none());
    }
}

#[tokio::test]
async fn test_invalid_field_after_valid_ones_adds_nothing() {
    let connection = MockConnection::new(65_535);
    let mut stream = stream(&connection);

    let received = stream
        .receive_headers(request(&[("accept", "*/*"), ("connection", "close")]), false)
        .await;

    assert!(received.is_none());
    assert!(stream.headers().is_none());
    assert!(!stream.is_receiving());
    assert_eq!(connection.resets(), vec![Reason::PROTOCOL_ERROR]);
}

#[tokio::test]
async fn test_unknown_pseudo_header_resets_stream() {
    let connection = MockConnection::new(65_535);
    let mut stream = stream(&connection);

    stream
        .receive_headers(fields(&[(":method", "GET"), (":bogus", "1")]), true)
        .await;

    assert_eq!(connection.resets(), vec![Reason::PROTOCOL_ERROR]);
}

#[tokio::test]
async fn test_pseudo_header_after_regular_field_resets_stream() {
    let connection = MockConnection::new(65_535);
    let mut stream = stream(&connection);

    stream
        .receive_headers(fields(&[("accept", "*/*"), (":path", "/")]), true)
        .await;

    assert_eq!(connection.resets(), vec![Reason::PROTOCOL_ERROR]);
}

#[tokio::test]
async fn test_pseudo_header_in_later_block_resets_stream() {
    let connection = MockConnection::new(65_535);
    let mut stream = stream(&connection);

    stream
        .receive_headers(request(&[("trailers", "x-checksum")]), false)
        .await
        .unwrap();
    let received = stream.receive_headers(fields(&[(":path", "/other")]), true).await;

    assert!(received.is_none());
    assert_eq!(connection.resets(), vec![Reason::PROTOCOL_ERROR]);
    assert!(stream.headers().unwrap().pseudo(":path") == Some("/"));
}

#[tokio::test]
async fn test_header_block_on_closed_stream_ignored() {
    let connection = MockConnection::new(65_535);
    let mut stream = stream(&connection);
    stream.close(None).await;

    let received = stream.receive_headers(request(&[]), true).await;

    assert!(received.is_none());
    assert!(connection.sent().is_empty());
    assert!(stream.headers().is_none());
}
