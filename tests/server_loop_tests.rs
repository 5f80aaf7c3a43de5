//! Server loop driven over in-memory pipes.

use mcp_stdio_tools::config::ServerConfig;
use mcp_stdio_tools::protocol::{JsonRpcResponse, RpcId};
use mcp_stdio_tools::server::McpServer;

async fn run(input: &str) -> Vec<JsonRpcResponse> {
    let tmp = tempfile::tempdir().unwrap();
    let server = McpServer::new(ServerConfig::new(tmp.path()));

    let mut out = Vec::new();
    server.serve(input.as_bytes(), &mut out).await.unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.is_empty() || text.ends_with('\n'), "frames are newline-terminated");
    text.lines()
        .map(|line| serde_json::from_str(line).expect("each output line is one JSON response"))
        .collect()
}

#[tokio::test]
async fn one_response_per_request_in_order() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#, "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}"#, "\n",
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"echo","arguments":{"text":"hi"}}}"#, "\n",
    );

    let responses = run(input).await;

    let ids: Vec<_> = responses.iter().map(|r| r.id.clone()).collect();
    assert_eq!(
        ids,
        vec![Some(RpcId::Number(1)), Some(RpcId::Number(2)), Some(RpcId::Number(3))]
    );
    for resp in &responses {
        assert!(resp.result.is_some() ^ resp.error.is_some());
    }
}

#[tokio::test]
async fn blank_and_malformed_lines_are_skipped() {
    let input = concat!(
        "\n",
        "   \n",
        "this is not json\n",
        "{\"id\": 1, \"method\": \n",
        r#"{"id":7,"method":"ping"}"#, "\n",
    );

    let responses = run(input).await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].id, Some(RpcId::Number(7)));
}

#[tokio::test]
async fn errors_do_not_stop_the_loop() {
    let input = concat!(
        r#"{"id":1,"method":"no/such/method"}"#, "\n",
        r#"{"id":2,"method":"tools/call","params":{"name":"search_files","arguments":{"pattern":"("}}}"#, "\n",
        r#"{"id":3,"method":"tools/call","params":{"name":"ghost"}}"#, "\n",
        r#"{"id":4,"method":"ping"}"#, "\n",
    );

    let responses = run(input).await;

    let codes: Vec<Option<i32>> = responses
        .iter()
        .map(|r| r.error.as_ref().map(|e| e.code))
        .collect();
    assert_eq!(codes, vec![Some(-32601), Some(-32602), Some(-32602), None]);
}

#[tokio::test]
async fn final_line_without_newline_is_served() {
    let responses = run(r#"{"id":"last","method":"ping"}"#).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].id, Some(RpcId::Str("last".into())));
}

#[tokio::test]
async fn empty_input_exits_cleanly_without_output() {
    assert!(run("").await.is_empty());
}

#[tokio::test]
async fn oversized_line_is_skipped() {
    let huge = format!(
        r#"{{"id":1,"method":"tools/call","params":{{"name":"echo","arguments":{{"text":"{}"}}}}}}"#,
        "x".repeat(mcp_stdio_tools::transport::MAX_MESSAGE_BYTES)
    );
    let input = format!("{huge}\n{}\n", r#"{"id":2,"method":"ping"}"#);

    let responses = run(&input).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].id, Some(RpcId::Number(2)));
}

#[tokio::test]
async fn error_responses_carry_null_id_when_unrecoverable() {
    let responses = run("[1,2,3]\n").await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].id, None);
    assert_eq!(responses[0].error.as_ref().unwrap().code, -32600);
}
