use super::*;
use serde_json::json;

#[test]
fn test_parse_summarize_request() {
    let request: Request = serde_json::from_value(json!({
        "action": "summarize",
        "tabId": 7,
        "url": "https://example.com/a",
        "content": "Some page text here"
    }))
    .unwrap();

    assert_eq!(request.tab_id(), TabId(7));
    assert_eq!(request.url(), Some("https://example.com/a"));
    assert_eq!(request.kind(), Some(OperationKind::Summarizing));
    match request {
        Request::Summarize { focus, .. } => assert!(focus.is_empty()),
        other => panic!("unexpected request: {:?}", other),
    }
}

#[test]
fn test_parse_fact_check_request() {
    let request: Request = serde_json::from_value(json!({
        "action": "factCheck",
        "tabId": 1,
        "url": "https://example.com",
        "selection": "The moon is made of cheese."
    }))
    .unwrap();
    assert_eq!(request.kind(), Some(OperationKind::FactChecking));
}

#[test]
fn test_parse_rewrite_default_level() {
    let request: Request = serde_json::from_value(json!({
        "action": "rewrite",
        "tabId": 3,
        "url": "https://example.com",
        "text": "Photosynthesis converts light into chemical energy."
    }))
    .unwrap();
    match request {
        Request::Rewrite { level, .. } => assert_eq!(level, ReadingLevel::MiddleSchool),
        other => panic!("unexpected request: {:?}", other),
    }
}

#[test]
fn test_tab_closed_has_no_url() {
    let request: Request =
        serde_json::from_value(json!({"action": "tabClosed", "tabId": 9})).unwrap();
    assert_eq!(request.url(), None);
    assert_eq!(request.kind(), None);
    assert_eq!(request.tab_id(), TabId(9));
}

#[test]
fn test_unknown_action_is_rejected() {
    let result: Result<Request, _> =
        serde_json::from_value(json!({"action": "explode", "tabId": 1}));
    assert!(result.is_err());
}

#[test]
fn test_chat_requests_are_unguarded() {
    let request = Request::Chat {
        tab_id: TabId(1),
        url: "u".to_string(),
        query: "q".to_string(),
    };
    assert_eq!(request.kind(), None);

    let request = Request::PageLoaded {
        tab_id: TabId(1),
        url: "u".to_string(),
        content: String::new(),
    };
    assert_eq!(request.kind(), Some(OperationKind::Initializing));
}

#[test]
fn test_response_serialization() {
    let response = Response::Result {
        tab_id: TabId(4),
        kind: OperationKind::FactChecking,
        text: "Supported.".to_string(),
    };
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["type"], "result");
    assert_eq!(json["tabId"], 4);
    assert_eq!(json["kind"], "factChecking");

    let progress = Response::Progress {
        tab_id: TabId(4),
        kind: None,
        message: "Attempt 1 failed: boom".to_string(),
    };
    let json = serde_json::to_value(&progress).unwrap();
    assert!(json.get("kind").is_none());
    assert_eq!(progress.tab_id(), TabId(4));
}

#[test]
fn test_operation_flags_serialization() {
    let mut running = BTreeMap::new();
    running.insert(OperationKind::Defining, true);
    let flags = OperationFlags {
        running,
        summarized: false,
        all_idle: false,
    };
    let json = serde_json::to_value(&flags).unwrap();
    assert_eq!(json["running"]["defining"], true);
    assert_eq!(json["allIdle"], false);
}

#[test]
fn test_display() {
    assert_eq!(TabId(12).to_string(), "tab-12");
    assert_eq!(OperationKind::FactChecking.to_string(), "factChecking");
    assert_eq!(OperationKind::ALL.len(), 6);
    assert!(ReadingLevel::Elementary.audience().contains("elementary"));
}
