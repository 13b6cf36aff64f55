    use super::*;
    use std::time::Duration;

    use tokio::sync::{Semaphore, mpsc};

    use pagemind_protocols::{ReadingLevel, SessionPurpose};

    use crate::chat::CHAT_CHUNK_BUDGET;
    use crate::pipeline::PipelineSettings;
    use crate::retry::{RetryPolicy, RetryingInvoker};
    use crate::sentinel;
    use crate::session_pool::ModelSessionPool;
    use crate::store::MemoryStore;
    use crate::test_support::ScriptedModel;

    const URL: &str = "https://news.example/article";
    const TAB: TabId = TabId(42);

    struct Harness {
        dispatcher: Arc<Dispatcher>,
        pool: Arc<ModelSessionPool>,
    }

    fn harness(scripted: &ScriptedModel) -> Harness {
        let model = scripted.clone().into_arc();
        let pool = Arc::new(ModelSessionPool::new(model.clone()));
        let invoker = Arc::new(RetryingInvoker::new(model, RetryPolicy::default()));
        let state = Arc::new(ExtensionState::new(
            pool.clone(),
            invoker.clone(),
            CHAT_CHUNK_BUDGET,
        ));
        let pipelines = Arc::new(Pipelines::new(
            pool.clone(),
            invoker,
            PipelineSettings::default(),
        ));
        let history = Arc::new(ChatHistory::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(24 * 60 * 60),
        ));
        Harness {
            dispatcher: Arc::new(Dispatcher::new(state, pipelines).with_history(history)),
            pool,
        }
    }

    fn analyze(url: &str) -> Request {
        Request::Analyze {
            tab_id: TAB,
            url: url.to_string(),
            selection: "the selected passage".to_string(),
        }
    }

    async fn wait_for_calls(scripted: &ScriptedModel, n: usize) {
        while scripted.call_count() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_summarize_stores_summary_and_marks_tab() {
        let scripted = ScriptedModel::with_summary_chars(30);
        let h = harness(&scripted);

        let response = h
            .dispatcher
            .handle(Request::Summarize {
                tab_id: TAB,
                url: URL.to_string(),
                content: "An article about memory safety in systems code.".to_string(),
                focus: String::new(),
            })
            .await;

        match response {
            Some(Response::Result { kind, text, .. }) => {
                assert_eq!(kind, OperationKind::Summarizing);
                assert_eq!(text.chars().count(), 30);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let tab = h.dispatcher.state().get(TAB).unwrap();
        assert!(tab.operations().is_summarized());
        assert!(tab.summary().is_some());
        assert_eq!(h.pool.live_total(), 0);

        match h.dispatcher.handle(Request::OperationStatus { tab_id: TAB, url: URL.to_string() }).await {
            Some(Response::Status { flags, .. }) => {
                assert!(flags.summarized);
                assert!(flags.all_idle);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_analyze_uses_page_summary() {
        let scripted = ScriptedModel::with_summary_chars(15);
        let h = harness(&scripted);
        h.dispatcher
            .handle(Request::Summarize {
                tab_id: TAB,
                url: URL.to_string(),
                content: "Some article text with several words.".to_string(),
                focus: String::new(),
            })
            .await;

        h.dispatcher.handle(analyze(URL)).await;

        let calls = scripted.calls();
        let analyze_call = calls
            .iter()
            .find(|c| c.purpose == SessionPurpose::Analyze)
            .unwrap();
        assert!(analyze_call.input.contains("Page summary:"));
    }

    #[tokio::test]
    async fn test_duplicate_analyze_is_dropped() {
        let gate = Arc::new(Semaphore::new(0));
        let scripted = ScriptedModel::gated(gate.clone());
        let h = harness(&scripted);

        let first = tokio::spawn({
            let dispatcher = h.dispatcher.clone();
            async move { dispatcher.handle(analyze(URL)).await }
        });
        wait_for_calls(&scripted, 1).await;

        let second = h.dispatcher.handle(analyze(URL)).await;
        assert!(second.is_none());

        gate.add_permits(1);
        let first = first.await.unwrap();
        assert!(matches!(
            first,
            Some(Response::Result {
                kind: OperationKind::Analyzing,
                ..
            })
        ));
        assert_eq!(scripted.calls_for(SessionPurpose::Analyze), 1);
        assert_eq!(h.pool.live_total(), 0);
    }

    #[tokio::test]
    async fn test_different_kinds_run_concurrently() {
        let gate = Arc::new(Semaphore::new(0));
        let scripted = ScriptedModel::gated(gate.clone());
        let h = harness(&scripted);

        let analyzing = tokio::spawn({
            let dispatcher = h.dispatcher.clone();
            async move { dispatcher.handle(analyze(URL)).await }
        });
        wait_for_calls(&scripted, 1).await;

        let defining = tokio::spawn({
            let dispatcher = h.dispatcher.clone();
            async move {
                dispatcher
                    .handle(Request::Define {
                        tab_id: TAB,
                        url: URL.to_string(),
                        term: "borrow".to_string(),
                    })
                    .await
            }
        });
        wait_for_calls(&scripted, 2).await;

        gate.add_permits(2);
        assert!(analyzing.await.unwrap().is_some());
        assert!(defining.await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_navigation_drops_stale_result() {
        let gate = Arc::new(Semaphore::new(0));
        let scripted = ScriptedModel::gated(gate.clone());
        let h = harness(&scripted);

        let running = tokio::spawn({
            let dispatcher = h.dispatcher.clone();
            async move { dispatcher.handle(analyze(URL)).await }
        });
        wait_for_calls(&scripted, 1).await;

        let status = h
            .dispatcher
            .handle(Request::OperationStatus {
                tab_id: TAB,
                url: "https://news.example/other".to_string(),
            })
            .await;
        match status {
            Some(Response::Status { flags, .. }) => assert!(flags.all_idle),
            other => panic!("unexpected response: {:?}", other),
        }

        gate.add_permits(1);
        assert!(running.await.unwrap().is_none());
        assert_eq!(h.pool.live_total(), 0);
    }

    #[tokio::test]
    async fn test_tab_closed_removes_context() {
        let scripted = ScriptedModel::new();
        let h = harness(&scripted);
        h.dispatcher.handle(analyze(URL)).await;
        assert_eq!(h.dispatcher.state().len(), 1);

        let response = h.dispatcher.handle(Request::TabClosed { tab_id: TAB }).await;

        assert_eq!(response, Some(Response::Ack { tab_id: TAB }));
        assert!(h.dispatcher.state().is_empty());
    }

    #[tokio::test]
    async fn test_chat_flow_persists_history() {
        let scripted = ScriptedModel::new();
        let h = harness(&scripted);

        let ready = h
            .dispatcher
            .handle(Request::PageLoaded {
                tab_id: TAB,
                url: URL.to_string(),
                content: "The article explains ownership and borrowing in Rust.".to_string(),
            })
            .await;
        assert_eq!(
            ready,
            Some(Response::Result {
                tab_id: TAB,
                kind: OperationKind::Initializing,
                text: CHAT_READY.to_string(),
            })
        );

        let reply = h
            .dispatcher
            .handle(Request::Chat {
                tab_id: TAB,
                url: URL.to_string(),
                query: "What is borrowing?".to_string(),
            })
            .await;
        assert!(matches!(reply, Some(Response::ChatReply { .. })));

        match h.dispatcher.handle(Request::ChatHistory { tab_id: TAB, url: URL.to_string() }).await {
            Some(Response::History { turns, .. }) => {
                assert_eq!(turns.len(), 2);
                assert_eq!(turns[0].role, ChatRole::User);
                assert_eq!(turns[0].text, "What is borrowing?");
                assert_eq!(turns[1].role, ChatRole::Assistant);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_before_page_loaded() {
        let scripted = ScriptedModel::new();
        let h = harness(&scripted);

        let reply = h
            .dispatcher
            .handle(Request::Chat {
                tab_id: TAB,
                url: URL.to_string(),
                query: "Hello?".to_string(),
            })
            .await;

        assert_eq!(
            reply,
            Some(Response::ChatReply {
                tab_id: TAB,
                text: sentinel::CHAT_NOT_INITIALIZED.to_string(),
            })
        );
        match h.dispatcher.handle(Request::ChatHistory { tab_id: TAB, url: URL.to_string() }).await {
            Some(Response::History { turns, .. }) => assert!(turns.is_empty()),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_errors_are_sent_as_progress() {
        let scripted = ScriptedModel::new();
        scripted.fail_next(1);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let model = scripted.clone().into_arc();
        let pool = Arc::new(ModelSessionPool::new(model.clone()));
        let invoker = Arc::new(RetryingInvoker::new(model, RetryPolicy::default()));
        let state = Arc::new(ExtensionState::new(pool.clone(), invoker.clone(), CHAT_CHUNK_BUDGET));
        let pipelines = Arc::new(Pipelines::new(pool, invoker, PipelineSettings::default()));
        let dispatcher = Dispatcher::new(state, pipelines).with_progress(tx);

        let response = dispatcher
            .handle(Request::Rewrite {
                tab_id: TAB,
                url: URL.to_string(),
                text: "A hard sentence to read.".to_string(),
                level: ReadingLevel::Elementary,
            })
            .await;

        assert!(matches!(response, Some(Response::Result { .. })));
        match rx.try_recv() {
            Ok(Response::Progress { tab_id, kind, message }) => {
                assert_eq!(tab_id, TAB);
                assert_eq!(kind, Some(OperationKind::Rewriting));
                assert!(message.starts_with("Attempt 1 failed"));
            }
            other => panic!("unexpected progress: {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }
