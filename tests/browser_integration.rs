use std::sync::Arc;
use std::time::Duration;
use tab_retitle::engine::{PromptChoice, RecordingEditor, ScriptedPrompt};
use tab_retitle::{
    BrowserSession, Document, EngineConfig, LaunchOptions, MemoryRuleStore, NavigationEvent, RuleDraft, RuleEngine,
    RuleState,
};

fn launch() -> BrowserSession {
    BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser")
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Chrome to be installed
async fn test_tab_document_reads_and_sets_title() {
    let session = launch();
    session
        .navigate("data:text/html,<html><head><title>Before</title></head><body><h1 id='order'> 42 </h1></body></html>")
        .expect("Failed to navigate");

    let document = session.document().await.expect("Failed to attach document");
    assert_eq!(document.title().await.unwrap(), "Before");
    assert_eq!(document.query_text("#order").await.unwrap().as_deref(), Some(" 42 "));
    assert_eq!(document.query_text("#missing").await.unwrap(), None);

    document.set_title("After").await.unwrap();
    assert_eq!(document.title().await.unwrap(), "After");
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn test_engine_waits_for_late_content_in_tab() {
    let session = launch();
    let page = "data:text/html,<html><head><title>Loading</title></head><body>\
        <script>setTimeout(function(){var s=document.createElement('span');s.id='order-id';\
        s.textContent='1337';document.body.appendChild(s);},300);</script></body></html>";
    let url = session.navigate(page).expect("Failed to navigate");

    let rule = RuleDraft::new("startsWith", "data:text/html", "Order {{order}}")
        .selector("order", "#order-id")
        .into_rule()
        .unwrap();
    let engine = RuleEngine::new(
        Arc::new(MemoryRuleStore::with_rules(vec![rule.clone()])),
        Arc::new(ScriptedPrompt::always(PromptChoice::Confirm)),
        Arc::new(RecordingEditor::new()),
        EngineConfig::default().extraction_timeout(Duration::from_secs(10)),
    );

    let document = session.document().await.expect("Failed to attach document");
    let report = engine.on_navigation(&NavigationEvent::complete(url), &document).await.unwrap();

    assert_eq!(report.state_of(&rule.id), Some(RuleState::Verified));
    assert_eq!(document.title().await.unwrap(), "Order 1337");
}
