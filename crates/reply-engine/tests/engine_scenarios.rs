//! End-to-end scenarios for the decision engine, driven through an
//! in-memory database, mock providers, and a recording transport.

use std::sync::Arc;

use database::rule::NewRule;
use database::trigger::NewTrigger;
use database::{chat, peer, quota, rule, settings, trigger, Database, Subject};
use mock_provider::{FailingProvider, StaticProvider};
use provider_core::CompletionProvider;
use reply_engine::{
    DenyReason, EngineConfig, MessageEvent, Outcome, RecordingTransport, ReplyEngine,
    ResponseGenerator,
};

async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

async fn seed(db: &Database, pairs: &[(&str, &str)]) {
    for (key, value) in pairs {
        settings::set_setting(db.pool(), key, value).await.unwrap();
    }
}

fn engine(
    db: &Database,
    transport: &RecordingTransport,
    local: Arc<dyn CompletionProvider>,
    claude: Arc<dyn CompletionProvider>,
    config: EngineConfig,
) -> ReplyEngine {
    ReplyEngine::new(
        db.clone(),
        ResponseGenerator::new(local, claude),
        Arc::new(transport.clone()),
        config,
    )
}

/// Engine whose providers always fail; template paths never touch them.
fn template_engine(db: &Database, transport: &RecordingTransport) -> ReplyEngine {
    engine(
        db,
        transport,
        Arc::new(FailingProvider::new()),
        Arc::new(FailingProvider::new()),
        EngineConfig::default(),
    )
}

fn assert_replied(outcome: &Outcome) -> &str {
    match outcome {
        Outcome::Replied { text, .. } => text,
        other => panic!("expected Replied, got {:?}", other),
    }
}

fn assert_denied(outcome: &Outcome, expected: DenyReason) {
    match outcome {
        Outcome::Denied { reason, .. } => assert_eq!(*reason, expected),
        other => panic!("expected Denied({:?}), got {:?}", expected, other),
    }
}

async fn rule_for_peer(db: &Database, tg_peer_id: i64, mode: &str, min_interval_sec: i64) -> Subject {
    let stored = peer::upsert_peer(
        db.pool(),
        &peer::PeerProfile {
            tg_peer_id,
            username: None,
            first_name: Some("Test".to_string()),
            last_name: None,
            is_bot: false,
        },
    )
    .await
    .unwrap();
    let subject = Subject::peer(stored.id);

    rule::upsert_rule(
        db.pool(),
        &NewRule {
            account_id: 1,
            subject,
            mode: mode.to_string(),
            template: Some("I'll get back to you".to_string()),
            prompt: None,
            min_interval_sec,
            enabled: true,
        },
    )
    .await
    .unwrap();

    subject
}

#[tokio::test]
async fn master_switch_off_skips_everything() {
    let db = test_db().await;
    let transport = RecordingTransport::new();
    let engine = template_engine(&db, &transport);

    rule_for_peer(&db, 500, "template", 0).await;
    let outcome = engine.process(&MessageEvent::private(500, 1, "hello")).await;

    assert!(matches!(outcome, Outcome::Skipped { .. }));
    assert_eq!(transport.sent_count().await, 0);
}

#[tokio::test]
async fn new_contact_cap_allows_five_then_denies() {
    let db = test_db().await;
    seed(
        &db,
        &[
            ("auto_reply_enabled", "1"),
            ("new_contact_mode", "template"),
            ("default_template", "I'm away, back soon"),
            ("new_contact_max_replies", "5"),
        ],
    )
    .await;

    let transport = RecordingTransport::new();
    let engine = template_engine(&db, &transport);

    for message_id in 1..=5 {
        let outcome = engine
            .process(&MessageEvent::private(500, message_id, "are you there?"))
            .await;
        assert_eq!(assert_replied(&outcome), "I'm away, back soon");
    }

    let sixth = engine.process(&MessageEvent::private(500, 6, "hello??")).await;
    assert_denied(&sixth, DenyReason::NewContactLimit);
    assert_eq!(transport.sent_count().await, 5);
}

#[tokio::test]
async fn daily_cap_denies_once_reached() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1"), ("daily_max_replies", "2")]).await;

    let transport = RecordingTransport::new();
    let engine = template_engine(&db, &transport);
    rule_for_peer(&db, 500, "template", 0).await;

    assert_replied(&engine.process(&MessageEvent::private(500, 1, "one")).await);
    assert_replied(&engine.process(&MessageEvent::private(500, 2, "two")).await);

    let third = engine.process(&MessageEvent::private(500, 3, "three")).await;
    assert_denied(&third, DenyReason::DailyLimit);
    assert_eq!(transport.sent_count().await, 2);
}

#[tokio::test]
async fn duplicate_message_never_double_commits() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let transport = RecordingTransport::new();
    let engine = template_engine(&db, &transport);
    let subject = rule_for_peer(&db, 500, "template", 0).await;

    let event = MessageEvent::private(500, 42, "knock knock");
    assert_replied(&engine.process(&event).await);

    let again = engine.process(&event).await;
    assert!(matches!(again, Outcome::Skipped { .. }));

    let state = quota::get_state(db.pool(), 1, &subject).await.unwrap().unwrap();
    assert_eq!(state.replies_today, 1);
    assert_eq!(transport.sent_count().await, 1);
}

#[tokio::test]
async fn explicit_off_rule_beats_personal_default() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let transport = RecordingTransport::new();
    let engine = engine(
        &db,
        &transport,
        Arc::new(StaticProvider::new("ai reply")),
        Arc::new(StaticProvider::new("ai reply")),
        EngineConfig::default(),
    );

    rule_for_peer(&db, 500, "off", 0).await;
    peer::set_personal_members(db.pool(), &[500]).await.unwrap();

    let outcome = engine.process(&MessageEvent::private(500, 1, "hi friend")).await;
    assert!(matches!(outcome, Outcome::Skipped { .. }));
    assert_eq!(transport.sent_count().await, 0);
}

#[tokio::test]
async fn explicit_rule_beats_new_contact_off_default() {
    let db = test_db().await;
    // new_contact_mode defaults to off; the rule must still win.
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let transport = RecordingTransport::new();
    let engine = template_engine(&db, &transport);
    rule_for_peer(&db, 500, "template", 0).await;

    let outcome = engine.process(&MessageEvent::private(500, 1, "hello")).await;
    assert_eq!(assert_replied(&outcome), "I'll get back to you");
}

#[tokio::test]
async fn personal_peer_gets_ai_with_remote_fallback() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1"), ("ai_engine", "local")]).await;

    let transport = RecordingTransport::new();
    let engine = engine(
        &db,
        &transport,
        Arc::new(FailingProvider::with_message("tunnel down")),
        Arc::new(StaticProvider::named("claude", "from the cloud")),
        EngineConfig::default(),
    );

    // Peer must exist before it can be flagged personal.
    peer::upsert_peer(
        db.pool(),
        &peer::PeerProfile {
            tg_peer_id: 500,
            username: None,
            first_name: None,
            last_name: None,
            is_bot: false,
        },
    )
    .await
    .unwrap();
    peer::set_personal_members(db.pool(), &[500]).await.unwrap();

    let outcome = engine.process(&MessageEvent::private(500, 1, "what's up?")).await;
    assert_eq!(assert_replied(&outcome), "from the cloud");
}

#[tokio::test]
async fn generation_failure_consumes_no_quota() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let transport = RecordingTransport::new();
    let engine = engine(
        &db,
        &transport,
        Arc::new(FailingProvider::new()),
        Arc::new(FailingProvider::new()),
        EngineConfig::default(),
    );
    let subject = rule_for_peer(&db, 500, "ai", 0).await;

    let outcome = engine.process(&MessageEvent::private(500, 1, "hello")).await;
    assert!(matches!(outcome, Outcome::Failed { .. }));
    assert!(quota::get_state(db.pool(), 1, &subject).await.unwrap().is_none());
    assert_eq!(transport.sent_count().await, 0);
}

#[tokio::test]
async fn dispatch_failure_consumes_no_quota() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let transport = RecordingTransport::new();
    transport.set_failing(true).await;
    let engine = template_engine(&db, &transport);
    let subject = rule_for_peer(&db, 500, "template", 0).await;

    let outcome = engine.process(&MessageEvent::private(500, 1, "hello")).await;
    assert!(matches!(outcome, Outcome::Failed { .. }));
    assert!(quota::get_state(db.pool(), 1, &subject).await.unwrap().is_none());

    // Quota untouched, so the next message is eligible again.
    transport.set_failing(false).await;
    assert_replied(&engine.process(&MessageEvent::private(500, 2, "hello again")).await);
}

#[tokio::test]
async fn min_interval_gates_consecutive_replies() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let transport = RecordingTransport::new();
    let engine = template_engine(&db, &transport);
    rule_for_peer(&db, 500, "template", 3600).await;

    assert_replied(&engine.process(&MessageEvent::private(500, 1, "first")).await);

    let second = engine.process(&MessageEvent::private(500, 2, "second")).await;
    assert_denied(&second, DenyReason::IntervalNotElapsed);
    assert_eq!(transport.sent_count().await, 1);
}

#[tokio::test]
async fn keyword_trigger_replies_then_cools_down() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let stored = chat::ensure_chat(db.pool(), -100123, Some("Support")).await.unwrap();
    trigger::upsert_trigger(
        db.pool(),
        &NewTrigger {
            chat_id: stored.id,
            kind: "keyword".to_string(),
            keywords: Some(vec!["help".to_string()]),
            probability: None,
            cooldown_sec: 600,
            daily_cap: 50,
            enabled: true,
        },
    )
    .await
    .unwrap();

    let transport = RecordingTransport::new();
    let engine = engine(
        &db,
        &transport,
        Arc::new(StaticProvider::new("how can I help?")),
        Arc::new(FailingProvider::new()),
        EngineConfig::default(),
    );

    let first = engine
        .process(&MessageEvent::group(-100123, 7, 1, "can somebody help me"))
        .await;
    assert_eq!(assert_replied(&first), "how can I help?");

    let second = engine
        .process(&MessageEvent::group(-100123, 8, 2, "yes please help"))
        .await;
    assert_denied(&second, DenyReason::Cooldown);
    assert_eq!(transport.sent_count().await, 1);
}

#[tokio::test]
async fn group_without_matching_trigger_is_skipped() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let stored = chat::ensure_chat(db.pool(), -100123, None).await.unwrap();
    trigger::upsert_trigger(
        db.pool(),
        &NewTrigger {
            chat_id: stored.id,
            kind: "keyword".to_string(),
            keywords: Some(vec!["deploy".to_string()]),
            probability: None,
            cooldown_sec: 0,
            daily_cap: 50,
            enabled: true,
        },
    )
    .await
    .unwrap();

    let transport = RecordingTransport::new();
    let engine = engine(
        &db,
        &transport,
        Arc::new(StaticProvider::new("reply")),
        Arc::new(FailingProvider::new()),
        EngineConfig::default(),
    );

    let outcome = engine
        .process(&MessageEvent::group(-100123, 7, 1, "nothing relevant"))
        .await;
    assert!(matches!(outcome, Outcome::Skipped { .. }));
    assert_eq!(transport.sent_count().await, 0);
}

#[tokio::test]
async fn mention_trigger_uses_configured_username() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let stored = chat::ensure_chat(db.pool(), -100555, None).await.unwrap();
    trigger::upsert_trigger(
        db.pool(),
        &NewTrigger {
            chat_id: stored.id,
            kind: "mention".to_string(),
            keywords: None,
            probability: None,
            cooldown_sec: 0,
            daily_cap: 50,
            enabled: true,
        },
    )
    .await
    .unwrap();

    let transport = RecordingTransport::new();
    let engine = engine(
        &db,
        &transport,
        Arc::new(StaticProvider::new("you rang?")),
        Arc::new(FailingProvider::new()),
        EngineConfig::with_username("mybot"),
    );

    let outcome = engine
        .process(&MessageEvent::group(-100555, 7, 1, "hey @MyBot look at this"))
        .await;
    assert_eq!(assert_replied(&outcome), "you rang?");
}

#[tokio::test]
async fn bot_and_system_senders_never_get_replies() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1"), ("new_contact_mode", "template")]).await;

    let transport = RecordingTransport::new();
    let engine = template_engine(&db, &transport);

    let mut from_bot = MessageEvent::private(600, 1, "beep");
    from_bot.sender.is_bot = true;
    assert!(matches!(engine.process(&from_bot).await, Outcome::Skipped { .. }));

    let from_system = MessageEvent::private(777_000, 2, "login code: 12345");
    assert!(matches!(engine.process(&from_system).await, Outcome::Skipped { .. }));

    assert_eq!(transport.sent_count().await, 0);
}

#[tokio::test]
async fn outbound_capture_feeds_reply_trigger() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1")]).await;

    let stored = chat::ensure_chat(db.pool(), -100777, None).await.unwrap();
    trigger::upsert_trigger(
        db.pool(),
        &NewTrigger {
            chat_id: stored.id,
            kind: "reply".to_string(),
            keywords: None,
            probability: None,
            cooldown_sec: 0,
            daily_cap: 50,
            enabled: true,
        },
    )
    .await
    .unwrap();

    let transport = RecordingTransport::new();
    let engine = engine(
        &db,
        &transport,
        Arc::new(StaticProvider::new("glad you asked")),
        Arc::new(FailingProvider::new()),
        EngineConfig::default(),
    );

    // The account's own group message is captured but not replied to.
    let mut own = MessageEvent::group(-100777, 0, 10, "I think we should ship on Friday");
    own.outgoing = true;
    assert!(matches!(engine.process(&own).await, Outcome::Skipped { .. }));

    // A reply to that message fires the reply trigger.
    let mut reply = MessageEvent::group(-100777, 7, 11, "why Friday?");
    reply.reply_to_id = Some(10);
    assert_eq!(assert_replied(&engine.process(&reply).await), "glad you asked");

    // A reply to someone else's message does not.
    let mut other = MessageEvent::group(-100777, 7, 12, "agreed");
    other.reply_to_id = Some(11);
    assert!(matches!(engine.process(&other).await, Outcome::Skipped { .. }));
}

#[tokio::test]
async fn ai_switch_off_downgrades_to_skip() {
    let db = test_db().await;
    seed(&db, &[("auto_reply_enabled", "1"), ("ai_enabled", "0")]).await;

    let transport = RecordingTransport::new();
    let engine = engine(
        &db,
        &transport,
        Arc::new(StaticProvider::new("should not appear")),
        Arc::new(StaticProvider::new("should not appear")),
        EngineConfig::default(),
    );

    rule_for_peer(&db, 500, "ai", 0).await;
    let outcome = engine.process(&MessageEvent::private(500, 1, "hello")).await;
    assert!(matches!(outcome, Outcome::Skipped { .. }));
    assert_eq!(transport.sent_count().await, 0);
}
