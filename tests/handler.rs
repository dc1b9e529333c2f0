mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use common::{builder, enabled_config, MemoryDiagnostics, RecordingTransport, Reply};
use telegram_log_sink::api::{ApiMethod, Payload};
use telegram_log_sink::{DeliveryConfig, FormatConfig, Formatter, Level, LogRecord};

fn record(message: &str) -> LogRecord {
    LogRecord::new(Level::ERROR, "app", message).with_function("run")
}

#[test]
fn short_text_is_sent_as_message() {
    let transport = RecordingTransport::ok();
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(enabled_config(), &transport, &diagnostics).build().unwrap();

    handler.emit(&record("disk full"));

    assert_eq!(transport.count(ApiMethod::SendMessage), 1);
    assert_eq!(transport.count(ApiMethod::SendDocument), 0);

    let request = &transport.requests()[0];
    assert_eq!(request.url, "https://api.telegram.org/bot123:abc/sendMessage");
    assert_eq!(request.timeout, Duration::from_secs(2));
    match &request.payload {
        Payload::Json(body) => {
            assert_eq!(body["chat_id"], json!("-100500"));
            assert_eq!(body["parse_mode"], json!("HTML"));
            assert_eq!(body["disable_notification"], json!(false));
            assert_eq!(body["disable_web_page_preview"], json!(false));
            let text = body["text"].as_str().unwrap();
            assert!(text.contains("ERROR</b>"));
            assert!(text.ends_with("[app:run]\ndisk full"));
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn long_text_is_sent_as_document() {
    let transport = RecordingTransport::ok();
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let formatter = Formatter::new(FormatConfig::plain());
    let handler = builder(enabled_config(), &transport, &diagnostics)
        .formatter(formatter.clone())
        .build()
        .unwrap();

    let rec = record(&"é".repeat(5000));
    let full = formatter.format(&rec);
    assert!(full.chars().count() >= 4096);

    handler.emit(&rec);

    assert_eq!(transport.count(ApiMethod::SendMessage), 0);
    assert_eq!(transport.count(ApiMethod::SendDocument), 1);
    match &transport.requests()[0].payload {
        Payload::Multipart { fields, document } => {
            let caption = &fields.iter().find(|(k, _)| k == "caption").unwrap().1;
            assert_eq!(caption.chars().count(), 1000);
            assert!(full.starts_with(caption.as_str()));
            assert_eq!(document.content, full.as_bytes());
            assert_eq!(document.file_name, "traceback.txt");
            assert_eq!(document.mime, "text/plain");
            assert!(fields.iter().all(|(k, _)| k != "parse_mode"));
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn boundary_length_switches_to_document() {
    let transport = RecordingTransport::ok();
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(enabled_config(), &transport, &diagnostics)
        .formatter(Formatter::new(FormatConfig::plain().with_template("{message}")))
        .build()
        .unwrap();

    handler.emit(&record(&"x".repeat(4095)));
    handler.emit(&record(&"x".repeat(4096)));

    assert_eq!(transport.count(ApiMethod::SendMessage), 1);
    assert_eq!(transport.count(ApiMethod::SendDocument), 1);
}

#[test]
fn missing_chat_id_never_calls_network() {
    for enabled in [true, false] {
        for chat_id in [None, Some(String::new()), Some("   ".to_string())] {
            let transport = RecordingTransport::ok();
            let diagnostics = Arc::new(MemoryDiagnostics::default());
            let config = DeliveryConfig {
                token: "123:abc".to_string(),
                chat_id,
                enabled,
                ..DeliveryConfig::default()
            };
            let handler = builder(config, &transport, &diagnostics).build().unwrap();

            assert_eq!(handler.threshold(), None);
            assert!(!handler.enabled_for(Level::FATAL));

            handler.handle(&record("x"));
            handler.emit(&record("x"));

            assert!(transport.requests().is_empty());
            assert!(diagnostics.contains(Level::ERROR, "Did not get chat id"));
            if enabled {
                assert!(diagnostics.contains(Level::WARNING, "without chat_id"));
            } else {
                assert!(diagnostics.contains(Level::INFO, "TelegramHandler disabled"));
            }
        }
    }
}

#[test]
fn disabled_handler_never_calls_network() {
    let transport = RecordingTransport::ok();
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(enabled_config().enabled(false), &transport, &diagnostics)
        .build()
        .unwrap();

    handler.handle(&record("quiet"));

    assert!(transport.requests().is_empty());
    assert!(diagnostics.contains(Level::INFO, "TelegramHandler disabled"));
}

#[test]
fn transport_failure_is_swallowed_and_logged() {
    let transport = RecordingTransport::replying(Reply::Status(502, "bad gateway".to_string()));
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(enabled_config(), &transport, &diagnostics).build().unwrap();

    handler.emit(&record("x"));

    assert_eq!(transport.requests().len(), 1);
    assert!(diagnostics.contains(Level::ERROR, "Error while making POST to"));
    assert!(diagnostics.contains(Level::DEBUG, "bad gateway"));
    assert!(!diagnostics.contains(Level::ERROR, "123:abc"));
    assert!(!diagnostics.contains(Level::WARNING, "ok=false"));
}

#[test]
fn ok_false_response_is_reported() {
    let transport = RecordingTransport::replying(Reply::Body(
        json!({"ok": false, "description": "Bad Request: chat not found"}),
    ));
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(enabled_config(), &transport, &diagnostics).build().unwrap();

    handler.emit(&record("x"));

    assert!(diagnostics.contains(Level::WARNING, "chat not found"));
}

#[test]
fn threshold_filters_in_handle() {
    let transport = RecordingTransport::ok();
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(enabled_config(), &transport, &diagnostics)
        .level(Level::ERROR)
        .build()
        .unwrap();

    handler.handle(&LogRecord::new(Level::WARNING, "app", "skipped"));
    handler.handle(&LogRecord::new(Level::CRITICAL, "app", "sent"));

    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn formatter_override_sets_parse_mode() {
    let transport = RecordingTransport::ok();
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(enabled_config(), &transport, &diagnostics)
        .formatter(Formatter::new(FormatConfig::markdown()))
        .build()
        .unwrap();

    handler.emit(&record("x"));

    match &transport.requests()[0].payload {
        Payload::Json(body) => {
            assert_eq!(body["parse_mode"], json!("Markdown"));
            assert_eq!(body["text"], json!("*ERROR*\n[app:run]\nx"));
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn default_formatter_uses_emoji_and_service() {
    let transport = RecordingTransport::ok();
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(enabled_config(), &transport, &diagnostics)
        .service("billing")
        .build()
        .unwrap();

    let text = handler.format(&record("x")).text;
    assert_eq!(text, "<b>\u{1F534} ERROR</b>\nFrom billing\n[app:run]\nx");
}

#[test]
fn structured_message_is_sent_as_indented_json() {
    let transport = RecordingTransport::ok();
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(enabled_config(), &transport, &diagnostics).build().unwrap();

    handler.emit(&LogRecord::new(Level::INFO, "app", json!({"test": "test"})));

    match &transport.requests()[0].payload {
        Payload::Json(body) => {
            assert!(body["text"].as_str().unwrap().contains("\"test\": \"test\""));
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn discovers_chat_id_from_last_update() {
    let transport = RecordingTransport::replying(Reply::Body(json!({
        "ok": true,
        "result": [
            {"update_id": 1, "message": {"chat": {"id": 11}}},
            {"update_id": 2, "message": {"from": {"id": 5}, "chat": {"id": -1001234, "type": "supergroup"}}}
        ]
    })));
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = builder(DeliveryConfig::new("123:abc", ""), &transport, &diagnostics)
        .build()
        .unwrap();

    assert_eq!(handler.discover_chat_id().as_deref(), Some("-1001234"));
    let request = &transport.requests()[0];
    assert_eq!(request.method, ApiMethod::GetUpdates);
    assert_eq!(request.payload, Payload::Empty);
}

#[test]
fn discover_chat_id_handles_bad_responses() {
    let cases = [
        Reply::Body(json!({"ok": false})),
        Reply::Body(json!({"ok": true, "result": []})),
        Reply::Status(401, "Unauthorized".to_string()),
    ];
    for reply in cases {
        let transport = RecordingTransport::replying(reply);
        let diagnostics = Arc::new(MemoryDiagnostics::default());
        let handler = builder(DeliveryConfig::new("t", ""), &transport, &diagnostics)
            .build()
            .unwrap();

        assert_eq!(handler.discover_chat_id(), None);
        assert!(diagnostics
            .entries()
            .iter()
            .any(|(l, m)| *l == Level::ERROR && !m.contains("Did not get chat id")));
    }
}

#[test]
fn concurrent_emits_are_independent() {
    let transport = RecordingTransport::ok();
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let handler = Arc::new(builder(enabled_config(), &transport, &diagnostics).build().unwrap());

    let threads: Vec<_> = (0..8)
        .map(|i| {
            let handler = Arc::clone(&handler);
            std::thread::spawn(move || handler.emit(&record(&format!("worker {}", i))))
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(transport.count(ApiMethod::SendMessage), 8);
}
