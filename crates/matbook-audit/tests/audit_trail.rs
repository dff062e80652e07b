//! End-to-end tests: service built from configuration, events on disk,
//! and the serialized shape checked against `schemas/AuditEvent.schema.json`.

use matbook_audit::{
    AuditAction, AuditContext, AuditEntityType, AuditService, RecordOptions, SinkLevel, SinkLine,
    to_fields,
};
use matbook_core::{AuditConfig, SinkKind};
use serde_json::{Value, json};

fn validator() -> jsonschema::Validator {
    let schema: Value =
        serde_json::from_str(include_str!("../../../schemas/AuditEvent.schema.json"))
            .expect("schema must parse");
    jsonschema::draft202012::options()
        .build(&schema)
        .expect("schema must compile")
}

fn assert_valid(validator: &jsonschema::Validator, instance: &Value) {
    if !validator.is_valid(instance) {
        let msgs: Vec<String> = validator
            .iter_errors(instance)
            .take(20)
            .enumerate()
            .map(|(idx, err)| format!("{}: {}", idx + 1, err))
            .collect();
        panic!("audit event did not validate: {}", msgs.join("; "));
    }
}

#[tokio::test]
async fn file_sink_writes_schema_valid_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let config = AuditConfig {
        sink: SinkKind::File,
        file_path: Some(path.display().to_string()),
        ..Default::default()
    };
    let service = AuditService::from_config(&config).unwrap();
    let context = AuditContext::new("usr_1", "org_9").unwrap().with_role("front_desk");

    let before = to_fields(&json!({"email": "kim@example.com", "phone": null})).unwrap();
    let after = to_fields(&json!({"phone": "555-0100"})).unwrap();
    service
        .record_update(
            &context,
            AuditAction::MemberUpdateContact,
            AuditEntityType::Member,
            "mem_42",
            &before,
            &after,
            None,
        )
        .await
        .unwrap();

    service
        .record(
            &context,
            AuditAction::WaiverSign,
            AuditEntityType::Waiver,
            RecordOptions::failure("signature missing")
                .ip_address("203.0.113.7")
                .user_agent("Mozilla/5.0")
                .request_id("req_77"),
        )
        .await
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let validator = validator();
    for raw in &lines {
        let value: Value = serde_json::from_str(raw).unwrap();
        assert_valid(&validator, &value["audit"]);
    }

    let first: SinkLine = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first.level, SinkLevel::Info);
    assert_eq!(
        first.message,
        "[AUDIT] member.updateContact on member:mem_42 by user:usr_1 in org:org_9"
    );
    let changes = first.audit.changes().unwrap();
    assert_eq!(changes["phone"].before, Value::Null);
    assert_eq!(changes["phone"].after, json!("555-0100"));

    let second: SinkLine = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second.level, SinkLevel::Warn);
    assert!(second.message.starts_with("[AUDIT] FAILED waiver.sign on waiver by"));
    assert_eq!(second.audit.error(), Some("signature missing"));
    assert_eq!(second.audit.ip_address(), Some("203.0.113.7"));
}

#[tokio::test]
async fn every_action_yields_a_schema_valid_event() {
    let validator = validator();
    let sink = std::sync::Arc::new(matbook_audit::MemorySink::new());
    let service = AuditService::new(sink.clone());
    let context = AuditContext::new("usr_1", "org_9").unwrap();

    for action in AuditAction::ALL {
        service
            .record(
                &context,
                action,
                action.entity_type(),
                RecordOptions::success().entity_id("row_1"),
            )
            .await
            .unwrap();
    }

    let records = sink.records();
    assert_eq!(records.len(), AuditAction::ALL.len());
    for record in records {
        let value = serde_json::to_value(&record.payload.audit).unwrap();
        assert_valid(&validator, &value);
    }
}
