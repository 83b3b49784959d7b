use busctl::commands::Cli;
use busctl::error::AppError;
use clap::Parser;
use claims::*;
use server::model::SimpleValue;
use server::service_bus_manager::{EntityRef, ServiceBusCommand};
use std::io::Write;
use std::time::Duration;

fn command(args: &[&str]) -> Option<ServiceBusCommand> {
    let cli = Cli::try_parse_from(std::iter::once("busctl").chain(args.iter().copied())).unwrap();
    cli.command.to_service_bus_command().unwrap()
}

#[test]
fn queue_dead_letter_sub_queue_is_addressed_with_dlq_flag() {
    let parsed = command(&["delete", "--queue", "orders", "--dlq", "order-7"]);

    assert_eq!(
        parsed,
        Some(ServiceBusCommand::DeleteMessage {
            entity: EntityRef::queue("orders").dead_letter(),
            message_id: "order-7".to_string(),
        })
    );
}

#[test]
fn subscription_is_addressed_with_topic_and_subscription() {
    let parsed = command(&[
        "dead-letter",
        "--topic",
        "events",
        "--subscription",
        "audit",
        "evt-1",
        "--reason",
        "poison",
    ]);

    assert_eq!(
        parsed,
        Some(ServiceBusCommand::DeadLetterMessage {
            entity: EntityRef::subscription("events", "audit"),
            message_id: "evt-1".to_string(),
            reason: Some("poison".to_string()),
            error_description: None,
        })
    );
}

#[test]
fn queue_and_topic_conflict() {
    let result = Cli::try_parse_from([
        "busctl",
        "purge",
        "--queue",
        "orders",
        "--topic",
        "events",
        "--subscription",
        "audit",
    ]);
    assert_err!(result);
}

#[test]
fn topic_without_subscription_is_rejected() {
    assert_err!(Cli::try_parse_from(["busctl", "purge", "--topic", "events"]));
}

#[test]
fn missing_entity_is_a_usage_error() {
    let cli = assert_ok!(Cli::try_parse_from(["busctl", "transfer"]));

    let error = assert_err!(cli.command.to_service_bus_command());
    assert_matches!(error, AppError::Usage(_));
}

#[test]
fn global_flags_work_after_the_subcommand() {
    let cli = assert_ok!(Cli::try_parse_from([
        "busctl",
        "peek",
        "--queue",
        "orders",
        "--count",
        "5",
        "--from",
        "40",
        "--json",
        "--config",
        "alt.toml",
    ]));

    assert!(cli.json);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("alt.toml")));
    assert_eq!(
        assert_ok!(cli.command.to_service_bus_command()),
        Some(ServiceBusCommand::PeekMessages {
            entity: EntityRef::queue("orders"),
            max_count: Some(5),
            from_sequence: Some(40),
        })
    );
}

#[test]
fn resubmit_and_move_arguments() {
    assert_eq!(
        command(&["resubmit", "--queue", "orders", "42"]),
        Some(ServiceBusCommand::ResubmitDeadLetter {
            entity: EntityRef::queue("orders"),
            sequence: 42,
        })
    );
    assert_eq!(
        command(&["move", "--queue", "orders", "order-7", "--to", "archive"]),
        Some(ServiceBusCommand::MoveMessage {
            source: EntityRef::queue("orders"),
            message_id: "order-7".to_string(),
            destination: "archive".to_string(),
        })
    );
}

#[test]
fn send_builds_message_with_properties_in_order() {
    let parsed = command(&[
        "send",
        "--to",
        "orders",
        "--body",
        "{\"total\": 10}",
        "--message-id",
        "order-99",
        "--label",
        "created",
        "--ttl",
        "60",
        "--property",
        "tenant=contoso",
        "--property",
        "attempt=1",
    ]);

    let Some(ServiceBusCommand::SendMessage {
        entity_name,
        message,
    }) = parsed
    else {
        panic!("expected a send command");
    };
    assert_eq!(entity_name, "orders");
    assert_eq!(message.content, b"{\"total\": 10}".to_vec());
    assert_eq!(message.message_id.as_deref(), Some("order-99"));
    assert_eq!(message.label.as_deref(), Some("created"));
    assert_eq!(message.time_to_live, Some(Duration::from_secs(60)));
    let keys: Vec<_> = message
        .custom_properties
        .iter()
        .map(|p| p.key.as_str())
        .collect();
    assert_eq!(keys, vec!["tenant", "attempt"]);
    assert_eq!(
        message.custom_properties[0].value,
        SimpleValue::String("contoso".to_string())
    );
}

#[test]
fn send_generates_an_id_and_reads_body_file() {
    let mut body = tempfile::NamedTempFile::new().unwrap();
    body.write_all(b"from file").unwrap();
    let path = body.path().to_str().unwrap().to_string();

    let parsed = command(&["send", "--to", "orders", "--body-file", &path]);

    let Some(ServiceBusCommand::SendMessage { message, .. }) = parsed else {
        panic!("expected a send command");
    };
    assert_eq!(message.content, b"from file".to_vec());
    let id = assert_some!(message.message_id);
    assert_ok!(uuid::Uuid::parse_str(&id));
}

#[test]
fn send_without_body_is_a_usage_error() {
    let cli = assert_ok!(Cli::try_parse_from(["busctl", "send", "--to", "orders"]));
    assert_matches!(
        assert_err!(cli.command.to_service_bus_command()),
        AppError::Usage(_)
    );
}

#[test]
fn check_update_does_not_build_a_broker_command() {
    assert_none!(command(&["check-update"]));
}
