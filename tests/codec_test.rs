//! 编解码测试
//!
//! 覆盖三种格式的往返、嵌套配置类实例的重建以及规范输出

use confkeeper::codec::{self, Format};
use confkeeper::{
    ClassBuilder, ClassRegistry, ConfKeeperError, ConfigCodec, FieldKind, FieldSpec, Snapshot,
    Value, CLASS_MARKER,
};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn sample_snapshot() -> Snapshot {
    let mut server = Snapshot::new();
    server.insert("host".to_string(), Value::from("example.org"));
    server.insert("port".to_string(), Value::from(8443));
    server.insert("ratio".to_string(), Value::from(0.75));

    let mut snapshot = Snapshot::new();
    snapshot.insert("name".to_string(), Value::from("demo"));
    snapshot.insert("enabled".to_string(), Value::from(true));
    snapshot.insert(
        "tags".to_string(),
        Value::from(vec![Value::from("a"), Value::from("b")]),
    );
    snapshot.insert("server".to_string(), Value::from(server));
    snapshot
}

fn database_registry() -> Arc<ClassRegistry> {
    let registry = ClassRegistry::new();
    ClassBuilder::new("app.settings", "Database")
        .field(FieldSpec::new("host", FieldKind::String).default("localhost"))
        .field(
            FieldSpec::new("port", FieldKind::Integer)
                .default(5432)
                .gt(0)
                .lt(65536),
        )
        .field(FieldSpec::new("timeout", FieldKind::Float).default(1.5))
        .register(&registry)
        .unwrap();
    Arc::new(registry)
}

#[test]
fn test_round_trip_plain_snapshot_all_formats() {
    let registry = ClassRegistry::new();
    let snapshot = sample_snapshot();

    for format in Format::ALL {
        let text = codec::encode(&snapshot, format).unwrap();
        let decoded = codec::decode(&text, format, &registry).unwrap();
        assert_eq!(decoded, snapshot, "往返失败: {format}");
    }
}

#[test]
fn test_round_trip_nested_instance_all_formats() {
    let registry = database_registry();
    let class = registry.get("app.settings.Database").unwrap();

    let mut instance = class.instantiate().unwrap();
    instance.set("host", "db.internal").unwrap();
    instance.set("port", 6543).unwrap();

    let mut snapshot = sample_snapshot();
    snapshot.insert("database".to_string(), Value::from(instance.clone()));

    let codec = ConfigCodec::new(Arc::clone(&registry));
    for format in Format::ALL {
        let text = codec.encode(&snapshot, format).unwrap();
        assert!(text.contains(CLASS_MARKER));

        let decoded = codec.decode(&text, format).unwrap();
        let restored = decoded["database"].as_instance().unwrap();
        assert!(restored.is_instance_of("app.settings.Database"));
        assert_eq!(restored, &instance);
        assert_eq!(decoded, snapshot);
    }
}

#[test]
fn test_instance_inside_sequence() {
    let registry = database_registry();
    let text = r#"{
        "replicas": [
            {"_config_class_type": "app.settings.Database", "host": "r1"},
            {"_config_class_type": "app.settings.Database", "host": "r2", "port": 7000}
        ]
    }"#;

    let snapshot = codec::decode(text, Format::Json, &registry).unwrap();
    let replicas = snapshot["replicas"].as_sequence().unwrap();
    assert_eq!(replicas.len(), 2);
    assert_eq!(
        replicas[0].as_instance().unwrap().get("port"),
        Some(&Value::from(5432))
    );
    assert_eq!(
        replicas[1].as_instance().unwrap().get("port"),
        Some(&Value::from(7000))
    );
}

#[test]
fn test_class_typed_field_round_trip() {
    let registry = database_registry();
    ClassBuilder::new("app.settings", "Service")
        .field(FieldSpec::new("name", FieldKind::String))
        .field(FieldSpec::new(
            "database",
            FieldKind::Class("app.settings.Database".to_string()),
        ))
        .register(&registry)
        .unwrap();

    let text = r#"
service:
  _config_class_type: app.settings.Service
  name: billing
  database:
    _config_class_type: app.settings.Database
    host: db.billing
"#;
    let snapshot = codec::decode(text, Format::Yaml, &registry).unwrap();
    let service = snapshot["service"].as_instance().unwrap();
    let database = service.get("database").unwrap().as_instance().unwrap();
    assert_eq!(database.get("host"), Some(&Value::from("db.billing")));
    assert_eq!(database.get("port"), Some(&Value::from(5432)));

    for format in Format::ALL {
        let encoded = codec::encode(&snapshot, format).unwrap();
        assert_eq!(codec::decode(&encoded, format, &registry).unwrap(), snapshot);
    }
}

#[test]
fn test_wrong_class_in_typed_field_rejected() {
    let registry = database_registry();
    ClassBuilder::new("app.settings", "Other")
        .register(&registry)
        .unwrap();
    ClassBuilder::new("app.settings", "Holder")
        .field(FieldSpec::new(
            "database",
            FieldKind::Class("app.settings.Database".to_string()),
        ))
        .register(&registry)
        .unwrap();

    let text = r#"{"h": {"_config_class_type": "app.settings.Holder",
                   "database": {"_config_class_type": "app.settings.Other"}}}"#;
    let err = codec::decode(text, Format::Json, &registry).unwrap_err();
    assert!(matches!(err, ConfKeeperError::Validation(ref v) if v.field == "database"));
}

#[test]
fn test_decoded_instance_is_validated() {
    let registry = database_registry();
    let text = "[db]\n_config_class_type = \"app.settings.Database\"\nport = 0\n";

    let err = codec::decode(text, Format::Toml, &registry).unwrap_err();
    assert!(matches!(err, ConfKeeperError::Validation(ref v) if v.field == "port"));
}

#[test]
fn test_canonical_outputs() {
    let mut snapshot = Snapshot::new();
    snapshot.insert("key".to_string(), Value::from("value"));

    assert_eq!(
        codec::encode(&snapshot, Format::Json).unwrap(),
        "{\n    \"key\": \"value\"\n}"
    );
    assert_eq!(codec::encode(&snapshot, Format::Yaml).unwrap(), "key: value\n");
    assert_eq!(
        codec::encode(&snapshot, Format::Toml).unwrap(),
        "key = \"value\"\n"
    );
}

#[tokio::test]
async fn test_write_then_read_file() {
    let dir = tempdir().unwrap();
    let registry = database_registry();
    let codec = ConfigCodec::new(registry);
    let snapshot = sample_snapshot();

    for format in Format::ALL {
        let path = dir.path().join(format!("config.{}", format.extension()));
        codec.write_file(&path, &snapshot, None).await.unwrap();
        let read = codec.read_file(&path, None).await.unwrap();
        assert_eq!(read, snapshot);
    }
}

#[tokio::test]
async fn test_failed_encode_leaves_file_intact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "key = \"value\"\n").unwrap();

    let mut snapshot = Snapshot::new();
    snapshot.insert("key".to_string(), Value::Null);

    let err = codec::write_file(&path, &snapshot, None).await.unwrap_err();
    assert!(matches!(err, ConfKeeperError::Encode { format: Format::Toml, .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "key = \"value\"\n");
}

#[tokio::test]
async fn test_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.ini");
    fs::write(&path, "key=value").unwrap();

    let err = codec::read_file_raw(&path, None).await.unwrap_err();
    assert!(matches!(err, ConfKeeperError::UnsupportedFormat { .. }));

    // 显式格式覆盖扩展名
    let err = codec::read_file_raw(&path, Some(Format::Toml))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfKeeperError::Parse(_)));
}

#[tokio::test]
async fn test_non_finite_float_never_reaches_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{\n    \"x\": 1.0\n}").unwrap();

    let mut snapshot = Snapshot::new();
    snapshot.insert("x".to_string(), Value::from(f64::INFINITY));

    let err = codec::write_file(&path, &snapshot, None).await.unwrap_err();
    assert!(matches!(err, ConfKeeperError::Encode { format: Format::Json, .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{\n    \"x\": 1.0\n}");

    // YAML 与 TOML 可以表示无穷大
    for format in [Format::Yaml, Format::Toml] {
        let text = codec::encode(&snapshot, format).unwrap();
        let decoded = codec::decode_raw(&text, format).unwrap();
        assert_eq!(decoded, snapshot, "往返失败: {format}");
    }
}

#[test]
fn test_decoded_null_on_bounded_field_rejected() {
    let registry = ClassRegistry::new();
    ClassBuilder::new("app.settings", "Window")
        .field(FieldSpec::new("size", FieldKind::Any).default(5).gt(0).lt(10))
        .register(&registry)
        .unwrap();

    let text = r#"{"w": {"_config_class_type": "app.settings.Window", "size": null}}"#;
    let err = codec::decode(text, Format::Json, &registry).unwrap_err();
    assert!(matches!(err, ConfKeeperError::Validation(ref v) if v.field == "size"));
}
