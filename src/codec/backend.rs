//! 各格式的编解码实现
//!
//! 规范输出：JSON 使用4空格缩进并保持键顺序；YAML 为块风格；TOML 为块表语法。

use crate::codec::Format;
use crate::error::{ConfKeeperError, Location, ParseError, Result};
use crate::value::{find_non_finite_in_snapshot, find_null_in_snapshot, Snapshot, Value};
use serde::Serialize;

/// 单一格式的编解码器trait
pub trait FormatCodec: Send + Sync {
    /// 对应的格式
    fn format(&self) -> Format;

    /// 将快照编码为文本
    ///
    /// # 参数
    /// * `snapshot` - 配置快照
    ///
    /// # 返回
    /// * `Result<String>` - 完整的输出文本
    fn encode(&self, snapshot: &Snapshot) -> Result<String>;

    /// 将文本解码为未解析类标记的值树
    ///
    /// # 参数
    /// * `text` - 配置文本
    ///
    /// # 返回
    /// * `Result<Value>` - 值树或带位置信息的解析错误
    fn decode(&self, text: &str) -> Result<Value>;
}

/// JSON编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

/// YAML编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

/// TOML编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

/// 获取格式对应的编解码器
pub fn codec_for(format: Format) -> &'static dyn FormatCodec {
    match format {
        Format::Json => &JsonCodec,
        Format::Yaml => &YamlCodec,
        Format::Toml => &TomlCodec,
    }
}

impl FormatCodec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn encode(&self, snapshot: &Snapshot) -> Result<String> {
        // serde_json 会把 NaN 和无穷大静默写成 null
        if let Some(path) = find_non_finite_in_snapshot(snapshot) {
            return Err(ConfKeeperError::encode(
                Format::Json,
                format!("JSON不支持非有限浮点数: {path}"),
            ));
        }
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        snapshot
            .serialize(&mut serializer)
            .map_err(|e| ConfKeeperError::encode(Format::Json, e))?;
        String::from_utf8(buffer).map_err(|e| ConfKeeperError::encode(Format::Json, e))
    }

    fn decode(&self, text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| {
            let location = (e.line() > 0).then(|| Location {
                line: e.line(),
                column: e.column(),
            });
            ParseError::new(Format::Json, location, e.to_string()).into()
        })
    }
}

impl FormatCodec for YamlCodec {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn encode(&self, snapshot: &Snapshot) -> Result<String> {
        serde_yaml::to_string(snapshot).map_err(|e| ConfKeeperError::encode(Format::Yaml, e))
    }

    fn decode(&self, text: &str) -> Result<Value> {
        serde_yaml::from_str(text).map_err(|e| {
            let location = e.location().map(|l| Location {
                line: l.line(),
                column: l.column(),
            });
            ParseError::new(Format::Yaml, location, e.to_string()).into()
        })
    }
}

impl FormatCodec for TomlCodec {
    fn format(&self) -> Format {
        Format::Toml
    }

    fn encode(&self, snapshot: &Snapshot) -> Result<String> {
        if let Some(path) = find_null_in_snapshot(snapshot) {
            return Err(ConfKeeperError::encode(
                Format::Toml,
                format!("TOML不支持空值: {path}"),
            ));
        }
        toml::to_string(snapshot).map_err(|e| ConfKeeperError::encode(Format::Toml, e))
    }

    fn decode(&self, text: &str) -> Result<Value> {
        toml::from_str(text).map_err(|e| {
            let location = e.span().map(|span| offset_to_location(text, span.start));
            ParseError::new(Format::Toml, location, e.message()).into()
        })
    }
}

/// 将字节偏移转换为行列号（从1开始）
fn offset_to_location(text: &str, offset: usize) -> Location {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |index| index + 1);
    let column = before[line_start..].chars().count() + 1;
    Location { line, column }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_value() -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.insert("key".to_string(), Value::from("value"));
        snapshot
    }

    #[test]
    fn test_canonical_json() {
        assert_eq!(
            JsonCodec.encode(&key_value()).unwrap(),
            "{\n    \"key\": \"value\"\n}"
        );
    }

    #[test]
    fn test_canonical_yaml() {
        assert_eq!(YamlCodec.encode(&key_value()).unwrap(), "key: value\n");
    }

    #[test]
    fn test_canonical_toml() {
        assert_eq!(TomlCodec.encode(&key_value()).unwrap(), "key = \"value\"\n");
    }

    #[test]
    fn test_json_keeps_insertion_order() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("zeta".to_string(), Value::from(1));
        snapshot.insert("alpha".to_string(), Value::from(2));
        let text = JsonCodec.encode(&snapshot).unwrap();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }

    #[test]
    fn test_yaml_block_style() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(
            "list".to_string(),
            Value::from(vec![Value::from(1), Value::from(2)]),
        );
        let text = YamlCodec.encode(&snapshot).unwrap();
        assert_eq!(text, "list:\n- 1\n- 2\n");
    }

    #[test]
    fn test_toml_rejects_null() {
        let mut snapshot = key_value();
        snapshot.insert("empty".to_string(), Value::Null);
        let err = TomlCodec.encode(&snapshot).unwrap_err();
        assert!(matches!(err, ConfKeeperError::Encode { format: Format::Toml, .. }));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_json_rejects_non_finite_float() {
        let mut snapshot = key_value();
        snapshot.insert("upper".to_string(), Value::from(f64::INFINITY));
        let err = JsonCodec.encode(&snapshot).unwrap_err();
        assert!(matches!(err, ConfKeeperError::Encode { format: Format::Json, .. }));
        assert!(err.to_string().contains("upper"));

        snapshot.insert("upper".to_string(), Value::from(f64::NAN));
        assert!(JsonCodec.encode(&snapshot).is_err());
    }

    #[test]
    fn test_json_parse_error_has_location() {
        let err = JsonCodec.decode("{\n  \"key\": \n}").unwrap_err();
        match err {
            ConfKeeperError::Parse(parse) => {
                assert_eq!(parse.format, Format::Json);
                assert_eq!(parse.location.map(|l| l.line), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_toml_parse_error_has_location() {
        let err = TomlCodec.decode("a = 1\nb = = 2\n").unwrap_err();
        match err {
            ConfKeeperError::Parse(parse) => {
                assert_eq!(parse.format, Format::Toml);
                assert_eq!(parse.location.map(|l| l.line), Some(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_yaml_parse_error() {
        let err = YamlCodec.decode("key: [1, 2\n").unwrap_err();
        assert!(matches!(err, ConfKeeperError::Parse(ref p) if p.format == Format::Yaml));
    }

    #[test]
    fn test_offset_to_location() {
        let text = "ab\ncd\nef";
        assert_eq!(offset_to_location(text, 0), Location { line: 1, column: 1 });
        assert_eq!(offset_to_location(text, 4), Location { line: 2, column: 2 });
        assert_eq!(offset_to_location(text, 100), Location { line: 3, column: 3 });
    }
}
