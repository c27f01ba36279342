//! 配置编解码模块
//!
//! 在配置快照与 JSON/YAML/TOML 文本之间转换。解码时带有类标记的嵌套映射
//! 会通过注册表重建为配置类实例；编码时实例被扁平化为带类标记的映射。

pub mod backend;
pub mod format;
pub mod io;

pub use backend::{codec_for, FormatCodec, JsonCodec, TomlCodec, YamlCodec};
pub use format::Format;

use crate::error::{ConfKeeperError, ParseError, Result};
use crate::schema::{ClassRegistry, ConfigInstance, CLASS_MARKER};
use crate::value::{Mapping, Snapshot, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// 将快照编码为指定格式的文本
pub fn encode(snapshot: &Snapshot, format: Format) -> Result<String> {
    codec_for(format).encode(snapshot)
}

/// 解码文本但不解析类标记
///
/// 顶层必须是映射，空文档解码为空快照。
pub fn decode_raw(text: &str, format: Format) -> Result<Snapshot> {
    if text.trim().is_empty() {
        return Ok(Snapshot::new());
    }

    match codec_for(format).decode(text)? {
        Value::Mapping(snapshot) => Ok(snapshot),
        // 仅含注释的 YAML 文档解码为 null
        Value::Null => Ok(Snapshot::new()),
        other => Err(ParseError::new(
            format,
            None,
            format!("顶层必须是映射，实际为 {}", other.kind_name()),
        )
        .into()),
    }
}

/// 解码文本并通过注册表重建配置类实例
pub fn decode(text: &str, format: Format, registry: &ClassRegistry) -> Result<Snapshot> {
    let raw = decode_raw(text, format)?;
    resolve_snapshot(raw, format, registry)
}

/// 收集快照中出现的类标记（按出现顺序，去重）
pub fn class_markers(snapshot: &Snapshot) -> Vec<String> {
    fn collect(value: &Value, found: &mut Vec<String>) {
        match value {
            Value::Mapping(map) => {
                if let Some(Value::String(name)) = map.get(CLASS_MARKER) {
                    if !found.contains(name) {
                        found.push(name.clone());
                    }
                }
                map.values().for_each(|v| collect(v, found));
            }
            Value::Sequence(items) => items.iter().for_each(|v| collect(v, found)),
            Value::Instance(instance) => {
                if !found.iter().any(|name| name == instance.class_name()) {
                    found.push(instance.class_name().to_string());
                }
                instance.fields().for_each(|(_, v)| collect(v, found));
            }
            _ => {}
        }
    }

    let mut found = Vec::new();
    snapshot.values().for_each(|v| collect(v, &mut found));
    found
}

fn resolve_snapshot(raw: Snapshot, format: Format, registry: &ClassRegistry) -> Result<Snapshot> {
    raw.into_iter()
        .map(|(key, value)| Ok((key, resolve_value(value, format, registry)?)))
        .collect()
}

fn resolve_value(value: Value, format: Format, registry: &ClassRegistry) -> Result<Value> {
    match value {
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| resolve_value(item, format, registry))
            .collect::<Result<Vec<_>>>()
            .map(Value::Sequence),
        Value::Mapping(map) => {
            let mut resolved: Mapping = resolve_snapshot(map, format, registry)?;
            match resolved.shift_remove(CLASS_MARKER) {
                None => Ok(Value::Mapping(resolved)),
                Some(Value::String(name)) => {
                    let class = registry
                        .get(&name)
                        .ok_or(ConfKeeperError::UnknownConfigClass { name })?;
                    debug!("重建配置类实例: {}", class.qualified_name());
                    ConfigInstance::from_mapping(&class, resolved).map(Value::Instance)
                }
                Some(other) => Err(ParseError::new(
                    format,
                    None,
                    format!("{CLASS_MARKER} 必须是字符串，实际为 {}", other.kind_name()),
                )
                .into()),
            }
        }
        other => Ok(other),
    }
}

/// 绑定注册表的配置编解码器
#[derive(Debug, Clone)]
pub struct ConfigCodec {
    registry: Arc<ClassRegistry>,
}

impl ConfigCodec {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// 解码文本
    pub fn decode(&self, text: &str, format: Format) -> Result<Snapshot> {
        decode(text, format, &self.registry)
    }

    /// 解码文本但保留类标记
    pub fn decode_raw(text: &str, format: Format) -> Result<Snapshot> {
        decode_raw(text, format)
    }

    /// 编码快照
    pub fn encode(&self, snapshot: &Snapshot, format: Format) -> Result<String> {
        encode(snapshot, format)
    }

    /// 读取并解码配置文件
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    /// * `format` - 显式格式，`None` 时按扩展名推断
    ///
    /// # 返回
    /// * `Result<Snapshot>` - 解码后的快照
    pub async fn read_file<P: AsRef<Path>>(
        &self,
        path: P,
        format: Option<Format>,
    ) -> Result<Snapshot> {
        let path = path.as_ref();
        let format = Format::resolve(path, format)?;
        let text = read_text(path).await?;
        let snapshot = self.decode(&text, format)?;
        debug!("读取配置文件: {} ({})", path.display(), format);
        Ok(snapshot)
    }

    /// 编码并原子写入配置文件
    pub async fn write_file<P: AsRef<Path>>(
        &self,
        path: P,
        snapshot: &Snapshot,
        format: Option<Format>,
    ) -> Result<()> {
        write_file(path, snapshot, format).await
    }
}

/// 读取配置文件但不解析类标记
pub async fn read_file_raw<P: AsRef<Path>>(path: P, format: Option<Format>) -> Result<Snapshot> {
    let path = path.as_ref();
    let format = Format::resolve(path, format)?;
    let text = read_text(path).await?;
    decode_raw(&text, format)
}

/// 编码并原子写入配置文件
///
/// 先生成完整的输出再触碰目标文件；编码失败时目标文件不受影响。
pub async fn write_file<P: AsRef<Path>>(
    path: P,
    snapshot: &Snapshot,
    format: Option<Format>,
) -> Result<()> {
    let path = path.as_ref().to_path_buf();
    let format = Format::resolve(&path, format)?;
    let contents = encode(snapshot, format)?;

    let target = path.clone();
    tokio::task::spawn_blocking(move || io::write_atomic(&target, contents.as_bytes()))
        .await
        .map_err(|e| ConfKeeperError::io(&path, std::io::Error::other(e)))?
        .map_err(|e| ConfKeeperError::io(&path, e))?;

    debug!("写入配置文件: {} ({})", path.display(), format);
    Ok(())
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfKeeperError::io(path, e))
}
