//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use crate::codec::Format;
use crate::schema::Rule;
use crate::value::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// confkeeper 的主要错误类型
#[derive(Error, Debug)]
pub enum ConfKeeperError {
    /// 配置类重复注册
    #[error("配置类已注册: {name}")]
    DuplicateRegistration { name: String },

    /// 字段赋值未通过校验
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 配置类中不存在该字段
    #[error("配置类 {class} 没有字段 {field}")]
    UnknownField { class: String, field: String },

    /// 必填字段缺失且没有默认值
    #[error("配置类 {class} 缺少必填字段 {field}")]
    MissingField { class: String, field: String },

    /// 无法识别的配置文件格式
    #[error("不支持的配置文件格式: {path}")]
    UnsupportedFormat { path: String },

    /// 解码时遇到未注册的配置类
    #[error("未注册的配置类: {name}")]
    UnknownConfigClass { name: String },

    /// 配置文本解析失败
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// 配置编码失败
    #[error("{format}编码失败: {message}")]
    Encode { format: Format, message: String },

    /// 配置参数冲突或非法
    #[error("配置错误: {0}")]
    Configuration(String),

    /// 文件读写错误
    #[error("IO错误 {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfKeeperError {
    /// 创建IO错误
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 创建编码错误
    pub fn encode<M: fmt::Display>(format: Format, message: M) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }
}

/// 字段校验错误，包含字段名、违反的规则与被拒绝的值
#[derive(Error, Debug, Clone, PartialEq)]
#[error("字段 {field} 校验失败: {rule}, 值: {value}")]
pub struct ValidationError {
    /// 字段名
    pub field: String,
    /// 违反的规则
    pub rule: Rule,
    /// 被拒绝的值
    pub value: Value,
}

/// 解析位置（从1开始计数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "第{}行第{}列", self.line, self.column)
    }
}

/// 配置文本解析错误
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// 文本格式
    pub format: Format,
    /// 出错位置（解析器能给出时）
    pub location: Option<Location>,
    /// 解析器给出的错误信息
    pub message: String,
}

impl ParseError {
    pub fn new<M: Into<String>>(format: Format, location: Option<Location>, message: M) -> Self {
        Self {
            format,
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(
                f,
                "{}解析失败({}): {}",
                self.format, location, self.message
            ),
            None => write!(f, "{}解析失败: {}", self.format, self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ConfKeeperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_with_location() {
        let err = ParseError::new(
            Format::Json,
            Some(Location { line: 3, column: 7 }),
            "expected value",
        );
        let text = err.to_string();
        assert!(text.contains("JSON"));
        assert!(text.contains("第3行第7列"));
        assert!(text.contains("expected value"));
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err: ConfKeeperError = ValidationError {
            field: "port".to_string(),
            rule: Rule::GreaterThan(Value::Integer(0)),
            value: Value::Integer(-1),
        }
        .into();
        assert!(err.to_string().contains("port"));
        assert!(matches!(err, ConfKeeperError::Validation(_)));
    }
}
