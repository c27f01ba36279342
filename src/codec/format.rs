//! 配置文件格式
//!
//! 显式指定的格式优先，否则按文件扩展名推断

use crate::error::{ConfKeeperError, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 支持的配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// 全部格式
    pub const ALL: [Format; 3] = [Format::Json, Format::Yaml, Format::Toml];

    /// 根据文件扩展名推断格式
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Format>` - 推断出的格式，未知扩展名返回 `UnsupportedFormat`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfKeeperError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// 显式格式优先，否则按扩展名推断
    pub fn resolve<P: AsRef<Path>>(path: P, explicit: Option<Format>) -> Result<Self> {
        match explicit {
            Some(format) => Ok(format),
            None => Self::from_path(path),
        }
    }

    /// 规范扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "JSON"),
            Format::Yaml => write!(f, "YAML"),
            Format::Toml => write!(f, "TOML"),
        }
    }
}

impl FromStr for Format {
    type Err = ConfKeeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            _ => Err(ConfKeeperError::UnsupportedFormat {
                path: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Format::from_path("a/config.json").unwrap(), Format::Json);
        assert_eq!(Format::from_path("config.yaml").unwrap(), Format::Yaml);
        assert_eq!(Format::from_path("config.YML").unwrap(), Format::Yaml);
        assert_eq!(Format::from_path("config.toml").unwrap(), Format::Toml);
    }

    #[test]
    fn test_unknown_extension() {
        for path in ["config.ini", "config", "config.json.bak"] {
            assert!(matches!(
                Format::from_path(path),
                Err(ConfKeeperError::UnsupportedFormat { .. })
            ));
        }
    }

    #[test]
    fn test_explicit_format_wins() {
        assert_eq!(
            Format::resolve("settings.conf", Some(Format::Toml)).unwrap(),
            Format::Toml
        );
        assert_eq!(
            Format::resolve("settings.json", Some(Format::Yaml)).unwrap(),
            Format::Yaml
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("yml".parse::<Format>().unwrap(), Format::Yaml);
        assert!("xml".parse::<Format>().is_err());
    }
}
