//! 配置文件读写
//!
//! 写入先在目标目录生成临时文件，同步到磁盘后原子替换目标文件。

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// 原子写入文件
///
/// # 参数
/// * `path` - 目标文件路径
/// * `contents` - 完整的文件内容
///
/// # 返回
/// * `io::Result<()>` - 任一步骤失败时目标文件保持不变
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.flush()?;

    // 保留原文件权限
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
