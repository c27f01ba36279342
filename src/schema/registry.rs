//! 配置类注册表
//!
//! 限定名到类描述的只增映射，按注册顺序遍历。注册表由应用启动代码显式创建，
//! 通过 `Arc` 注入到构建器和编解码器中。

use crate::error::{ConfKeeperError, Result};
use crate::schema::descriptor::ClassDescriptor;
use indexmap::IndexMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// 配置类注册表
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<IndexMap<String, Arc<ClassDescriptor>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册配置类
    ///
    /// # 参数
    /// * `descriptor` - 配置类描述
    ///
    /// # 返回
    /// * `Result<Arc<ClassDescriptor>>` - 注册后的共享描述；限定名已存在时返回 `DuplicateRegistration`
    pub fn register(&self, descriptor: ClassDescriptor) -> Result<Arc<ClassDescriptor>> {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        let name = descriptor.qualified_name().to_string();
        if classes.contains_key(&name) {
            return Err(ConfKeeperError::DuplicateRegistration { name });
        }

        let descriptor = Arc::new(descriptor);
        classes.insert(name.clone(), Arc::clone(&descriptor));
        debug!("注册配置类: {}", name);
        Ok(descriptor)
    }

    /// 按顺序注册一组配置类，遇到第一个错误即停止
    pub fn register_all<I>(&self, descriptors: I) -> Result<Vec<Arc<ClassDescriptor>>>
    where
        I: IntoIterator<Item = ClassDescriptor>,
    {
        descriptors
            .into_iter()
            .map(|descriptor| self.register(descriptor))
            .collect()
    }

    /// 按注册顺序列出限定名
    pub fn list_classes(&self) -> Vec<String> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
