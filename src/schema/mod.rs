//! 配置类模块
//!
//! 提供配置类注册表、字段声明与校验、以及配置类实例

pub mod descriptor;
pub mod field;
pub mod instance;
pub mod registry;

// 重新导出主要类型
pub use descriptor::{qualify, ClassBuilder, ClassDescriptor, FieldKind, FieldSpec};
pub use field::{Constraints, Predicate, Rule, ValidatedField};
pub use instance::{ConfigInstance, CLASS_MARKER};
pub use registry::ClassRegistry;
