//! 配置类实例
//!
//! 每个声明的字段对应一个槽位：带约束的字段使用 `ValidatedField`，其余字段为普通值。

use crate::error::{ConfKeeperError, Result};
use crate::schema::descriptor::{ClassDescriptor, FieldSpec};
use crate::schema::field::ValidatedField;
use crate::value::{Mapping, Value};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;
use tracing::debug;

/// 扁平化映射中标记配置类限定名的键
pub const CLASS_MARKER: &str = "_config_class_type";

#[derive(Debug, Clone)]
enum FieldSlot {
    Plain(Value),
    Validated(ValidatedField<Value>),
}

impl FieldSlot {
    fn new(spec: &FieldSpec, initial: Value) -> Self {
        if spec.is_constrained() {
            FieldSlot::Validated(ValidatedField::with_shared(
                spec.name(),
                Arc::clone(spec.constraints()),
                initial,
            ))
        } else {
            FieldSlot::Plain(initial)
        }
    }

    fn value(&self) -> &Value {
        match self {
            FieldSlot::Plain(value) => value,
            FieldSlot::Validated(field) => field.get(),
        }
    }
}

/// 已注册配置类的实例
#[derive(Debug, Clone)]
pub struct ConfigInstance {
    class: Arc<ClassDescriptor>,
    slots: IndexMap<String, FieldSlot>,
}

impl ConfigInstance {
    /// 使用默认值创建实例
    ///
    /// 默认值直接写入，不经过校验；必填字段没有默认值时返回 `MissingField`。
    pub fn new(class: &Arc<ClassDescriptor>) -> Result<Self> {
        Self::from_mapping(class, Mapping::new())
    }

    /// 从扁平映射重建实例
    ///
    /// # 参数
    /// * `class` - 配置类描述
    /// * `values` - 字段名到值的映射，提供的值会经过完整校验
    ///
    /// # 返回
    /// * `Result<Self>` - 实例或第一个校验错误
    pub fn from_mapping(class: &Arc<ClassDescriptor>, mut values: Mapping) -> Result<Self> {
        let mut slots = IndexMap::with_capacity(class.fields().len());

        for spec in class.fields() {
            let initial = match values.shift_remove(spec.name()) {
                Some(value) => spec.validate(value)?,
                None => match spec.default_value() {
                    Some(default) => default.clone(),
                    None if spec.is_optional() => Value::Null,
                    None => {
                        return Err(ConfKeeperError::MissingField {
                            class: class.qualified_name().to_string(),
                            field: spec.name().to_string(),
                        })
                    }
                },
            };
            slots.insert(spec.name().to_string(), FieldSlot::new(spec, initial));
        }

        for key in values.keys() {
            debug!("忽略配置类 {} 中未声明的字段: {}", class.qualified_name(), key);
        }

        Ok(Self {
            class: Arc::clone(class),
            slots,
        })
    }

    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// 配置类限定名
    pub fn class_name(&self) -> &str {
        self.class.qualified_name()
    }

    /// 读取字段值
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.slots.get(field).map(FieldSlot::value)
    }

    /// 校验并设置字段值；失败时字段保持原值
    pub fn set<V: Into<Value>>(&mut self, field: &str, value: V) -> Result<()> {
        let spec = self
            .class
            .field(field)
            .ok_or_else(|| ConfKeeperError::UnknownField {
                class: self.class.qualified_name().to_string(),
                field: field.to_string(),
            })?;
        let value = spec.check_kind(value.into())?;
        let bypass = spec.bypasses_constraints(&value);

        match self.slots.get_mut(field) {
            Some(FieldSlot::Validated(validated)) if !bypass => validated.set(value)?,
            Some(FieldSlot::Validated(validated)) => {
                *validated = ValidatedField::with_shared(
                    spec.name(),
                    Arc::clone(spec.constraints()),
                    value,
                );
            }
            Some(FieldSlot::Plain(current)) => *current = value,
            None => {
                return Err(ConfKeeperError::UnknownField {
                    class: self.class.qualified_name().to_string(),
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }

    /// 按声明顺序遍历字段
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots
            .iter()
            .map(|(name, slot)| (name.as_str(), slot.value()))
    }

    /// 扁平化为字段名到当前值的映射（不含类标记）
    pub fn to_mapping(&self) -> Mapping {
        self.fields()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    pub fn is_instance_of(&self, qualified_name: &str) -> bool {
        self.class_name() == qualified_name
    }
}

impl PartialEq for ConfigInstance {
    fn eq(&self, other: &Self) -> bool {
        self.class_name() == other.class_name()
            && self.slots.len() == other.slots.len()
            && self.fields().zip(other.fields()).all(|(a, b)| a == b)
    }
}

/// 序列化为带类标记的映射
impl Serialize for ConfigInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len() + 1))?;
        map.serialize_entry(CLASS_MARKER, self.class_name())?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
