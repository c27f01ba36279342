//! 配置类描述与构建器
//!
//! `ClassBuilder` 根据字段声明生成 [`ClassDescriptor`]，并注册到 [`ClassRegistry`]。
//! 带约束的字段在实例中由 `ValidatedField` 承载，无约束字段保持普通读写。

use crate::error::{ConfKeeperError, Result, ValidationError};
use crate::schema::field::{Constraints, Rule};
use crate::schema::registry::ClassRegistry;
use crate::schema::ConfigInstance;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// 字段的值类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// 任意值
    Any,
    Bool,
    Integer,
    /// 浮点数，整数会被转换为浮点数
    Float,
    String,
    Sequence,
    Mapping,
    /// 指定限定名的配置类实例
    Class(String),
}

impl FieldKind {
    /// 检查值是否符合类型
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Any, _) => true,
            (FieldKind::Bool, Value::Bool(_)) => true,
            (FieldKind::Integer, Value::Integer(_)) => true,
            (FieldKind::Float, Value::Float(_) | Value::Integer(_)) => true,
            (FieldKind::String, Value::String(_)) => true,
            (FieldKind::Sequence, Value::Sequence(_)) => true,
            (FieldKind::Mapping, Value::Mapping(_)) => true,
            (FieldKind::Class(name), Value::Instance(instance)) => instance.class_name() == name,
            _ => false,
        }
    }

    fn coerce(&self, value: Value) -> Value {
        match (self, value) {
            (FieldKind::Float, Value::Integer(i)) => Value::Float(i as f64),
            (_, value) => value,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Any => write!(f, "any"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::String => write!(f, "string"),
            FieldKind::Sequence => write!(f, "sequence"),
            FieldKind::Mapping => write!(f, "mapping"),
            FieldKind::Class(name) => write!(f, "{name}"),
        }
    }
}

/// 字段声明
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    optional: bool,
    default: Option<Value>,
    constraints: Arc<Constraints<Value>>,
}

impl FieldSpec {
    pub fn new<N: Into<String>>(name: N, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            default: None,
            constraints: Arc::new(Constraints::new()),
        }
    }

    /// 设置默认值（注册时不校验）
    pub fn default<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }

    /// 允许空值，缺省时为 null
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// 下界（不含）
    pub fn gt<V: Into<Value>>(mut self, bound: V) -> Self {
        self.update_constraints(|c| c.gt(bound.into()));
        self
    }

    /// 上界（不含）
    pub fn lt<V: Into<Value>>(mut self, bound: V) -> Self {
        self.update_constraints(|c| c.lt(bound.into()));
        self
    }

    /// 取值集合
    pub fn one_of<I, V>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
        self.update_constraints(|c| c.one_of(allowed));
        self
    }

    /// 自定义断言
    pub fn predicate<N, F>(mut self, name: N, check: F) -> Self
    where
        N: Into<String>,
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.update_constraints(|c| c.predicate(name, check));
        self
    }

    fn update_constraints<F>(&mut self, apply: F)
    where
        F: FnOnce(Constraints<Value>) -> Constraints<Value>,
    {
        let current = Constraints::clone(&self.constraints);
        self.constraints = Arc::new(apply(current));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// 既没有默认值也不允许空值
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.optional
    }

    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty()
    }

    pub fn constraints(&self) -> &Arc<Constraints<Value>> {
        &self.constraints
    }

    /// 检查类型并做必要的转换（不含约束检查）
    pub(crate) fn check_kind(&self, value: Value) -> std::result::Result<Value, ValidationError> {
        if self.bypasses_constraints(&value) {
            return Ok(value);
        }
        if !self.kind.accepts(&value) {
            return Err(ValidationError {
                field: self.name.clone(),
                rule: Rule::Type(self.kind.clone()),
                value,
            });
        }
        Ok(self.kind.coerce(value))
    }

    /// 可选字段的空值跳过约束检查
    pub(crate) fn bypasses_constraints(&self, value: &Value) -> bool {
        self.optional && value.is_null()
    }

    /// 类型与约束的完整校验，返回转换后的值
    ///
    /// 非可选字段的空值同样要经过约束检查，与上下界不可比时即不满足。
    pub fn validate(&self, value: Value) -> std::result::Result<Value, ValidationError> {
        let value = self.check_kind(value)?;
        if !self.bypasses_constraints(&value) {
            self.constraints.check(&self.name, &value)?;
        }
        Ok(value)
    }
}

/// 配置类描述
#[derive(Debug)]
pub struct ClassDescriptor {
    module: String,
    name: String,
    qualified_name: String,
    fields: Vec<FieldSpec>,
}

impl ClassDescriptor {
    /// 模块路径
    pub fn module(&self) -> &str {
        &self.module
    }

    /// 类名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 限定名 `<module>.<ClassName>`
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// 用默认值创建实例
    pub fn instantiate(self: &Arc<Self>) -> Result<ConfigInstance> {
        ConfigInstance::new(self)
    }

    /// 主动校验所有默认值（默认情况下默认值不做校验）
    pub fn validate_defaults(&self) -> Result<()> {
        for spec in &self.fields {
            if let Some(default) = &spec.default {
                spec.validate(default.clone())?;
            }
        }
        Ok(())
    }
}

/// 生成限定名
pub fn qualify(module: &str, name: &str) -> String {
    format!("{module}.{name}")
}

/// 配置类构建器
#[derive(Debug)]
pub struct ClassBuilder {
    module: String,
    name: String,
    fields: Vec<FieldSpec>,
}

impl ClassBuilder {
    /// 创建构建器
    ///
    /// # 参数
    /// * `module` - 所在模块路径，与类名一起组成限定名
    /// * `name` - 类名
    pub fn new<M: Into<String>, N: Into<String>>(module: M, name: N) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// 追加字段声明
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn qualified_name(&self) -> String {
        qualify(&self.module, &self.name)
    }

    /// 生成描述（不注册）
    pub fn build(self) -> Result<ClassDescriptor> {
        if self.name.trim().is_empty() {
            return Err(ConfKeeperError::Configuration("配置类名不能为空".to_string()));
        }

        for (index, spec) in self.fields.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(ConfKeeperError::Configuration(format!(
                    "配置类 {} 的字段名不能为空",
                    self.name
                )));
            }
            if self.fields[..index].iter().any(|other| other.name == spec.name) {
                return Err(ConfKeeperError::Configuration(format!(
                    "配置类 {} 的字段重复: {}",
                    self.name, spec.name
                )));
            }
        }

        Ok(ClassDescriptor {
            qualified_name: qualify(&self.module, &self.name),
            module: self.module,
            name: self.name,
            fields: self.fields,
        })
    }

    /// 生成描述并注册
    pub fn register(self, registry: &ClassRegistry) -> Result<Arc<ClassDescriptor>> {
        registry.register(self.build()?)
    }
}

/// 以调用处的模块路径创建 [`ClassBuilder`]
///
/// ```
/// use confkeeper::schema::{FieldKind, FieldSpec};
///
/// let builder = confkeeper::config_class!("Server")
///     .field(FieldSpec::new("port", FieldKind::Integer).default(8080).gt(0).lt(65536));
/// assert!(builder.qualified_name().ends_with(".Server"));
/// ```
#[macro_export]
macro_rules! config_class {
    ($name:expr) => {
        $crate::schema::ClassBuilder::new(module_path!(), $name)
    };
}
