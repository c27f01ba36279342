//! 字段校验器
//!
//! `ValidatedField<T>` 包装一个字段的当前值及其约束。赋值时依次检查：
//! 下界（不含）、上界（不含）、枚举集合、自定义断言（按声明顺序）。
//! 第一个失败的检查返回 [`ValidationError`]，且字段值保持不变。

use crate::error::ValidationError;
use crate::schema::FieldKind;
use crate::value::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// 违反的约束规则
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// 值的类型与字段声明不符
    Type(FieldKind),
    /// 必须大于下界
    GreaterThan(Value),
    /// 必须小于上界
    LessThan(Value),
    /// 必须属于给定集合
    OneOf(Vec<Value>),
    /// 自定义断言（记录断言名称）
    Predicate(String),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Type(kind) => write!(f, "类型必须为 {kind}"),
            Rule::GreaterThan(bound) => write!(f, "必须大于 {bound}"),
            Rule::LessThan(bound) => write!(f, "必须小于 {bound}"),
            Rule::OneOf(allowed) => write!(f, "必须属于 {}", Value::Sequence(allowed.clone())),
            Rule::Predicate(name) => write!(f, "不满足约束 {name}"),
        }
    }
}

/// 断言函数类型
pub type PredicateFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// 命名的自定义断言
pub struct Predicate<T> {
    name: String,
    check: PredicateFn<T>,
}

impl<T> Predicate<T> {
    pub fn new<N, F>(name: N, check: F) -> Self
    where
        N: Into<String>,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test(&self, value: &T) -> bool {
        (self.check)(value)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            check: Arc::clone(&self.check),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

/// 字段约束集合
#[derive(Debug, Clone)]
pub struct Constraints<T> {
    gt: Option<T>,
    lt: Option<T>,
    one_of: Option<Vec<T>>,
    predicates: Vec<Predicate<T>>,
}

impl<T> Default for Constraints<T> {
    fn default() -> Self {
        Self {
            gt: None,
            lt: None,
            one_of: None,
            predicates: Vec::new(),
        }
    }
}

impl<T> Constraints<T>
where
    T: PartialOrd + Clone + Into<Value>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置下界（不含）
    pub fn gt(mut self, bound: T) -> Self {
        self.gt = Some(bound);
        self
    }

    /// 设置上界（不含）
    pub fn lt(mut self, bound: T) -> Self {
        self.lt = Some(bound);
        self
    }

    /// 限定取值集合
    pub fn one_of<I: IntoIterator<Item = T>>(mut self, allowed: I) -> Self {
        self.one_of = Some(allowed.into_iter().collect());
        self
    }

    /// 追加自定义断言
    pub fn predicate<N, F>(mut self, name: N, check: F) -> Self
    where
        N: Into<String>,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Predicate::new(name, check));
        self
    }

    pub fn lower_bound(&self) -> Option<&T> {
        self.gt.as_ref()
    }

    pub fn upper_bound(&self) -> Option<&T> {
        self.lt.as_ref()
    }

    pub fn allowed(&self) -> Option<&[T]> {
        self.one_of.as_deref()
    }

    pub fn predicates(&self) -> &[Predicate<T>] {
        &self.predicates
    }

    /// 是否没有任何约束
    pub fn is_empty(&self) -> bool {
        self.gt.is_none() && self.lt.is_none() && self.one_of.is_none() && self.predicates.is_empty()
    }

    /// 按固定顺序检查值
    ///
    /// # 参数
    /// * `field` - 字段名，用于错误信息
    /// * `value` - 待检查的值
    ///
    /// # 返回
    /// * `Result<(), ValidationError>` - 第一个失败的规则
    pub fn check(&self, field: &str, value: &T) -> Result<(), ValidationError> {
        if let Some(bound) = &self.gt {
            if value.partial_cmp(bound) != Some(Ordering::Greater) {
                return Err(violation(field, Rule::GreaterThan(bound.clone().into()), value));
            }
        }

        if let Some(bound) = &self.lt {
            if value.partial_cmp(bound) != Some(Ordering::Less) {
                return Err(violation(field, Rule::LessThan(bound.clone().into()), value));
            }
        }

        if let Some(allowed) = &self.one_of {
            if !allowed.iter().any(|candidate| candidate == value) {
                let allowed = allowed.iter().cloned().map(Into::into).collect();
                return Err(violation(field, Rule::OneOf(allowed), value));
            }
        }

        for predicate in &self.predicates {
            if !predicate.test(value) {
                return Err(violation(
                    field,
                    Rule::Predicate(predicate.name().to_string()),
                    value,
                ));
            }
        }

        Ok(())
    }
}

fn violation<T: Clone + Into<Value>>(field: &str, rule: Rule, value: &T) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        rule,
        value: value.clone().into(),
    }
}

/// 带约束的字段
///
/// 构造时不校验初始值（默认值延迟校验），之后的每次 `set` 都先完整校验再赋值。
#[derive(Debug, Clone)]
pub struct ValidatedField<T> {
    name: String,
    constraints: Arc<Constraints<T>>,
    value: T,
}

impl<T> ValidatedField<T>
where
    T: PartialOrd + Clone + Into<Value>,
{
    pub fn new<N: Into<String>>(name: N, constraints: Constraints<T>, initial: T) -> Self {
        Self::with_shared(name, Arc::new(constraints), initial)
    }

    /// 与其他实例共享同一份约束
    pub fn with_shared<N: Into<String>>(
        name: N,
        constraints: Arc<Constraints<T>>,
        initial: T,
    ) -> Self {
        Self {
            name: name.into(),
            constraints,
            value: initial,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraints(&self) -> &Constraints<T> {
        &self.constraints
    }

    /// 读取当前值
    pub fn get(&self) -> &T {
        &self.value
    }

    /// 校验并赋值；失败时不修改当前值
    pub fn set(&mut self, value: T) -> Result<(), ValidationError> {
        self.constraints.check(&self.name, &value)?;
        self.value = value;
        Ok(())
    }

    /// 只校验不赋值
    pub fn validate(&self, value: &T) -> Result<(), ValidationError> {
        self.constraints.check(&self.name, value)
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: PartialEq> PartialEq for ValidatedField<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}
