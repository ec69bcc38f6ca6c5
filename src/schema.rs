// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Schema 绑定模块
//!
//! 把解码后的表单数据（`键 -> 值列表`）按字段名写入处理器提供的结构体。
//!
//! 结构体通过实现 [`Schema`] 给出一张字段描述表：每一项包含字段名、
//! 元素类型以及访问该字段的函数指针。绑定时按表查找，不做运行时反射。
//!
//! ## 规则
//! 1. 请求中存在、但结构体未声明的键会被忽略。
//! 2. 值列表为空的键会被跳过。
//! 3. 列表字段逐个转换后追加；标量字段收到多个值时报 `InvalidArrayValue`。
//! 4. 遇到第一个错误立即返回，不做错误聚合。

use std::collections::HashMap;

use crate::{
    coerce::{coerce_all, coerce_one, Coerce, FieldKind},
    exception::Exception,
};

/// 绑定目标的类型分类。只有结构体可以进行表单绑定。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaKind {
    Struct,
    Other(&'static str),
}

/// 可以作为表单绑定目标的类型。
///
/// 通常用 [`form_schema!`](crate::form_schema) 宏生成实现：
///
/// ```
/// use webctx::form_schema;
///
/// #[derive(Default)]
/// struct Signup {
///     name: String,
///     age: i64,
///     tags: Vec<String>,
/// }
///
/// form_schema!(Signup {
///     "Name" => name: string,
///     "Age" => age: integer,
///     "Tags" => tags: strings,
/// });
/// ```
pub trait Schema: Sized {
    fn schema_kind() -> SchemaKind {
        SchemaKind::Struct
    }

    fn fields() -> Vec<Field<Self>>;
}

enum Slot<T> {
    Str(fn(&mut T) -> &mut String),
    Int(fn(&mut T) -> &mut i64),
    Float(fn(&mut T) -> &mut f64),
    StrList(fn(&mut T) -> &mut Vec<String>),
    IntList(fn(&mut T) -> &mut Vec<i64>),
    FloatList(fn(&mut T) -> &mut Vec<f64>),
    Unsupported(&'static str),
}

/// 字段描述：字段名 + 类型 + 访问器
pub struct Field<T> {
    name: &'static str,
    slot: Slot<T>,
}

impl<T> Field<T> {
    pub fn string(name: &'static str, accessor: fn(&mut T) -> &mut String) -> Self {
        Self { name, slot: Slot::Str(accessor) }
    }

    pub fn integer(name: &'static str, accessor: fn(&mut T) -> &mut i64) -> Self {
        Self { name, slot: Slot::Int(accessor) }
    }

    pub fn float(name: &'static str, accessor: fn(&mut T) -> &mut f64) -> Self {
        Self { name, slot: Slot::Float(accessor) }
    }

    pub fn strings(name: &'static str, accessor: fn(&mut T) -> &mut Vec<String>) -> Self {
        Self { name, slot: Slot::StrList(accessor) }
    }

    pub fn integers(name: &'static str, accessor: fn(&mut T) -> &mut Vec<i64>) -> Self {
        Self { name, slot: Slot::IntList(accessor) }
    }

    pub fn floats(name: &'static str, accessor: fn(&mut T) -> &mut Vec<f64>) -> Self {
        Self { name, slot: Slot::FloatList(accessor) }
    }

    /// 声明一个存在但无法从表单转换的字段（如 `bool`），绑定到它时报错。
    pub fn unsupported(name: &'static str, kind: &'static str) -> Self {
        Self { name, slot: Slot::Unsupported(kind) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 字段（或列表元素）的类型
    pub fn kind(&self) -> FieldKind {
        match self.slot {
            Slot::Str(_) | Slot::StrList(_) => FieldKind::String,
            Slot::Int(_) | Slot::IntList(_) => FieldKind::Integer,
            Slot::Float(_) | Slot::FloatList(_) => FieldKind::Float64,
            Slot::Unsupported(kind) => FieldKind::Unsupported(kind),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self.slot,
            Slot::StrList(_) | Slot::IntList(_) | Slot::FloatList(_)
        )
    }

    fn apply(&self, target: &mut T, values: &[String]) -> Result<(), Exception> {
        let key = self.name;
        if !self.is_collection() && values.len() > 1 {
            return Err(Exception::InvalidArrayValue(key.to_string()));
        }
        match self.slot {
            Slot::Str(acc) => assign(target, acc, key, values),
            Slot::Int(acc) => assign(target, acc, key, values),
            Slot::Float(acc) => assign(target, acc, key, values),
            Slot::StrList(acc) => append(target, acc, key, values),
            Slot::IntList(acc) => append(target, acc, key, values),
            Slot::FloatList(acc) => append(target, acc, key, values),
            Slot::Unsupported(kind) => Err(Exception::UnsupportedFieldType(kind.to_string())),
        }
    }
}

fn assign<T, V: Coerce>(
    target: &mut T,
    accessor: fn(&mut T) -> &mut V,
    key: &str,
    values: &[String],
) -> Result<(), Exception> {
    let value = coerce_one::<V>(key, &values[0])?;
    *accessor(target) = value;
    Ok(())
}

fn append<T, V: Coerce>(
    target: &mut T,
    accessor: fn(&mut T) -> &mut Vec<V>,
    key: &str,
    values: &[String],
) -> Result<(), Exception> {
    let converted = coerce_all::<V>(key, values)?;
    accessor(target).extend(converted);
    Ok(())
}

/// 将表单数据绑定到目标结构体。
///
/// 按字段描述表的声明顺序处理，所以在存在多个非法键时返回的错误是确定的。
pub fn bind_form<T: Schema>(
    body: &HashMap<String, Vec<String>>,
    target: &mut T,
) -> Result<(), Exception> {
    if let SchemaKind::Other(kind) = T::schema_kind() {
        return Err(Exception::InvalidSchemaType(kind.to_string()));
    }

    for field in T::fields() {
        let values = match body.get(field.name()) {
            Some(v) if !v.is_empty() => v,
            _ => continue,
        };
        field.apply(target, values)?;
    }
    Ok(())
}

impl Schema for String {
    fn schema_kind() -> SchemaKind {
        SchemaKind::Other("string")
    }

    fn fields() -> Vec<Field<Self>> {
        Vec::new()
    }
}

impl Schema for i64 {
    fn schema_kind() -> SchemaKind {
        SchemaKind::Other("int64")
    }

    fn fields() -> Vec<Field<Self>> {
        Vec::new()
    }
}

impl Schema for f64 {
    fn schema_kind() -> SchemaKind {
        SchemaKind::Other("float64")
    }

    fn fields() -> Vec<Field<Self>> {
        Vec::new()
    }
}

/// 为结构体生成 [`Schema`] 实现。
///
/// 每一项的格式为 `"表单键" => 字段名: 构造器`，构造器取
/// `string`、`integer`、`float`、`strings`、`integers`、`floats` 之一。
/// 不支持的字段类型写作 `"表单键" => unsupported("类型名")`，绑定时返回
/// `UnsupportedFieldType`。
#[macro_export]
macro_rules! form_schema {
    (@fields $ty:ty; [$($out:expr,)*]) => {
        ::std::vec![$($out),*]
    };
    (@fields $ty:ty; [$($out:expr,)*] $name:literal => unsupported($kind:literal) $(, $($rest:tt)*)?) => {
        $crate::form_schema!(@fields $ty;
            [$($out,)* $crate::schema::Field::<$ty>::unsupported($name, $kind),]
            $($($rest)*)?)
    };
    (@fields $ty:ty; [$($out:expr,)*] $name:literal => $field:ident : $ctor:ident $(, $($rest:tt)*)?) => {
        $crate::form_schema!(@fields $ty;
            [$($out,)* $crate::schema::Field::<$ty>::$ctor($name, |s| &mut s.$field),]
            $($($rest)*)?)
    };
    ($ty:ty { $($body:tt)* }) => {
        impl $crate::schema::Schema for $ty {
            fn fields() -> ::std::vec::Vec<$crate::schema::Field<Self>> {
                $crate::form_schema!(@fields $ty; [] $($body)*)
            }
        }
    };
}
