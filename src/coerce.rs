//! 表单值转换：把字符串形式的原始值转换为字段要求的标量类型。
//!
//! 转换失败时返回的异常会带上出错的原始值和它所属的键。

use crate::exception::Exception;

/// 绑定目标字段的元素类型。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    String,
    Integer,
    Float64,
    /// 不支持转换的类型，携带类型描述（例如 `bool`）
    Unsupported(&'static str),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "String",
            FieldKind::Integer => "Integer",
            FieldKind::Float64 => "Float64",
            FieldKind::Unsupported(kind) => kind,
        }
    }
}

/// 可以由单个表单值转换得到的标量类型。
pub trait Coerce: Sized {
    const KIND: FieldKind;

    fn coerce(key: &str, raw: &str) -> Result<Self, Exception>;
}

impl Coerce for String {
    const KIND: FieldKind = FieldKind::String;

    fn coerce(_key: &str, raw: &str) -> Result<Self, Exception> {
        Ok(raw.to_string())
    }
}

impl Coerce for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn coerce(key: &str, raw: &str) -> Result<Self, Exception> {
        raw.parse::<i64>()
            .map_err(|_| invalid_value(key, raw, Self::KIND))
    }
}

impl Coerce for f64 {
    const KIND: FieldKind = FieldKind::Float64;

    fn coerce(key: &str, raw: &str) -> Result<Self, Exception> {
        raw.parse::<f64>()
            .map_err(|_| invalid_value(key, raw, Self::KIND))
    }
}

fn invalid_value(key: &str, raw: &str, kind: FieldKind) -> Exception {
    Exception::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        expected: kind.name().to_string(),
    }
}

/// 转换单个原始值
pub fn coerce_one<V: Coerce>(key: &str, raw: &str) -> Result<V, Exception> {
    V::coerce(key, raw)
}

/// 逐个转换一组原始值，保持输入顺序。
///
/// 遇到第一个非法值即返回错误；结果先缓存在新的 `Vec` 中，
/// 调用方只有在全部成功时才会拿到它。
pub fn coerce_all<V: Coerce>(key: &str, raws: &[String]) -> Result<Vec<V>, Exception> {
    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
        out.push(V::coerce(key, raw)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_string_passthrough() {
        let v: String = coerce_one("name", "  hello;\n").unwrap();
        assert_eq!(v, "  hello;\n");
    }

    #[test]
    fn test_integer() {
        assert_eq!(coerce_one::<i64>("Age", "42").unwrap(), 42);
        assert_eq!(coerce_one::<i64>("Age", "-7").unwrap(), -7);
        assert_eq!(coerce_one::<i64>("Age", "+3").unwrap(), 3);
    }

    #[test]
    fn test_integer_invalid() {
        let err = coerce_one::<i64>("Age", "abc").unwrap_err();
        assert_eq!(
            err,
            Exception::InvalidValue {
                key: "Age".to_string(),
                value: "abc".to_string(),
                expected: "Integer".to_string(),
            }
        );
        assert!(coerce_one::<i64>("Age", "4.2").is_err());
        assert!(coerce_one::<i64>("Age", "").is_err());
    }

    #[test]
    fn test_float() {
        assert_eq!(coerce_one::<f64>("Price", "3.5").unwrap(), 3.5);
        assert_eq!(coerce_one::<f64>("Price", "10").unwrap(), 10.0);
        assert_eq!(coerce_one::<f64>("Price", "-1e3").unwrap(), -1000.0);
    }

    #[test]
    fn test_float_invalid() {
        match coerce_one::<f64>("Price", "cheap") {
            Err(Exception::InvalidValue { key, value, expected }) => {
                assert_eq!(key, "Price");
                assert_eq!(value, "cheap");
                assert_eq!(expected, "Float64");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_coerce_all_keeps_order() {
        let v: Vec<i64> = coerce_all("Ids", &strings(&["3", "1", "2"])).unwrap();
        assert_eq!(v, vec![3, 1, 2]);
    }

    #[test]
    fn test_coerce_all_stops_at_first_invalid() {
        let err = coerce_all::<i64>("Ids", &strings(&["1", "x", "y"])).unwrap_err();
        assert!(matches!(err, Exception::InvalidValue { ref value, .. } if value == "x"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(FieldKind::Integer.name(), "Integer");
        assert_eq!(FieldKind::Unsupported("bool").name(), "bool");
    }
}
