// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了请求上下文在整个生命周期中可能产生的各类异常情况。
//!
//! ## 分类
//! - **协议解析**：请求报文本身无法被理解（编码、方法、版本、报文长度）。
//! - **请求体解码**：JSON 或 multipart 报文格式错误。
//! - **Schema 绑定**：表单值无法写入目标结构体的字段。
//! - **响应阶段**：序列化、模板渲染失败，以及处理器主动终止请求。
//!
//! 绑定阶段的异常只会返回给调用方，是否转化为 `TerminalRequestError` 由处理器决定。

use std::{fmt, io};

/// 请求处理过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 客户端使用了服务器暂不支持的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 请求行或标头格式不正确。
    MalformedRequest,
    /// 请求体超过配置的 `max_body_size`。对应 `413 Content Too Large`。
    PayloadTooLarge,
    /// multipart 报文缺少 boundary 或分段格式错误。
    MalformedMultipart,
    /// 请求的文件不存在。对应 `404 Not Found`。
    FileNotFound,
    /// 当前请求的 Content-Type 不支持 Schema 绑定。
    InvalidContentType,
    /// 绑定目标不是结构体（记录）类型，携带目标的类型描述。
    InvalidSchemaType(String),
    /// 某个键对应的原始值无法转换为字段要求的类型。
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
    /// 标量字段收到了多个值。
    InvalidArrayValue(String),
    /// 字段类型不在可转换的范围内（仅支持字符串、整数、浮点数及其列表）。
    UnsupportedFieldType(String),
    /// JSON 请求体无法反序列化到目标结构体。
    InvalidJson(String),
    /// 响应数据无法序列化为 JSON。
    JsonEncode(String),
    /// 模板渲染失败。
    Render(String),
    /// 文件系统或传输层 I/O 错误。
    Io(String),
    /// 处理器主动终止请求，携带状态码与响应体。
    TerminalRequestError { code: u16, body: String },
    /// 响应已进入重定向、旁路或错误状态，不能再直接写传输层。
    ResponseAlreadyDecided,
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            MalformedRequest => write!(f, "Malformed HTTP request"),
            PayloadTooLarge => write!(f, "Request payload too large (413)"),
            MalformedMultipart => write!(f, "Malformed multipart body"),
            FileNotFound => write!(f, "File not found (404)"),
            InvalidContentType => write!(f, "Invalid content type"),
            InvalidSchemaType(kind) => write!(f, "Invalid validation struct type: {}", kind),
            InvalidValue {
                key,
                value,
                expected,
            } => write!(
                f,
                "Invalid value '{}' for key '{}', must be {}",
                value, key, expected
            ),
            InvalidArrayValue(key) => write!(f, "Invalid array value for key '{}'", key),
            UnsupportedFieldType(kind) => write!(f, "Unsupported field type: {}", kind),
            InvalidJson(msg) => write!(f, "Invalid JSON body: {}", msg),
            JsonEncode(msg) => write!(f, "Couldn't encode JSON: {}", msg),
            Render(msg) => write!(f, "Template render failed: {}", msg),
            Io(msg) => write!(f, "I/O error: {}", msg),
            TerminalRequestError { code, body } => {
                write!(f, "Request terminated with {}: {}", code, body)
            }
            ResponseAlreadyDecided => write!(f, "Response outcome already decided"),
        }
    }
}

impl std::error::Error for Exception {}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        Io(e.to_string())
    }
}

impl Exception {
    /// 异常所对应的默认 HTTP 状态码。
    pub fn status_code(&self) -> u16 {
        match self {
            RequestIsNotUtf8 | UnSupportedRequestMethod | MalformedRequest | MalformedMultipart => {
                400
            }
            UnsupportedHttpVersion => 505,
            PayloadTooLarge => 413,
            FileNotFound => 404,
            InvalidContentType => 415,
            InvalidSchemaType(_) | UnsupportedFieldType(_) => 500,
            InvalidValue { .. } | InvalidArrayValue(_) | InvalidJson(_) => 400,
            JsonEncode(_) | Render(_) | Io(_) | ResponseAlreadyDecided => 500,
            TerminalRequestError { code, .. } => *code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_message() {
        let e = InvalidValue {
            key: "Age".to_string(),
            value: "abc".to_string(),
            expected: "Integer".to_string(),
        };
        assert_eq!(e.to_string(), "Invalid value 'abc' for key 'Age', must be Integer");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PayloadTooLarge.status_code(), 413);
        assert_eq!(InvalidArrayValue("x".to_string()).status_code(), 400);
        assert_eq!(
            TerminalRequestError {
                code: 418,
                body: String::new()
            }
            .status_code(),
            418
        );
        assert_eq!(ResponseAlreadyDecided.status_code(), 500);
        assert_eq!(
            ResponseAlreadyDecided.to_string(),
            "Response outcome already decided"
        );
    }

    #[test]
    fn test_from_io_error() {
        let e: Exception = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, Io(ref m) if m.contains("gone")));
    }
}
