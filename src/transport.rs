//! 传输层抽象。
//!
//! Finalizer 只通过 [`Transport`] 写出响应；[`BufferedTransport`] 把写入内容
//! 组装为完整的 HTTP/1.1 响应报文，交给服务器一次性发送。

use std::io;

use chrono::Utc;

use crate::{
    param::{CRLF, SERVER_NAME, STATUS_CODES},
    util::format_http_date,
};

pub trait Transport {
    /// 设置标头，替换同名值
    fn set_header(&mut self, key: &str, value: &str);
    /// 追加标头
    fn add_header(&mut self, key: &str, value: &str);
    /// 写出状态行。每个响应只能调用一次。
    fn write_header(&mut self, code: u16) -> io::Result<()>;
    /// 写出响应体。未写状态行时隐式使用 200。
    fn write_body(&mut self, body: &[u8]) -> io::Result<()>;
}

/// 在内存中组装响应报文的传输层实现
#[derive(Debug, Clone, Default)]
pub struct BufferedTransport {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    /// HEAD 请求：保留 Content-Length，但不输出响应体
    head_only: bool,
}

impl BufferedTransport {
    pub fn new(head_only: bool) -> Self {
        Self {
            head_only,
            ..Default::default()
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// 某个标头的全部值
    pub fn header_values(&self, key: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_written(&self) -> bool {
        self.status.is_some()
    }

    /// 生成完整的响应报文。什么都没有写过时按 `200 OK` 空响应处理。
    pub fn as_bytes(&self) -> Vec<u8> {
        let code = self.status.unwrap_or(200);
        let reason = STATUS_CODES.get(&code).copied().unwrap_or("Unknown");

        let mut head = format!("HTTP/1.1 {} {}{}", code, reason, CRLF);
        head.push_str(&format!("Date: {}{}", format_http_date(&Utc::now()), CRLF));
        head.push_str(&format!("Server: {}{}", SERVER_NAME, CRLF));
        for (k, v) in &self.headers {
            head.push_str(&format!("{}: {}{}", k, v, CRLF));
        }
        if self.header("Content-Length").is_none() {
            head.push_str(&format!("Content-Length: {}{}", self.body.len(), CRLF));
        }
        head.push_str(&format!("Connection: close{}", CRLF));
        head.push_str(CRLF);

        let mut bytes = head.into_bytes();
        if !self.head_only {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

impl Transport for BufferedTransport {
    fn set_header(&mut self, key: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.headers.push((key.to_string(), value.to_string()));
    }

    fn add_header(&mut self, key: &str, value: &str) {
        self.headers.push((key.to_string(), value.to_string()));
    }

    fn write_header(&mut self, code: u16) -> io::Result<()> {
        if self.status.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "status line already written",
            ));
        }
        self.status = Some(code);
        Ok(())
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        if self.status.is_none() {
            self.status = Some(200);
        }
        self.body.extend_from_slice(body);
        Ok(())
    }
}
