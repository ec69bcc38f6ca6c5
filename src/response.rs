// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应状态模块
//!
//! `ResponseState` 保存一次请求的唯一结果：状态码、标头、输出字节、终止错误，
//! 以及响应模式（普通 / 重定向 / 已旁路）。处理器通过一组互不依赖的 setter
//! 修改它，最终由 `finalizer` 模块决定唯一的终止动作。

use bytes::Bytes;
use log::warn;

use crate::{
    exception::Exception,
    finalizer::TerminalAction,
    param::REDIRECT_CODES,
    transport::Transport,
};

/// 响应模式。一旦离开 `Normal` 就不会再回到 `Normal`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseMode {
    Normal,
    /// 通过 `redirect` 设置了跳转
    Redirect,
    /// 协作方已经直接向传输层写出了完整响应
    Bypassed,
}

#[derive(Debug, Clone)]
pub struct ResponseState {
    /// 0 表示尚未设置
    status_code: u16,
    headers: Vec<(String, String)>,
    output: Bytes,
    error: Option<Exception>,
    mode: ResponseMode,
    finalized: Option<TerminalAction>,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseState {
    pub fn new() -> Self {
        Self {
            status_code: 0,
            headers: Vec::new(),
            output: Bytes::new(),
            error: None,
            mode: ResponseMode::Normal,
            finalized: None,
        }
    }

    pub fn set_status_code(&mut self, code: u16) {
        self.status_code = code;
    }

    /// 设置标头，替换同名（大小写不敏感）的已有值
    pub fn set_header(&mut self, key: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.headers.push((key.to_string(), value.to_string()));
    }

    /// 追加标头，不影响同名的已有值（用于 `Set-Cookie`）
    pub fn add_header(&mut self, key: &str, value: &str) {
        self.headers.push((key.to_string(), value.to_string()));
    }

    pub fn set_output(&mut self, output: impl Into<Bytes>) {
        self.output = output.into();
    }

    /// 标记响应已由协作方直接写出，Finalizer 不再进行任何写入。
    ///
    /// 必须在协作方写传输层之前调用。
    pub fn bypass(&mut self) {
        if self.mode == ResponseMode::Normal {
            self.mode = ResponseMode::Bypassed;
        }
    }

    /// 设置跳转：状态码与 `Location` 一起设置。
    ///
    /// 只有 301/302/303/307 会进入重定向模式，其他状态码只会写入标头。
    pub fn redirect(&mut self, location: &str, code: u16) {
        self.set_status_code(code);
        self.set_header("Location", location);
        if REDIRECT_CODES.contains(&code) {
            self.mode = ResponseMode::Redirect;
        } else {
            warn!("重定向使用了非重定向状态码{}，将按普通响应处理", code);
        }
    }

    /// 设置终止错误，状态码保持不变（未设置时 Finalizer 使用 500）
    pub fn set_error(&mut self, error: Exception) {
        self.error = Some(error);
    }

    /// 设置终止错误并同时指定状态码
    pub fn set_error_with_status(&mut self, error: Exception, code: u16) {
        self.status_code = code;
        self.error = Some(error);
    }

    /// 以 `TerminalRequestError` 终止请求，响应体即错误体
    pub fn abort(&mut self, code: u16, body: &str) {
        self.set_output(body.to_string());
        self.set_error_with_status(
            Exception::TerminalRequestError {
                code,
                body: body.to_string(),
            },
            code,
        );
    }
}

impl ResponseState {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// 大小写不敏感地查找标头的第一个值
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    pub fn output(&self) -> &Bytes {
        &self.output
    }

    pub fn error(&self) -> Option<&Exception> {
        self.error.as_ref()
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// 显式跳转，或者状态码本身就是重定向状态码
    pub fn is_redirect(&self) -> bool {
        self.mode == ResponseMode::Redirect || REDIRECT_CODES.contains(&self.status_code)
    }

    pub fn is_bypassed(&self) -> bool {
        self.mode == ResponseMode::Bypassed
    }

    pub fn finalized(&self) -> Option<TerminalAction> {
        self.finalized
    }

    pub(crate) fn mark_finalized(&mut self, action: TerminalAction) {
        self.finalized = Some(action);
    }

    /// 将缓存的标头交给传输层。同名标头逐个追加。
    pub fn flush_headers<T: Transport + ?Sized>(&self, transport: &mut T) {
        for (k, v) in &self.headers {
            transport.add_header(k, v);
        }
    }
}
