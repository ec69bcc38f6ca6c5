// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 控制器模块
//!
//! 一个请求的处理顺序固定为 Prepare → 处理器 → Finish → Finalizer。
//! 本模块同时为 `RequestContext` 提供常用的响应便捷方法，它们都只修改
//! `ResponseState`，唯一的例外是 `send_file`：它直接写传输层，并在写之前
//! 把响应标记为已旁路。

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::{
    context::RequestContext,
    exception::Exception,
    finalizer::{finalize, TerminalAction},
    param::get_mime,
    response::ResponseMode,
    transport::Transport,
};

const SEND_FILE_CHUNK: usize = 8192;

/// 模板渲染器，由服务器进程持有并注入每个请求
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, data: &Value) -> Result<String, String>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &Value) -> Result<String, String> + Send + Sync,
{
    fn render(&self, template: &str, data: &Value) -> Result<String, String> {
        self(template, data)
    }
}

pub trait Controller {
    /// 返回 false 时跳过处理器，但仍会执行 Finish 与 Finalizer
    fn prepare(&mut self, _ctx: &mut RequestContext) -> bool {
        true
    }

    fn handle(&mut self, ctx: &mut RequestContext, transport: &mut dyn Transport);

    fn finish(&mut self, _ctx: &mut RequestContext) {}
}

/// 驱动一个请求的完整生命周期，返回实际执行的终止动作
pub fn run(
    controller: &mut dyn Controller,
    ctx: &mut RequestContext,
    transport: &mut dyn Transport,
) -> TerminalAction {
    if controller.prepare(ctx) {
        controller.handle(ctx, transport);
    } else {
        debug!("[ID{}]Prepare返回false，跳过处理器", ctx.id());
    }
    controller.finish(ctx);
    let id = ctx.id();
    finalize(ctx.response_mut(), transport, id)
}

/// 把序列化结果中的非 ASCII 字符转成 `\uXXXX`，超出 BMP 的字符使用代理对
pub fn escape_unicode(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

impl RequestContext {
    pub fn plain(&mut self, text: &str) {
        let response = self.response_mut();
        response.set_header("Content-Type", "text/plain; charset=utf-8");
        response.set_output(text.to_string());
    }

    /// 输出 JSON。序列化失败时设置终止错误。
    pub fn json<S: Serialize + ?Sized>(&mut self, data: &S, escape: bool) {
        match serde_json::to_string(data) {
            Ok(encoded) => {
                let encoded = if escape {
                    escape_unicode(&encoded)
                } else {
                    encoded
                };
                let response = self.response_mut();
                response.set_header("Content-Type", "application/json; charset=utf-8");
                response.set_output(encoded);
            }
            Err(e) => self
                .response_mut()
                .set_error(Exception::JsonEncode(e.to_string())),
        }
    }

    /// 调用注入的渲染器输出 HTML
    pub fn render(&mut self, template: &str, data: &Value) {
        let rendered = match self.renderer() {
            Some(renderer) => renderer.render(template, data).map_err(Exception::Render),
            None => Err(Exception::Render(format!("没有可用的渲染器: {}", template))),
        };
        match rendered {
            Ok(html) => {
                let response = self.response_mut();
                response.set_header("Content-Type", "text/html; charset=utf-8");
                response.set_output(html);
            }
            Err(e) => self.response_mut().set_error(e),
        }
    }

    pub fn error(&mut self, code: u16, body: &str) {
        self.response_mut().abort(code, body);
    }

    /// `body` 为空时使用默认的 `504 Gateway Timeout`
    pub fn error_504(&mut self, body: &str) {
        let body = if body.is_empty() {
            "504 Gateway Timeout"
        } else {
            body
        };
        self.error(504, body);
    }

    /// 声明处理器将自行写出完整响应
    pub fn custom_response(&mut self) {
        self.response_mut().bypass();
    }

    pub fn redirect(&mut self, location: &str, code: u16) {
        self.response_mut().redirect(location, code);
    }

    pub fn set_header(&mut self, key: &str, value: &str) {
        self.response_mut().set_header(key, value);
    }

    pub fn set_status_code(&mut self, code: u16) {
        self.response_mut().set_status_code(code);
    }

    pub fn set_output(&mut self, output: impl Into<bytes::Bytes>) {
        self.response_mut().set_output(output);
    }

    /// 请求头的值，不存在时为空字符串
    pub fn get_header(&self, key: &str) -> &str {
        self.header(key).unwrap_or("")
    }

    /// 直接把文件写到传输层。
    ///
    /// 响应已是重定向、旁路或带有错误时返回 `ResponseAlreadyDecided`，不写传输层。
    /// 文件打不开时返回 `FileNotFound`，响应保持普通模式，由处理器决定如何报错。
    /// 打开成功后先标记旁路，再写标头与内容。
    pub fn send_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        transport: &mut dyn Transport,
    ) -> Result<(), Exception> {
        let path = path.as_ref();
        let response = self.response();
        if response.mode() != ResponseMode::Normal
            || response.is_redirect()
            || response.error().is_some()
        {
            warn!(
                "[ID{}]响应已确定（{:?}），拒绝发送文件{}",
                self.id(),
                response.mode(),
                path.display()
            );
            return Err(Exception::ResponseAlreadyDecided);
        }
        let mut file = File::open(path).map_err(|e| {
            warn!("[ID{}]无法打开文件{}: {}", self.id(), path.display(), e);
            Exception::FileNotFound
        })?;
        let size = file.metadata()?.len();

        self.response_mut().bypass();
        self.response().flush_headers(transport);
        let mime = get_mime(path.extension().and_then(|e| e.to_str()));
        transport.set_header("Content-Type", mime);
        transport.set_header("Content-Length", &size.to_string());
        transport.write_header(200)?;

        let mut buf = vec![0u8; SEND_FILE_CHUNK];
        loop {
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            transport.write_body(&buf[..n])?;
        }
        debug!("[ID{}]已发送文件{}，{}字节", self.id(), path.display(), size);
        Ok(())
    }
}
