// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求上下文模块
//!
//! `RequestContext` 由单个在途请求独占，持有：
//! - 原始请求与解码后的查询参数、请求体；
//! - 上传文件列表（请求结束时由服务器统一删除）；
//! - 供处理器使用的语言标识与自定义数据；
//! - 本次请求唯一的 `ResponseState`。
//!
//! 响应相关的便捷方法（JSON、纯文本、模板、发送文件等）见 `controller` 模块。

use std::{collections::HashMap, path::Path, sync::Arc};

use bytes::Bytes;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    body::{decode_form, decode_json, decode_multipart, parse_query, DecodedBody},
    controller::Renderer,
    cookie::{encode_cookie, parse_cookie_header, CookieOptions},
    exception::Exception,
    param::ContentType,
    request::Request,
    response::ResponseState,
    schema::{bind_form, Schema},
    upload::Files,
};

pub struct RequestContext {
    id: u128,
    request: Request,
    query: HashMap<String, Value>,
    content_type: ContentType,
    body: DecodedBody,
    files: Files,
    cookies: Vec<(String, String)>,
    /// `Accept-Language` 的第一个语言标签，缺失时为空
    pub lang: String,
    /// 处理器自定义数据（例如会话信息）
    pub user: HashMap<String, Value>,
    renderer: Option<Arc<dyn Renderer>>,
    response: ResponseState,
}

impl RequestContext {
    /// 根据已解析的请求构建上下文，并按 Content-Type 解码请求体。
    ///
    /// multipart 中的文件会写入 `upload_dir`。JSON 解码失败不会中断构建：
    /// 解码结果为空，错误会在 `validate_schema` 时返回。
    pub fn from_request(request: Request, id: u128, upload_dir: &Path) -> Result<Self, Exception> {
        let content_type = ContentType::classify(request.content_type());
        let query = parse_query(request.query());
        let cookies = request
            .header("Cookie")
            .map(parse_cookie_header)
            .unwrap_or_default();
        let lang = request
            .header("Accept-Language")
            .and_then(|v| v.split([',', ';']).next())
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        let mut files = Files::new();
        let body = match content_type {
            ContentType::Form => DecodedBody::Form(decode_form(request.body())),
            ContentType::Json => match decode_json(request.body()) {
                Ok(v) => DecodedBody::Json(v),
                Err(e) => {
                    warn!("[ID{}]{}", id, e);
                    DecodedBody::Empty
                }
            },
            ContentType::Multipart => {
                let (fields, uploaded) =
                    decode_multipart(request.body(), request.content_type(), upload_dir, id)?;
                files = uploaded;
                DecodedBody::Form(fields)
            }
            ContentType::Other => DecodedBody::Empty,
        };
        debug!(
            "[ID{}]请求体解码完成: {:?}, 上传文件{}个",
            id,
            content_type,
            files.len()
        );

        Ok(Self {
            id,
            request,
            query,
            content_type,
            body,
            files,
            cookies,
            lang,
            user: HashMap::new(),
            renderer: None,
            response: ResponseState::new(),
        })
    }

    /// 注入模板渲染器
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn id(&self) -> u128 {
        self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    pub fn query(&self) -> &HashMap<String, Value> {
        &self.query
    }

    /// 单值查询参数。重复出现的键返回第一个值。
    pub fn query_value(&self, key: &str) -> Option<&str> {
        match self.query.get(key)? {
            Value::String(s) => Some(s),
            Value::Array(values) => values.first().and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// 原始请求体
    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub fn decoded_body(&self) -> &DecodedBody {
        &self.body
    }

    /// 表单（或 multipart 文本字段）数据
    pub fn form(&self) -> Option<&HashMap<String, Vec<String>>> {
        match &self.body {
            DecodedBody::Form(map) => Some(map),
            _ => None,
        }
    }

    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form()?.get(key)?.first().map(String::as_str)
    }

    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            DecodedBody::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn files(&self) -> &Files {
        &self.files
    }

    /// 取走上传文件的所有权，此后由调用方负责删除
    pub fn take_files(&mut self) -> Files {
        std::mem::take(&mut self.files)
    }

    /// 大小写不敏感地读取请求头
    pub fn header(&self, key: &str) -> Option<&str> {
        self.request.header(key)
    }

    /// 读取请求中的 Cookie，不存在时返回空字符串
    pub fn cookie(&self, name: &str) -> &str {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// 追加一个 `Set-Cookie` 响应头，多次调用不会互相覆盖
    pub fn set_cookie(&mut self, name: &str, value: &str, options: &CookieOptions) {
        let cookie = encode_cookie(name, value, options);
        self.response.add_header("Set-Cookie", &cookie);
    }

    /// 将请求数据绑定到 `schema`。
    ///
    /// - JSON：对原始请求体整体反序列化，结果替换 `schema`。
    /// - 表单 / multipart：按字段描述表逐个写入，未声明的键被忽略。
    /// - 其他类型：`InvalidContentType`。
    ///
    /// 错误原样返回，不会自动写入响应。
    pub fn validate_schema<T>(&self, schema: &mut T) -> Result<(), Exception>
    where
        T: Schema + DeserializeOwned,
    {
        match self.content_type {
            ContentType::Json => {
                *schema = serde_json::from_slice(self.request.body())
                    .map_err(|e| Exception::InvalidJson(e.to_string()))?;
                Ok(())
            }
            ContentType::Form | ContentType::Multipart => {
                let empty = HashMap::new();
                let form = self.form().unwrap_or(&empty);
                bind_form(form, schema)
            }
            ContentType::Other => Err(Exception::InvalidContentType),
        }
    }

    pub(crate) fn renderer(&self) -> Option<&Arc<dyn Renderer>> {
        self.renderer.as_ref()
    }

    pub fn response(&self) -> &ResponseState {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseState {
        &mut self.response
    }

    pub fn is_redirect(&self) -> bool {
        self.response.is_redirect()
    }
}
