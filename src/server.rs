// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 连接处理模块
//!
//! 负责单个连接的生命周期：
//! 1. 读取请求报文，直到报文头完整且 `Content-Length` 得到满足。
//! 2. 解析请求、构建 `RequestContext`，按精确路径分发给控制器。
//! 3. 由 Finalizer 把结果写入 `BufferedTransport`，一次性发送给客户端。
//! 4. 删除本次请求的上传文件。
//!
//! 连接处理对流类型是泛型的，测试中可以直接使用 `tokio::io::duplex`。

use std::{collections::HashMap, sync::Arc, time::Instant};

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    config::Config,
    context::RequestContext,
    controller::{run, Controller, Renderer},
    exception::Exception,
    finalizer::TerminalAction,
    param::{HttpRequestMethod, STATUS_CODES},
    request::{content_length, header_end, Request},
    transport::{BufferedTransport, Transport},
    util::HtmlBuilder,
};

/// 每个请求创建一个新的控制器实例
pub type ControllerFactory = Box<dyn Fn() -> Box<dyn Controller + Send> + Send + Sync>;

/// 服务器进程共享的只读状态：配置、路由表与渲染器
pub struct App {
    config: Config,
    routes: HashMap<String, ControllerFactory>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            routes: HashMap::new(),
            renderer: None,
        }
    }

    /// 注册精确匹配的路由
    pub fn route<F>(mut self, path: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Controller + Send> + Send + Sync + 'static,
    {
        self.routes.insert(path.to_string(), Box::new(factory));
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn controller(&self, path: &str) -> Option<Box<dyn Controller + Send>> {
        self.routes.get(path).map(|factory| factory())
    }
}

/// 读取完整请求报文。连接在发送任何数据前关闭时返回 `Ok(None)`。
async fn read_request<S>(
    stream: &mut S,
    id: u128,
    config: &Config,
) -> Result<Option<Vec<u8>>, Exception>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut chunk = vec![0u8; config.read_buffer_size()];
    let mut expected: Option<usize> = None;

    loop {
        if let Some(total) = expected {
            if buffer.len() >= total {
                break;
            }
        } else if let Some(end) = header_end(&buffer) {
            let head = String::from_utf8_lossy(&buffer[..end]);
            let length = content_length(&head);
            if length > config.max_body_size() {
                warn!("[ID{}]请求体长度{}超过上限{}", id, length, config.max_body_size());
                return Err(Exception::PayloadTooLarge);
            }
            expected = Some(end + length);
            continue;
        } else if buffer.len() > config.max_body_size() {
            warn!("[ID{}]报文头超过上限{}", id, config.max_body_size());
            return Err(Exception::PayloadTooLarge);
        }

        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            debug!("[ID{}]连接提前关闭，已读取{}字节", id, buffer.len());
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
    Ok(Some(buffer))
}

/// 把状态页写入传输层。状态行写失败时不再写页面内容。
fn write_status_page(transport: &mut dyn Transport, code: u16) {
    transport.set_header("Content-Type", "text/html;charset=utf-8");
    let page = HtmlBuilder::from_status_code(code, None).build();
    if let Err(e) = transport.write_header(code) {
        warn!("写出状态页{}的状态行失败: {}", code, e);
        return;
    }
    if let Err(e) = transport.write_body(page.as_bytes()) {
        warn!("写出状态页{}的内容失败: {}", code, e);
    }
}

fn status_page(code: u16) -> Vec<u8> {
    let mut transport = BufferedTransport::new(false);
    write_status_page(&mut transport, code);
    transport.as_bytes()
}

async fn send<S>(stream: &mut S, id: u128, bytes: &[u8])
where
    S: AsyncWrite + Unpin,
{
    if let Err(e) = stream.write_all(bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    if let Err(e) = stream.flush().await {
        warn!("[ID{}]刷新连接失败: {}", id, e);
    }
}

/// # 连接处理器
///
/// 处理一个连接上的一个请求，然后结束。
pub async fn handle_connection<S>(stream: &mut S, id: u128, app: &App)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let config = app.config();
    let raw = match read_request(stream, id, config).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return,
        Err(Exception::Io(msg)) => {
            error!("[ID{}]读取连接时遇到错误: {}", id, msg);
            return;
        }
        Err(e) => {
            send(stream, id, &status_page(e.status_code())).await;
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕，共{}字节", id, raw.len());

    let start_time = Instant::now();

    let request = match Request::try_from(&raw, id) {
        Ok(req) => req,
        Err(e) => {
            warn!("[ID{}]解析HTTP请求失败: {}", id, e);
            send(stream, id, &status_page(e.status_code())).await;
            return;
        }
    };

    let version = *request.version();
    let method = request.method();
    let path = request.path().to_string();
    let user_agent = request.user_agent().to_string();

    let mut controller = match app.controller(&path) {
        Some(c) => c,
        None => {
            warn!("[ID{}]请求的路径：{} 不存在，返回404", id, &path);
            info!(
                "[ID{}] {}, {}, {}, {}, {}, {}, ",
                id, version, path, method, 404, "Not Found", user_agent
            );
            send(stream, id, &status_page(404)).await;
            return;
        }
    };

    let mut ctx = match RequestContext::from_request(request, id, &config.upload_dir()) {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!("[ID{}]解码请求体失败: {}", id, e);
            send(stream, id, &status_page(e.status_code())).await;
            return;
        }
    };
    if let Some(renderer) = &app.renderer {
        ctx = ctx.with_renderer(Arc::clone(renderer));
    }

    let mut transport = BufferedTransport::new(method == HttpRequestMethod::Head);
    let action = run(controller.as_mut(), &mut ctx, &mut transport);
    drop(controller);

    let code = match action {
        TerminalAction::Error(code)
        | TerminalAction::Redirect(code)
        | TerminalAction::Normal(code) => code,
        TerminalAction::Bypassed => transport.status().unwrap_or(200),
    };
    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );
    info!(
        "[ID{}] {}, {}, {}, {}, {}, {}, ",
        id,
        version,
        path,
        method,
        code,
        STATUS_CODES.get(&code).copied().unwrap_or("Unknown"),
        user_agent,
    );

    send(stream, id, &transport.as_bytes()).await;

    let mut files = ctx.take_files();
    if !files.is_empty() {
        match files.remove_all() {
            Ok(()) => debug!("[ID{}]上传文件已清理", id),
            Err(e) => warn!("[ID{}]清理上传文件失败: {}", id, e),
        }
    }
}
