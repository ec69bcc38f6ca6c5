// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 演示服务器
//!
//! 基于 Tokio 多线程运行时，每个连接一个任务。内置几个演示控制器：
//! - `/`：纯文本问候，回显请求语言
//! - `/signup`：表单 / JSON 绑定，写入 Cookie 并以 JSON 回显
//! - `/file`：把 `www_root/index.html` 直接写给客户端
//! - `/legacy`：永久重定向到 `/`
//! - `/slow`：504

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    path::PathBuf,
    sync::Arc,
};

use log::{debug, error, info, warn};
use serde_derive::{Deserialize, Serialize};
use tokio::{net::TcpListener, runtime::Builder};

use webctx::{
    form_schema, handle_connection, App, Config, Controller, CookieOptions, RequestContext,
    Transport,
};

struct IndexController;

impl Controller for IndexController {
    fn handle(&mut self, ctx: &mut RequestContext, _transport: &mut dyn Transport) {
        let lang = if ctx.lang.is_empty() { "unknown" } else { ctx.lang.as_str() };
        let text = format!("Hello from webctx! (lang: {})", lang);
        ctx.plain(&text);
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Signup {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Age")]
    age: i64,
    #[serde(rename = "Tags")]
    tags: Vec<String>,
}

form_schema!(Signup {
    "Name" => name: string,
    "Age" => age: integer,
    "Tags" => tags: strings,
});

struct SignupController;

impl Controller for SignupController {
    fn handle(&mut self, ctx: &mut RequestContext, _transport: &mut dyn Transport) {
        let mut signup = Signup::default();
        if let Err(e) = ctx.validate_schema(&mut signup) {
            ctx.error(e.status_code(), &e.to_string());
            return;
        }
        let options = CookieOptions::new().max_age(3600).http_only(true);
        ctx.set_cookie("signup", &signup.name, &options);
        ctx.json(&signup, false);
    }
}

struct FileController {
    root: PathBuf,
}

impl Controller for FileController {
    fn handle(&mut self, ctx: &mut RequestContext, transport: &mut dyn Transport) {
        let path = self.root.join("index.html");
        if let Err(e) = ctx.send_file(&path, transport) {
            ctx.error(e.status_code(), &e.to_string());
        }
    }
}

struct LegacyController;

impl Controller for LegacyController {
    fn handle(&mut self, ctx: &mut RequestContext, _transport: &mut dyn Transport) {
        ctx.redirect("/", 301);
    }
}

struct SlowController;

impl Controller for SlowController {
    fn handle(&mut self, ctx: &mut RequestContext, _transport: &mut dyn Transport) {
        ctx.error_504("");
    }
}

fn build_app(config: Config) -> App {
    let root = PathBuf::from(config.www_root());
    App::new(config)
        .route("/", || Box::new(IndexController))
        .route("/signup", || Box::new(SignupController))
        .route("/file", move || Box::new(FileController { root: root.clone() }))
        .route("/legacy", || Box::new(LegacyController))
        .route("/slow", || Box::new(SlowController))
}

fn main() {
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统: {}", e);
    }

    let config = Config::from_toml("config/development.toml");
    info!("配置文件已载入");
    info!("www root: {}", config.www_root());

    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建Tokio运行时: {}", e);
            return;
        }
    };

    runtime.block_on(serve(config));
}

async fn serve(config: Config) {
    let port = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);

    let listener = match TcpListener::bind(SocketAddrV4::new(address, port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("端口{}绑定完成", port);

    let app = Arc::new(build_app(config));
    let mut id: u128 = 0;
    loop {
        let (mut stream, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("接受连接失败: {}", e);
                continue;
            }
        };
        debug!("[ID{}]TCP连接已建立：{}", id, addr);

        let app = Arc::clone(&app);
        tokio::spawn(async move {
            handle_connection(&mut stream, id, &app).await;
        });
        id += 1;
    }
}
