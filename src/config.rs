use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::{fs, path::PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    www_root: String,
    port: u16,
    worker_threads: usize,
    local: bool,
    #[serde(default = "default_max_body_size")]
    max_body_size: usize,
    #[serde(default)]
    upload_dir: String,
    #[serde(default = "default_read_buffer_size")]
    read_buffer_size: usize,
}

fn default_max_body_size() -> usize {
    8388608 // 8MB
}

fn default_read_buffer_size() -> usize {
    8192 // 8KB
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            www_root: ".".to_string(),
            port: 7878,
            worker_threads: 0,
            local: true,
            max_body_size: default_max_body_size(),
            upload_dir: String::new(),
            read_buffer_size: default_read_buffer_size(),
        }
    }

    /// 从 TOML 文件载入配置。文件缺失或格式错误时记录日志并使用默认配置。
    pub fn from_toml(filename: &str) -> Self {
        let str_val = match fs::read_to_string(filename) {
            Ok(s) => s,
            Err(e) => {
                error!("无法读取配置文件{}: {}，使用默认配置", filename, e);
                return Self::normalized(Config::new());
            }
        };
        Self::normalized(Self::from_toml_str(&str_val))
    }

    pub fn from_toml_str(content: &str) -> Self {
        match toml::from_str(content) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象: {}，使用默认配置", e);
                Config::new()
            }
        }
    }

    fn normalized(mut raw_config: Config) -> Self {
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.read_buffer_size == 0 {
            warn!("read_buffer_size被设置为0，该值将被改为{}。", default_read_buffer_size());
            raw_config.read_buffer_size = default_read_buffer_size();
        }
        raw_config
    }
}

impl Config {
    pub fn www_root(&self) -> &str {
        &self.www_root
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// 上传文件的落盘目录，未配置时为系统临时目录
    pub fn upload_dir(&self) -> PathBuf {
        if self.upload_dir.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.upload_dir)
        }
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }
}
