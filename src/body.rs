// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求体解码模块
//!
//! - 查询字符串：`键 -> 值`，重复的键会合并为字符串数组。
//! - `application/x-www-form-urlencoded`：`键 -> 值列表`。
//! - `application/json`：任意 JSON 值。
//! - `multipart/form-data`：文本分段进入 `键 -> 值列表`，文件分段写入上传目录。

use std::{
    collections::HashMap,
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use chrono::Utc;
use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;
use serde_json::Value;

use crate::{
    exception::Exception,
    upload::{Files, UploadedFile},
};

lazy_static! {
    static ref DISPOSITION_NAME: Regex = Regex::new(r#"(?i)(?:^|;)\s*name="([^"]*)""#).unwrap();
    static ref DISPOSITION_FILENAME: Regex =
        Regex::new(r#"(?i)(?:^|;)\s*filename="([^"]*)""#).unwrap();
    static ref BOUNDARY: Regex = Regex::new(r#"(?i)boundary=(?:"([^"]+)"|([^;\s]+))"#).unwrap();
}

/// 解码后的请求体
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DecodedBody {
    /// 表单或 multipart 的文本字段
    Form(HashMap<String, Vec<String>>),
    Json(Value),
    #[default]
    Empty,
}

/// 百分号解码，`+` 视为空格。非法 UTF-8 以替换字符保留。
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// 解析 `a=1&b=2&a=3` 形式的数据，保持每个键下值的出现顺序
pub fn parse_urlencoded(data: &str) -> HashMap<String, Vec<String>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for pair in data.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        map.entry(decode_component(key))
            .or_default()
            .push(decode_component(value));
    }
    map
}

/// 解析查询字符串。只出现一次的键为字符串，重复出现的键为字符串数组。
pub fn parse_query(query: &str) -> HashMap<String, Value> {
    parse_urlencoded(query)
        .into_iter()
        .map(|(k, mut vs)| {
            let value = if vs.len() == 1 {
                Value::String(vs.remove(0))
            } else {
                Value::Array(vs.into_iter().map(Value::String).collect())
            };
            (k, value)
        })
        .collect()
}

pub fn decode_form(body: &[u8]) -> HashMap<String, Vec<String>> {
    parse_urlencoded(&String::from_utf8_lossy(body))
}

pub fn decode_json(body: &[u8]) -> Result<Value, Exception> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| Exception::InvalidJson(e.to_string()))
}

/// 从 `Content-Type` 中取出 multipart 的 boundary
pub fn multipart_boundary(content_type: &str) -> Option<String> {
    let caps = BOUNDARY.captures(content_type)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// 解码 multipart 请求体。
///
/// 文件分段写入 `upload_dir`，返回的 [`Files`] 归调用方所有。
/// 解码失败时已写入的文件会被删除。
pub fn decode_multipart(
    body: &[u8],
    content_type: &str,
    upload_dir: &Path,
    id: u128,
) -> Result<(HashMap<String, Vec<String>>, Files), Exception> {
    let mut fields: HashMap<String, Vec<String>> = HashMap::new();
    let mut files = Files::new();

    match split_parts(body, content_type, upload_dir, id, &mut fields, &mut files) {
        Ok(()) => Ok((fields, files)),
        Err(e) => {
            if let Err(rm) = files.remove_all() {
                error!("[ID{}]清理上传文件失败: {}", id, rm);
            }
            Err(e)
        }
    }
}

fn split_parts(
    body: &[u8],
    content_type: &str,
    upload_dir: &Path,
    id: u128,
    fields: &mut HashMap<String, Vec<String>>,
    files: &mut Files,
) -> Result<(), Exception> {
    let boundary = multipart_boundary(content_type).ok_or(Exception::MalformedMultipart)?;
    let delimiter = format!("--{}", boundary).into_bytes();
    let next_delimiter = format!("\r\n--{}", boundary).into_bytes();

    let mut pos = find(body, &delimiter).ok_or(Exception::MalformedMultipart)? + delimiter.len();
    let mut index = 0usize;

    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            return Ok(());
        }
        if !rest.starts_with(b"\r\n") {
            return Err(Exception::MalformedMultipart);
        }
        let part = &rest[2..];
        let head_len = find(part, b"\r\n\r\n").ok_or(Exception::MalformedMultipart)?;
        let head = std::str::from_utf8(&part[..head_len]).map_err(|_| Exception::MalformedMultipart)?;
        let content_start = head_len + 4;
        let content_len =
            find(&part[content_start..], &next_delimiter).ok_or(Exception::MalformedMultipart)?;
        let content = &part[content_start..content_start + content_len];

        let disposition = head
            .split("\r\n")
            .filter_map(|line| line.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-disposition"))
            .map(|(_, v)| v.trim())
            .ok_or(Exception::MalformedMultipart)?;
        let name = DISPOSITION_NAME
            .captures(disposition)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(Exception::MalformedMultipart)?;

        match DISPOSITION_FILENAME.captures(disposition).and_then(|c| c.get(1)) {
            Some(filename) if !filename.as_str().is_empty() => {
                let file = save_upload(upload_dir, id, index, &name, filename.as_str(), content)?;
                debug!("[ID{}]上传文件{}已保存到{}", id, file.name, file.path.display());
                files.push(file);
            }
            Some(_) => {}
            None => fields
                .entry(name)
                .or_default()
                .push(String::from_utf8_lossy(content).into_owned()),
        }

        index += 1;
        pos += 2 + content_start + content_len + next_delimiter.len();
    }
}

fn save_upload(
    upload_dir: &Path,
    id: u128,
    index: usize,
    field: &str,
    filename: &str,
    content: &[u8],
) -> Result<UploadedFile, Exception> {
    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let path = upload_dir.join(format!(
        "upload-{}-{}-{}-{}.tmp",
        std::process::id(),
        id,
        index,
        stamp
    ));
    let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    file.write_all(content)?;

    // 只保留文件名部分，去掉客户端可能附带的目录
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .to_string();

    Ok(UploadedFile {
        path,
        name,
        size: content.len() as u64,
        field: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlencoded() {
        let map = parse_urlencoded("name=John+Doe&city=New%20York&tag=a&tag=b&flag");
        assert_eq!(map["name"], vec!["John Doe"]);
        assert_eq!(map["city"], vec!["New York"]);
        assert_eq!(map["tag"], vec!["a", "b"]);
        assert_eq!(map["flag"], vec![""]);
    }

    #[test]
    fn test_parse_urlencoded_empty() {
        assert!(parse_urlencoded("").is_empty());
        assert!(parse_urlencoded("&&").is_empty());
    }

    #[test]
    fn test_parse_query() {
        let q = parse_query("id=7&tag=a&tag=b");
        assert_eq!(q["id"], Value::String("7".to_string()));
        assert_eq!(q["tag"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_decode_json() {
        let v = decode_json(br#"{"name": "test", "value": 42}"#).unwrap();
        assert_eq!(v["name"], "test");
        assert_eq!(v["value"], 42);
        assert_eq!(decode_json(b"").unwrap(), Value::Null);
        assert!(matches!(decode_json(b"{bad"), Err(Exception::InvalidJson(_))));
    }

    #[test]
    fn test_multipart_boundary() {
        assert_eq!(
            multipart_boundary("multipart/form-data; boundary=----abc123"),
            Some("----abc123".to_string())
        );
        assert_eq!(
            multipart_boundary("multipart/form-data; boundary=\"quoted b\""),
            Some("quoted b".to_string())
        );
        assert_eq!(multipart_boundary("multipart/form-data"), None);
    }

    const CT: &str = "multipart/form-data; boundary=XyZ";

    fn multipart_body() -> Vec<u8> {
        [
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"Name\"\r\n\r\n",
            "alice\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"Tags\"\r\n\r\n",
            "a\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"Tags\"\r\n\r\n",
            "b\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"doc\"; filename=\"../../notes.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "line1\r\nline2\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"empty\"; filename=\"\"\r\n\r\n",
            "\r\n",
            "--XyZ--\r\n",
        ]
        .concat()
        .into_bytes()
    }

    #[test]
    fn test_decode_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let (fields, mut files) = decode_multipart(&multipart_body(), CT, dir.path(), 1).unwrap();

        assert_eq!(fields["Name"], vec!["alice"]);
        assert_eq!(fields["Tags"], vec!["a", "b"]);
        assert!(!fields.contains_key("doc"));

        assert_eq!(files.len(), 1);
        let doc = files.iter().next().unwrap();
        assert_eq!(doc.name, "notes.txt");
        assert_eq!(doc.field, "doc");
        assert_eq!(doc.size, 12);
        assert_eq!(std::fs::read(&doc.path).unwrap(), b"line1\r\nline2");

        files.remove_all().unwrap();
    }

    #[test]
    fn test_decode_multipart_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let body = b"--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nno end";
        assert_eq!(
            decode_multipart(body, CT, dir.path(), 1).unwrap_err(),
            Exception::MalformedMultipart
        );
        assert_eq!(
            decode_multipart(b"", "multipart/form-data", dir.path(), 1).unwrap_err(),
            Exception::MalformedMultipart
        );
    }

    #[test]
    fn test_failed_decode_removes_saved_files() {
        let dir = tempfile::tempdir().unwrap();
        let body = [
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"f\"; filename=\"a.bin\"\r\n\r\n",
            "data\r\n",
            "--XyZ\r\n",
            "garbage without header end",
        ]
        .concat();
        assert!(decode_multipart(body.as_bytes(), CT, dir.path(), 2).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
