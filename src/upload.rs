//! multipart 解码过程中落盘的上传文件。
//!
//! 解码完成后文件归调用方所有，需要显式调用 [`Files::remove_all`] 清理。

use std::{fs, io, path::PathBuf};

use log::warn;

/// 一个已保存到临时位置的上传文件
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// 落盘路径
    pub path: PathBuf,
    /// 客户端提供的原始文件名
    pub name: String,
    /// 字节数
    pub size: u64,
    /// multipart 分段中的字段名
    pub field: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Files(Vec<UploadedFile>);

impl Files {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, file: UploadedFile) {
        self.0.push(file);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UploadedFile> {
        self.0.iter()
    }

    /// 按字段名查找上传文件
    pub fn by_field(&self, field: &str) -> Vec<&UploadedFile> {
        self.0.iter().filter(|f| f.field == field).collect()
    }

    /// 删除全部文件。
    ///
    /// 单个文件删除失败不会中断，所有文件都会被尝试删除，最后返回遇到的第一个错误。
    /// 列表在调用后被清空。
    pub fn remove_all(&mut self) -> io::Result<()> {
        let mut first_err = None;
        for file in self.0.drain(..) {
            if let Err(e) = fs::remove_file(&file.path) {
                warn!("无法删除上传文件{}: {}", file.path.display(), e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl IntoIterator for Files {
    type Item = UploadedFile;
    type IntoIter = std::vec::IntoIter<UploadedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
