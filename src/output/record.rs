// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/output/record.rs - 检测结果 JSON 记录
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detect::{DetectionResult, ImageSize},
  input::HasImageSize,
  output::Render,
};

#[derive(Error, Debug)]
pub enum RecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
}

/// 写入磁盘的单条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  /// RFC 3339 格式的 UTC 时间
  pub recorded_at: String,
  pub image_size: ImageSize,
  #[serde(flatten)]
  pub result: DetectionResult,
}

/// 按日期分目录保存检测结果：`<dir>/YYYY/MM/DD/HH-MM-SS-NNNN.json`
///
/// `always` 查询参数控制是否保存空结果，默认不保存。
pub struct RecordOutput {
  directory: PathBuf,
  counter: AtomicU16,
  always: bool,
}

impl FromUrlWithScheme for RecordOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordOutput {
  type Error = RecordOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(RecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");
    Ok(Self::new(uri.path(), always))
  }
}

impl RecordOutput {
  pub fn new<P: AsRef<Path>>(directory: P, always: bool) -> Self {
    Self {
      directory: directory.as_ref().to_path_buf(),
      counter: AtomicU16::new(0),
      always,
    }
  }

  fn record_id(&self) -> u16 {
    self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  fn record_path(&self, now: &DateTime<Utc>) -> Result<PathBuf, RecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.json",
      now.format("%H-%M-%S"),
      self.record_id()
    )))
  }

  /// 写入一条记录，返回文件路径；结果为空且未设置 `always` 时返回 `None`
  pub fn write_record(
    &self,
    image_size: ImageSize,
    result: &DetectionResult,
  ) -> Result<Option<PathBuf>, RecordOutputError> {
    if !self.always && result.is_empty() {
      return Ok(None);
    }

    let now = Utc::now();
    let record = Record {
      recorded_at: now.to_rfc3339(),
      image_size,
      result: result.clone(),
    };

    let path = self.record_path(&now)?;
    std::fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
    info!("保存检测记录: {}", path.display());

    Ok(Some(path))
  }
}

impl<F: HasImageSize> Render<F, DetectionResult> for RecordOutput {
  type Error = RecordOutputError;

  fn render_result(&self, frame: &F, result: &DetectionResult) -> Result<(), Self::Error> {
    self.write_record(frame.image_size(), result)?;
    Ok(())
  }
}
