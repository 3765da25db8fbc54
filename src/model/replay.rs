// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/model/replay.rs - 回放预先保存的网络输出
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Model, RawOutput},
};

#[derive(Error, Debug)]
pub enum ReplayModelError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("网络输出文件格式错误: {0}")]
  FormatError(#[from] serde_json::Error),
}

/// 从 JSON 文件回放网络输出，每次推理都返回同一份结果
///
/// 文件格式:
/// `{"image_size": {"width": 800, "height": 600}, "layers": [[[cx, cy, w, h, obj, s0, ...], ...]]}`，
/// 其中 `image_size` 可省略。
pub struct ReplayModel<Frame> {
  output: RawOutput,
  _phantom: std::marker::PhantomData<Frame>,
}

impl<Frame> std::fmt::Debug for ReplayModel<Frame> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReplayModel")
      .field("layers", &self.output.layers.len())
      .field("cells", &self.output.num_cells())
      .finish()
  }
}

impl<Frame> FromUrlWithScheme for ReplayModel<Frame> {
  const SCHEME: &'static str = "replay";
}

impl<Frame> FromUrl for ReplayModel<Frame> {
  type Error = ReplayModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ReplayModelError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Self::from_path(url.path())
  }
}

impl<Frame> ReplayModel<Frame> {
  pub fn new(output: RawOutput) -> Self {
    Self {
      output,
      _phantom: std::marker::PhantomData,
    }
  }

  pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReplayModelError> {
    let path = path.as_ref();
    info!("加载网络输出文件: {}", path.display());
    let data = std::fs::read(path)?;
    let output: RawOutput = serde_json::from_slice(&data)?;
    debug!(
      "网络输出: {} 个检测层, {} 个网格",
      output.layers.len(),
      output.num_cells()
    );
    Ok(Self::new(output))
  }

  pub fn output(&self) -> &RawOutput {
    &self.output
  }
}

impl<Frame> Model for ReplayModel<Frame> {
  type Input = Frame;
  type Output = RawOutput;
  type Error = ReplayModelError;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(self.output.clone())
  }
}

/// 为目录中的每张图像读取同名 `.json` 网络输出文件
///
/// `queue/lift-a.jpg` 对应 `queue/lift-a.json`。
#[cfg(feature = "read_image_file")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarReplayModel;

#[cfg(feature = "read_image_file")]
impl Model for SidecarReplayModel {
  type Input = crate::input::ImageFrame;
  type Output = RawOutput;
  type Error = ReplayModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let path = input.path.with_extension("json");
    let model = ReplayModel::<()>::from_path(&path)?;
    Ok(model.output)
  }
}
