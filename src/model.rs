// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/model.rs - 推理引擎边界
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

use serde::{Deserialize, Serialize};

use crate::detect::ImageSize;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 一张图像的原始网络输出
///
/// 检测层 → 网格 → 预测向量。层数与每层网格数由推理引擎决定。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOutput {
  /// 推理时的原图尺寸（可选）
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_size: Option<ImageSize>,
  pub layers: Vec<Vec<Vec<f32>>>,
}

impl RawOutput {
  pub fn new(layers: Vec<Vec<Vec<f32>>>) -> Self {
    Self {
      image_size: None,
      layers,
    }
  }

  pub fn with_image_size(mut self, size: ImageSize) -> Self {
    self.image_size = Some(size);
    self
  }

  /// 按层顺序遍历全部网格
  pub fn cells(&self) -> impl Iterator<Item = &[f32]> {
    self.layers.iter().flatten().map(Vec::as_slice)
  }

  pub fn num_cells(&self) -> usize {
    self.layers.iter().map(Vec::len).sum()
  }
}

mod replay;
#[cfg(feature = "read_image_file")]
pub use self::replay::SidecarReplayModel;
pub use self::replay::{ReplayModel, ReplayModelError};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cells_flatten_layers_in_order() {
    let output = RawOutput::new(vec![
      vec![vec![1.0], vec![2.0]],
      vec![],
      vec![vec![3.0, 4.0]],
    ]);
    let cells: Vec<&[f32]> = output.cells().collect();
    assert_eq!(cells, vec![&[1.0][..], &[2.0][..], &[3.0, 4.0][..]]);
    assert_eq!(output.num_cells(), 3);
  }
}
