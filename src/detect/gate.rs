// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/detect/gate.rs - 几何形状校验
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

use crate::{config::ConfigError, detect::BBox};

/// 候选框形状策略
///
/// 在解码阶段逐个调用，拒绝的候选框不会进入 NMS。
pub trait ShapeGate: std::fmt::Debug + Send + Sync {
  fn accept(&self, bbox: &BBox) -> bool;

  /// 构建配置时检查参数
  fn validate(&self) -> Result<(), ConfigError> {
    Ok(())
  }
}

/// 高度严格大于宽度
pub fn is_upright(bbox: &BBox) -> bool {
  bbox.height > bbox.width
}

/// 直立门限：仅保留高大于宽的框
#[derive(Debug, Clone, Copy, Default)]
pub struct Upright;

impl ShapeGate for Upright {
  fn accept(&self, bbox: &BBox) -> bool {
    is_upright(bbox)
  }
}

/// 宽高比门限：`height / width` 严格大于 `min_ratio`
///
/// `min_ratio = 1.0` 与 [`Upright`] 等价。
#[derive(Debug, Clone, Copy)]
pub struct MinAspectRatio {
  pub min_ratio: f32,
}

impl ShapeGate for MinAspectRatio {
  fn accept(&self, bbox: &BBox) -> bool {
    if !bbox.is_valid() {
      return false;
    }
    (bbox.height as f64) > (bbox.width as f64) * self.min_ratio as f64
  }

  /// 宽高比必须是正的有限值
  fn validate(&self) -> Result<(), ConfigError> {
    if self.min_ratio.is_finite() && self.min_ratio > 0.0 {
      Ok(())
    } else {
      Err(ConfigError::InvalidAspectRatio(self.min_ratio))
    }
  }
}

/// 不做形状过滤
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyShape;

impl ShapeGate for AnyShape {
  fn accept(&self, _bbox: &BBox) -> bool {
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn square_is_not_upright() {
    assert!(!is_upright(&BBox::new(0, 0, 40, 40)));
    assert!(is_upright(&BBox::new(0, 0, 40, 41)));
    assert!(!Upright.accept(&BBox::new(0, 0, 41, 40)));
  }

  #[test]
  fn aspect_ratio_relaxes_upright() {
    let gate = MinAspectRatio { min_ratio: 0.8 };
    assert!(gate.accept(&BBox::new(0, 0, 100, 90)));
    assert!(!gate.accept(&BBox::new(0, 0, 100, 80)));

    let strict = MinAspectRatio { min_ratio: 1.0 };
    assert!(!strict.accept(&BBox::new(0, 0, 50, 50)));
    assert!(strict.accept(&BBox::new(0, 0, 50, 51)));
  }

  #[test]
  fn aspect_ratio_must_be_positive_and_finite() {
    assert!(MinAspectRatio { min_ratio: 0.8 }.validate().is_ok());
    for min_ratio in [f32::NAN, f32::INFINITY, 0.0, -1.0] {
      assert!(matches!(
        MinAspectRatio { min_ratio }.validate(),
        Err(ConfigError::InvalidAspectRatio(_))
      ));
    }
    assert!(Upright.validate().is_ok());
  }
}
