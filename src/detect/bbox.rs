// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/detect/bbox.rs - 像素坐标边界框
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

/// 像素坐标下的轴对齐边界框，左上角定位
///
/// 坐标不裁剪到图像范围内，`x`、`y` 可以为负数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
  /// 左上角 x 坐标
  pub x: i32,
  /// 左上角 y 坐标
  pub y: i32,
  /// 宽度
  pub width: i32,
  /// 高度
  pub height: i32,
}

impl BBox {
  pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 宽高均为正
  pub fn is_valid(&self) -> bool {
    self.width > 0 && self.height > 0
  }

  pub fn area(&self) -> i64 {
    if !self.is_valid() {
      return 0;
    }
    self.width as i64 * self.height as i64
  }

  pub fn right(&self) -> i64 {
    self.x as i64 + self.width as i64
  }

  pub fn bottom(&self) -> i64 {
    self.y as i64 + self.height as i64
  }

  /// 与另一个边界框的交集面积，不相交时为 0
  pub fn intersection_area(&self, other: &BBox) -> i64 {
    let x1 = (self.x as i64).max(other.x as i64);
    let y1 = (self.y as i64).max(other.y as i64);
    let x2 = self.right().min(other.right());
    let y2 = self.bottom().min(other.bottom());

    (x2 - x1).max(0) * (y2 - y1).max(0)
  }

  /// 计算两个边界框的 IoU
  ///
  /// 并集面积不为正时（退化框）返回 0。
  pub fn iou(&self, other: &BBox) -> f64 {
    let intersection = self.intersection_area(other);
    let union = self.area() + other.area() - intersection;

    if union > 0 {
      intersection as f64 / union as f64
    } else {
      0.0
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn disjoint_boxes_have_zero_iou() {
    let a = BBox::new(0, 0, 10, 20);
    let b = BBox::new(10, 0, 10, 20);
    assert_eq!(a.intersection_area(&b), 0);
    assert_eq!(a.iou(&b), 0.0);
  }

  #[test]
  fn identical_boxes_have_unit_iou() {
    let a = BBox::new(-5, -5, 10, 20);
    assert_eq!(a.iou(&a), 1.0);
  }

  #[test]
  fn partial_overlap() {
    // 交集 5x10 = 50，并集 200 + 200 - 50 = 350
    let a = BBox::new(0, 0, 10, 20);
    let b = BBox::new(5, 10, 10, 20);
    assert_eq!(a.intersection_area(&b), 50);
    assert!((a.iou(&b) - 50.0 / 350.0).abs() < 1e-12);
  }

  #[test]
  fn degenerate_boxes_do_not_divide_by_zero() {
    let a = BBox::new(3, 3, 0, 0);
    assert_eq!(a.area(), 0);
    assert_eq!(a.iou(&a), 0.0);

    let b = BBox::new(0, 0, -4, 10);
    assert_eq!(b.area(), 0);
    assert_eq!(b.iou(&BBox::new(0, 0, 10, 10)), 0.0);
  }
}
