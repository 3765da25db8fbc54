// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/lift.rs - 缆车排队负载
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

use crate::detect::{DetectionResult, TargetLabel};

/// 缆车当前排队人数与容量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiftLoad {
  pub name: String,
  pub capacity: u32,
  pub current_load: u32,
}

impl LiftLoad {
  /// 以目标类别的计数作为当前负载；`TargetLabel::Any` 时取全部计数之和
  pub fn from_result(
    name: impl Into<String>,
    capacity: u32,
    result: &DetectionResult,
    target: &TargetLabel,
  ) -> Self {
    let count = match target {
      TargetLabel::Label(label) => result.count(label),
      TargetLabel::Any => result.total(),
    };

    Self {
      name: name.into(),
      capacity,
      current_load: u32::try_from(count).unwrap_or(u32::MAX),
    }
  }

  /// 负载率，容量为 0 时无意义
  pub fn occupancy(&self) -> Option<f32> {
    if self.capacity == 0 {
      None
    } else {
      Some(self.current_load as f32 / self.capacity as f32)
    }
  }
}
