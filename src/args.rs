// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/args.rs - 命令行公共参数
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

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::{
  config::{
    ClassVocabulary, ConfigError, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD,
    DetectConfig,
  },
  detect::{MinAspectRatio, PredictionLayout, TargetLabel},
};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutArg {
  /// [cx, cy, w, h, objectness, scores...]
  Yolo,
  /// [cx, cy, w, h, scores...]
  AnchorFree,
}

/// 检测后处理参数
#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
  /// 置信度阈值 (0.0 - 1.0)，分数严格大于该值才保留
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  /// 计数的目标类别，`*` 表示全部类别
  #[arg(long, default_value = "person", value_name = "LABEL")]
  pub target: TargetLabel,

  /// 类别名称文件，每行一个；缺省使用 COCO 80 类
  #[arg(long, value_name = "FILE")]
  pub classes: Option<PathBuf>,

  /// 网络输出向量布局
  #[arg(long, value_enum, default_value_t = LayoutArg::Yolo)]
  pub layout: LayoutArg,

  /// 放宽直立门限：保留 height / width 大于该值的框（缺省要求高大于宽）
  #[arg(long, value_name = "RATIO")]
  pub min_aspect_ratio: Option<f32>,
}

impl DetectArgs {
  pub fn build_config(&self) -> Result<DetectConfig, ConfigError> {
    let vocabulary = match &self.classes {
      Some(path) => ClassVocabulary::from_names_file(path)?,
      None => ClassVocabulary::coco(),
    };
    let layout = match self.layout {
      LayoutArg::Yolo => PredictionLayout::yolo(vocabulary.len()),
      LayoutArg::AnchorFree => PredictionLayout::anchor_free(vocabulary.len()),
    };

    let mut builder = DetectConfig::builder()
      .confidence_threshold(self.confidence)
      .iou_threshold(self.nms_threshold)
      .target_label(self.target.clone())
      .vocabulary(vocabulary)
      .layout(layout);
    if let Some(min_ratio) = self.min_aspect_ratio {
      builder = builder.shape_gate(MinAspectRatio { min_ratio });
    }

    builder.build()
  }
}
