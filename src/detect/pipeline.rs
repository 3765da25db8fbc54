// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/detect/pipeline.rs - 后处理流程入口
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

use tracing::debug;

use crate::{
  config::DetectConfig,
  detect::{Aggregator, BoxDecoder, Candidate, DetectionResult, ImageSize, Suppressor},
  model::RawOutput,
};

/// 各阶段数量，逐级不增
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
  pub raw: usize,
  pub malformed: usize,
  pub candidates: usize,
  pub suppressed: usize,
  pub detections: usize,
}

/// 解码 → 形状校验 → NMS → 类别过滤与计数
///
/// 不持有可变状态，同一个实例可在多个线程中同时使用。
#[derive(Debug, Clone)]
pub struct Pipeline {
  config: DetectConfig,
}

impl Pipeline {
  pub fn new(config: DetectConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &DetectConfig {
    &self.config
  }

  pub fn decoder(&self) -> BoxDecoder<'_> {
    BoxDecoder::new(
      self.config.layout(),
      self.config.confidence_threshold(),
      self.config.shape_gate(),
    )
  }

  pub fn suppressor(&self) -> Suppressor {
    Suppressor::new(
      self.config.iou_threshold(),
      self.config.confidence_threshold(),
    )
  }

  pub fn aggregator(&self) -> Aggregator<'_> {
    Aggregator::new(self.config.vocabulary(), self.config.target_label())
  }

  /// 仅执行解码与形状校验
  pub fn decode<'c, I>(&self, cells: I, size: ImageSize) -> Vec<Candidate>
  where
    I: IntoIterator<Item = &'c [f32]>,
  {
    self.decoder().decode(cells, size).0
  }

  pub fn run<'c, I>(&self, cells: I, size: ImageSize) -> DetectionResult
  where
    I: IntoIterator<Item = &'c [f32]>,
  {
    self.run_with_stats(cells, size).0
  }

  pub fn run_with_stats<'c, I>(&self, cells: I, size: ImageSize) -> (DetectionResult, PipelineStats)
  where
    I: IntoIterator<Item = &'c [f32]>,
  {
    let (candidates, decode_stats) = self.decoder().decode(cells, size);
    let suppressed = self.suppressor().suppress(&candidates);
    let result = self.aggregator().aggregate(&suppressed);

    let stats = PipelineStats {
      raw: decode_stats.cells,
      malformed: decode_stats.malformed,
      candidates: candidates.len(),
      suppressed: suppressed.len(),
      detections: result.detections.len(),
    };
    debug!("后处理统计: {:?}", stats);

    (result, stats)
  }

  /// 处理一份原始网络输出
  pub fn run_output(&self, output: &RawOutput, size: ImageSize) -> DetectionResult {
    self.run(output.cells(), size)
  }

  /// 批量处理多张图像，输出顺序与输入一致
  ///
  /// 启用 `parallel` 特性时使用 rayon 并行。
  #[cfg(feature = "parallel")]
  pub fn run_batch(&self, jobs: &[(RawOutput, ImageSize)]) -> Vec<DetectionResult> {
    use rayon::prelude::*;

    jobs
      .par_iter()
      .map(|(output, size)| self.run_output(output, *size))
      .collect()
  }

  #[cfg(not(feature = "parallel"))]
  pub fn run_batch(&self, jobs: &[(RawOutput, ImageSize)]) -> Vec<DetectionResult> {
    jobs
      .iter()
      .map(|(output, size)| self.run_output(output, *size))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn person(cx: f32, cy: f32, w: f32, h: f32, score: f32) -> Vec<f32> {
    let mut v = vec![cx, cy, w, h, 1.0];
    let mut scores = vec![0.0; 80];
    scores[0] = score;
    v.extend(scores);
    v
  }

  #[test]
  fn stats_narrow_monotonically() {
    let pipeline = Pipeline::new(DetectConfig::builder().build().unwrap());
    let cells = [
      person(0.5, 0.5, 0.1, 0.3, 0.9),
      person(0.5, 0.5, 0.1, 0.31, 0.8),
      person(0.2, 0.5, 0.3, 0.1, 0.9),
      vec![0.5; 3],
    ];
    let (result, stats) =
      pipeline.run_with_stats(cells.iter().map(Vec::as_slice), ImageSize::new(800, 600));

    assert_eq!(stats.raw, 4);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.candidates, 2);
    assert_eq!(stats.suppressed, 1);
    assert_eq!(stats.detections, 1);
    assert_eq!(result.count("person"), 1);
  }
}
