// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/task.rs - 任务执行
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

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use tracing::{debug, error, info, warn};

use crate::{
  detect::{DetectionResult, ImageSize, Pipeline},
  input::{FrameInfo, HasImageSize},
  model::{Model, RawOutput},
  output::Render,
};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

/// 以帧的真实尺寸为准，网络输出中记录的尺寸只用于核对
fn resolve_size<F: HasImageSize>(frame: &F, raw: &RawOutput) -> ImageSize {
  let size = frame.image_size();
  if let Some(recorded) = raw.image_size
    && recorded != size
  {
    warn!(
      "网络输出记录的图像尺寸 {}x{} 与输入帧 {}x{} 不一致，使用输入帧尺寸",
      recorded.width, recorded.height, size.width, size.height
    );
  }
  size
}

/// 处理单张图像：推理 → 后处理 → 渲染
pub struct OneShotTask<'a> {
  pipeline: &'a Pipeline,
}

impl<'a> OneShotTask<'a> {
  pub fn new(pipeline: &'a Pipeline) -> Self {
    Self { pipeline }
  }
}

impl<
  F: HasImageSize,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = RawOutput, Error = ME>,
  O: Render<F, DetectionResult, Error = RE>,
> Task<I, M, O> for OneShotTask<'_>
{
  type Output = DetectionResult;
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = std::time::Instant::now();
    let raw = model.infer(&frame)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    let size = resolve_size(&frame, &raw);
    let result = self.pipeline.run_output(&raw, size);
    info!(
      "后处理完成，保留 {} 个检测，耗时: {:.2?}",
      result.detections.len(),
      now.elapsed()
    );

    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(result)
  }
}

/// 批量处理多张图像
///
/// 每读取 `chunk_size` 帧做一次推理与并行后处理，渲染后即释放这些帧，
/// 只保留 [`FrameInfo::info`] 与检测结果。中断后不再读取新的帧，已读取的帧照常完成。
/// 单帧推理失败只记录日志并跳过。
pub struct BatchTask<'a> {
  pipeline: &'a Pipeline,
  stop: Arc<AtomicBool>,
  chunk_size: usize,
}

pub const DEFAULT_CHUNK_SIZE: usize = 16;

impl<'a> BatchTask<'a> {
  pub fn new(pipeline: &'a Pipeline) -> Self {
    Self {
      pipeline,
      stop: Arc::new(AtomicBool::new(false)),
      chunk_size: DEFAULT_CHUNK_SIZE,
    }
  }

  /// 同时驻留内存的最大帧数，至少为 1
  pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
    self.chunk_size = chunk_size.max(1);
    self
  }

  /// 外部共享的停止标志
  pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
    self.stop = stop;
    self
  }

  /// 收到 Ctrl-C 时设置停止标志
  pub fn with_interrupt(self) -> anyhow::Result<Self> {
    let stop = self.stop.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，处理完已读取的图像后退出...");
      stop.store(true, Ordering::SeqCst);
    })?;
    Ok(self)
  }

  pub fn stop_flag(&self) -> Arc<AtomicBool> {
    self.stop.clone()
  }

  fn flush<F, O, RE>(
    &self,
    frames: &mut Vec<F>,
    jobs: &mut Vec<(RawOutput, ImageSize)>,
    output: &O,
    done: &mut Vec<(F::Info, DetectionResult)>,
  ) -> Result<(), RE>
  where
    F: FrameInfo,
    O: Render<F, DetectionResult, Error = RE>,
  {
    let results = self.pipeline.run_batch(jobs.as_slice());
    jobs.clear();
    for (frame, result) in frames.drain(..).zip(results) {
      output.render_result(&frame, &result)?;
      done.push((frame.info(), result));
    }
    Ok(())
  }
}

impl<
  F: FrameInfo,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = RawOutput, Error = ME>,
  O: Render<F, DetectionResult, Error = RE>,
> Task<I, M, O> for BatchTask<'_>
{
  type Output = Vec<(F::Info, DetectionResult)>;
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    info!("开始批量任务，每批 {} 张...", self.chunk_size);
    let now = std::time::Instant::now();

    let mut done = Vec::new();
    let mut frames = Vec::with_capacity(self.chunk_size);
    let mut jobs = Vec::with_capacity(self.chunk_size);
    for (idx, frame) in input.enumerate() {
      if self.stop.load(Ordering::SeqCst) {
        warn!("中断信号接收，停止读取新的图像");
        break;
      }
      match model.infer(&frame) {
        Ok(raw) => {
          let size = resolve_size(&frame, &raw);
          jobs.push((raw, size));
          frames.push(frame);
        }
        Err(e) => error!("第 {} 张图像推理失败，已跳过: {}", idx, e),
      }

      if frames.len() >= self.chunk_size {
        self.flush(&mut frames, &mut jobs, &output, &mut done)?;
        debug!("已完成 {} 张，耗时: {:.2?}", done.len(), now.elapsed());
      }
    }
    self.flush(&mut frames, &mut jobs, &output, &mut done)?;

    info!("批量任务完成，共 {} 张，耗时: {:.2?}", done.len(), now.elapsed());
    Ok(done)
  }
}
