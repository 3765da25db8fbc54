// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/bin/count_queue_batch.rs - 批量统计目录中每张图像的排队人数
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

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use xuedao::{
  FromUrl,
  args::DetectArgs,
  detect::Pipeline,
  input::ImageDirectoryInput,
  model::SidecarReplayModel,
  output::{CountReport, RecordOutput},
  task::{BatchTask, Task},
};

/// Xuedao 批量参数配置
///
/// 每张图像旁需要有同名的 `.json` 网络输出文件。
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 图像目录，例如 folder:///data/queue
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 检测记录目录，例如 record:///data/records?always
  #[arg(long, value_name = "RECORD")]
  pub record: Option<Url>,

  #[command(flatten)]
  pub detect: DetectArgs,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入目录: {}", args.input);
  let pipeline = Pipeline::new(args.detect.build_config()?);

  let input = ImageDirectoryInput::from_url(&args.input)?;
  let outputs = match &args.record {
    Some(url) => {
      info!("检测记录目录: {}", url);
      vec![RecordOutput::from_url(url)?]
    }
    None => Vec::new(),
  };

  let done = BatchTask::new(&pipeline)
    .with_interrupt()?
    .run_task(input, SidecarReplayModel, outputs)?;

  let mut stdout = std::io::stdout().lock();
  for (path, result) in &done {
    writeln!(stdout, "{}", path.display())?;
    CountReport.write_to(&mut stdout, result)?;
  }

  Ok(())
}
