// 该文件是 Xuedao （雪道排队） 项目的一部分。
// src/bin/count_queue.rs - 单张图像排队人数统计
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

use anyhow::Result;
use clap::Parser;
use image::RgbImage;
use tracing::info;
use url::Url;

use xuedao::{
  FromUrl,
  args::DetectArgs,
  detect::Pipeline,
  input::ImageFileInput,
  lift::LiftLoad,
  model::ReplayModel,
  output::{CountReport, OutputWrapper},
  task::{OneShotTask, Task},
};

/// Xuedao 单张图像参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 网络输出文件，例如 replay:///data/lift-a.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像，例如 image:///data/lift-a.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，可重复：image:///out.jpg?font=/path/font.ttf 或 record:///records
  #[arg(long, value_name = "OUTPUT")]
  pub output: Vec<Url>,

  #[command(flatten)]
  pub detect: DetectArgs,

  /// 缆车名称
  #[arg(long, value_name = "NAME", default_value = "lift")]
  pub lift: String,
  /// 缆车排队容量，给出时输出负载率
  #[arg(long, value_name = "CAPACITY")]
  pub capacity: Option<u32>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("网络输出文件: {}", args.model);
  info!("输入来源: {}", args.input);
  for output in &args.output {
    info!("输出路径: {}", output);
  }

  let config = args.detect.build_config()?;
  info!(
    "置信度阈值: {}, NMS 阈值: {}, 目标类别: {}",
    config.confidence_threshold(),
    config.iou_threshold(),
    config.target_label()
  );
  let target = config.target_label().clone();
  let pipeline = Pipeline::new(config);

  let input = ImageFileInput::from_url(&args.input)?;
  let model = ReplayModel::<RgbImage>::from_url(&args.model)?;
  let outputs = args
    .output
    .iter()
    .map(OutputWrapper::from_url)
    .collect::<Result<Vec<_>, _>>()?;

  let result = OneShotTask::new(&pipeline).run_task(input, model, outputs)?;

  println!("检测计数:");
  CountReport.write_to(std::io::stdout().lock(), &result)?;

  if let Some(capacity) = args.capacity {
    let load = LiftLoad::from_result(args.lift, capacity, &result, &target);
    match load.occupancy() {
      Some(ratio) => println!(
        "{}: {}/{} ({:.0}%)",
        load.name,
        load.current_load,
        load.capacity,
        ratio * 100.0
      ),
      None => println!("{}: {}", load.name, load.current_load),
    }
  }

  Ok(())
}
