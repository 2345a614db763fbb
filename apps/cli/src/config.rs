//! 配置加载
//!
//! 优先级：命令行参数 > `--config` 指定的文件 > 默认配置文件 > 内置默认值。
//! 默认配置文件位于 `<config_dir>/cogip/planner.toml`，不存在时忽略。

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use cogip_planner::Properties;

fn config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine config directory"))?;
    path.push("cogip");
    Ok(path)
}

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("planner.toml"))
}

/// 命令行覆盖的配置项
#[derive(Args, Debug, Default, Clone)]
pub struct PropertyOverrides {
    /// 机器人宽度（mm）
    #[arg(long)]
    pub robot_width: Option<f64>,

    /// 检测障碍半径（mm）
    #[arg(long)]
    pub obstacle_radius: Option<f64>,

    /// 障碍包围盒外扩比例
    #[arg(long)]
    pub obstacle_bb_margin: Option<f64>,

    /// 障碍包围盒顶点数
    #[arg(long)]
    pub obstacle_bb_vertices: Option<usize>,

    /// 障碍广播周期（秒）
    #[arg(long)]
    pub obstacle_sender_interval: Option<f64>,

    /// 路径刷新周期（秒）
    #[arg(long)]
    pub path_refresh_interval: Option<f64>,

    /// 可视图节点到起点的最大距离（mm）
    #[arg(long)]
    pub max_distance: Option<f64>,
}

impl PropertyOverrides {
    /// 逐项应用，使用与运行时更新相同的校验
    pub fn apply(&self, properties: &mut Properties) -> Result<()> {
        let overrides = [
            ("robot_width", self.robot_width.map(|v| json!(v))),
            ("obstacle_radius", self.obstacle_radius.map(|v| json!(v))),
            ("obstacle_bb_margin", self.obstacle_bb_margin.map(|v| json!(v))),
            ("obstacle_bb_vertices", self.obstacle_bb_vertices.map(|v| json!(v))),
            ("obstacle_sender_interval", self.obstacle_sender_interval.map(|v| json!(v))),
            ("path_refresh_interval", self.path_refresh_interval.map(|v| json!(v))),
            ("max_distance", self.max_distance.map(|v| json!(v))),
        ];
        for (name, value) in overrides {
            if let Some(value) = value {
                properties.update(name, &value)?;
                debug!("Override {} = {}", name, value);
            }
        }
        Ok(())
    }
}

/// 加载配置并应用命令行覆盖
pub fn load_properties(path: Option<&Path>, overrides: &PropertyOverrides) -> Result<Properties> {
    let mut properties = match path {
        Some(path) => Properties::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let path = default_config_file()?;
            if path.exists() {
                info!("Loading config from {}", path.display());
                Properties::load_from_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?
            } else {
                Properties::default()
            }
        },
    };
    overrides.apply(&mut properties)?;
    Ok(properties)
}
