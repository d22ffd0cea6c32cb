//! # 线路指标导出
//!
//! 每条线路一行：`from_bus,to_bus,capacity,susceptance,flow,abs_flow,congestion`。
//!
//! ## 依赖关系
//! - 被 `commands/network.rs` 调用
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{GridUtilError, Result};
use crate::network::model::LineFlow;

use std::path::Path;

const HEADER: [&str; 7] = [
    "from_bus",
    "to_bus",
    "capacity",
    "susceptance",
    "flow",
    "abs_flow",
    "congestion",
];

/// 导出线路指标为 CSV
pub fn metrics_to_csv(flows: &[LineFlow], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(HEADER)?;

    for line in flows {
        wtr.write_record(&[
            line.line.from_bus.to_string(),
            line.line.to_bus.to_string(),
            line.line.capacity.to_string(),
            line.line.susceptance.to_string(),
            format!("{:.4}", line.flow),
            format!("{:.4}", line.abs_flow()),
            format!("{:.4}", line.congestion()),
        ])?;
    }

    wtr.flush().map_err(|e| GridUtilError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
