//! # 颜色映射
//!
//! 标量 → 颜色，锚点取自 ColorBrewer 配色。
//!
//! ## 依赖关系
//! - 被 `network/overlay.rs`, `network/plot.rs` 使用
//! - 使用 `plotters` 颜色类型

use plotters::style::RGBColor;

/// RdYlGn (11 级)，由红到绿
const RD_YL_GN: [(u8, u8, u8); 11] = [
    (165, 0, 38),
    (215, 48, 39),
    (244, 109, 67),
    (253, 174, 97),
    (254, 224, 139),
    (255, 255, 191),
    (217, 239, 139),
    (166, 217, 106),
    (102, 189, 99),
    (26, 152, 80),
    (0, 104, 55),
];

/// Reds (9 级)，由浅到深
const REDS: [(u8, u8, u8); 9] = [
    (255, 245, 240),
    (254, 224, 210),
    (252, 187, 161),
    (252, 146, 114),
    (251, 106, 74),
    (239, 59, 44),
    (203, 24, 29),
    (165, 15, 21),
    (103, 0, 13),
];

/// 可用的颜色映射
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    /// 反向 RdYlGn：低值绿，高值红
    RdYlGnReversed,
    Reds,
}

impl Colormap {
    /// t ∈ [0, 1] 对应的颜色，超出范围时截断
    pub fn color_at(self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Colormap::RdYlGnReversed => interpolate(&RD_YL_GN, 1.0 - t),
            Colormap::Reds => interpolate(&REDS, t),
        }
    }
}

fn interpolate(anchors: &[(u8, u8, u8)], t: f64) -> RGBColor {
    let last = anchors.len() - 1;
    let pos = t * last as f64;
    let i = (pos.floor() as usize).min(last);
    let j = (i + 1).min(last);
    let frac = pos - i as f64;

    let lerp = |a: u8, b: u8| -> u8 {
        (a as f64 + (b as f64 - a as f64) * frac).round().clamp(0.0, 255.0) as u8
    };

    let (r0, g0, b0) = anchors[i];
    let (r1, g1, b1) = anchors[j];
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// 线性归一化到 [0, 1]；区间退化时返回 0
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
