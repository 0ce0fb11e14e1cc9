use crate::config::VolumeConfig;
use crate::indicator::vwap::{VWAP, VWAPBuilder};
use crate::model::Flag;
use crate::series::PriceSeries;
use serde::Serialize;
use std::fmt::Display;

/// 거래량 이상 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnomalyKind {
    /// 평균 대비 급증 (기관 참여 신호)
    Spike,
    /// 평균 대비 고갈 (모멘텀 소진 주의)
    DryUp,
}

/// 거래량 이상 탐지 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeAnomaly {
    /// 발생 바 인덱스
    pub index: usize,
    /// 평균 대비 배수
    pub ratio: f64,
    pub kind: AnomalyKind,
    /// 해당 바 종가
    pub price: f64,
}

/// 볼륨 프로파일
///
/// 가격 구간별 거래량 히스토그램과 파생 레벨입니다.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeProfile {
    /// 최대 거래량 구간 가격 (Point of Control)
    pub poc: f64,
    /// 밸류 에어리어 하단
    pub value_area_low: f64,
    /// 밸류 에어리어 상단
    pub value_area_high: f64,
    /// (구간 중심 가격, 누적 거래량) 히스토그램
    pub histogram: Vec<(f64, f64)>,
}

/// 가격 움직임의 거래량 확인 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveConfirmation {
    pub confirmed: bool,
    /// "strong" / "moderate" / "neutral" / "weak"
    pub strength: String,
    pub reasoning: String,
    pub price_move_pct: f64,
    pub volume_change_pct: f64,
}

impl Display for MoveConfirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MoveConfirmation(confirmed: {}, {})",
            self.confirmed, self.strength
        )
    }
}

/// 거래량 추세 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolumeTrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// 거래량 추세 분석 결과
///
/// 최근 구간 평균을 직전 구간 평균과 비교합니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeTrend {
    pub direction: VolumeTrendDirection,
    /// "strong" / "moderate" / "neutral"
    pub strength: String,
    /// 구간 간 평균 거래량 변화율 (%)
    pub change_pct: f64,
}

/// 거래량 분석 결과
#[derive(Debug, Clone, Serialize)]
pub struct VolumeAnalysis {
    /// VWAP 값 (거래량 없으면 None)
    pub vwap: Option<f64>,
    /// 현재가의 VWAP 대비 편차 (%)
    pub vwap_deviation_pct: Option<f64>,
    /// 현재 바 거래량의 평균 대비 배수
    pub volume_ratio: Option<f64>,
    /// 볼륨 프로파일 (바가 없으면 None)
    pub profile: Option<VolumeProfile>,
    /// 룩백 구간 내 이상 목록
    pub anomalies: Vec<VolumeAnomaly>,
    /// 거래량 추세 (바가 부족하면 None)
    pub trend: Option<VolumeTrend>,
}

/// 거래량 분석기
///
/// VWAP 편차, 볼륨 프로파일, 이상 탐지, 움직임 확인을 담당합니다.
#[derive(Debug)]
pub struct VolumeAnalyzer {
    profile_bins: usize,
    value_area_pct: f64,
    anomaly_lookback: usize,
    spike_multiplier: f64,
    confirmation_threshold_pct: f64,
    vwap_period: usize,
}

impl VolumeAnalyzer {
    /// 새 거래량 분석기 생성
    pub fn new(config: &VolumeConfig) -> VolumeAnalyzer {
        VolumeAnalyzer {
            profile_bins: config.profile_bins,
            value_area_pct: config.value_area_pct,
            anomaly_lookback: config.anomaly_lookback,
            spike_multiplier: config.spike_multiplier,
            confirmation_threshold_pct: config.confirmation_threshold_pct,
            vwap_period: config.vwap_period,
        }
    }

    /// 거래량 분석 수행
    pub fn analyze(&self, series: &PriceSeries, current_price: f64) -> VolumeAnalysis {
        let vwap = VWAPBuilder::new(self.vwap_period).build(series.bars());
        let vwap_deviation_pct = vwap.as_ref().map(|v| v.deviation_pct(current_price));

        let volume_ratio = self.current_volume_ratio(series);
        let profile = self.build_profile(series);
        let anomalies = self.detect_anomalies(series);
        let trend = self.volume_trend(series, 10);

        log::debug!(
            "거래량 분석 완료: vwap={:?}, ratio={:?}, 이상 {}건",
            vwap.as_ref().map(|v| v.value),
            volume_ratio,
            anomalies.len()
        );

        VolumeAnalysis {
            vwap: vwap.map(|v: VWAP| v.value),
            vwap_deviation_pct,
            volume_ratio,
            profile,
            anomalies,
            trend,
        }
    }

    /// 거래량 추세 분석
    ///
    /// 최근 period개 바의 평균 거래량을 직전 period개 바의 평균과
    /// 비교합니다. ±20%를 넘으면 증가/감소, ±50%를 넘으면 강한
    /// 증가/감소로 분류합니다.
    pub fn volume_trend(&self, series: &PriceSeries, period: usize) -> Option<VolumeTrend> {
        let bars = series.bars();
        if bars.len() < period * 2 || period == 0 {
            return None;
        }

        let recent = &bars[bars.len() - period..];
        let older = &bars[bars.len() - period * 2..bars.len() - period];

        let avg_recent = recent.iter().map(|b| b.volume).sum::<f64>() / period as f64;
        let avg_older = older.iter().map(|b| b.volume).sum::<f64>() / period as f64;
        if avg_older <= 0.0 {
            return None;
        }

        let change_pct = (avg_recent - avg_older) / avg_older * 100.0;

        let (direction, strength) = if change_pct > 20.0 {
            (
                VolumeTrendDirection::Increasing,
                if change_pct > 50.0 { "strong" } else { "moderate" },
            )
        } else if change_pct < -20.0 {
            (
                VolumeTrendDirection::Decreasing,
                if change_pct < -50.0 { "strong" } else { "moderate" },
            )
        } else {
            (VolumeTrendDirection::Stable, "neutral")
        };

        Some(VolumeTrend {
            direction,
            strength: strength.to_string(),
            change_pct,
        })
    }

    /// 현재 바 거래량의 평균 대비 배수
    fn current_volume_ratio(&self, series: &PriceSeries) -> Option<f64> {
        let last = series.last()?;
        let avg = series.average_volume(self.anomaly_lookback)?;
        if avg <= 0.0 {
            return None;
        }
        Some(last.volume / avg)
    }

    /// 볼륨 프로파일 생성
    ///
    /// 가격 범위를 균등 구간으로 나누고 각 바의 거래량을 고가-저가 범위가
    /// 닿는 구간에 균등 분배합니다. POC는 최대 구간, 밸류 에어리어는
    /// POC에서 양쪽으로 확장하며 누적 거래량이 목표 비율에 도달할 때까지
    /// 더 큰 이웃을 편입합니다.
    pub fn build_profile(&self, series: &PriceSeries) -> Option<VolumeProfile> {
        let bars = series.bars();
        if bars.is_empty() {
            return None;
        }

        let price_min = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let price_max = bars
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        if price_max <= price_min {
            return None;
        }

        let bin_width = (price_max - price_min) / self.profile_bins as f64;
        let bin_centers: Vec<f64> = (0..self.profile_bins)
            .map(|i| price_min + bin_width * (i as f64 + 0.5))
            .collect();

        let mut volume_profile = vec![0.0_f64; self.profile_bins];
        for bar in bars {
            let touched: Vec<usize> = bin_centers
                .iter()
                .enumerate()
                .filter(|&(_, &center)| center >= bar.low && center <= bar.high)
                .map(|(i, _)| i)
                .collect();
            if touched.is_empty() {
                continue;
            }
            let share = bar.volume / touched.len() as f64;
            for i in touched {
                volume_profile[i] += share;
            }
        }

        let total_volume: f64 = volume_profile.iter().sum();
        if total_volume <= 0.0 {
            return None;
        }

        // POC: 최대 거래량 구간
        let poc_idx = volume_profile
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap_or(0);

        // 밸류 에어리어: POC에서 바깥쪽으로 확장
        let target_volume = total_volume * self.value_area_pct;
        let mut current_volume = volume_profile[poc_idx];
        let mut lower_idx = poc_idx as isize - 1;
        let mut upper_idx = poc_idx + 1;
        let mut va_low_idx = poc_idx;
        let mut va_high_idx = poc_idx;

        while current_volume < target_volume
            && (lower_idx >= 0 || upper_idx < self.profile_bins)
        {
            let lower_vol = if lower_idx >= 0 {
                volume_profile[lower_idx as usize]
            } else {
                0.0
            };
            let upper_vol = if upper_idx < self.profile_bins {
                volume_profile[upper_idx]
            } else {
                0.0
            };

            if lower_vol >= upper_vol && lower_idx >= 0 {
                va_low_idx = lower_idx as usize;
                current_volume += lower_vol;
                lower_idx -= 1;
            } else if upper_idx < self.profile_bins {
                va_high_idx = upper_idx;
                current_volume += upper_vol;
                upper_idx += 1;
            } else {
                break;
            }
        }

        Some(VolumeProfile {
            poc: bin_centers[poc_idx],
            value_area_low: bin_centers[va_low_idx],
            value_area_high: bin_centers[va_high_idx],
            histogram: bin_centers
                .iter()
                .copied()
                .zip(volume_profile.iter().copied())
                .collect(),
        })
    }

    /// 거래량 스파이크/드라이업 탐지
    ///
    /// 각 바의 거래량을 직전 N바 평균과 비교합니다.
    pub fn detect_anomalies(&self, series: &PriceSeries) -> Vec<VolumeAnomaly> {
        let bars = series.bars();
        if bars.len() < self.anomaly_lookback + 1 {
            return Vec::new();
        }

        let mut anomalies = Vec::new();
        for idx in self.anomaly_lookback..bars.len() {
            let window = &bars[idx - self.anomaly_lookback..idx];
            let avg: f64 =
                window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64;
            if avg <= 0.0 {
                continue;
            }

            let ratio = bars[idx].volume / avg;
            if ratio >= self.spike_multiplier {
                anomalies.push(VolumeAnomaly {
                    index: idx,
                    ratio,
                    kind: AnomalyKind::Spike,
                    price: bars[idx].close,
                });
            } else if ratio <= 1.0 / self.spike_multiplier {
                anomalies.push(VolumeAnomaly {
                    index: idx,
                    ratio,
                    kind: AnomalyKind::DryUp,
                    price: bars[idx].close,
                });
            }
        }

        anomalies
    }

    /// 가격 움직임의 거래량 확인
    ///
    /// 작은 움직임은 항상 통과시키고, 강한 움직임은 거래량 증가를
    /// 요구합니다. 확인 실패는 분석을 막지 않으며 불리언으로만 전달됩니다.
    pub fn confirm_move(&self, price_move_pct: f64, volume_change_pct: f64) -> MoveConfirmation {
        let abs_move = price_move_pct.abs();
        let threshold = self.confirmation_threshold_pct;

        let (confirmed, strength, reasoning) = if abs_move < 1.0 {
            (
                true,
                "neutral",
                "Small price move - volume confirmation not critical".to_string(),
            )
        } else if abs_move >= 2.0 && volume_change_pct >= threshold {
            (
                true,
                "strong",
                format!(
                    "Strong {:.1}% move with {:.0}% volume increase",
                    abs_move, volume_change_pct
                ),
            )
        } else if abs_move >= 2.0 {
            (
                false,
                "weak",
                format!(
                    "Strong {:.1}% move without volume support - potential false breakout",
                    abs_move
                ),
            )
        } else if volume_change_pct >= threshold * 0.5 {
            (
                true,
                "moderate",
                format!(
                    "Moderate {:.1}% move with {:.0}% volume increase",
                    abs_move, volume_change_pct
                ),
            )
        } else {
            (
                false,
                "weak",
                format!("Price move {:.1}% not confirmed by volume", abs_move),
            )
        };

        MoveConfirmation {
            confirmed,
            strength: strength.to_string(),
            reasoning,
            price_move_pct,
            volume_change_pct,
        }
    }

    /// 거래량 컴포넌트의 레드/그린 플래그 생성
    pub fn flags(&self, analysis: &VolumeAnalysis) -> (Vec<Flag>, Vec<Flag>) {
        let mut red = Vec::new();
        let mut green = Vec::new();

        if let Some(ratio) = analysis.volume_ratio {
            if ratio > 1.5 {
                green.push(Flag::low(
                    "volume",
                    format!("High volume: {:.1}x average", ratio),
                ));
            } else if ratio < 0.7 {
                red.push(Flag::low(
                    "volume",
                    format!("Low volume: {:.1}x average", ratio),
                ));
            }
        }

        if let Some(deviation) = analysis.vwap_deviation_pct {
            if deviation > 2.0 {
                red.push(Flag::medium(
                    "vwap",
                    format!(
                        "Price {:.1}% above VWAP - overextended, mean reversion risk",
                        deviation
                    ),
                ));
            } else if deviation < -2.0 {
                red.push(Flag::medium(
                    "vwap",
                    format!("Price {:.1}% below VWAP - weak positioning", deviation.abs()),
                ));
            }
        }

        (red, green)
    }
}
