use crate::config::TrendConfig;
use crate::indicator::adx::ADXBuilder;
use crate::model::{Direction, Flag, PriceBar, TradeSpec};
use crate::series::PriceSeries;
use serde::Serialize;
use std::fmt::Display;

/// 추세 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Uptrend,
    Downtrend,
    Sideways,
}

impl TrendDirection {
    /// 시그널 방향으로 변환
    pub fn as_direction(&self) -> Direction {
        match self {
            TrendDirection::Uptrend => Direction::Bullish,
            TrendDirection::Downtrend => Direction::Bearish,
            TrendDirection::Sideways => Direction::Neutral,
        }
    }
}

impl Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Uptrend => write!(f, "uptrend"),
            TrendDirection::Downtrend => write!(f, "downtrend"),
            TrendDirection::Sideways => write!(f, "sideways"),
        }
    }
}

/// 스윙 구조 카운트
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrendStructure {
    pub higher_highs: usize,
    pub higher_lows: usize,
    pub lower_highs: usize,
    pub lower_lows: usize,
    pub swing_high_count: usize,
    pub swing_low_count: usize,
}

/// 추세 상태
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendState {
    pub direction: TrendDirection,
    /// 추세 강도 (0-100)
    pub strength: f64,
    /// 판정 신뢰도 (0-100)
    pub confidence: f64,
    /// ADX 값. 바가 부족하면 None이며 판정은 구조만으로 이뤄집니다.
    pub adx: Option<f64>,
    pub structure: TrendStructure,
}

impl Display for TrendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TrendState({}, strength: {:.0}, adx: {})",
            self.direction,
            self.strength,
            self.adx
                .map(|a| format!("{:.1}", a))
                .unwrap_or_else(|| "N/A".to_string())
        )
    }
}

/// 멀티 타임프레임 정렬 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAlignment {
    /// 모든 타임프레임의 방향이 일치할 때만 true
    pub aligned: bool,
    pub direction: TrendDirection,
    pub timeframes_checked: usize,
}

/// 추세 분석기
///
/// 스윙 구조를 1차 신호로, ADX를 신뢰도 배수로 사용합니다.
#[derive(Debug)]
pub struct TrendAnalyzer {
    structure_lookback: usize,
    swing_window: usize,
    adx_period: usize,
    adx_trend_threshold: f64,
    adx_weak_threshold: f64,
}

impl TrendAnalyzer {
    /// 새 추세 분석기 생성
    pub fn new(config: &TrendConfig) -> TrendAnalyzer {
        TrendAnalyzer {
            structure_lookback: config.structure_lookback,
            swing_window: config.swing_window,
            adx_period: config.adx_period,
            adx_trend_threshold: config.adx_trend_threshold,
            adx_weak_threshold: config.adx_weak_threshold,
        }
    }

    /// 추세 분석 수행
    ///
    /// ADX가 불가능한 짧은 시계열에서도 구조만으로 판정하며 실패하지
    /// 않습니다.
    pub fn analyze(&self, series: &PriceSeries) -> TrendState {
        let bars = series.tail(self.structure_lookback);
        let structure = self.detect_structure(bars);
        let (mut direction, mut strength, mut confidence) =
            self.classify_structure(bars, &structure);

        // ADX는 방향이 아니라 강도/신뢰도를 보정
        let adx = ADXBuilder::new(self.adx_period)
            .build(series.bars())
            .map(|a| a.value);

        match adx {
            Some(value) if value >= self.adx_trend_threshold => {
                confidence = confidence.max(80.0);
                strength = strength.max(value.min(100.0));
            }
            Some(value) if value < self.adx_weak_threshold => {
                // 약한 ADX는 횡보 쪽으로 끌어내림
                if strength < 80.0 {
                    direction = TrendDirection::Sideways;
                }
                confidence = confidence.min(50.0);
            }
            Some(_) => {
                confidence = confidence.min(60.0);
            }
            None => {
                // ADX 불가: 구조 단독 판정, 신뢰도 하향
                confidence = (confidence - 20.0).max(30.0);
            }
        }

        log::debug!(
            "추세 분석 완료: {} (strength={:.0}, confidence={:.0}, adx={:?})",
            direction,
            strength,
            confidence,
            adx
        );

        TrendState {
            direction,
            strength,
            confidence,
            adx,
            structure,
        }
    }

    /// 스윙 구조 카운트 수집
    fn detect_structure(&self, bars: &[PriceBar]) -> TrendStructure {
        let w = self.swing_window;
        if bars.len() < w * 2 + 1 {
            return TrendStructure::default();
        }

        let mut highs = Vec::new();
        let mut lows = Vec::new();

        for i in w..bars.len() - w {
            let window_max = bars[i - w..=i + w]
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            if bars[i].high == window_max {
                highs.push(bars[i].high);
            }

            let window_min = bars[i - w..=i + w]
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min);
            if bars[i].low == window_min {
                lows.push(bars[i].low);
            }
        }

        let higher_highs = highs.windows(2).filter(|w| w[1] > w[0]).count();
        let lower_highs = highs.windows(2).filter(|w| w[1] < w[0]).count();
        let higher_lows = lows.windows(2).filter(|w| w[1] > w[0]).count();
        let lower_lows = lows.windows(2).filter(|w| w[1] < w[0]).count();

        TrendStructure {
            higher_highs,
            higher_lows,
            lower_highs,
            lower_lows,
            swing_high_count: highs.len(),
            swing_low_count: lows.len(),
        }
    }

    /// 최근 스윙 기준 방향/강도/신뢰도 판정
    ///
    /// 최근 세 스윙이 모두 고점·저점 동반 상승이면 강한 상승 추세,
    /// 한쪽만 상승이면 약한 상승 추세로 판정합니다. 하락은 대칭입니다.
    fn classify_structure(
        &self,
        bars: &[PriceBar],
        structure: &TrendStructure,
    ) -> (TrendDirection, f64, f64) {
        if structure.swing_high_count < 2 || structure.swing_low_count < 2 {
            return (TrendDirection::Sideways, 30.0, 50.0);
        }

        let w = self.swing_window;
        let mut recent_highs = Vec::new();
        let mut recent_lows = Vec::new();
        for i in w..bars.len() - w {
            let window_max = bars[i - w..=i + w]
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            if bars[i].high == window_max {
                recent_highs.push(bars[i].high);
            }
            let window_min = bars[i - w..=i + w]
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min);
            if bars[i].low == window_min {
                recent_lows.push(bars[i].low);
            }
        }

        let take_highs = recent_highs.len().min(3);
        let take_lows = recent_lows.len().min(3);
        let last_highs = &recent_highs[recent_highs.len() - take_highs..];
        let last_lows = &recent_lows[recent_lows.len() - take_lows..];

        let higher_highs = last_highs.windows(2).all(|w| w[1] > w[0]);
        let higher_lows = last_lows.windows(2).all(|w| w[1] > w[0]);
        let lower_highs = last_highs.windows(2).all(|w| w[1] < w[0]);
        let lower_lows = last_lows.windows(2).all(|w| w[1] < w[0]);

        if higher_highs && higher_lows {
            (TrendDirection::Uptrend, 80.0, 90.0)
        } else if lower_highs && lower_lows {
            (TrendDirection::Downtrend, 80.0, 90.0)
        } else if higher_highs || higher_lows {
            (TrendDirection::Uptrend, 60.0, 60.0)
        } else if lower_highs || lower_lows {
            (TrendDirection::Downtrend, 60.0, 60.0)
        } else {
            (TrendDirection::Sideways, 40.0, 70.0)
        }
    }

    /// 멀티 타임프레임 정렬 검사
    ///
    /// 모든 타임프레임의 방향이 일치할 때만 정렬로 판정합니다.
    pub fn alignment(&self, states: &[TrendState]) -> TrendAlignment {
        if states.is_empty() {
            return TrendAlignment {
                aligned: false,
                direction: TrendDirection::Sideways,
                timeframes_checked: 0,
            };
        }

        let first = states[0].direction;
        let aligned = states.iter().all(|s| s.direction == first);

        TrendAlignment {
            aligned,
            direction: if aligned {
                first
            } else {
                TrendDirection::Sideways
            },
            timeframes_checked: states.len(),
        }
    }

    /// 추세 컴포넌트의 레드/그린 플래그 생성
    pub fn flags(&self, state: &TrendState, trade: &TradeSpec) -> (Vec<Flag>, Vec<Flag>) {
        let mut red = Vec::new();
        let mut green = Vec::new();

        let trend_dir = state.direction.as_direction();
        let trade_dir = trade.direction();

        if trend_dir.opposes(trade_dir) {
            red.push(Flag::high(
                "trend",
                format!(
                    "Counter-trend trade ({}, taking {}s)",
                    state.direction, trade.option_type
                ),
            ));
        } else if trend_dir == trade_dir {
            green.push(Flag::low(
                "trend",
                format!("With the trend ({})", state.direction),
            ));
        }

        if let Some(adx) = state.adx {
            if adx < self.adx_weak_threshold {
                red.push(Flag::low(
                    "trend",
                    format!("Weak trend (ADX {:.1}) - choppy conditions", adx),
                ));
            }
        }

        (red, green)
    }
}
