use crate::analyzer::swing_zone::ZoneAnalysis;
use crate::config::{EngineConfig, TrailingConfig};
use crate::model::OptionType;
use serde::Serialize;
use std::fmt::Display;

/// 트레일링 스톱 후보 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrailingStopKind {
    /// 수익 단계별 ATR 배수 기반
    Atr,
    /// 지지/저항 존 기반
    Technical,
    /// R 트리거 도달 시 진입가 스톱
    Breakeven,
    /// 조정 없음 (초기 스톱 유지)
    Initial,
}

impl Display for TrailingStopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrailingStopKind::Atr => write!(f, "atr"),
            TrailingStopKind::Technical => write!(f, "technical"),
            TrailingStopKind::Breakeven => write!(f, "breakeven"),
            TrailingStopKind::Initial => write!(f, "initial"),
        }
    }
}

/// 트레일링 스톱 후보
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailingStopLevel {
    pub price: f64,
    pub kind: TrailingStopKind,
    pub reason: String,
    /// 낮을수록 높은 우선순위
    pub priority: u8,
}

/// 트레일링 스톱 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailingStop {
    pub stop: f64,
    pub kind: TrailingStopKind,
    pub reason: String,
    /// 초기 스톱보다 타이트해졌는지 여부
    pub active: bool,
    pub candidates: Vec<TrailingStopLevel>,
}

/// 트레일링 스톱 매니저
///
/// ATR/기술적/브레이크이븐 후보를 수집해 우선순위가 가장 높은 것을
/// 선택합니다. 스톱은 초기 스톱 대비 타이트해지는 방향으로만
/// 움직입니다 (리스크 축소 전용).
#[derive(Debug)]
pub struct TrailingStopManager {
    config: TrailingConfig,
}

impl TrailingStopManager {
    /// 새 트레일링 스톱 매니저 생성
    pub fn new(config: &EngineConfig) -> TrailingStopManager {
        TrailingStopManager {
            config: config.trailing.clone(),
        }
    }

    /// 최적 트레일링 스톱 계산 (프리미엄 기준)
    ///
    /// # Arguments
    /// * `entry_price` - 진입 프리미엄
    /// * `current_price` - 현재 프리미엄
    /// * `initial_stop` - 초기 손절 프리미엄
    /// * `atr` - 기초자산 ATR
    /// * `profit_r` - 현재 수익 R 배수
    /// * `option_type` - 옵션 유형
    /// * `zones` - 존 분석 (기술적 트레일링용)
    /// * `underlying_price` - 현재 기초자산 가격
    /// * `delta` - 옵션 델타 (존 레벨의 프리미엄 환산용)
    pub fn calculate(
        &self,
        entry_price: f64,
        current_price: f64,
        initial_stop: f64,
        atr: Option<f64>,
        profit_r: f64,
        option_type: OptionType,
        zones: Option<&ZoneAnalysis>,
        underlying_price: Option<f64>,
        delta: Option<f64>,
    ) -> TrailingStop {
        let mut candidates = Vec::new();

        // 1. ATR 기반 트레일링 (수익이 커질수록 여유를 넓힘)
        if let (Some(atr), Some(delta)) = (atr, delta) {
            if let Some(level) =
                self.atr_trailing(current_price, initial_stop, atr, profit_r, delta)
            {
                candidates.push(level);
            }
        }

        // 2. 기술적 레벨 트레일링
        if let (Some(zones), Some(underlying), Some(delta)) = (zones, underlying_price, delta) {
            if let Some(level) = self.technical_trailing(
                entry_price,
                current_price,
                initial_stop,
                option_type,
                zones,
                underlying,
                delta,
            ) {
                candidates.push(level);
            }
        }

        // 3. 브레이크이븐 스톱
        if profit_r >= self.config.breakeven_r_trigger && entry_price > initial_stop {
            candidates.push(TrailingStopLevel {
                price: entry_price,
                kind: TrailingStopKind::Breakeven,
                reason: format!(
                    "Breakeven stop at {:.1}R (triggered at {}R)",
                    profit_r, self.config.breakeven_r_trigger
                ),
                priority: 3,
            });
        }

        if candidates.is_empty() {
            return TrailingStop {
                stop: initial_stop,
                kind: TrailingStopKind::Initial,
                reason: "Using initial stop loss".to_string(),
                active: false,
                candidates,
            };
        }

        candidates.sort_by_key(|c| c.priority);
        let best = candidates[0].clone();

        // 스톱은 초기 스톱보다 느슨해지지 않음
        let stop = best.price.max(initial_stop);

        TrailingStop {
            stop: (stop * 100.0).round() / 100.0,
            kind: best.kind,
            reason: best.reason,
            active: true,
            candidates,
        }
    }

    /// ATR 트레일링 후보
    fn atr_trailing(
        &self,
        current_price: f64,
        initial_stop: f64,
        atr: f64,
        profit_r: f64,
        delta: f64,
    ) -> Option<TrailingStopLevel> {
        let (multiplier, phase) = if profit_r >= 4.0 {
            (self.config.high_atr_multiplier, "high profit")
        } else if profit_r >= 2.0 {
            (self.config.mid_atr_multiplier, "mid profit")
        } else {
            (self.config.initial_atr_multiplier, "initial")
        };

        // 주가 ATR를 델타로 프리미엄 이동량에 사상해 피크 아래로 트레일
        let stop = current_price - multiplier * atr * delta.abs();
        if stop <= initial_stop {
            return None;
        }

        Some(TrailingStopLevel {
            price: stop,
            kind: TrailingStopKind::Atr,
            reason: format!("ATR trailing ({}): {}x ATR below peak", phase, multiplier),
            priority: 2,
        })
    }

    /// 기술적 레벨 트레일링 후보
    ///
    /// 콜은 현재가 아래 가장 높은 지지 존으로, 풋은 현재가 위 가장
    /// 낮은 저항 존으로 트레일합니다. 존 레벨은 델타 선형 근사로
    /// 프리미엄에 환산합니다.
    fn technical_trailing(
        &self,
        entry_price: f64,
        current_price: f64,
        initial_stop: f64,
        option_type: OptionType,
        zones: &ZoneAnalysis,
        underlying_price: f64,
        delta: f64,
    ) -> Option<TrailingStopLevel> {
        let min_premium = entry_price * (1.0 + self.config.min_distance_from_entry_pct / 100.0);

        let (zone, distance) = match option_type {
            OptionType::Call => {
                let zone = zones.nearest_support()?;
                (zone, underlying_price - zone.price)
            }
            OptionType::Put => {
                let zone = zones.nearest_resistance()?;
                (zone, zone.price - underlying_price)
            }
        };
        if distance <= 0.0 {
            return None;
        }

        let stop_premium = current_price - delta.abs() * distance;
        if stop_premium <= initial_stop || stop_premium < min_premium {
            return None;
        }

        Some(TrailingStopLevel {
            price: stop_premium,
            kind: TrailingStopKind::Technical,
            reason: format!(
                "Technical {} at ${:.2} (strength: {:.0})",
                zone.kind, zone.price, zone.strength
            ),
            priority: 1,
        })
    }

    /// 현재 프리미엄이 트레일링 스톱에 도달했는지 확인
    pub fn should_exit(&self, current_price: f64, trailing_stop: f64) -> bool {
        current_price <= trailing_stop
    }
}
