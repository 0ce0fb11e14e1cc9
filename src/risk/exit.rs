use crate::analyzer::swing_zone::{Zone, ZoneAnalysis};
use crate::config::{EngineConfig, ExitConfig, ExitPrecedence};
use crate::model::{OptionType, PriceBar, TradeSpec};
use crate::series::PriceSeries;
use serde::Serialize;
use std::fmt::Display;

/// 동적 청산 조정 액션
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitAction {
    /// 조정 없음. 원래 플랜 유지.
    None,
    /// 돌파 확인: 러너 유지, 스톱을 돌파 존 아래로, 다음 존 재목표
    AdjustForBreakout,
    /// 거부 패턴: 잔여 물량 확대 청산, 스톱 타이트닝
    ExitOnRejection,
}

impl Display for ExitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitAction::None => write!(f, "none"),
            ExitAction::AdjustForBreakout => write!(f, "adjust_for_breakout"),
            ExitAction::ExitOnRejection => write!(f, "exit_on_rejection"),
        }
    }
}

/// 동적 청산 조정 결과
///
/// 매 가격 관찰마다 독립적으로 계산되는 무상태 결과입니다. 같은
/// 스냅샷에 대해 항상 같은 결과를 내며, 직전에 발행된 조정을 기억하고
/// 중복 적용을 피하는 것은 호출자의 책임입니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitAdjustment {
    pub action: ExitAction,
    /// 새 스톱 (기초자산 레벨)
    pub new_stop: Option<f64>,
    /// 새 러너 목표 (기초자산 레벨)
    pub new_runner_target: Option<f64>,
    /// 청산 권고 계약 수
    pub exit_contracts: u32,
    /// 트리거된 패턴 이름
    pub pattern: Option<String>,
    pub reason: String,
}

impl ExitAdjustment {
    fn none(reason: impl Into<String>) -> ExitAdjustment {
        ExitAdjustment {
            action: ExitAction::None,
            new_stop: None,
            new_runner_target: None,
            exit_contracts: 0,
            pattern: None,
            reason: reason.into(),
        }
    }
}

impl Display for ExitAdjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExitAdjustment({}: {})", self.action, self.reason)
    }
}

/// 거부 패턴 지오메트리 판정 결과
struct RejectionSignal {
    pattern: &'static str,
    exit_pct: f64,
}

/// 동적 청산 조정기
///
/// 돌파와 거부를 독립적으로 검사합니다. 한 스냅샷에서 둘 다 성립하면
/// 설정된 우선순위 정책(기본: 거부 우선)을 따릅니다.
#[derive(Debug)]
pub struct ExitAdjuster {
    config: ExitConfig,
}

impl ExitAdjuster {
    /// 새 청산 조정기 생성
    pub fn new(config: &EngineConfig) -> ExitAdjuster {
        ExitAdjuster {
            config: config.exits.clone(),
        }
    }

    /// 청산 조정 검사
    ///
    /// # Arguments
    /// * `series` - 가격 시계열 (돌파 거래량 확인에 20바 이상 필요)
    /// * `trade` - 트레이드 명세
    /// * `remaining_contracts` - 잔여 계약 수
    /// * `current_price` - 현재 기초자산 가격
    /// * `watched_zone` - 플랜이 주시하는 존 (콜: 저항, 풋: 지지)
    /// * `zones` - 다음 목표 탐색용 존 분석
    ///
    /// # Returns
    /// * `ExitAdjustment` - 조정 권고 (없으면 action = None)
    pub fn check(
        &self,
        series: &PriceSeries,
        trade: &TradeSpec,
        remaining_contracts: u32,
        current_price: f64,
        watched_zone: &Zone,
        zones: &ZoneAnalysis,
    ) -> ExitAdjustment {
        let rejection = self.check_rejection(series, trade, remaining_contracts, watched_zone);
        let breakout = self.check_breakout(series, trade, current_price, watched_zone, zones);

        match (rejection, breakout) {
            (Some(r), Some(b)) => match self.config.precedence {
                // 실현 이익 보호가 러너 연장보다 우선
                ExitPrecedence::RejectionFirst => r,
                ExitPrecedence::BreakoutFirst => b,
            },
            (Some(r), None) => r,
            (None, Some(b)) => b,
            (None, None) => ExitAdjustment::none("No adjustment - original plan stands"),
        }
    }

    /// 돌파 검사
    ///
    /// 확인 비율 이상 + 존 위 종가 마감 + 거래량 배수 충족이 모두
    /// 필요합니다. 꼬리만 넘긴 경우는 거짓 돌파로 무시합니다.
    fn check_breakout(
        &self,
        series: &PriceSeries,
        trade: &TradeSpec,
        current_price: f64,
        watched_zone: &Zone,
        zones: &ZoneAnalysis,
    ) -> Option<ExitAdjustment> {
        let bars = series.bars();
        if bars.len() < 20 {
            log::debug!("돌파 검사에 바가 부족합니다: {} < 20", bars.len());
            return None;
        }

        let level = watched_zone.price;
        let last_bar = bars.last().unwrap();

        let (beyond_threshold, closed_beyond) = match trade.option_type {
            OptionType::Call => (
                current_price >= level * (1.0 + self.config.breakout_confirmation_pct),
                last_bar.close > level,
            ),
            OptionType::Put => (
                current_price <= level * (1.0 - self.config.breakout_confirmation_pct),
                last_bar.close < level,
            ),
        };

        if !beyond_threshold {
            return None;
        }

        // 꼬리만 넘긴 돌파는 거부 가능성이 높음
        if !closed_beyond {
            log::debug!(
                "거짓 돌파: 레벨 ${:.2} 너머 꼬리, 종가는 복귀",
                level
            );
            return None;
        }

        // 거래량 확인
        let avg_volume = bars[bars.len() - 20..]
            .iter()
            .map(|b| b.volume)
            .sum::<f64>()
            / 20.0;
        if avg_volume <= 0.0 {
            return None;
        }
        let volume_ratio = last_bar.volume / avg_volume;
        if volume_ratio < self.config.breakout_volume_multiplier {
            log::debug!(
                "돌파 미확인: 거래량 {:.1}x < {:.1}x",
                volume_ratio,
                self.config.breakout_volume_multiplier
            );
            return None;
        }

        // 확인된 돌파: 깨진 레벨 바로 밑으로 스톱, 다음 존 재목표
        let (new_stop, new_runner_target) = match trade.option_type {
            OptionType::Call => (
                level * 0.995,
                zones.next_resistance_above(level).map(|z| z.price),
            ),
            OptionType::Put => (
                level * 1.005,
                zones.next_support_below(level).map(|z| z.price),
            ),
        };

        Some(ExitAdjustment {
            action: ExitAction::AdjustForBreakout,
            new_stop: Some((new_stop * 100.0).round() / 100.0),
            new_runner_target,
            exit_contracts: 0,
            pattern: None,
            reason: format!(
                "Broke ${:.2} (strength: {:.0}) on {:.1}x volume - hold runner, trail stop to broken level",
                level, watched_zone.strength, volume_ratio
            ),
        })
    }

    /// 거부 검사
    ///
    /// 마지막 바가 주시 존 근접 범위 안에서 거부 지오메트리(슈팅스타,
    /// 엔걸핑, 긴 꼬리)를 만들면 패턴 강도에 따라 잔여 물량의
    /// 50-75% 청산을 권고합니다.
    fn check_rejection(
        &self,
        series: &PriceSeries,
        trade: &TradeSpec,
        remaining_contracts: u32,
        watched_zone: &Zone,
    ) -> Option<ExitAdjustment> {
        let bars = series.bars();
        if bars.len() < 3 {
            return None;
        }

        let last_bar = &bars[bars.len() - 1];
        let prev_bar = &bars[bars.len() - 2];
        let level = watched_zone.price;

        // 존 근접 검사
        let at_level = match trade.option_type {
            OptionType::Call => {
                (last_bar.high - level).abs() / level <= self.config.rejection_proximity_pct
            }
            OptionType::Put => {
                (last_bar.low - level).abs() / level <= self.config.rejection_proximity_pct
            }
        };
        if !at_level {
            return None;
        }

        let signal = match trade.option_type {
            OptionType::Call => self.bearish_rejection(last_bar, prev_bar),
            OptionType::Put => self.bullish_rejection(last_bar, prev_bar),
        }?;

        let exit_contracts =
            (remaining_contracts as f64 * signal.exit_pct).ceil() as u32;

        Some(ExitAdjustment {
            action: ExitAction::ExitOnRejection,
            new_stop: None,
            new_runner_target: None,
            exit_contracts: exit_contracts.min(remaining_contracts),
            pattern: Some(signal.pattern.to_string()),
            reason: format!(
                "{} at ${:.2} - exit {:.0}% of remaining position and tighten stop",
                signal.pattern,
                level,
                signal.exit_pct * 100.0
            ),
        })
    }

    /// 베어리시 거부 지오메트리 (콜 포지션, 저항 존)
    fn bearish_rejection(&self, current: &PriceBar, previous: &PriceBar) -> Option<RejectionSignal> {
        let body = current.body();
        let range = current.range();
        let upper_wick = current.upper_wick();
        let lower_wick = current.lower_wick();

        // 베어리시 엔걸핑: 가장 강한 거부
        if previous.is_bullish()
            && current.is_bearish()
            && current.open >= previous.close
            && current.close <= previous.open
        {
            return Some(RejectionSignal {
                pattern: "bearish_engulfing",
                exit_pct: 0.75,
            });
        }

        // 슈팅스타: 긴 윗꼬리 + 음봉 마감
        if upper_wick > body * 2.0 && lower_wick < body * 0.3 && current.is_bearish() {
            return Some(RejectionSignal {
                pattern: "shooting_star",
                exit_pct: 0.60,
            });
        }

        // 긴 윗꼬리 (중간 강도 거부)
        if range > 0.0
            && upper_wick / range > self.config.wick_ratio_threshold
            && current.is_bearish()
        {
            return Some(RejectionSignal {
                pattern: "long_upper_wick",
                exit_pct: 0.50,
            });
        }

        None
    }

    /// 불리시 거부 지오메트리 (풋 포지션, 지지 존)
    fn bullish_rejection(&self, current: &PriceBar, previous: &PriceBar) -> Option<RejectionSignal> {
        let body = current.body();
        let range = current.range();
        let upper_wick = current.upper_wick();
        let lower_wick = current.lower_wick();

        // 불리시 엔걸핑
        if previous.is_bearish()
            && current.is_bullish()
            && current.open <= previous.close
            && current.close >= previous.open
        {
            return Some(RejectionSignal {
                pattern: "bullish_engulfing",
                exit_pct: 0.75,
            });
        }

        // 망치: 긴 아랫꼬리 + 양봉 마감
        if lower_wick > body * 2.0 && upper_wick < body * 0.3 && current.is_bullish() {
            return Some(RejectionSignal {
                pattern: "hammer",
                exit_pct: 0.60,
            });
        }

        // 긴 아랫꼬리
        if range > 0.0
            && lower_wick / range > self.config.wick_ratio_threshold
            && current.is_bullish()
        {
            return Some(RejectionSignal {
                pattern: "long_lower_wick",
                exit_pct: 0.50,
            });
        }

        None
    }
}
