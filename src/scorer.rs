use crate::analyzer::pattern::{Pattern, contextual_strength};
use crate::analyzer::swing_zone::ZoneAnalysis;
use crate::analyzer::trend::TrendState;
use crate::config::EngineConfig;
use crate::model::{Direction, Flag, FlagSeverity, TradeSpec};
use serde::Serialize;
use std::fmt::Display;

/// 점수 구성 내역
///
/// 기여 항목을 모두 이름으로 노출합니다. 추세 정렬 보너스와 역추세
/// 감점은 상호 배타적이며 동시에 0이 아닐 수 없습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub rule_bonus: f64,
    pub green_bonus: f64,
    pub red_penalty: f64,
    pub pattern_bonus: f64,
    pub trend_bonus: f64,
    pub counter_trend_penalty: f64,
    /// [0, 100] 클램프된 최종 점수
    pub final_score: f64,
}

impl Display for ScoreBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Score({:.0} = {:.0} +rule {:.0} +green {:.0} -red {:.0} +pattern {:.0} +trend {:.0} -counter {:.0})",
            self.final_score,
            self.base,
            self.rule_bonus,
            self.green_bonus,
            self.red_penalty,
            self.pattern_bonus,
            self.trend_bonus,
            self.counter_trend_penalty
        )
    }
}

/// 셋업 품질 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SetupQuality {
    Excellent,
    Good,
    Average,
    Poor,
}

impl SetupQuality {
    /// 최종 점수에서 품질 등급 산출
    pub fn from_score(score: f64) -> SetupQuality {
        if score >= 80.0 {
            SetupQuality::Excellent
        } else if score >= 65.0 {
            SetupQuality::Good
        } else if score >= 45.0 {
            SetupQuality::Average
        } else {
            SetupQuality::Poor
        }
    }
}

impl Display for SetupQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupQuality::Excellent => write!(f, "excellent"),
            SetupQuality::Good => write!(f, "good"),
            SetupQuality::Average => write!(f, "average"),
            SetupQuality::Poor => write!(f, "poor"),
        }
    }
}

/// 셋업 점수 결과
#[derive(Debug, Clone, Serialize)]
pub struct SetupScore {
    pub breakdown: ScoreBreakdown,
    pub quality: SetupQuality,
    /// 심각도 내림차순 정렬된 레드 플래그
    pub red_flags: Vec<Flag>,
    pub green_flags: Vec<Flag>,
}

/// 셋업 스코어러
///
/// 상태 없는 순수 함수입니다. 상류 컴포넌트가 생성한 플래그를 중복
/// 제거 없이 병합하고, 자체 구조 규칙 검사를 더해 점수를 구성합니다.
#[derive(Debug)]
pub struct SetupScorer {
    base_score: f64,
    rule_bonus: f64,
    green_flag_bonus: f64,
    green_bonus_cap: f64,
    red_high_penalty: f64,
    red_medium_penalty: f64,
    red_low_penalty: f64,
    pattern_bonus_max: f64,
    trend_bonus: f64,
    counter_trend_penalty: f64,
    max_otm_distance_pct: f64,
    min_premium: f64,
}

impl SetupScorer {
    /// 새 셋업 스코어러 생성
    pub fn new(config: &EngineConfig) -> SetupScorer {
        SetupScorer {
            base_score: config.scoring.base_score,
            rule_bonus: config.scoring.rule_bonus,
            green_flag_bonus: config.scoring.green_flag_bonus,
            green_bonus_cap: config.scoring.green_bonus_cap,
            red_high_penalty: config.scoring.red_high_penalty,
            red_medium_penalty: config.scoring.red_medium_penalty,
            red_low_penalty: config.scoring.red_low_penalty,
            pattern_bonus_max: config.scoring.pattern_bonus_max,
            trend_bonus: config.scoring.trend_bonus,
            counter_trend_penalty: config.scoring.counter_trend_penalty,
            max_otm_distance_pct: config.scoring.max_otm_distance_pct,
            min_premium: config.sizing.min_premium,
        }
    }

    /// 셋업 점수 계산
    ///
    /// # Arguments
    /// * `trade` - 트레이드 명세
    /// * `current_price` - 현재 기초자산 가격
    /// * `trend` - 추세 상태
    /// * `zones` - 존 분석 (패턴 컨텍스트 보정용)
    /// * `patterns` - 강도 내림차순 패턴 목록
    /// * `red_flags` / `green_flags` - 상류 컴포넌트가 생성한 플래그
    ///
    /// # Returns
    /// * `SetupScore` - 구성 내역과 병합·정렬된 플래그
    pub fn score(
        &self,
        trade: &TradeSpec,
        current_price: f64,
        trend: &TrendState,
        zones: &ZoneAnalysis,
        patterns: &[Pattern],
        mut red_flags: Vec<Flag>,
        mut green_flags: Vec<Flag>,
    ) -> SetupScore {
        // 구조 규칙 검사 (최소 프리미엄, 행사가 거리)
        let rules_pass = self.check_structural_rules(trade, current_price, &mut red_flags);
        let rule_bonus = if rules_pass { self.rule_bonus } else { 0.0 };

        // 추세 정렬 보너스와 역추세 감점은 정확히 하나만 적용
        let trade_direction = trade.direction();
        let trend_direction = trend.direction.as_direction();
        let (trend_bonus, counter_trend_penalty) = if trend_direction == Direction::Neutral {
            (0.0, 0.0)
        } else if trend_direction == trade_direction {
            (self.trend_bonus, 0.0)
        } else {
            (0.0, self.counter_trend_penalty)
        };

        // 방향 일치 최상위 패턴 보너스 (컨텍스트 보정 강도 스케일)
        let pattern_bonus = patterns
            .iter()
            .find(|p| p.direction == trade_direction)
            .map(|p| {
                let at_matching_zone = match p.direction {
                    Direction::Bullish => zones
                        .nearest_support()
                        .map(|z| z.distance_pct(p.price) <= 1.0)
                        .unwrap_or(false),
                    Direction::Bearish => zones
                        .nearest_resistance()
                        .map(|z| z.distance_pct(p.price) <= 1.0)
                        .unwrap_or(false),
                    Direction::Neutral => false,
                };
                let strength =
                    contextual_strength(p, at_matching_zone, trend.direction.as_direction());
                self.pattern_bonus_max * strength / 100.0
            })
            .unwrap_or(0.0);

        let green_bonus =
            (green_flags.len() as f64 * self.green_flag_bonus).min(self.green_bonus_cap);

        let red_penalty: f64 = red_flags
            .iter()
            .map(|f| match f.severity {
                FlagSeverity::High => self.red_high_penalty,
                FlagSeverity::Medium => self.red_medium_penalty,
                FlagSeverity::Low => self.red_low_penalty,
            })
            .sum();

        let raw = self.base_score + rule_bonus + green_bonus - red_penalty + pattern_bonus
            + trend_bonus
            - counter_trend_penalty;
        let final_score = raw.clamp(0.0, 100.0);

        // 심각도 순 정렬 (높은 심각도 먼저)
        red_flags.sort_by_key(|f| f.severity);
        green_flags.sort_by_key(|f| f.severity);

        let breakdown = ScoreBreakdown {
            base: self.base_score,
            rule_bonus,
            green_bonus,
            red_penalty,
            pattern_bonus,
            trend_bonus,
            counter_trend_penalty,
            final_score,
        };

        log::info!("셋업 점수: {} - {}", trade, breakdown);

        SetupScore {
            breakdown,
            quality: SetupQuality::from_score(final_score),
            red_flags,
            green_flags,
        }
    }

    /// 구조 규칙 검사
    ///
    /// 실패한 규칙은 레드 플래그로 추가되고 규칙 보너스가 박탈됩니다.
    fn check_structural_rules(
        &self,
        trade: &TradeSpec,
        current_price: f64,
        red_flags: &mut Vec<Flag>,
    ) -> bool {
        let mut pass = true;

        if trade.premium < self.min_premium {
            red_flags.push(Flag::medium(
                "premium",
                format!(
                    "Premium ${:.2} below minimum ${:.2} - poor risk/reward",
                    trade.premium, self.min_premium
                ),
            ));
            pass = false;
        }

        if current_price > 0.0 {
            let otm_pct = trade.otm_distance_pct(current_price);
            if otm_pct > self.max_otm_distance_pct {
                red_flags.push(Flag::medium(
                    "strike_distance",
                    format!("Strike is {:.1}% OTM - low delta", otm_pct),
                ));
                pass = false;
            }
        }

        pass
    }
}
