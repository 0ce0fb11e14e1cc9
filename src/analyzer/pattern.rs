use crate::config::PatternConfig;
use crate::model::{Direction, Flag, PriceBar, TradeSpec};
use crate::series::PriceSeries;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt::Display;

/// 캔들 패턴 종류 (닫힌 카탈로그)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatternKind {
    BullishEngulfing,
    BearishEngulfing,
    /// 저점 부근의 불리시 핀바
    Hammer,
    /// 위치 조건 없는 불리시 핀바
    BullishPinBar,
    /// 고점 부근의 베어리시 핀바
    ShootingStar,
    /// 위치 조건 없는 베어리시 핀바
    BearishPinBar,
    Doji,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl PatternKind {
    /// 패턴 시그널 방향
    pub fn direction(&self) -> Direction {
        match self {
            PatternKind::BullishEngulfing
            | PatternKind::Hammer
            | PatternKind::BullishPinBar
            | PatternKind::MorningStar
            | PatternKind::ThreeWhiteSoldiers => Direction::Bullish,
            PatternKind::BearishEngulfing
            | PatternKind::ShootingStar
            | PatternKind::BearishPinBar
            | PatternKind::EveningStar
            | PatternKind::ThreeBlackCrows => Direction::Bearish,
            PatternKind::Doji => Direction::Neutral,
        }
    }

    /// 반전 패턴 여부
    pub fn is_reversal(&self) -> bool {
        !matches!(
            self,
            PatternKind::ThreeWhiteSoldiers | PatternKind::ThreeBlackCrows
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::BullishEngulfing => "bullish_engulfing",
            PatternKind::BearishEngulfing => "bearish_engulfing",
            PatternKind::Hammer => "hammer",
            PatternKind::BullishPinBar => "bullish_pinbar",
            PatternKind::ShootingStar => "shooting_star",
            PatternKind::BearishPinBar => "bearish_pinbar",
            PatternKind::Doji => "doji",
            PatternKind::MorningStar => "morning_star",
            PatternKind::EveningStar => "evening_star",
            PatternKind::ThreeWhiteSoldiers => "three_white_soldiers",
            PatternKind::ThreeBlackCrows => "three_black_crows",
        }
    }
}

impl Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 탐지된 캔들 패턴
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub direction: Direction,
    /// 패턴을 구성하는 바 수
    pub bars_consumed: usize,
    /// 패턴 강도 (0-100)
    pub strength: f64,
    /// 마지막 구성 바 종가
    pub price: f64,
    /// 마지막 구성 바 인덱스
    pub index: usize,
    pub volume_confirmed: bool,
}

impl Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pattern({} @{} strength: {:.0}, vol: {})",
            self.kind, self.index, self.strength, self.volume_confirmed
        )
    }
}

/// 패턴 탐지기 종류
///
/// 각 탐지기는 `detect(bars, idx) -> Option<Pattern>` 형태의 순수 술어로,
/// 정렬된 카탈로그 목록을 통해 순회됩니다. 컴파일 타임에 닫혀 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Engulfing,
    PinBar,
    Doji,
    Star,
    ThreeLine,
}

impl DetectorKind {
    /// 지정 인덱스에서 패턴 탐지 시도
    pub fn detect(&self, bars: &[PriceBar], idx: usize) -> Option<Pattern> {
        match self {
            DetectorKind::Engulfing => detect_engulfing(bars, idx),
            DetectorKind::PinBar => detect_pin_bar(bars, idx),
            DetectorKind::Doji => detect_doji(bars, idx),
            DetectorKind::Star => detect_star(bars, idx),
            DetectorKind::ThreeLine => detect_three_line(bars, idx),
        }
    }
}

/// 정렬된 패턴 탐지기 카탈로그
static PATTERN_CATALOG: Lazy<Vec<DetectorKind>> = Lazy::new(|| {
    vec![
        DetectorKind::Engulfing,
        DetectorKind::PinBar,
        DetectorKind::Doji,
        DetectorKind::Star,
        DetectorKind::ThreeLine,
    ]
});

/// 엔걸핑 패턴 탐지
///
/// 몸통이 직전 봉의 몸통을 덮으면서 10% 이상 커야 합니다.
fn detect_engulfing(bars: &[PriceBar], idx: usize) -> Option<Pattern> {
    if idx < 1 || idx >= bars.len() {
        return None;
    }

    let curr = &bars[idx];
    let prev = &bars[idx - 1];

    if curr.body() <= prev.body() * 1.1 {
        return None;
    }

    // 불리시 엔걸핑: 음봉 뒤의 더 큰 양봉
    if prev.is_bearish()
        && curr.is_bullish()
        && curr.open <= prev.close
        && curr.close >= prev.open
    {
        return Some(Pattern {
            kind: PatternKind::BullishEngulfing,
            direction: Direction::Bullish,
            bars_consumed: 2,
            strength: engulfing_strength(curr, prev),
            price: curr.close,
            index: idx,
            volume_confirmed: false,
        });
    }

    // 베어리시 엔걸핑: 양봉 뒤의 더 큰 음봉
    if prev.is_bullish()
        && curr.is_bearish()
        && curr.open >= prev.close
        && curr.close <= prev.open
    {
        return Some(Pattern {
            kind: PatternKind::BearishEngulfing,
            direction: Direction::Bearish,
            bars_consumed: 2,
            strength: engulfing_strength(curr, prev),
            price: curr.close,
            index: idx,
            volume_confirmed: false,
        });
    }

    None
}

/// 엔걸핑 강도 (0-100)
fn engulfing_strength(curr: &PriceBar, prev: &PriceBar) -> f64 {
    let ratio = if prev.body() > 0.0 {
        curr.body() / prev.body()
    } else {
        1.0
    };
    // 몸통 비율에서 최대 60점
    let mut strength = (ratio * 40.0).min(60.0);

    let range = curr.range();
    if range > 0.0 {
        // 범위 대비 큰 몸통 보너스 (최대 20점)
        strength += curr.body() / range * 20.0;

        // 극단 근처 마감 보너스 (최대 20점)
        let close_position = if curr.is_bullish() {
            (curr.close - curr.low) / range
        } else {
            (curr.high - curr.close) / range
        };
        strength += close_position * 20.0;
    }

    strength.min(100.0)
}

/// 핀바 (망치/슈팅스타) 탐지
///
/// 몸통 30% 미만에 한쪽 꼬리가 60% 이상이어야 합니다. 최근 평균가
/// 대비 위치에 따라 망치/슈팅스타와 일반 핀바를 구분합니다.
fn detect_pin_bar(bars: &[PriceBar], idx: usize) -> Option<Pattern> {
    if idx < 1 || idx >= bars.len() {
        return None;
    }

    let candle = &bars[idx];
    let range = candle.range();
    if range == 0.0 {
        return None;
    }

    let body_pct = candle.body() / range;
    let upper_pct = candle.upper_wick() / range;
    let lower_pct = candle.lower_wick() / range;

    if body_pct > 0.3 {
        return None;
    }

    // 최근 10바 평균 종가 (위치 판정용)
    let recent_avg = if idx >= 10 {
        Some(bars[idx - 10..idx].iter().map(|b| b.close).sum::<f64>() / 10.0)
    } else {
        None
    };

    // 불리시 핀바: 긴 아랫꼬리
    if lower_pct > 0.6 && upper_pct < 0.2 {
        let at_bottom = recent_avg
            .map(|avg| candle.low <= avg * 0.98)
            .unwrap_or(false);
        let kind = if at_bottom {
            PatternKind::Hammer
        } else {
            PatternKind::BullishPinBar
        };
        return Some(Pattern {
            kind,
            direction: Direction::Bullish,
            bars_consumed: 1,
            strength: pin_bar_strength(body_pct, lower_pct, upper_pct),
            price: candle.close,
            index: idx,
            volume_confirmed: false,
        });
    }

    // 베어리시 핀바: 긴 윗꼬리
    if upper_pct > 0.6 && lower_pct < 0.2 {
        let at_top = recent_avg
            .map(|avg| candle.high >= avg * 1.02)
            .unwrap_or(false);
        let kind = if at_top {
            PatternKind::ShootingStar
        } else {
            PatternKind::BearishPinBar
        };
        return Some(Pattern {
            kind,
            direction: Direction::Bearish,
            bars_consumed: 1,
            strength: pin_bar_strength(body_pct, upper_pct, lower_pct),
            price: candle.close,
            index: idx,
            volume_confirmed: false,
        });
    }

    None
}

/// 핀바 강도 (0-100)
fn pin_bar_strength(body_pct: f64, long_wick_pct: f64, short_wick_pct: f64) -> f64 {
    // 작은 몸통 최대 30점, 긴 거부 꼬리 최대 50점, 짧은 반대 꼬리 최대 20점
    let body_score = (1.0 - body_pct) * 30.0;
    let wick_score = long_wick_pct * 50.0;
    let opposite_score = (1.0 - short_wick_pct) * 20.0;
    (body_score + wick_score + opposite_score).min(100.0)
}

/// 도지 탐지 (우유부단 캔들)
fn detect_doji(bars: &[PriceBar], idx: usize) -> Option<Pattern> {
    if idx >= bars.len() {
        return None;
    }

    let candle = &bars[idx];
    let range = candle.range();
    if range == 0.0 {
        return None;
    }

    let body_pct = candle.body() / range;
    if body_pct >= 0.1 {
        return None;
    }

    Some(Pattern {
        kind: PatternKind::Doji,
        direction: Direction::Neutral,
        bars_consumed: 1,
        // 몸통이 작을수록 강한 도지
        strength: (1.0 - body_pct) * 100.0,
        price: candle.close,
        index: idx,
        volume_confirmed: false,
    })
}

/// 모닝스타/이브닝스타 탐지 (3봉 반전)
fn detect_star(bars: &[PriceBar], idx: usize) -> Option<Pattern> {
    if idx < 2 || idx >= bars.len() {
        return None;
    }

    let first = &bars[idx - 2];
    let star = &bars[idx - 1];
    let third = &bars[idx];

    let star_range = star.range();
    if star_range == 0.0 {
        return None;
    }

    // 가운데 봉(스타)은 작은 몸통이어야 함
    if star.body() / star_range > 0.3 {
        return None;
    }
    if first.body() <= star.body() * 2.0 || third.body() <= star.body() * 2.0 {
        return None;
    }

    let first_mid = (first.open + first.close) / 2.0;

    // 모닝스타: 음봉 - 스타 - 첫 봉 몸통 중간 위로 마감하는 양봉
    if first.is_bearish() && third.is_bullish() && third.close > first_mid {
        return Some(Pattern {
            kind: PatternKind::MorningStar,
            direction: Direction::Bullish,
            bars_consumed: 3,
            strength: star_strength(first, star, third),
            price: third.close,
            index: idx,
            volume_confirmed: false,
        });
    }

    // 이브닝스타: 양봉 - 스타 - 첫 봉 몸통 중간 아래로 마감하는 음봉
    if first.is_bullish() && third.is_bearish() && third.close < first_mid {
        return Some(Pattern {
            kind: PatternKind::EveningStar,
            direction: Direction::Bearish,
            bars_consumed: 3,
            strength: star_strength(first, star, third),
            price: third.close,
            index: idx,
            volume_confirmed: false,
        });
    }

    None
}

/// 스타 패턴 강도 (0-100)
fn star_strength(first: &PriceBar, star: &PriceBar, third: &PriceBar) -> f64 {
    let star_body = star.body().max(f64::EPSILON);
    let first_body = first.body().max(f64::EPSILON);

    // 큰 바깥 봉 최대 50점
    let size_score = ((first.body() + third.body()) / star_body).min(10.0) * 5.0;
    // 작은 스타 최대 30점
    let star_score = (1.0 - (star.body() / first_body).min(1.0)) * 30.0;
    // 첫 봉 몸통 침투 최대 20점
    let penetration = ((third.close - first.close).abs() / first_body).min(1.0);
    let penetration_score = penetration * 20.0;

    (size_score + star_score + penetration_score).min(100.0)
}

/// 쓰리 화이트 솔저 / 쓰리 블랙 크로우 탐지 (3봉 연속)
fn detect_three_line(bars: &[PriceBar], idx: usize) -> Option<Pattern> {
    if idx < 2 || idx >= bars.len() {
        return None;
    }

    let c1 = &bars[idx - 2];
    let c2 = &bars[idx - 1];
    let c3 = &bars[idx];

    // 쓰리 화이트 솔저: 연속 양봉, 각 봉이 직전 몸통 내에서 시작해 더 높게 마감
    if c1.is_bullish()
        && c2.is_bullish()
        && c3.is_bullish()
        && c2.open > c1.open
        && c2.open < c1.close
        && c2.close > c1.close
        && c3.open > c2.open
        && c3.open < c2.close
        && c3.close > c2.close
    {
        return Some(Pattern {
            kind: PatternKind::ThreeWhiteSoldiers,
            direction: Direction::Bullish,
            bars_consumed: 3,
            strength: 75.0,
            price: c3.close,
            index: idx,
            volume_confirmed: false,
        });
    }

    // 쓰리 블랙 크로우: 연속 음봉, 각 봉이 직전 몸통 내에서 시작해 더 낮게 마감
    if c1.is_bearish()
        && c2.is_bearish()
        && c3.is_bearish()
        && c2.open < c1.open
        && c2.open > c1.close
        && c2.close < c1.close
        && c3.open < c2.open
        && c3.open > c2.close
        && c3.close < c2.close
    {
        return Some(Pattern {
            kind: PatternKind::ThreeBlackCrows,
            direction: Direction::Bearish,
            bars_consumed: 3,
            strength: 75.0,
            price: c3.close,
            index: idx,
            volume_confirmed: false,
        });
    }

    None
}

/// 컨텍스트 보정 점수 (0-100)
///
/// 거래량 확인, 방향이 맞는 존 근접, 추세 정렬에 보너스를 부여합니다.
/// 스코어러가 사용하며 탐지기 자체는 관여하지 않습니다.
pub fn contextual_strength(
    pattern: &Pattern,
    at_matching_zone: bool,
    trend_direction: Direction,
) -> f64 {
    let mut score = pattern.strength;

    if pattern.volume_confirmed {
        score += 10.0;
    }
    if at_matching_zone {
        score += 15.0;
    }
    if pattern.direction == trend_direction {
        score += 10.0;
    }

    score.min(100.0)
}

/// 캔들 패턴 분석기
///
/// 후행 윈도우를 스캔해 카탈로그의 모든 패턴을 강도 내림차순으로
/// 반환합니다. 겹치는 바에서 여러 패턴이 동시에 성립할 수 있습니다.
#[derive(Debug)]
pub struct PatternAnalyzer {
    lookback: usize,
    require_volume_confirmation: bool,
    volume_confirm_multiplier: f64,
}

impl PatternAnalyzer {
    /// 새 패턴 분석기 생성
    pub fn new(config: &PatternConfig) -> PatternAnalyzer {
        PatternAnalyzer {
            lookback: config.lookback,
            require_volume_confirmation: config.require_volume_confirmation,
            volume_confirm_multiplier: config.volume_confirm_multiplier,
        }
    }

    /// 패턴 탐지 수행
    ///
    /// # Arguments
    /// * `series` - 가격 시계열
    ///
    /// # Returns
    /// * `Vec<Pattern>` - 강도 내림차순 정렬된 모든 매치
    pub fn analyze(&self, series: &PriceSeries) -> Vec<Pattern> {
        let bars = series.bars();
        if bars.len() < 3 {
            return Vec::new();
        }

        let start_idx = bars.len().saturating_sub(self.lookback);
        let mut detected = Vec::new();

        for idx in start_idx..bars.len() {
            for detector in PATTERN_CATALOG.iter() {
                if let Some(mut pattern) = detector.detect(bars, idx) {
                    pattern.volume_confirmed = self.check_volume_confirmation(bars, idx);
                    detected.push(pattern);
                }
            }
        }

        detected.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap());

        log::debug!("패턴 탐지 완료: {}건", detected.len());
        detected
    }

    /// 거래량 확인 검사
    ///
    /// 확인을 요구하지 않으면 항상 통과로 처리합니다.
    fn check_volume_confirmation(&self, bars: &[PriceBar], idx: usize) -> bool {
        if !self.require_volume_confirmation {
            return true;
        }

        let window_start = idx.saturating_sub(19);
        let window = &bars[window_start..=idx];
        let avg = window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64;
        if avg <= 0.0 {
            return false;
        }

        bars[idx].volume > avg * self.volume_confirm_multiplier
    }

    /// 특정 방향의 최상위 패턴
    pub fn top_for_direction<'a>(
        &self,
        patterns: &'a [Pattern],
        direction: Direction,
    ) -> Option<&'a Pattern> {
        patterns.iter().find(|p| p.direction == direction)
    }

    /// 패턴 컴포넌트의 레드/그린 플래그 생성
    pub fn flags(&self, patterns: &[Pattern], trade: &TradeSpec) -> (Vec<Flag>, Vec<Flag>) {
        let mut red = Vec::new();
        let mut green = Vec::new();
        let trade_direction = trade.direction();

        if let Some(aligned) = self.top_for_direction(patterns, trade_direction) {
            if aligned.strength >= 60.0 {
                green.push(Flag::low(
                    "pattern",
                    format!(
                        "{} ({:.0}/100) supports {} entry",
                        aligned.kind, aligned.strength, trade.option_type
                    ),
                ));
            }
        }

        // 반대 방향 패턴은 방향 충돌 레드 플래그
        let opposing = patterns
            .iter()
            .find(|p| p.direction.opposes(trade_direction));
        if let Some(conflict) = opposing {
            if conflict.strength >= 60.0 {
                red.push(Flag::medium(
                    "pattern",
                    format!(
                        "{} ({:.0}/100) conflicts with {} entry",
                        conflict.kind, conflict.strength, trade.option_type
                    ),
                ));
            }
        }

        (red, green)
    }
}
