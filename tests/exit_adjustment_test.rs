mod common_test_utils;
use common_test_utils::*;

use trade_setup_engine::analyzer::swing_zone::{Zone, ZoneAnalysis, ZoneKind};
use trade_setup_engine::config::{EngineConfig, ExitPrecedence};
use trade_setup_engine::model::{OptionType, PriceBar, TradeSpec};
use trade_setup_engine::risk::exit::{ExitAction, ExitAdjuster};

fn resistance_zone(price: f64) -> Zone {
    Zone {
        price,
        kind: ZoneKind::Resistance,
        touches: 3,
        volume: 3000.0,
        strength: 80.0,
        last_touch_index: 50,
        range_low: price - 0.2,
        range_high: price + 0.2,
    }
}

fn support_zone(price: f64) -> Zone {
    Zone {
        price,
        kind: ZoneKind::Support,
        touches: 3,
        volume: 3000.0,
        strength: 80.0,
        last_touch_index: 50,
        range_low: price - 0.2,
        range_high: price + 0.2,
    }
}

fn zones_with_next_resistance(watched: f64, next: f64) -> ZoneAnalysis {
    ZoneAnalysis {
        support_zones: vec![support_zone(watched * 0.95)],
        resistance_zones: vec![resistance_zone(watched), resistance_zone(next)],
        swing_high_count: 6,
        swing_low_count: 5,
    }
}

fn call_trade() -> TradeSpec {
    TradeSpec::new("AAPL", OptionType::Call, 100.0, 2.50, 7).unwrap()
}

/// 평탄한 배경 바 (거래량 1000)
fn quiet_bars(count: usize, price: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            bar(
                i as i64,
                price,
                price + 0.3,
                price - 0.3,
                price,
                1000.0,
            )
        })
        .collect()
}

#[test]
fn test_breakout_with_volume_adjusts_plan() {
    // 저항 $100을 +0.6%로 돌파, 거래량 2배
    let mut bars = quiet_bars(30, 99.0);
    bars.push(bar(30, 99.8, 100.7, 99.7, 100.6, 2500.0));
    let series = series(bars);

    let adjuster = ExitAdjuster::new(&EngineConfig::default());
    let zones = zones_with_next_resistance(100.0, 105.0);
    let adjustment = adjuster.check(
        &series,
        &call_trade(),
        2,
        100.6,
        &zones.resistance_zones[0],
        &zones,
    );

    assert_eq!(adjustment.action, ExitAction::AdjustForBreakout);
    // 새 스톱은 깨진 존 가격보다 엄격하게 아래
    let new_stop = adjustment.new_stop.unwrap();
    assert!(new_stop < 100.0);
    // 다음 존으로 재목표 (원래 레벨 청산은 실행하지 않음)
    assert_eq!(adjustment.new_runner_target, Some(105.0));
    assert_eq!(adjustment.exit_contracts, 0);
}

#[test]
fn test_breakout_without_volume_not_confirmed() {
    let mut bars = quiet_bars(30, 99.0);
    // 돌파는 했지만 거래량이 평균 수준
    bars.push(bar(30, 99.8, 100.7, 99.7, 100.6, 1000.0));
    let series = series(bars);

    let adjuster = ExitAdjuster::new(&EngineConfig::default());
    let zones = zones_with_next_resistance(100.0, 105.0);
    let adjustment = adjuster.check(
        &series,
        &call_trade(),
        2,
        100.6,
        &zones.resistance_zones[0],
        &zones,
    );

    assert_eq!(adjustment.action, ExitAction::None);
}

#[test]
fn test_wick_only_breakout_is_false_breakout() {
    let mut bars = quiet_bars(30, 99.0);
    // 꼬리만 돌파하고 종가는 레벨 아래로 복귀
    bars.push(bar(30, 99.5, 100.8, 99.0, 99.6, 2500.0));
    let series = series(bars);

    let adjuster = ExitAdjuster::new(&EngineConfig::default());
    let zones = zones_with_next_resistance(100.0, 105.0);
    let adjustment = adjuster.check(
        &series,
        &call_trade(),
        2,
        100.6,
        &zones.resistance_zones[0],
        &zones,
    );

    // 거짓 돌파는 조정 없음 (거부 지오메트리도 근접 실패)
    assert_ne!(adjustment.action, ExitAction::AdjustForBreakout);
}

#[test]
fn test_bearish_engulfing_near_resistance_exits_majority() {
    let mut bars = quiet_bars(30, 99.0);
    // 직전 양봉, 마지막 바가 저항 0.3% 이내에서 베어리시 엔걸핑
    bars.push(bar(30, 99.2, 99.9, 99.1, 99.8, 1200.0));
    bars.push(bar(31, 99.9, 100.1, 98.9, 99.1, 2000.0));
    let series = series(bars);

    let adjuster = ExitAdjuster::new(&EngineConfig::default());
    let zones = zones_with_next_resistance(100.0, 105.0);
    let adjustment = adjuster.check(
        &series,
        &call_trade(),
        4,
        99.1,
        &zones.resistance_zones[0],
        &zones,
    );

    assert_eq!(adjustment.action, ExitAction::ExitOnRejection);
    // 잔여 4계약의 50% 이상 청산
    assert!(adjustment.exit_contracts >= 2);
    assert_eq!(adjustment.pattern.as_deref(), Some("bearish_engulfing"));
}

#[test]
fn test_hammer_near_support_exits_put() {
    let trade = TradeSpec::new("AAPL", OptionType::Put, 100.0, 2.50, 7).unwrap();
    let mut bars = quiet_bars(30, 101.0);
    // 직전 음봉, 지지 $100 근처의 망치 (긴 아랫꼬리 + 양봉 마감)
    bars.push(bar(30, 101.0, 101.2, 100.6, 100.7, 1200.0));
    bars.push(bar(31, 100.78, 100.85, 99.95, 100.84, 2000.0));
    let series = series(bars);

    let adjuster = ExitAdjuster::new(&EngineConfig::default());
    let zones = ZoneAnalysis {
        support_zones: vec![support_zone(100.0)],
        resistance_zones: vec![resistance_zone(104.0)],
        swing_high_count: 4,
        swing_low_count: 4,
    };
    let adjustment = adjuster.check(
        &series,
        &trade,
        4,
        100.84,
        &zones.support_zones[0],
        &zones,
    );

    assert_eq!(adjustment.action, ExitAction::ExitOnRejection);
    assert_eq!(adjustment.pattern.as_deref(), Some("hammer"));
}

#[test]
fn test_no_condition_returns_none() {
    let bars = quiet_bars(30, 97.0);
    let series = series(bars);

    let adjuster = ExitAdjuster::new(&EngineConfig::default());
    let zones = zones_with_next_resistance(100.0, 105.0);
    let adjustment = adjuster.check(
        &series,
        &call_trade(),
        2,
        97.0,
        &zones.resistance_zones[0],
        &zones,
    );

    assert_eq!(adjustment.action, ExitAction::None);
    assert!(adjustment.new_stop.is_none());
    assert_eq!(adjustment.exit_contracts, 0);
}

#[test]
fn test_rejection_takes_precedence_over_breakout_by_default() {
    // 같은 스냅샷에서 돌파 조건과 거부 지오메트리가 동시에 성립
    let mut bars = quiet_bars(30, 99.0);
    bars.push(bar(30, 99.8, 100.0, 99.6, 99.9, 1200.0));
    // 몸통이 작고 윗꼬리가 긴 음봉, 종가는 레벨 위
    bars.push(bar(31, 100.08, 100.45, 100.0, 100.02, 2500.0));
    let series = series(bars);

    let zones = zones_with_next_resistance(100.0, 105.0);

    let default_adjuster = ExitAdjuster::new(&EngineConfig::default());
    let adjustment = default_adjuster.check(
        &series,
        &call_trade(),
        4,
        100.6,
        &zones.resistance_zones[0],
        &zones,
    );
    assert_eq!(adjustment.action, ExitAction::ExitOnRejection);

    // 정책을 뒤집으면 돌파가 우선
    let mut config = EngineConfig::default();
    config.exits.precedence = ExitPrecedence::BreakoutFirst;
    let breakout_first = ExitAdjuster::new(&config);
    let adjustment = breakout_first.check(
        &series,
        &call_trade(),
        4,
        100.6,
        &zones.resistance_zones[0],
        &zones,
    );
    assert_eq!(adjustment.action, ExitAction::AdjustForBreakout);
}
