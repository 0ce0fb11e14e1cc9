use trade_setup_engine::analyzer::swing_zone::{Zone, ZoneAnalysis, ZoneKind};
use trade_setup_engine::config::EngineConfig;
use trade_setup_engine::model::OptionType;
use trade_setup_engine::risk::trailing_stop::{TrailingStopKind, TrailingStopManager};

fn zones_with_support(price: f64) -> ZoneAnalysis {
    ZoneAnalysis {
        support_zones: vec![Zone {
            price,
            kind: ZoneKind::Support,
            touches: 3,
            volume: 3000.0,
            strength: 75.0,
            last_touch_index: 50,
            range_low: price - 0.2,
            range_high: price + 0.2,
        }],
        resistance_zones: vec![],
        swing_high_count: 4,
        swing_low_count: 4,
    }
}

#[test]
fn test_no_candidates_keeps_initial_stop() {
    let manager = TrailingStopManager::new(&EngineConfig::default());
    // ATR/존/델타 없음, 수익도 브레이크이븐 트리거 미만
    let result = manager.calculate(
        2.50,
        3.00,
        1.25,
        None,
        0.4,
        OptionType::Call,
        None,
        None,
        None,
    );

    assert_eq!(result.kind, TrailingStopKind::Initial);
    assert_eq!(result.stop, 1.25);
    assert!(!result.active);
}

#[test]
fn test_breakeven_stop_at_r_trigger() {
    let manager = TrailingStopManager::new(&EngineConfig::default());
    // 2R 도달: 브레이크이븐 스톱 발동
    let result = manager.calculate(
        2.50,
        5.00,
        1.25,
        None,
        2.4,
        OptionType::Call,
        None,
        None,
        None,
    );

    assert_eq!(result.kind, TrailingStopKind::Breakeven);
    assert_eq!(result.stop, 2.50);
    assert!(result.active);
}

#[test]
fn test_technical_stop_preferred_over_atr() {
    let manager = TrailingStopManager::new(&EngineConfig::default());
    let zones = zones_with_support(98.0);

    // CALL $2.50 진입, 현재 $4.00, 기초자산 $100, 지지 $98, 델타 0.5
    let result = manager.calculate(
        2.50,
        4.00,
        1.25,
        Some(0.6),
        2.4,
        OptionType::Call,
        Some(&zones),
        Some(100.0),
        Some(0.5),
    );

    // 기술적 후보(우선순위 1)가 ATR 후보(우선순위 2)보다 우선
    assert_eq!(result.kind, TrailingStopKind::Technical);
    assert!(result.active);
    // 기술적 스톱 = 4.00 - 0.5*(100-98) = 3.00
    assert!((result.stop - 3.00).abs() < 1e-9);
    assert!(result.candidates.len() >= 2);
}

#[test]
fn test_stop_never_loosens_below_initial() {
    let manager = TrailingStopManager::new(&EngineConfig::default());

    // ATR 스톱 후보가 초기 스톱보다 느슨하면 제외되어 초기 스톱 유지
    let result = manager.calculate(
        2.50,
        2.60,
        2.00,
        Some(2.0),
        0.1,
        OptionType::Call,
        None,
        None,
        Some(0.5),
    );

    assert!(result.stop >= 2.00);
}

#[test]
fn test_should_exit_on_stop_hit() {
    let manager = TrailingStopManager::new(&EngineConfig::default());
    assert!(manager.should_exit(1.90, 2.00));
    assert!(!manager.should_exit(2.10, 2.00));
}
