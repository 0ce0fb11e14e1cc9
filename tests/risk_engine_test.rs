use trade_setup_engine::config::{EngineConfig, ScalingMethod};
use trade_setup_engine::model::{OptionType, TradeSpec};
use trade_setup_engine::risk::plan::{GoNoGo, PlanContext, RiskEngine};

fn call_trade(premium: f64, dte: u32) -> TradeSpec {
    TradeSpec::new("AAPL", OptionType::Call, 215.0, premium, dte).unwrap()
}

#[test]
fn test_position_sizing_floors_and_caps() {
    let engine = RiskEngine::new(&EngineConfig::default());

    // 비싼 프리미엄: floor 결과가 0이어도 최소 1계약
    let expensive = call_trade(25.0, 7);
    let position = engine.calculate_position(&expensive);
    assert_eq!(position.contracts, 1);

    // 싼 프리미엄: 최대 포지션 수로 캡
    let cheap = call_trade(0.60, 7);
    let position = engine.calculate_position(&cheap);
    assert_eq!(
        position.contracts,
        EngineConfig::default().account.max_open_positions as u32
    );
    assert!(position.reasoning.contains("Capped"));
}

#[test]
fn test_stop_uses_tighter_of_pct_and_dollar_cap() {
    let engine = RiskEngine::new(&EngineConfig::default());

    // 프리미엄 $3.50: 50% 손절 = $1.75, 달러 캡 = 3.50-5.00 < 0
    let trade = call_trade(3.50, 7);
    let stop = engine.calculate_stop(&trade, None, None);
    assert!((stop.stop_loss - 1.75).abs() < 1e-9);

    // 프리미엄 $20: 50% 손절 = $10, 달러 캡 = 20-5 = $15 (더 타이트)
    let big = call_trade(20.0, 7);
    let stop = engine.calculate_stop(&big, None, None);
    assert!((stop.stop_loss - 15.0).abs() < 1e-9);
}

#[test]
fn test_atr_stop_applies_when_tighter() {
    let engine = RiskEngine::new(&EngineConfig::default());
    let trade = call_trade(3.50, 7);

    // ATR 1.0, 델타 0.5: ATR 손절 = 3.50 - 1.5*1.0*0.5 = 2.75 > 1.75
    let stop = engine.calculate_stop(&trade, Some(1.0), Some(0.5));
    assert!((stop.stop_loss - 2.75).abs() < 1e-9);
    assert!(stop.reasoning.contains("ATR"));
}

#[test]
fn test_zero_dte_uses_tighter_stops() {
    let engine = RiskEngine::new(&EngineConfig::default());

    let regular = engine.calculate_stop(&call_trade(3.50, 7), None, None);
    let zero_dte = engine.calculate_stop(&call_trade(3.50, 0), None, None);

    // 당일 만기는 더 타이트한 (높은) 손절가
    assert!(zero_dte.stop_loss > regular.stop_loss);
}

#[test]
fn test_r_based_targets() {
    let engine = RiskEngine::new(&EngineConfig::default());
    let trade = call_trade(3.50, 7);
    let ctx = PlanContext::default();

    let stop = engine.calculate_stop(&trade, None, None);
    let targets = engine.calculate_targets(&trade, stop.stop_loss, 4, &ctx);

    // 리스크 $1.75, 2R 목표 = 3.50 + 3.50 = $7.00
    assert!((targets.target_1 - 7.0).abs() < 1e-9);
    assert_eq!(targets.target_1_r, 2.0);
    // 러너는 절반
    assert_eq!(targets.runner_contracts, 2);
    // 러너 목표 5R = 3.50 + 8.75 = $12.25
    assert!((targets.runner_target - 12.25).abs() < 1e-9);
}

#[test]
fn test_go_no_go_fails_on_low_premium_despite_good_setup() {
    let engine = RiskEngine::new(&EngineConfig::default());
    // 최소 프리미엄($0.50) 미달
    let trade = call_trade(0.30, 7);
    let ctx = PlanContext::default();

    let plan = engine.create_trade_plan(&trade, &ctx);
    assert_eq!(plan.go_no_go, GoNoGo::NoGo);
    assert!(
        plan.reasons.iter().any(|r| r.contains("below minimum")),
        "실패 사유에 프리미엄 규칙이 명시되어야 함: {:?}",
        plan.reasons
    );
}

#[test]
fn test_go_no_go_fails_on_position_count_ceiling() {
    let engine = RiskEngine::new(&EngineConfig::default());
    let trade = call_trade(3.50, 7);
    let ctx = PlanContext {
        open_positions: EngineConfig::default().account.max_open_positions,
        ..PlanContext::default()
    };

    let plan = engine.create_trade_plan(&trade, &ctx);
    assert_eq!(plan.go_no_go, GoNoGo::NoGo);
    assert!(plan.reasons.iter().any(|r| r.contains("max open positions")));
}

#[test]
fn test_go_no_go_lists_all_failing_reasons() {
    let engine = RiskEngine::new(&EngineConfig::default());
    let trade = call_trade(0.30, 7);
    let ctx = PlanContext {
        open_positions: 10,
        ..PlanContext::default()
    };

    let plan = engine.create_trade_plan(&trade, &ctx);
    assert_eq!(plan.go_no_go, GoNoGo::NoGo);
    assert!(plan.reasons.len() >= 2);
}

#[test]
fn test_clean_trade_is_go() {
    let engine = RiskEngine::new(&EngineConfig::default());
    let trade = call_trade(3.50, 7);
    let ctx = PlanContext::default();

    let plan = engine.create_trade_plan(&trade, &ctx);
    assert_eq!(plan.go_no_go, GoNoGo::Go);
    assert!(plan.reasons.is_empty());
    assert!(plan.stop_loss < trade.premium);
    assert!(plan.target_1 > trade.premium);
    assert!(plan.max_loss_dollars > 0.0);
}

#[test]
fn test_technical_scaling_falls_back_without_zones() {
    let mut config = EngineConfig::default();
    config.targets.scaling_method = ScalingMethod::TechnicalWeighted;
    let engine = RiskEngine::new(&config);
    let trade = call_trade(3.50, 7);

    let stop = engine.calculate_stop(&trade, None, None);
    let targets = engine.calculate_targets(&trade, stop.stop_loss, 4, &PlanContext::default());

    // 존이 없으면 R 배수로 폴백하며 사유에 명시
    assert!(targets.reasoning.contains("fell back"));
    assert!((targets.target_1 - 7.0).abs() < 1e-9);
}
