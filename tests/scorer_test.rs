use trade_setup_engine::analyzer::pattern::{Pattern, PatternKind};
use trade_setup_engine::analyzer::swing_zone::ZoneAnalysis;
use trade_setup_engine::analyzer::trend::{TrendDirection, TrendState, TrendStructure};
use trade_setup_engine::config::EngineConfig;
use trade_setup_engine::model::{Direction, Flag, OptionType, TradeSpec};
use trade_setup_engine::scorer::SetupScorer;

fn trend(direction: TrendDirection, strength: f64) -> TrendState {
    TrendState {
        direction,
        strength,
        confidence: 80.0,
        adx: Some(30.0),
        structure: TrendStructure::default(),
    }
}

fn bullish_pattern(strength: f64) -> Pattern {
    Pattern {
        kind: PatternKind::BullishEngulfing,
        direction: Direction::Bullish,
        bars_consumed: 2,
        strength,
        price: 100.0,
        index: 59,
        volume_confirmed: true,
    }
}

fn call_trade() -> TradeSpec {
    TradeSpec::new("AAPL", OptionType::Call, 102.0, 2.50, 7).unwrap()
}

#[test]
fn test_final_score_clamped_to_lower_bound() {
    let scorer = SetupScorer::new(&EngineConfig::default());
    let red: Vec<Flag> = (0..20)
        .map(|i| Flag::high("test", format!("red {}", i)))
        .collect();

    let score = scorer.score(
        &call_trade(),
        100.0,
        &trend(TrendDirection::Downtrend, 80.0),
        &ZoneAnalysis::default(),
        &[],
        red,
        vec![],
    );

    assert_eq!(score.breakdown.final_score, 0.0);
}

#[test]
fn test_final_score_clamped_to_upper_bound() {
    let scorer = SetupScorer::new(&EngineConfig::default());
    let green: Vec<Flag> = (0..30)
        .map(|i| Flag::low("test", format!("green {}", i)))
        .collect();

    let score = scorer.score(
        &call_trade(),
        100.0,
        &trend(TrendDirection::Uptrend, 80.0),
        &ZoneAnalysis::default(),
        &[bullish_pattern(100.0)],
        vec![],
        green,
    );

    assert!(score.breakdown.final_score <= 100.0);
    // 그린 보너스는 상한으로 캡
    assert!(score.breakdown.green_bonus <= EngineConfig::default().scoring.green_bonus_cap);
}

#[test]
fn test_trend_bonus_and_counter_penalty_mutually_exclusive() {
    let scorer = SetupScorer::new(&EngineConfig::default());
    let trade = call_trade();

    for direction in [
        TrendDirection::Uptrend,
        TrendDirection::Downtrend,
        TrendDirection::Sideways,
    ] {
        let score = scorer.score(
            &trade,
            100.0,
            &trend(direction, 80.0),
            &ZoneAnalysis::default(),
            &[],
            vec![],
            vec![],
        );
        let b = score.breakdown;
        assert!(
            b.trend_bonus == 0.0 || b.counter_trend_penalty == 0.0,
            "추세 보너스와 역추세 감점은 동시에 적용될 수 없음"
        );
        match direction {
            TrendDirection::Uptrend => {
                assert!(b.trend_bonus > 0.0);
                assert_eq!(b.counter_trend_penalty, 0.0);
            }
            TrendDirection::Downtrend => {
                assert_eq!(b.trend_bonus, 0.0);
                assert!(b.counter_trend_penalty > 0.0);
            }
            TrendDirection::Sideways => {
                assert_eq!(b.trend_bonus, 0.0);
                assert_eq!(b.counter_trend_penalty, 0.0);
            }
        }
    }
}

#[test]
fn test_counter_trend_dominates_single_pattern_bonus() {
    // 콜 + 강한 하락 추세 + 강도 90+ 불리시 반전 패턴:
    // 같은 셋업을 하락 추세 없이 평가한 경우보다 점수가 낮아야 함
    let scorer = SetupScorer::new(&EngineConfig::default());
    let trade = call_trade();
    let pattern = [bullish_pattern(92.0)];

    // 하락 추세: 역추세 플래그 + 감점 동반
    let counter_trend_flags = vec![Flag::high(
        "trend",
        "Counter-trend trade (downtrend, taking CALLs)",
    )];
    let with_downtrend = scorer.score(
        &trade,
        100.0,
        &trend(TrendDirection::Downtrend, 80.0),
        &ZoneAnalysis::default(),
        &pattern,
        counter_trend_flags,
        vec![],
    );

    let without_downtrend = scorer.score(
        &trade,
        100.0,
        &trend(TrendDirection::Sideways, 40.0),
        &ZoneAnalysis::default(),
        &pattern,
        vec![],
        vec![],
    );

    assert!(
        with_downtrend.breakdown.final_score < without_downtrend.breakdown.final_score,
        "역추세 감점이 단일 패턴 보너스를 압도해야 함: {} >= {}",
        with_downtrend.breakdown.final_score,
        without_downtrend.breakdown.final_score
    );
    assert!(with_downtrend.breakdown.pattern_bonus > 0.0);
    assert!(with_downtrend.breakdown.counter_trend_penalty > 0.0);
}

#[test]
fn test_structural_rule_failure_removes_bonus_and_adds_flag() {
    let scorer = SetupScorer::new(&EngineConfig::default());
    // 최소 프리미엄 미달
    let trade = TradeSpec::new("AAPL", OptionType::Call, 102.0, 0.30, 7).unwrap();

    let score = scorer.score(
        &trade,
        100.0,
        &trend(TrendDirection::Sideways, 40.0),
        &ZoneAnalysis::default(),
        &[],
        vec![],
        vec![],
    );

    assert_eq!(score.breakdown.rule_bonus, 0.0);
    assert!(score.red_flags.iter().any(|f| f.category == "premium"));
}

#[test]
fn test_far_otm_strike_fails_rule_check() {
    let scorer = SetupScorer::new(&EngineConfig::default());
    // 15% OTM 콜
    let trade = TradeSpec::new("AAPL", OptionType::Call, 115.0, 2.50, 7).unwrap();

    let score = scorer.score(
        &trade,
        100.0,
        &trend(TrendDirection::Sideways, 40.0),
        &ZoneAnalysis::default(),
        &[],
        vec![],
        vec![],
    );

    assert_eq!(score.breakdown.rule_bonus, 0.0);
    assert!(
        score
            .red_flags
            .iter()
            .any(|f| f.category == "strike_distance")
    );
}

#[test]
fn test_red_flags_sorted_by_severity() {
    let scorer = SetupScorer::new(&EngineConfig::default());
    let red = vec![
        Flag::low("a", "low"),
        Flag::high("b", "high"),
        Flag::medium("c", "medium"),
    ];

    let score = scorer.score(
        &call_trade(),
        100.0,
        &trend(TrendDirection::Sideways, 40.0),
        &ZoneAnalysis::default(),
        &[],
        red,
        vec![],
    );

    let severities: Vec<_> = score.red_flags.iter().map(|f| f.severity).collect();
    let mut sorted = severities.clone();
    sorted.sort();
    assert_eq!(severities, sorted);
    assert_eq!(score.red_flags[0].category, "b");
}

#[test]
fn test_pattern_bonus_only_for_matching_direction() {
    let scorer = SetupScorer::new(&EngineConfig::default());
    let trade = call_trade();

    let bearish = [Pattern {
        kind: PatternKind::BearishEngulfing,
        direction: Direction::Bearish,
        bars_consumed: 2,
        strength: 95.0,
        price: 100.0,
        index: 59,
        volume_confirmed: true,
    }];

    let score = scorer.score(
        &trade,
        100.0,
        &trend(TrendDirection::Sideways, 40.0),
        &ZoneAnalysis::default(),
        &bearish,
        vec![],
        vec![],
    );

    // 반대 방향 패턴은 보너스를 받지 못함
    assert_eq!(score.breakdown.pattern_bonus, 0.0);
}
