mod common_test_utils;
use common_test_utils::*;

use trade_setup_engine::analyzer::pattern::{PatternAnalyzer, PatternKind};
use trade_setup_engine::config::PatternConfig;
use trade_setup_engine::model::{Direction, OptionType, TradeSpec};

fn no_volume_config() -> PatternConfig {
    PatternConfig {
        require_volume_confirmation: false,
        ..PatternConfig::default()
    }
}

#[test]
fn test_bullish_engulfing_detected() {
    let mut bars: Vec<_> = (0..10)
        .map(|i| bar(i, 100.0, 101.0, 99.0, 100.0, 1000.0))
        .collect();
    // 음봉 뒤에 그 몸통을 덮는 큰 양봉
    bars.push(bar(10, 100.0, 100.5, 98.8, 99.0, 1000.0));
    bars.push(bar(11, 98.9, 101.6, 98.7, 101.5, 2000.0));
    let series = series(bars);

    let analyzer = PatternAnalyzer::new(&no_volume_config());
    let patterns = analyzer.analyze(&series);

    let engulfing = patterns
        .iter()
        .find(|p| p.kind == PatternKind::BullishEngulfing)
        .expect("불리시 엔걸핑이 탐지되어야 함");
    assert_eq!(engulfing.direction, Direction::Bullish);
    assert_eq!(engulfing.bars_consumed, 2);
    assert!(engulfing.strength > 50.0);
}

#[test]
fn test_bearish_engulfing_detected() {
    let mut bars: Vec<_> = (0..10)
        .map(|i| bar(i, 100.0, 101.0, 99.0, 100.0, 1000.0))
        .collect();
    bars.push(bar(10, 100.0, 101.2, 99.5, 101.0, 1000.0));
    bars.push(bar(11, 101.1, 101.3, 98.4, 98.5, 2000.0));
    let series = series(bars);

    let analyzer = PatternAnalyzer::new(&no_volume_config());
    let patterns = analyzer.analyze(&series);

    assert!(
        patterns
            .iter()
            .any(|p| p.kind == PatternKind::BearishEngulfing)
    );
}

#[test]
fn test_hammer_detected_at_bottom() {
    // 하락 구간 끝의 긴 아랫꼬리 작은 몸통
    let mut bars: Vec<_> = (0..15)
        .map(|i| {
            let price = 110.0 - i as f64;
            bar(i, price + 0.3, price + 0.5, price - 0.5, price, 1000.0)
        })
        .collect();
    // 망치: 몸통 0.2, 아랫꼬리 3.0, 윗꼬리 0.1
    bars.push(bar(15, 95.2, 95.5, 92.1, 95.4, 1500.0));
    let series = series(bars);

    let analyzer = PatternAnalyzer::new(&no_volume_config());
    let patterns = analyzer.analyze(&series);

    let hammer = patterns
        .iter()
        .find(|p| p.kind == PatternKind::Hammer || p.kind == PatternKind::BullishPinBar)
        .expect("망치/불리시 핀바가 탐지되어야 함");
    assert_eq!(hammer.direction, Direction::Bullish);
    assert!(hammer.strength >= 60.0);
}

#[test]
fn test_doji_detected() {
    let mut bars: Vec<_> = (0..10)
        .map(|i| bar(i, 100.0, 101.0, 99.0, 100.5, 1000.0))
        .collect();
    // 도지: 시가와 종가가 거의 같음
    bars.push(bar(10, 100.0, 101.5, 98.5, 100.02, 1000.0));
    let series = series(bars);

    let analyzer = PatternAnalyzer::new(&no_volume_config());
    let patterns = analyzer.analyze(&series);

    let doji = patterns
        .iter()
        .find(|p| p.kind == PatternKind::Doji)
        .expect("도지가 탐지되어야 함");
    assert_eq!(doji.direction, Direction::Neutral);
}

#[test]
fn test_three_white_soldiers_detected() {
    let mut bars: Vec<_> = (0..10)
        .map(|i| bar(i, 100.0, 101.0, 99.0, 100.0, 1000.0))
        .collect();
    bars.push(bar(10, 100.0, 102.2, 99.8, 102.0, 1000.0));
    bars.push(bar(11, 101.0, 104.2, 100.8, 104.0, 1000.0));
    bars.push(bar(12, 103.0, 106.2, 102.8, 106.0, 1000.0));
    let series = series(bars);

    let analyzer = PatternAnalyzer::new(&no_volume_config());
    let patterns = analyzer.analyze(&series);

    let soldiers = patterns
        .iter()
        .find(|p| p.kind == PatternKind::ThreeWhiteSoldiers)
        .expect("쓰리 화이트 솔저가 탐지되어야 함");
    assert_eq!(soldiers.bars_consumed, 3);
    assert_eq!(soldiers.strength, 75.0);
}

#[test]
fn test_patterns_sorted_by_strength() {
    let mut bars: Vec<_> = (0..10)
        .map(|i| bar(i, 100.0, 101.0, 99.0, 100.0, 1000.0))
        .collect();
    bars.push(bar(10, 100.0, 100.5, 98.8, 99.0, 1000.0));
    bars.push(bar(11, 98.9, 101.6, 98.7, 101.5, 2000.0));
    bars.push(bar(12, 101.5, 103.0, 100.0, 101.55, 1000.0));
    let series = series(bars);

    let analyzer = PatternAnalyzer::new(&no_volume_config());
    let patterns = analyzer.analyze(&series);

    for pair in patterns.windows(2) {
        assert!(pair[0].strength >= pair[1].strength);
    }
}

#[test]
fn test_volume_confirmation_marks_pattern() {
    let mut bars: Vec<_> = (0..20)
        .map(|i| bar(i, 100.0, 101.0, 99.0, 100.0, 1000.0))
        .collect();
    bars.push(bar(20, 100.0, 100.5, 98.8, 99.0, 1000.0));
    // 평균 대비 3배 거래량의 엔걸핑
    bars.push(bar(21, 98.9, 101.6, 98.7, 101.5, 3000.0));
    let series = series(bars);

    let analyzer = PatternAnalyzer::new(&PatternConfig::default());
    let patterns = analyzer.analyze(&series);

    let engulfing = patterns
        .iter()
        .find(|p| p.kind == PatternKind::BullishEngulfing)
        .unwrap();
    assert!(engulfing.volume_confirmed);
}

#[test]
fn test_conflicting_pattern_flagged() {
    let mut bars: Vec<_> = (0..10)
        .map(|i| bar(i, 100.0, 101.0, 99.0, 100.0, 1000.0))
        .collect();
    // 강한 베어리시 엔걸핑
    bars.push(bar(10, 100.0, 101.2, 99.5, 101.0, 1000.0));
    bars.push(bar(11, 101.1, 101.3, 98.4, 98.5, 2000.0));
    let series = series(bars);

    let analyzer = PatternAnalyzer::new(&no_volume_config());
    let patterns = analyzer.analyze(&series);

    let trade = TradeSpec::new("AAPL", OptionType::Call, 105.0, 2.50, 7).unwrap();
    let (red, _green) = analyzer.flags(&patterns, &trade);

    assert!(
        red.iter().any(|f| f.category == "pattern"),
        "콜 진입과 충돌하는 베어리시 패턴은 레드 플래그여야 함"
    );
}
