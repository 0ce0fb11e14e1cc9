use chrono::{DateTime, Utc};
use trade_setup_engine::model::PriceBar;
use trade_setup_engine::series::PriceSeries;

/// 일 단위 간격의 테스트 바 생성
pub fn bar(day: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> PriceBar {
    PriceBar::new(
        DateTime::<Utc>::from_timestamp(day * 86_400, 0).unwrap(),
        open,
        high,
        low,
        close,
        volume,
    )
}

/// 바 목록을 검증된 시계열로 변환
pub fn series(bars: Vec<PriceBar>) -> PriceSeries {
    PriceSeries::new(bars).unwrap()
}

/// 단조 상승 시계열 (내부 극값 없음)
pub fn create_uptrend_bars(count: usize, base_price: f64, step: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let price = base_price + i as f64 * step;
            bar(
                i as i64,
                price - step / 2.0,
                price + step,
                price - step,
                price + step / 2.0,
                1000.0,
            )
        })
        .collect()
}

/// 단조 하락 시계열
pub fn create_downtrend_bars(count: usize, base_price: f64, step: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let price = base_price - i as f64 * step;
            bar(
                i as i64,
                price + step / 2.0,
                price + step,
                price - step,
                price - step / 2.0,
                1000.0,
            )
        })
        .collect()
}

/// 고정 범위 왕복 시계열 (10바 주기: 5바 상승, 5바 하락)
///
/// 고점은 `base + amplitude`, 저점은 `base - amplitude`에 반복적으로
/// 닿아 지지/저항 존 테스트에 적합합니다.
pub fn create_range_bars(count: usize, base_price: f64, amplitude: f64) -> Vec<PriceBar> {
    let step = amplitude * 2.0 / 5.0;
    (0..count)
        .map(|i| {
            let phase = i % 10;
            // 삼각파: 0..5 상승, 5..10 하락
            let offset = if phase <= 5 {
                -amplitude + step * phase as f64
            } else {
                amplitude - step * (phase - 5) as f64
            };
            let close = base_price + offset;
            bar(
                i as i64,
                close - step / 4.0,
                close + step / 4.0,
                close - step / 4.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// 지그재그 상승 시계열 (8바 주기: 5바 상승, 3바 되돌림)
///
/// 고점과 저점이 주기마다 높아져 상승 구조 테스트에 적합합니다.
pub fn create_zigzag_uptrend_bars(count: usize, base_price: f64, step: f64) -> Vec<PriceBar> {
    let mut price = base_price;
    let mut bars = Vec::with_capacity(count);
    for i in 0..count {
        let phase = i % 8;
        if phase < 5 {
            price += step;
        } else {
            price -= step * 0.4;
        }
        bars.push(bar(
            i as i64,
            price - step / 4.0,
            price + step / 4.0,
            price - step / 4.0,
            price,
            1000.0,
        ));
    }
    bars
}

/// 지그재그 하락 시계열 (8바 주기: 5바 하락, 3바 반등)
pub fn create_zigzag_downtrend_bars(count: usize, base_price: f64, step: f64) -> Vec<PriceBar> {
    let mut price = base_price;
    let mut bars = Vec::with_capacity(count);
    for i in 0..count {
        let phase = i % 8;
        if phase < 5 {
            price -= step;
        } else {
            price += step * 0.4;
        }
        bars.push(bar(
            i as i64,
            price + step / 4.0,
            price + step / 4.0,
            price - step / 4.0,
            price,
            1000.0,
        ));
    }
    bars
}
