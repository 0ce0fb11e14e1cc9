use crate::model::PriceBar;
use std::fmt::Display;

/// RSI 계산 함수
fn calculate_rsi(values: &[f64], period: usize) -> f64 {
    if values.len() < period + 1 {
        return 50.0;
    }

    let mut gains = Vec::with_capacity(values.len());
    let mut losses = Vec::with_capacity(values.len());

    // 가격 변화량 계산
    for i in 1..values.len() {
        let change = values[i] - values[i - 1];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    // 첫 번째 평균 게인/로스 계산
    let mut avg_gain = gains.iter().take(period).sum::<f64>() / period as f64;
    let mut avg_loss = losses.iter().take(period).sum::<f64>() / period as f64;

    // 나머지 기간에 대해 지수이동평균으로 업데이트
    for i in period..gains.len() {
        let smoothing_factor = 1.0 / period as f64;
        avg_gain = (avg_gain * (1.0 - smoothing_factor)) + (gains[i] * smoothing_factor);
        avg_loss = (avg_loss * (1.0 - smoothing_factor)) + (losses[i] * smoothing_factor);
    }

    if avg_loss < 0.000001 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// 상대강도지수(RSI) 기술적 지표
///
/// 가격 변동의 상대적 강도를 측정하여 과매수/과매도 상태를 판단합니다.
#[derive(Clone, Debug)]
pub struct RSI {
    period: usize,
    /// RSI 값 (0-100)
    pub value: f64,
}

impl Display for RSI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RSI({}: {:.2})", self.period, self.value)
    }
}

impl RSI {
    /// RSI가 과매수 상태인지 확인 (일반적으로 70 이상)
    pub fn is_overbought(&self, threshold: Option<f64>) -> bool {
        self.value >= threshold.unwrap_or(70.0)
    }

    /// RSI가 과매도 상태인지 확인 (일반적으로 30 이하)
    pub fn is_oversold(&self, threshold: Option<f64>) -> bool {
        self.value <= threshold.unwrap_or(30.0)
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// RSI 계산 빌더
#[derive(Debug)]
pub struct RSIBuilder {
    period: usize,
}

impl RSIBuilder {
    /// 새 RSI 빌더 생성
    ///
    /// # Arguments
    /// * `period` - RSI 계산 기간 (일반적으로 14)
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생
    pub fn new(period: usize) -> RSIBuilder {
        if period == 0 {
            panic!("RSI 기간은 0보다 커야 합니다");
        }
        RSIBuilder { period }
    }

    /// 바 시퀀스에서 RSI 계산
    ///
    /// 데이터가 부족하면 중립값 50을 반환합니다.
    pub fn build(&self, bars: &[PriceBar]) -> RSI {
        let values: Vec<f64> = bars.iter().map(|b| b.close).collect();

        RSI {
            period: self.period,
            value: calculate_rsi(&values, self.period),
        }
    }
}
