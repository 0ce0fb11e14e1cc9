use crate::indicator::ma::{ema_alpha, ema_step};
use crate::model::PriceBar;
use std::fmt::Display;

/// MACD(Moving Average Convergence Divergence) 기술적 지표
///
/// 추세 추종 모멘텀 지표로, 빠른 EMA와 느린 EMA의 차이(MACD 라인)와
/// 그에 대한 시그널 라인(MACD의 EMA)을 제공합니다.
#[derive(Clone, Debug)]
pub struct MACD {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    /// MACD 라인 (빠른 EMA - 느린 EMA)
    pub macd_line: f64,
    /// 시그널 라인 (MACD의 EMA)
    pub signal_line: f64,
    /// 히스토그램 (MACD - 시그널)
    pub histogram: f64,
}

impl Display for MACD {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD({},{},{}: {:.2}, {:.2}, {:.2})",
            self.fast_period,
            self.slow_period,
            self.signal_period,
            self.macd_line,
            self.signal_line,
            self.histogram
        )
    }
}

impl MACD {
    /// MACD가 시그널 라인 위에 있는지 (상승 모멘텀)
    pub fn is_bullish(&self) -> bool {
        self.macd_line > self.signal_line
    }

    /// MACD가 시그널 라인 아래에 있는지 (하락 모멘텀)
    pub fn is_bearish(&self) -> bool {
        self.macd_line < self.signal_line
    }
}

/// MACD 계산 함수 (전체 데이터에서 계산)
fn calculate_macd(
    values: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> (f64, f64, f64) {
    if values.len() < slow_period {
        return (0.0, 0.0, 0.0);
    }

    let fast_alpha = ema_alpha(fast_period);
    let slow_alpha = ema_alpha(slow_period);
    let signal_alpha = ema_alpha(signal_period);

    // 초기 SMA 시드
    let fast_sma = values[..fast_period].iter().sum::<f64>() / fast_period as f64;
    let slow_sma = values[..slow_period].iter().sum::<f64>() / slow_period as f64;

    // 전체 데이터를 순회하며 EMA 및 MACD 라인 계산
    let mut fast_ema = fast_sma;
    let mut slow_ema = slow_sma;
    let mut macd_lines = Vec::with_capacity(values.len());

    for &price in values.iter() {
        fast_ema = ema_step(price, fast_ema, fast_alpha);
        slow_ema = ema_step(price, slow_ema, slow_alpha);
        macd_lines.push(fast_ema - slow_ema);
    }

    // 시그널 라인 계산 (MACD 라인의 EMA, SMA로 시드)
    let mut signal_line = 0.0;
    if macd_lines.len() >= signal_period {
        let signal_sma =
            macd_lines[..signal_period].iter().sum::<f64>() / signal_period as f64;
        signal_line = signal_sma;

        for &macd in macd_lines[signal_period..].iter() {
            signal_line = ema_step(macd, signal_line, signal_alpha);
        }
    }

    let macd_line = *macd_lines.last().unwrap_or(&0.0);
    let histogram = macd_line - signal_line;

    (macd_line, signal_line, histogram)
}

/// MACD 계산 빌더
#[derive(Debug)]
pub struct MACDBuilder {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl MACDBuilder {
    /// 새 MACD 빌더 생성
    ///
    /// # Arguments
    /// * `fast_period` - 빠른 EMA 기간 (일반적으로 12)
    /// * `slow_period` - 느린 EMA 기간 (일반적으로 26)
    /// * `signal_period` - 시그널 라인 기간 (일반적으로 9)
    ///
    /// # Panics
    /// * 유효하지 않은 기간 조합이면 패닉 발생
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> MACDBuilder {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            panic!("MACD 기간은 0보다 커야 합니다");
        }
        if fast_period >= slow_period {
            panic!("빠른 기간은 느린 기간보다 작아야 합니다");
        }

        MACDBuilder {
            fast_period,
            slow_period,
            signal_period,
        }
    }

    /// 바 시퀀스에서 MACD 계산
    ///
    /// 데이터가 느린 기간보다 짧으면 None을 반환합니다.
    pub fn build(&self, bars: &[PriceBar]) -> Option<MACD> {
        if bars.len() < self.slow_period {
            return None;
        }

        let values: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let (macd_line, signal_line, histogram) = calculate_macd(
            &values,
            self.fast_period,
            self.slow_period,
            self.signal_period,
        );

        Some(MACD {
            fast_period: self.fast_period,
            slow_period: self.slow_period,
            signal_period: self.signal_period,
            macd_line,
            signal_line,
            histogram,
        })
    }
}
