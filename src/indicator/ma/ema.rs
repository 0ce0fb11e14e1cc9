use crate::indicator::ma::MA;
use crate::model::PriceBar;
use std::fmt::Display;
use ta_lib::exponential_moving_average;

/// 지수이동평균(EMA) 기술적 지표
///
/// 최근 데이터에 더 높은 가중치를 부여하는 이동평균입니다.
#[derive(Clone, Debug)]
pub struct EMA {
    period: usize,
    ema: f64,
}

impl Display for EMA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}: {:.2})", self.period, self.ema)
    }
}

impl MA for EMA {
    fn get(&self) -> f64 {
        self.ema
    }

    fn period(&self) -> usize {
        self.period
    }
}

/// 지수이동평균(EMA) 계산 빌더
#[derive(Debug)]
pub struct EMABuilder {
    pub period: usize,
}

impl EMABuilder {
    /// 새 EMA 빌더 생성
    ///
    /// # Arguments
    /// * `period` - EMA 계산 기간
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생
    pub fn new(period: usize) -> EMABuilder {
        if period == 0 {
            panic!("EMA 기간은 0보다 커야 합니다");
        }
        EMABuilder { period }
    }

    /// 바 시퀀스에서 EMA 계산
    ///
    /// 데이터가 기간보다 짧으면 None을 반환합니다.
    pub fn build(&self, bars: &[PriceBar]) -> Option<EMA> {
        if bars.len() < self.period {
            return None;
        }

        let values: Vec<f64> = bars.iter().map(|b| b.close).collect();

        // ta-lib으로 EMA 계산
        let (result, _) = exponential_moving_average(&values, Some(self.period)).unwrap();
        let ema = *result.last().unwrap_or(&0.0);

        Some(EMA {
            period: self.period,
            ema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn bar(ts: i64, close: f64) -> PriceBar {
        PriceBar::new(
            DateTime::<Utc>::from_timestamp(ts, 0).unwrap(),
            close,
            close,
            close,
            close,
            1000.0,
        )
    }

    #[test]
    fn test_ema_tracks_rising_series() {
        let rising: Vec<PriceBar> = (0..30).map(|i| bar(i * 60, 100.0 + i as f64)).collect();
        let short = EMABuilder::new(5).build(&rising).unwrap();
        let long = EMABuilder::new(20).build(&rising).unwrap();
        // 상승 시계열에서 짧은 EMA가 긴 EMA 위에 위치
        assert!(short.get() > long.get());
    }

    #[test]
    fn test_ema_insufficient_data() {
        let bars: Vec<PriceBar> = (0..3).map(|i| bar(i * 60, 100.0)).collect();
        assert!(EMABuilder::new(10).build(&bars).is_none());
    }
}
