use crate::model::PriceBar;
use std::fmt::Display;

/// 평균진폭(ATR) 기술적 지표
///
/// 바의 고가/저가/이전 종가에서 파생되는 변동성 측정값입니다.
#[derive(Debug, Clone, Copy)]
pub struct ATR {
    /// ATR 계산 기간
    pub period: usize,
    /// 계산된 ATR 값
    pub value: f64,
}

impl Display for ATR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ATR({}: {:.4})", self.period, self.value)
    }
}

impl ATR {
    /// 현재가 대비 ATR 비율 (%)
    pub fn percent_of(&self, price: f64) -> f64 {
        if price == 0.0 {
            return 0.0;
        }
        self.value / price * 100.0
    }
}

/// True Range = max(고가-저가, |고가-이전종가|, |저가-이전종가|)
fn true_range(current: &PriceBar, previous: &PriceBar) -> f64 {
    (current.high - current.low)
        .max((current.high - previous.close).abs())
        .max((current.low - previous.close).abs())
}

/// ATR 계산 빌더
#[derive(Debug)]
pub struct ATRBuilder {
    period: usize,
}

impl ATRBuilder {
    /// 새 ATR 빌더 생성
    ///
    /// # Arguments
    /// * `period` - ATR 계산 기간 (일반적으로 14)
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생
    pub fn new(period: usize) -> ATRBuilder {
        if period == 0 {
            panic!("ATR 기간은 0보다 커야 합니다");
        }
        ATRBuilder { period }
    }

    /// 바 시퀀스에서 ATR 계산
    ///
    /// Wilder 평활화 방식을 사용합니다. 바가 2개 미만이면 None.
    ///
    /// # Arguments
    /// * `bars` - 시간 오름차순 바 목록
    ///
    /// # Returns
    /// * `Option<ATR>` - 계산된 ATR 또는 데이터 부족 시 None
    pub fn build(&self, bars: &[PriceBar]) -> Option<ATR> {
        if bars.len() < 2 {
            return None;
        }

        let tr_values: Vec<f64> = bars
            .windows(2)
            .map(|w| true_range(&w[1], &w[0]))
            .collect();

        let value = if tr_values.len() >= self.period {
            // 첫 period개는 단순 평균, 이후 Wilder 평활화로 업데이트
            let mut atr =
                tr_values.iter().take(self.period).sum::<f64>() / self.period as f64;
            for tr in &tr_values[self.period..] {
                atr = (atr * (self.period as f64 - 1.0) + tr) / self.period as f64;
            }
            atr
        } else {
            // 데이터가 부족하면 가용 구간 평균
            tr_values.iter().sum::<f64>() / tr_values.len() as f64
        };

        Some(ATR {
            period: self.period,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn bar(ts: i64, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar::new(
            DateTime::<Utc>::from_timestamp(ts, 0).unwrap(),
            close,
            high,
            low,
            close,
            1000.0,
        )
    }

    #[test]
    fn test_atr_insufficient_data() {
        let builder = ATRBuilder::new(14);
        assert!(builder.build(&[]).is_none());
        assert!(builder.build(&[bar(0, 101.0, 99.0, 100.0)]).is_none());
    }

    #[test]
    fn test_atr_constant_range() {
        // 매 바 범위가 2.0이고 갭이 없으면 ATR은 2.0
        let bars: Vec<PriceBar> = (0..30)
            .map(|i| bar(i * 60, 101.0, 99.0, 100.0))
            .collect();
        let atr = ATRBuilder::new(14).build(&bars).unwrap();
        assert!((atr.value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_atr_positive_on_moving_series() {
        let bars: Vec<PriceBar> = (0..40)
            .map(|i| {
                let base = 100.0 + i as f64;
                bar(i * 60, base + 1.5, base - 1.5, base)
            })
            .collect();
        let atr = ATRBuilder::new(14).build(&bars).unwrap();
        assert!(atr.value > 0.0);
    }

    #[test]
    #[should_panic(expected = "ATR 기간은 0보다 커야 합니다")]
    fn test_atr_zero_period() {
        ATRBuilder::new(0);
    }
}
