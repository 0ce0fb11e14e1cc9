use crate::model::PriceBar;
use std::fmt::Display;

/// 거래량가중평균가격(VWAP) 기술적 지표
///
/// 주어진 기간 동안 거래량을 가중치로 한 평균 가격입니다.
/// 기관 평균 단가 역할을 하며 동적 지지/저항으로 해석합니다.
#[derive(Clone, Debug)]
pub struct VWAP {
    /// 계산 기간 (0이면 전체 데이터)
    pub period: usize,
    /// VWAP 값
    pub value: f64,
}

impl Display for VWAP {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VWAP({}): {:.2}", self.period, self.value)
    }
}

impl VWAP {
    /// 가격 대비 VWAP의 상대적 거리(%)
    pub fn deviation_pct(&self, price: f64) -> f64 {
        if self.value == 0.0 {
            return 0.0; // 0으로 나누기 방지
        }
        ((price - self.value) / self.value) * 100.0
    }

    pub fn is_price_above(&self, price: f64) -> bool {
        price > self.value
    }

    pub fn is_price_below(&self, price: f64) -> bool {
        price < self.value
    }
}

/// VWAP 계산 빌더
#[derive(Debug)]
pub struct VWAPBuilder {
    /// 계산 기간 (0이면 전체 데이터)
    period: usize,
}

impl VWAPBuilder {
    /// 새 VWAP 빌더 생성
    ///
    /// # Arguments
    /// * `period` - 계산 기간 (0이면 전체 데이터 사용)
    pub fn new(period: usize) -> VWAPBuilder {
        VWAPBuilder { period }
    }

    /// 바 시퀀스에서 VWAP 계산
    ///
    /// VWAP = Σ(대표가격 × 거래량) / Σ(거래량).
    /// 거래량 합이 0이거나 바가 없으면 None.
    pub fn build(&self, bars: &[PriceBar]) -> Option<VWAP> {
        let window = if self.period > 0 && bars.len() > self.period {
            &bars[bars.len() - self.period..]
        } else {
            bars
        };

        if window.is_empty() {
            return None;
        }

        let mut cum_pv = 0.0;
        let mut cum_volume = 0.0;
        for bar in window {
            cum_pv += bar.typical_price() * bar.volume;
            cum_volume += bar.volume;
        }

        if cum_volume <= 0.0 {
            return None;
        }

        Some(VWAP {
            period: self.period,
            value: cum_pv / cum_volume,
        })
    }
}
