use crate::indicator::ma::MA;
use crate::model::PriceBar;
use std::fmt::Display;
use ta_lib::simple_moving_average;

/// 단순이동평균(SMA) 기술적 지표
#[derive(Clone, Debug)]
pub struct SMA {
    period: usize,
    sma: f64,
}

impl Display for SMA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SMA({}: {:.2})", self.period, self.sma)
    }
}

impl MA for SMA {
    fn get(&self) -> f64 {
        self.sma
    }

    fn period(&self) -> usize {
        self.period
    }
}

/// 단순이동평균(SMA) 계산 빌더
#[derive(Debug)]
pub struct SMABuilder {
    pub period: usize,
}

impl SMABuilder {
    /// 새 SMA 빌더 생성
    ///
    /// # Arguments
    /// * `period` - SMA 계산 기간
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생
    pub fn new(period: usize) -> SMABuilder {
        if period == 0 {
            panic!("SMA 기간은 0보다 커야 합니다");
        }
        SMABuilder { period }
    }

    /// 바 시퀀스에서 SMA 계산
    ///
    /// 데이터가 기간보다 짧으면 None을 반환합니다.
    pub fn build(&self, bars: &[PriceBar]) -> Option<SMA> {
        if bars.len() < self.period {
            return None;
        }

        let values: Vec<f64> = bars.iter().map(|b| b.close).collect();

        // ta-lib으로 SMA 계산
        let (result, _) = simple_moving_average(&values, Some(self.period)).unwrap();
        let sma = *result.last().unwrap_or(&0.0);

        Some(SMA {
            period: self.period,
            sma,
        })
    }
}
