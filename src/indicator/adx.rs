use crate::model::PriceBar;
use std::fmt::Display;
use ta_lib::average_directional_movement_index;

/// 평균방향지수(ADX) 기술적 지표
///
/// 추세의 방향이 아니라 강도를 측정합니다.
/// 25 이상이면 추세장, 20 미만이면 약세/횡보장으로 해석합니다.
#[derive(Clone, Debug)]
pub struct ADX {
    pub period: usize,
    pub value: f64,
}

impl Display for ADX {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ADX({}: {:.2})", self.period, self.value)
    }
}

impl ADX {
    /// 강한 추세 여부
    pub fn is_trending(&self, threshold: f64) -> bool {
        self.value >= threshold
    }

    /// 약세/횡보 여부
    pub fn is_weak(&self, threshold: f64) -> bool {
        self.value < threshold
    }
}

/// ADX 계산 빌더
#[derive(Debug)]
pub struct ADXBuilder {
    period: usize,
}

impl ADXBuilder {
    /// 새 ADX 빌더 생성
    ///
    /// # Arguments
    /// * `period` - ADX 계산 기간 (일반적으로 14)
    ///
    /// # Panics
    /// * 기간이 0이면 패닉 발생
    pub fn new(period: usize) -> ADXBuilder {
        if period == 0 {
            panic!("ADX 기간은 0보다 커야 합니다");
        }
        ADXBuilder { period }
    }

    /// 바 시퀀스에서 ADX 계산
    ///
    /// ADX 수렴에는 기간의 두 배 이상의 바가 필요하며,
    /// 부족하면 None을 반환합니다 (기본값으로 대체하지 않음).
    ///
    /// # Arguments
    /// * `bars` - 시간 오름차순 바 목록
    ///
    /// # Returns
    /// * `Option<ADX>` - 계산된 ADX 또는 데이터 부족 시 None
    pub fn build(&self, bars: &[PriceBar]) -> Option<ADX> {
        if bars.len() < self.period * 2 {
            return None;
        }

        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

        // ta-lib으로 ADX 계산
        let (result, _) =
            average_directional_movement_index(&high, &low, &close, Some(self.period)).unwrap();

        result.last().map(|&value| ADX {
            period: self.period,
            value,
        })
    }
}
