use crate::model::{EngineError, EngineResult, PriceBar};

/// 검증된 가격 시계열
///
/// 타임스탬프가 엄격하게 증가하는 바 시퀀스를 보관합니다.
/// 순서가 어긋난 입력은 재정렬하지 않고 생성 시점에 거부합니다.
/// 생성 이후에는 불변이며, 여러 스레드에서 동시에 읽어도 안전합니다.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// 새 가격 시계열 생성
    ///
    /// # Arguments
    /// * `bars` - 시간 오름차순 바 목록
    ///
    /// # Returns
    /// * `EngineResult<PriceSeries>` - 검증된 시계열 또는 순서 오류
    pub fn new(bars: Vec<PriceBar>) -> EngineResult<PriceSeries> {
        for window in bars.windows(2) {
            if window[1].timestamp <= window[0].timestamp {
                return Err(EngineError::NonMonotonicSeries(format!(
                    "{} 이후에 {} 가 왔습니다",
                    window[0].timestamp, window[1].timestamp
                )));
            }
        }

        log::trace!("가격 시계열 생성: {}개 바", bars.len());
        Ok(PriceSeries { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 전체 바 슬라이스
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    /// 가장 최근 바
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// 최근 n개 바 슬라이스 (데이터가 부족하면 전체)
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    /// 종가 벡터
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// 고가 벡터
    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// 저가 벡터
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// 거래량 벡터
    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// 최근 n개 바의 평균 거래량. 바가 없으면 None.
    pub fn average_volume(&self, n: usize) -> Option<f64> {
        let tail = self.tail(n);
        if tail.is_empty() {
            return None;
        }
        Some(tail.iter().map(|b| b.volume).sum::<f64>() / tail.len() as f64)
    }

    /// 최근 n개 바 동안의 종가 변화율 (%)
    ///
    /// 시작 바가 없으면 None을 반환합니다.
    pub fn pct_change(&self, n: usize) -> Option<f64> {
        if self.bars.len() < n + 1 || n == 0 {
            return None;
        }
        let last = self.bars.last()?.close;
        let base = self.bars[self.bars.len() - 1 - n].close;
        if base == 0.0 {
            return None;
        }
        Some((last - base) / base * 100.0)
    }

    /// 종가 로그 수익률 벡터
    pub fn log_returns(&self) -> Vec<f64> {
        self.bars
            .windows(2)
            .filter(|w| w[0].close > 0.0 && w[1].close > 0.0)
            .map(|w| (w[1].close / w[0].close).ln())
            .collect()
    }
}
