use crate::config::OptionsConfig;
use crate::model::OptionType;
use crate::options::black_scholes::{call_price, put_price};
use crate::series::PriceSeries;
use serde::Serialize;
use std::fmt::Display;

/// IV 랭크 계산 결과
///
/// 샘플이 최소 개수에 미달하면 `rank_pct`는 None이며, 호출자는
/// "N/A"로 표시해야 합니다. 수치로 대체하지 않는 것이 계약입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IVRankResult {
    pub current_iv: f64,
    pub min_iv: f64,
    pub max_iv: f64,
    /// 히스토리 범위 내 현재 IV의 백분위 (0-100)
    pub rank_pct: Option<f64>,
    pub sample_count: usize,
}

impl Display for IVRankResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rank_pct {
            Some(rank) => write!(
                f,
                "IVRank({:.0}% of [{:.1}%, {:.1}%], n={})",
                rank,
                self.min_iv * 100.0,
                self.max_iv * 100.0,
                self.sample_count
            ),
            None => write!(f, "IVRank(N/A, n={})", self.sample_count),
        }
    }
}

/// 히스토리 IV 재계산용 일일 샘플
///
/// 수집기 협력자가 미리 가져온 (옵션 종가, 기초자산 종가, 잔여 일수)
/// 쌍입니다. 엔진은 네트워크를 호출하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoricalIvSample {
    pub option_close: f64,
    pub underlying_close: f64,
    pub days_to_expiry: u32,
}

/// 블랙-숄즈 IV 역산
///
/// 시장가와 이론가가 일치하는 변동성을 이분법으로 찾습니다.
/// 내재가치 이하의 가격이나 수렴 실패는 None으로 보고되며, 해당
/// 샘플은 기본값으로 대체되지 않고 버려집니다.
///
/// # Arguments
/// * `spot` - 기초자산 가격
/// * `strike` - 행사가
/// * `time_years` - 잔여 기간 (연)
/// * `risk_free_rate` - 무위험 이자율
/// * `option_type` - 옵션 유형
/// * `market_price` - 시장 가격
/// * `sigma_low` / `sigma_high` - 탐색 구간
///
/// # Returns
/// * `Option<f64>` - 연환산 IV (소수) 또는 역산 불가 시 None
pub fn solve_implied_vol(
    spot: f64,
    strike: f64,
    time_years: f64,
    risk_free_rate: f64,
    option_type: OptionType,
    market_price: f64,
    sigma_low: f64,
    sigma_high: f64,
) -> Option<f64> {
    if spot <= 0.0 || strike <= 0.0 || market_price <= 0.0 || time_years <= 0.0 {
        return None;
    }

    let intrinsic = match option_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    };
    // 내재가치 이하 가격은 무차익 위반이므로 역산 불가
    if market_price <= intrinsic {
        return None;
    }

    let price_at = |sigma: f64| -> f64 {
        match option_type {
            OptionType::Call => call_price(spot, strike, time_years, risk_free_rate, sigma),
            OptionType::Put => put_price(spot, strike, time_years, risk_free_rate, sigma),
        }
    };

    let mut lo = sigma_low;
    let mut hi = sigma_high;
    let f_lo = price_at(lo) - market_price;
    let f_hi = price_at(hi) - market_price;

    // 탐색 구간이 해를 감싸지 않으면 수렴 불가
    if f_lo * f_hi > 0.0 {
        return None;
    }

    for _ in 0..100 {
        let mid = (lo + hi) / 2.0;
        let f_mid = price_at(mid) - market_price;

        if f_mid.abs() < 1e-6 || (hi - lo) / 2.0 < 1e-6 {
            return Some(mid);
        }

        if f_lo.signum() == f_mid.signum() {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Some((lo + hi) / 2.0)
}

/// 일일 샘플에서 히스토리 IV 시계열 재계산
///
/// 역산에 실패한 날(비유동/무차익 위반)은 버려집니다.
pub fn recompute_historical_ivs(
    samples: &[HistoricalIvSample],
    strike: f64,
    option_type: OptionType,
    config: &OptionsConfig,
) -> Vec<f64> {
    let capped: &[HistoricalIvSample] = if samples.len() > config.max_lookback_days {
        &samples[samples.len() - config.max_lookback_days..]
    } else {
        samples
    };

    let mut ivs = Vec::with_capacity(capped.len());
    let mut dropped = 0usize;

    for sample in capped {
        if sample.days_to_expiry == 0 || sample.option_close <= 0.0 {
            dropped += 1;
            continue;
        }
        let time_years = sample.days_to_expiry as f64 / 365.0;
        match solve_implied_vol(
            sample.underlying_close,
            strike,
            time_years,
            config.risk_free_rate,
            option_type,
            sample.option_close,
            config.sigma_low,
            config.sigma_high,
        ) {
            Some(iv) if iv > 0.0 => ivs.push(iv),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("IV 역산 샘플 {}개 탈락 ({}개 유지)", dropped, ivs.len());
    }

    ivs
}

/// IV 랭크 계산
///
/// rank = (현재 IV - 최소 IV) / (최대 IV - 최소 IV) × 100, [0,100] 클램프.
/// 샘플 수가 `min_historical_samples` 미만이면 rank는 None입니다.
/// 히스토리가 평평하면 (최대 ≤ 최소) 50을 보고합니다.
pub fn iv_rank(current_iv: f64, historical_ivs: &[f64], min_samples: usize) -> IVRankResult {
    let sample_count = historical_ivs.len();

    if sample_count < min_samples {
        log::debug!(
            "IV 랭크 샘플 부족: {} < {} - N/A 보고",
            sample_count,
            min_samples
        );
        return IVRankResult {
            current_iv,
            min_iv: 0.0,
            max_iv: 0.0,
            rank_pct: None,
            sample_count,
        };
    }

    let min_iv = historical_ivs.iter().copied().fold(f64::INFINITY, f64::min);
    let max_iv = historical_ivs
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let rank_pct = if max_iv <= min_iv {
        // 평평한 히스토리
        50.0
    } else {
        ((current_iv - min_iv) / (max_iv - min_iv) * 100.0).clamp(0.0, 100.0)
    };

    IVRankResult {
        current_iv,
        min_iv,
        max_iv,
        rank_pct: Some(rank_pct),
        sample_count,
    }
}

/// 실현 변동성 (연환산)
///
/// 최근 window개 로그 수익률의 표준편차 × √252. 데이터가 부족하면 None.
pub fn realized_volatility(series: &PriceSeries, window: usize) -> Option<f64> {
    let returns = series.log_returns();
    if returns.len() < window || window < 2 {
        return None;
    }

    let recent = &returns[returns.len() - window..];
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    let variance = recent.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (recent.len() as f64 - 1.0);
    let std_daily = variance.sqrt();

    if std_daily <= 0.0 || !std_daily.is_finite() {
        return None;
    }

    Some(std_daily * (252.0_f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iv_round_trip() {
        // 알려진 변동성으로 가격을 만든 뒤 역산하면 원래 값을 복원
        let (spot, strike, t, r) = (100.0, 105.0, 0.25, 0.05);
        for &sigma in &[0.15, 0.25, 0.40, 0.80] {
            let price = call_price(spot, strike, t, r, sigma);
            let solved = solve_implied_vol(
                spot,
                strike,
                t,
                r,
                OptionType::Call,
                price,
                0.001,
                5.0,
            )
            .unwrap();
            assert!(
                (solved - sigma).abs() < 1e-4,
                "sigma {} 복원 실패: {}",
                sigma,
                solved
            );
        }
    }

    #[test]
    fn test_iv_below_intrinsic_fails() {
        // 내재가치 이하 가격은 역산되지 않음
        let result =
            solve_implied_vol(110.0, 100.0, 0.25, 0.05, OptionType::Call, 9.0, 0.001, 5.0);
        assert!(result.is_none());
    }

    #[test]
    fn test_iv_rank_requires_min_samples() {
        let ivs = vec![0.2, 0.3, 0.25];
        let result = iv_rank(0.28, &ivs, 30);
        assert!(result.rank_pct.is_none());
        assert_eq!(result.sample_count, 3);
    }

    #[test]
    fn test_iv_rank_clamped() {
        let ivs: Vec<f64> = (0..40).map(|i| 0.20 + i as f64 * 0.005).collect();
        let result = iv_rank(1.0, &ivs, 30);
        assert_eq!(result.rank_pct, Some(100.0));

        let result = iv_rank(0.01, &ivs, 30);
        assert_eq!(result.rank_pct, Some(0.0));
    }

    #[test]
    fn test_iv_rank_flat_history() {
        let ivs = vec![0.25; 40];
        let result = iv_rank(0.25, &ivs, 30);
        assert_eq!(result.rank_pct, Some(50.0));
    }

    #[test]
    fn test_recompute_drops_bad_samples() {
        let config = OptionsConfig::default();
        let good_price = call_price(100.0, 105.0, 30.0 / 365.0, config.risk_free_rate, 0.3);
        let samples = vec![
            HistoricalIvSample {
                option_close: good_price,
                underlying_close: 100.0,
                days_to_expiry: 30,
            },
            // 내재가치 이하: 탈락해야 함
            HistoricalIvSample {
                option_close: 1.0,
                underlying_close: 110.0,
                days_to_expiry: 30,
            },
            // 만기 경과: 탈락해야 함
            HistoricalIvSample {
                option_close: 2.0,
                underlying_close: 100.0,
                days_to_expiry: 0,
            },
        ];
        let ivs = recompute_historical_ivs(&samples, 105.0, OptionType::Call, &config);
        assert_eq!(ivs.len(), 1);
        assert!((ivs[0] - 0.3).abs() < 1e-3);
    }
}
