use crate::model::OptionType;
use serde::Serialize;
use std::fmt::Display;

/// 표준정규 누적분포함수
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// 표준정규 확률밀도함수
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// 오차함수 (Abramowitz-Stegun 근사)
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

/// 옵션 스냅샷
///
/// 그릭스 계산의 단일 진실 공급원입니다. 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptionSnapshot {
    pub underlying_price: f64,
    pub strike: f64,
    pub option_type: OptionType,
    /// 만기까지 남은 기간 (연 단위)
    pub time_to_expiry_years: f64,
    /// 연환산 내재변동성 (소수)
    pub implied_vol: f64,
    /// 무위험 이자율 (연환산 소수)
    pub risk_free_rate: f64,
}

impl OptionSnapshot {
    pub fn new(
        underlying_price: f64,
        strike: f64,
        option_type: OptionType,
        time_to_expiry_years: f64,
        implied_vol: f64,
        risk_free_rate: f64,
    ) -> OptionSnapshot {
        OptionSnapshot {
            underlying_price,
            strike,
            option_type,
            time_to_expiry_years,
            implied_vol,
            risk_free_rate,
        }
    }

    /// 내재가치
    pub fn intrinsic_value(&self) -> f64 {
        match self.option_type {
            OptionType::Call => (self.underlying_price - self.strike).max(0.0),
            OptionType::Put => (self.strike - self.underlying_price).max(0.0),
        }
    }
}

impl Display for OptionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OptionSnapshot({} K={} S={:.2} T={:.4} IV={:.1}%)",
            self.option_type,
            self.strike,
            self.underlying_price,
            self.time_to_expiry_years,
            self.implied_vol * 100.0
        )
    }
}

/// 옵션 그릭스와 수익 확률
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    /// 일 단위 세타
    pub theta: f64,
    /// 변동성 1%p당 베가
    pub vega: f64,
    /// 손익분기 너머로 만기 도달할 위험중립 확률 (0-1)
    pub probability_of_profit: f64,
}

impl Display for Greeks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Greeks(Δ {:.2}, Γ {:.4}, Θ {:.4}, ν {:.2}, PoP {:.0}%)",
            self.delta,
            self.gamma,
            self.theta,
            self.vega,
            self.probability_of_profit * 100.0
        )
    }
}

fn d1_d2(spot: f64, strike: f64, t: f64, r: f64, sigma: f64) -> (f64, f64) {
    let d1 = ((spot / strike).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt());
    let d2 = d1 - sigma * t.sqrt();
    (d1, d2)
}

/// 블랙-숄즈 콜 가격. 만기(T=0)에는 내재가치를 반환합니다.
pub fn call_price(spot: f64, strike: f64, t: f64, r: f64, sigma: f64) -> f64 {
    if spot <= 0.0 || strike <= 0.0 || sigma <= 0.0 {
        return 0.0;
    }
    if t <= 0.0 {
        return (spot - strike).max(0.0);
    }
    let (d1, d2) = d1_d2(spot, strike, t, r, sigma);
    spot * norm_cdf(d1) - strike * (-r * t).exp() * norm_cdf(d2)
}

/// 블랙-숄즈 풋 가격. 만기(T=0)에는 내재가치를 반환합니다.
pub fn put_price(spot: f64, strike: f64, t: f64, r: f64, sigma: f64) -> f64 {
    if spot <= 0.0 || strike <= 0.0 || sigma <= 0.0 {
        return 0.0;
    }
    if t <= 0.0 {
        return (strike - spot).max(0.0);
    }
    let (d1, d2) = d1_d2(spot, strike, t, r, sigma);
    strike * (-r * t).exp() * norm_cdf(-d2) - spot * norm_cdf(-d1)
}

/// 스냅샷 기준 이론가
pub fn price(snapshot: &OptionSnapshot) -> f64 {
    match snapshot.option_type {
        OptionType::Call => call_price(
            snapshot.underlying_price,
            snapshot.strike,
            snapshot.time_to_expiry_years,
            snapshot.risk_free_rate,
            snapshot.implied_vol,
        ),
        OptionType::Put => put_price(
            snapshot.underlying_price,
            snapshot.strike,
            snapshot.time_to_expiry_years,
            snapshot.risk_free_rate,
            snapshot.implied_vol,
        ),
    }
}

/// 그릭스 및 수익 확률 계산
///
/// PoP는 행사가 대신 손익분기 가격을 사용한 d2의 위험중립 확률로
/// 근사합니다.
///
/// # Arguments
/// * `snapshot` - 옵션 스냅샷
/// * `breakeven` - 손익분기 기초자산 가격 (콜: 행사가+프리미엄)
///
/// # Returns
/// * `Option<Greeks>` - 입력이 유효 범위를 벗어나면 None
pub fn greeks(snapshot: &OptionSnapshot, breakeven: f64) -> Option<Greeks> {
    let s = snapshot.underlying_price;
    let k = snapshot.strike;
    let t = snapshot.time_to_expiry_years;
    let r = snapshot.risk_free_rate;
    let sigma = snapshot.implied_vol;

    if s <= 0.0 || k <= 0.0 || t <= 0.0 || sigma <= 0.0 || breakeven <= 0.0 {
        return None;
    }

    let (d1, d2) = d1_d2(s, k, t, r, sigma);
    let pdf_d1 = norm_pdf(d1);

    let delta = match snapshot.option_type {
        OptionType::Call => norm_cdf(d1),
        OptionType::Put => norm_cdf(d1) - 1.0,
    };

    let gamma = pdf_d1 / (s * sigma * t.sqrt());

    // 연 단위 세타를 일 단위로 환산
    let theta_annual = match snapshot.option_type {
        OptionType::Call => {
            -(s * pdf_d1 * sigma) / (2.0 * t.sqrt()) - r * k * (-r * t).exp() * norm_cdf(d2)
        }
        OptionType::Put => {
            -(s * pdf_d1 * sigma) / (2.0 * t.sqrt()) + r * k * (-r * t).exp() * norm_cdf(-d2)
        }
    };
    let theta = theta_annual / 365.0;

    // 변동성 1%p 변화당 가격 민감도
    let vega = s * pdf_d1 * t.sqrt() / 100.0;

    let probability_of_profit = probability_of_profit(s, breakeven, t, r, sigma, snapshot.option_type);

    Some(Greeks {
        delta,
        gamma,
        theta,
        vega,
        probability_of_profit,
    })
}

/// 손익분기 너머 만기 도달 확률 (위험중립)
pub fn probability_of_profit(
    spot: f64,
    breakeven: f64,
    t: f64,
    r: f64,
    sigma: f64,
    option_type: OptionType,
) -> f64 {
    if spot <= 0.0 || breakeven <= 0.0 || t <= 0.0 || sigma <= 0.0 {
        return 0.0;
    }

    let (_, d2) = d1_d2(spot, breakeven, t, r, sigma);
    match option_type {
        OptionType::Call => norm_cdf(d2),
        OptionType::Put => norm_cdf(-d2),
    }
}

/// 기초자산 즉시 이동 시 프리미엄 재평가
pub fn premium_at_spot(snapshot: &OptionSnapshot, new_spot: f64) -> f64 {
    let moved = OptionSnapshot {
        underlying_price: new_spot,
        ..*snapshot
    };
    price(&moved)
}

/// 기초자산 즉시 이동 시 추정 손익 (계약당 100주)
pub fn estimate_pl(
    snapshot: &OptionSnapshot,
    entry_premium: f64,
    new_spot: f64,
    contracts: u32,
) -> f64 {
    (premium_at_spot(snapshot, new_spot) - entry_premium) * contracts as f64 * 100.0
}

/// 스트레스 시나리오 결과: (기초자산 변동률, 추정 손익, 리스크 대비 %)
pub type StressScenario = (f64, f64, f64);

/// 기초자산 % 이동 시나리오별 손익 테이블
///
/// 세타 조정 없는 즉시 이동 가정입니다.
pub fn stress_test_scenarios(
    snapshot: &OptionSnapshot,
    entry_premium: f64,
    contracts: u32,
    risk_dollars: f64,
    scenario_pct_changes: &[f64],
) -> Vec<StressScenario> {
    let risk = if risk_dollars > 0.0 { risk_dollars } else { 1.0 };

    scenario_pct_changes
        .iter()
        .map(|&pct| {
            let new_spot = snapshot.underlying_price * (1.0 + pct);
            let pl = estimate_pl(snapshot, entry_premium, new_spot, contracts);
            (pct, pl, pl / risk * 100.0)
        })
        .collect()
}

/// 세타가 임계값보다 음수면 빠른 시간가치 잠식 위험
pub fn theta_high_decay_risk(theta: Option<f64>, threshold: f64) -> bool {
    theta.map(|t| t < threshold).unwrap_or(false)
}

/// 베가가 임계값을 넘으면 IV 변화 민감 위험
pub fn vega_high_risk(vega: Option<f64>, threshold: f64) -> bool {
    vega.map(|v| v > threshold).unwrap_or(false)
}

/// DTE를 연 단위 기간으로 변환
pub fn days_to_years(days: u32) -> f64 {
    days as f64 / 365.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_cdf_symmetry() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((norm_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 1e-3);
    }

    #[test]
    fn test_call_price_reasonable() {
        // ATM 콜, 1년, 20% 변동성, 5% 금리
        let price = call_price(100.0, 100.0, 1.0, 0.05, 0.20);
        assert!(price > 8.0 && price < 13.0);
    }

    #[test]
    fn test_put_call_parity() {
        let (s, k, t, r, sigma) = (100.0, 105.0, 0.5, 0.05, 0.25);
        let call = call_price(s, k, t, r, sigma);
        let put = put_price(s, k, t, r, sigma);
        // C - P = S - K·e^(-rT)
        let parity = s - k * (-r * t).exp();
        assert!((call - put - parity).abs() < 1e-6);
    }

    #[test]
    fn test_expiry_returns_intrinsic() {
        assert_eq!(call_price(110.0, 100.0, 0.0, 0.05, 0.2), 10.0);
        assert_eq!(call_price(90.0, 100.0, 0.0, 0.05, 0.2), 0.0);
        assert_eq!(put_price(90.0, 100.0, 0.0, 0.05, 0.2), 10.0);
    }

    #[test]
    fn test_greeks_call_delta_range() {
        let snapshot = OptionSnapshot::new(100.0, 100.0, OptionType::Call, 0.1, 0.25, 0.05);
        let greeks = greeks(&snapshot, 102.5).unwrap();
        assert!(greeks.delta > 0.0 && greeks.delta < 1.0);
        assert!(greeks.gamma > 0.0);
        assert!(greeks.theta < 0.0);
        assert!(greeks.vega > 0.0);
        assert!(greeks.probability_of_profit > 0.0 && greeks.probability_of_profit < 1.0);
    }

    #[test]
    fn test_pop_decreases_with_farther_breakeven() {
        let (s, t, r, sigma) = (100.0, 0.1, 0.05, 0.25);
        let near = probability_of_profit(s, 101.0, t, r, sigma, OptionType::Call);
        let far = probability_of_profit(s, 110.0, t, r, sigma, OptionType::Call);
        assert!(near > far);
    }

    #[test]
    fn test_greeks_rejects_degenerate_input() {
        let snapshot = OptionSnapshot::new(100.0, 100.0, OptionType::Call, 0.0, 0.25, 0.05);
        assert!(greeks(&snapshot, 102.5).is_none());
    }

    #[test]
    fn test_stress_scenarios_monotonic_for_call() {
        let snapshot = OptionSnapshot::new(100.0, 105.0, OptionType::Call, 0.1, 0.30, 0.05);
        let scenarios =
            stress_test_scenarios(&snapshot, 2.50, 2, 500.0, &[-0.05, -0.02, 0.0, 0.02, 0.05]);

        assert_eq!(scenarios.len(), 5);
        // 콜 손익은 기초자산 상승에 단조 증가
        for pair in scenarios.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
        // 상승 시나리오는 이익, 하락 시나리오는 손실
        assert!(scenarios[0].1 < 0.0);
        assert!(scenarios[4].1 > 0.0);
    }
}
