use crate::config::{AccountConfig, EngineConfig, SizingConfig};
use crate::model::ClosedTrade;
use serde::Serialize;
use std::fmt::Display;

/// 복합 사이징 결과
///
/// 적용된 배수를 항목별로 노출합니다. 적용되지 않은 항목은 None입니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingResult {
    pub contracts: u32,
    /// 자본 대비 실제 리스크 비율 (%)
    pub risk_pct: f64,
    pub risk_dollars: f64,
    pub position_value: f64,
    /// 자본 대비 포지션 가치 비율 (%)
    pub position_pct: f64,
    pub kelly_multiplier: Option<f64>,
    pub volatility_multiplier: Option<f64>,
    pub quality_multiplier: Option<f64>,
    pub drawdown_multiplier: Option<f64>,
    pub reasoning: String,
}

impl Display for SizingResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SizingResult({}계약, risk {:.2}% = ${:.0})",
            self.contracts, self.risk_pct, self.risk_dollars
        )
    }
}

/// 복합 포지션 사이저
///
/// 켈리 기준, IV 랭크, 셋업 품질, 드로다운 상태를 곱연산으로 결합해
/// 기본 리스크 비율을 조정합니다. 과거 트레이드 기록은 저널 협력자가
/// 소유한 읽기 전용 시퀀스입니다.
#[derive(Debug)]
pub struct PositionSizer {
    account: AccountConfig,
    sizing: SizingConfig,
}

impl PositionSizer {
    /// 새 포지션 사이저 생성
    pub fn new(config: &EngineConfig) -> PositionSizer {
        PositionSizer {
            account: config.account.clone(),
            sizing: config.sizing.clone(),
        }
    }

    /// 복합 사이징 계산
    ///
    /// # Arguments
    /// * `entry_price` - 진입 프리미엄
    /// * `stop_loss` - 손절 프리미엄
    /// * `setup_score` - 셋업 점수 (0-100)
    /// * `history` - 청산 완료 트레이드 기록
    /// * `iv_rank` - IV 랭크 (없으면 변동성 조정 생략)
    /// * `drawdown_pct` - 현재 드로다운 (%)
    ///
    /// # Returns
    /// * `SizingResult` - 계약 수와 적용 배수 내역
    pub fn calculate(
        &self,
        entry_price: f64,
        stop_loss: f64,
        setup_score: f64,
        history: &[ClosedTrade],
        iv_rank: Option<f64>,
        drawdown_pct: f64,
    ) -> SizingResult {
        let account_value = self.account.total_capital;
        let risk_per_contract = (entry_price - stop_loss).abs() * 100.0;
        let base_risk_pct = self.sizing.base_risk_pct;
        let mut reasons = Vec::new();

        // 1. 켈리 기준 조정
        let kelly_multiplier = if self.sizing.kelly.enabled {
            self.kelly_pct(history).map(|kelly| {
                let multiplier = kelly / base_risk_pct;
                reasons.push(format!(
                    "Kelly: {:.2}x (optimal {:.2}%)",
                    multiplier,
                    kelly * 100.0
                ));
                multiplier
            })
        } else {
            None
        };

        // 2. IV 랭크 조정 (높은 IV = 축소)
        let volatility_multiplier = if self.sizing.volatility.enabled {
            iv_rank.map(|rank| {
                let multiplier = self.volatility_adjustment(rank);
                if multiplier < 1.0 {
                    reasons.push(format!(
                        "High IV (rank {:.0}): size reduced to {:.2}x",
                        rank, multiplier
                    ));
                } else if multiplier > 1.0 {
                    reasons.push(format!(
                        "Low IV (rank {:.0}): size increased to {:.2}x",
                        rank, multiplier
                    ));
                }
                multiplier
            })
        } else {
            None
        };

        // 3. 셋업 품질 배수
        let quality_multiplier = if self.sizing.quality_enabled {
            let multiplier = quality_multiplier(setup_score);
            if (multiplier - 1.0).abs() > f64::EPSILON {
                reasons.push(format!(
                    "Setup quality ({:.0}/100): {:.2}x",
                    setup_score, multiplier
                ));
            }
            Some(multiplier)
        } else {
            None
        };

        // 4. 드로다운 보호
        let drawdown_multiplier = if drawdown_pct > 0.0 {
            let multiplier = drawdown_multiplier(drawdown_pct);
            reasons.push(format!(
                "Drawdown protection ({:.1}%): {:.2}x",
                drawdown_pct, multiplier
            ));
            Some(multiplier)
        } else {
            None
        };

        let mut final_risk_pct = base_risk_pct
            * kelly_multiplier.unwrap_or(1.0)
            * volatility_multiplier.unwrap_or(1.0)
            * quality_multiplier.unwrap_or(1.0)
            * drawdown_multiplier.unwrap_or(1.0);

        // 절대 한도 적용
        final_risk_pct = final_risk_pct
            .min(self.account.max_risk_per_trade)
            .max(self.sizing.min_risk_pct);

        let risk_dollars = account_value * final_risk_pct;
        let mut contracts = if risk_per_contract > 0.0 {
            ((risk_dollars / risk_per_contract) as u32).max(1)
        } else {
            self.sizing.default_contracts
        };

        // 포지션 가치 상한 검사
        let contract_value = entry_price * 100.0;
        let position_cap = account_value * self.account.max_position_pct;
        if contracts as f64 * contract_value > position_cap {
            contracts = ((position_cap / contract_value) as u32).max(1);
            reasons.push("Position size limit applied".to_string());
        }

        let actual_risk_dollars = contracts as f64 * risk_per_contract;
        let position_value = contracts as f64 * contract_value;

        SizingResult {
            contracts,
            risk_pct: actual_risk_dollars / account_value * 100.0,
            risk_dollars: actual_risk_dollars,
            position_value,
            position_pct: position_value / account_value * 100.0,
            kelly_multiplier,
            volatility_multiplier,
            quality_multiplier,
            drawdown_multiplier,
            reasoning: if reasons.is_empty() {
                "Standard sizing".to_string()
            } else {
                reasons.join(" | ")
            },
        }
    }

    /// 켈리 비율 계산
    ///
    /// f = (p·b - q) / b. 프랙셔널 켈리를 적용하고 [0.1%, 10%]로
    /// 클램프합니다. 기록이 부족하거나 승/패가 한쪽뿐이면 None.
    fn kelly_pct(&self, history: &[ClosedTrade]) -> Option<f64> {
        if history.len() < self.sizing.kelly.min_trades {
            return None;
        }

        let wins: Vec<&ClosedTrade> = history.iter().filter(|t| t.pnl > 0.0).collect();
        let losses: Vec<&ClosedTrade> = history.iter().filter(|t| t.pnl < 0.0).collect();
        if wins.is_empty() || losses.is_empty() {
            return None;
        }

        let win_rate = wins.len() as f64 / history.len() as f64;
        let avg_win_r =
            wins.iter().map(|t| t.r_multiple).sum::<f64>() / wins.len() as f64;
        let avg_loss_r =
            (losses.iter().map(|t| t.r_multiple).sum::<f64>() / losses.len() as f64).abs();
        if avg_loss_r == 0.0 {
            return None;
        }

        let b = avg_win_r / avg_loss_r;
        let kelly = (win_rate * b - (1.0 - win_rate)) / b;
        let fractional = kelly * self.sizing.kelly.fractional;

        Some(fractional.clamp(0.001, 0.10))
    }

    /// IV 랭크 기반 배수 (랭크가 오를수록 선형 축소)
    fn volatility_adjustment(&self, iv_rank: f64) -> f64 {
        let cfg = &self.sizing.volatility;
        if iv_rank >= cfg.high_iv_threshold {
            cfg.min_multiplier
        } else if iv_rank <= cfg.low_iv_threshold {
            cfg.max_multiplier
        } else {
            let normalized = (iv_rank - cfg.low_iv_threshold)
                / (cfg.high_iv_threshold - cfg.low_iv_threshold);
            cfg.max_multiplier - normalized * (cfg.max_multiplier - cfg.min_multiplier)
        }
    }
}

/// 셋업 점수 브래킷별 배수
fn quality_multiplier(setup_score: f64) -> f64 {
    if setup_score >= 90.0 {
        1.5
    } else if setup_score >= 80.0 {
        1.25
    } else if setup_score >= 70.0 {
        1.0
    } else if setup_score >= 60.0 {
        0.75
    } else {
        0.5
    }
}

/// 드로다운 구간별 배수
fn drawdown_multiplier(drawdown_pct: f64) -> f64 {
    if drawdown_pct < 5.0 {
        1.0
    } else if drawdown_pct < 10.0 {
        0.75
    } else if drawdown_pct < 15.0 {
        0.5
    } else {
        0.25
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(wins: usize, losses: usize) -> Vec<ClosedTrade> {
        let mut trades = Vec::new();
        for _ in 0..wins {
            trades.push(ClosedTrade::new(200.0, 2.0));
        }
        for _ in 0..losses {
            trades.push(ClosedTrade::new(-100.0, -1.0));
        }
        trades
    }

    #[test]
    fn test_kelly_requires_min_trades() {
        let sizer = PositionSizer::new(&EngineConfig::default());
        let result = sizer.calculate(2.50, 1.25, 75.0, &history(5, 5), None, 0.0);
        assert!(result.kelly_multiplier.is_none());
    }

    #[test]
    fn test_kelly_applied_with_history() {
        let sizer = PositionSizer::new(&EngineConfig::default());
        let result = sizer.calculate(2.50, 1.25, 75.0, &history(20, 15), None, 0.0);
        assert!(result.kelly_multiplier.is_some());
        assert!(result.contracts >= 1);
    }

    #[test]
    fn test_quality_brackets() {
        assert_eq!(quality_multiplier(95.0), 1.5);
        assert_eq!(quality_multiplier(85.0), 1.25);
        assert_eq!(quality_multiplier(75.0), 1.0);
        assert_eq!(quality_multiplier(65.0), 0.75);
        assert_eq!(quality_multiplier(40.0), 0.5);
    }

    #[test]
    fn test_drawdown_tiers() {
        assert_eq!(drawdown_multiplier(2.0), 1.0);
        assert_eq!(drawdown_multiplier(7.0), 0.75);
        assert_eq!(drawdown_multiplier(12.0), 0.5);
        assert_eq!(drawdown_multiplier(20.0), 0.25);
    }

    #[test]
    fn test_high_iv_reduces_size() {
        let sizer = PositionSizer::new(&EngineConfig::default());
        let low_iv = sizer.calculate(2.50, 1.25, 75.0, &[], Some(20.0), 0.0);
        let high_iv = sizer.calculate(2.50, 1.25, 75.0, &[], Some(80.0), 0.0);
        assert!(low_iv.contracts >= high_iv.contracts);
        assert_eq!(high_iv.volatility_multiplier, Some(0.5));
        assert_eq!(low_iv.volatility_multiplier, Some(1.5));
    }

    #[test]
    fn test_risk_pct_respects_ceiling() {
        let sizer = PositionSizer::new(&EngineConfig::default());
        // 좋은 기록 + 저IV + 최상급 점수라도 상한을 넘지 않음
        let result = sizer.calculate(2.50, 1.25, 95.0, &history(25, 10), Some(10.0), 0.0);
        let config = EngineConfig::default();
        assert!(result.risk_pct / 100.0 <= config.account.max_risk_per_trade * 1.5);
    }
}
