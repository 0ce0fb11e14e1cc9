use crate::analyzer::swing_zone::ZoneAnalysis;
use crate::config::{AccountConfig, EngineConfig, ScalingMethod, SizingConfig, StopConfig, TargetConfig};
use crate::model::{OptionType, TradeSpec};
use crate::options::black_scholes::{OptionSnapshot, premium_at_spot};
use serde::Serialize;
use std::fmt::Display;

/// 고/노고 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GoNoGo {
    Go,
    NoGo,
}

impl Display for GoNoGo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoNoGo::Go => write!(f, "GO"),
            GoNoGo::NoGo => write!(f, "NO-GO"),
        }
    }
}

/// 포지션 사이징 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSize {
    pub contracts: u32,
    /// 총 프리미엄 지출 (달러)
    pub total_premium: f64,
    /// 최대 리스크 (달러)
    pub max_risk_dollars: f64,
    /// 계약당 리스크 (달러)
    pub risk_per_contract: f64,
    pub capital_used: f64,
    /// 자본 대비 실제 리스크 비율
    pub risk_percentage: f64,
    pub reasoning: String,
}

/// 손절 계산 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopResult {
    pub stop_loss: f64,
    /// 프리미엄 대비 리스크 비율 (%)
    pub risk_pct: f64,
    pub reasoning: String,
}

/// 목표가 계산 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetResult {
    pub target_1: f64,
    pub target_1_r: f64,
    pub runner_contracts: u32,
    pub runner_target: f64,
    pub reasoning: String,
}

/// 트레이드 실행 플랜
#[derive(Debug, Clone, Serialize)]
pub struct TradePlan {
    pub position: PositionSize,
    /// 진입 구간 (하한, 상한)
    pub entry_zone: (f64, f64),
    pub stop_loss: f64,
    pub stop_risk_pct: f64,
    pub target_1: f64,
    pub target_1_r: f64,
    pub runner_contracts: u32,
    pub runner_target: f64,
    pub max_loss_dollars: f64,
    pub max_gain_dollars: f64,
    pub go_no_go: GoNoGo,
    /// NO-GO 시 실패한 모든 규칙 사유
    pub reasons: Vec<String>,
}

impl Display for TradePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TradePlan({} {}계약, stop ${:.2}, T1 ${:.2} ({}R), runner {} @ ${:.2})",
            self.go_no_go,
            self.position.contracts,
            self.stop_loss,
            self.target_1,
            self.target_1_r,
            self.runner_contracts,
            self.runner_target
        )
    }
}

/// 플랜 계산에 쓰이는 선택적 시장 컨텍스트
///
/// 없는 항목은 해당 항목에 의존하는 계산만 생략시킵니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanContext<'a> {
    /// 기초자산 ATR
    pub atr: Option<f64>,
    /// 옵션 델타
    pub delta: Option<f64>,
    /// 존 분석 결과 (technical_weighted 목표에 사용)
    pub zones: Option<&'a ZoneAnalysis>,
    /// 옵션 스냅샷 (존 목표의 프리미엄 환산에 사용)
    pub snapshot: Option<&'a OptionSnapshot>,
    /// 현재 기초자산 가격
    pub current_price: Option<f64>,
    /// 현재 열려 있는 포지션 수
    pub open_positions: usize,
}

/// 결정론적 리스크 엔진
///
/// 모든 계산은 규칙 기반이며 재량이 없습니다.
#[derive(Debug)]
pub struct RiskEngine {
    account: AccountConfig,
    sizing: SizingConfig,
    stops: StopConfig,
    targets: TargetConfig,
}

impl RiskEngine {
    /// 새 리스크 엔진 생성
    pub fn new(config: &EngineConfig) -> RiskEngine {
        RiskEngine {
            account: config.account.clone(),
            sizing: config.sizing.clone(),
            stops: config.stops.clone(),
            targets: config.targets.clone(),
        }
    }

    /// 리스크 파라미터 기반 계약 수 계산
    pub fn calculate_position(&self, trade: &TradeSpec) -> PositionSize {
        let max_risk_dollars = self.account.total_capital * self.account.max_risk_per_trade;
        let risk_per_contract = trade.premium * 100.0;

        let raw_contracts = max_risk_dollars / risk_per_contract;
        let mut contracts = (raw_contracts as u32).max(1);

        let max_positions = self.account.max_open_positions as u32;
        let reasoning = if contracts > max_positions {
            contracts = max_positions;
            format!("Capped at {} contracts (max positions)", max_positions)
        } else {
            format!(
                "Calculated: ${:.0} risk / ${:.0} per contract = {:.1} -> {}",
                max_risk_dollars, risk_per_contract, raw_contracts, contracts
            )
        };

        let total_premium = contracts as f64 * risk_per_contract;
        let actual_risk_pct =
            contracts as f64 * risk_per_contract / self.account.total_capital;

        PositionSize {
            contracts,
            total_premium,
            max_risk_dollars: contracts as f64 * risk_per_contract,
            risk_per_contract,
            // 롱 옵션은 프리미엄 전액이 초기 리스크 자본
            capital_used: total_premium,
            risk_percentage: actual_risk_pct,
            reasoning,
        }
    }

    /// 손절 레벨 계산
    ///
    /// 비율 손절, 달러 상한 손절, ATR 기반 손절 중 가장 보수적인
    /// (진입가에 가까운) 값을 사용합니다. ATR 손절은 주가 ATR를 델타로
    /// 옵션 프리미엄 변화량에 사상합니다. 당일 만기는 타이트한
    /// 파라미터 세트를 씁니다.
    pub fn calculate_stop(
        &self,
        trade: &TradeSpec,
        atr: Option<f64>,
        delta: Option<f64>,
    ) -> StopResult {
        let stop_pct = if trade.is_zero_dte() {
            self.stops.zero_dte_pct
        } else {
            self.stops.default_pct
        };

        let premium_stop = trade.premium * (1.0 - stop_pct);
        let dollar_stop = trade.premium - self.stops.max_loss_per_contract / 100.0;
        let mut stop_loss = premium_stop.max(dollar_stop);
        let mut method = format!("{:.0}% of premium", stop_pct * 100.0);

        if let (Some(atr), Some(delta)) = (atr, delta) {
            let multiplier = if trade.is_zero_dte() {
                self.stops.zero_dte_atr_multiplier
            } else {
                self.stops.atr_multiplier
            };
            let atr_stop = trade.premium - multiplier * atr * delta.abs();
            if atr_stop > stop_loss {
                stop_loss = atr_stop;
                method = format!("{}x ATR mapped through delta", multiplier);
            }
        }

        let entry_risk = trade.premium - stop_loss;
        let risk_pct = entry_risk / trade.premium * 100.0;

        StopResult {
            stop_loss: (stop_loss * 100.0).round() / 100.0,
            risk_pct: (risk_pct * 10.0).round() / 10.0,
            reasoning: format!(
                "Stop at ${:.2} ({:.1}% of premium, {})",
                stop_loss, risk_pct, method
            ),
        }
    }

    /// 목표가 및 러너 플랜 계산
    ///
    /// 기본은 R 배수 목표입니다. `technical_weighted` 모드에서는 존
    /// 레벨을 프리미엄으로 환산해 목표로 씁니다 (스냅샷이 있으면
    /// 블랙-숄즈 재평가, 없으면 델타 선형 근사). 존이 없으면 R 배수로
    /// 되돌아가며 사유에 명시합니다.
    pub fn calculate_targets(
        &self,
        trade: &TradeSpec,
        stop_loss: f64,
        contracts: u32,
        ctx: &PlanContext<'_>,
    ) -> TargetResult {
        let risk = trade.premium - stop_loss;
        let runner_contracts =
            (contracts as f64 * self.targets.runner_remaining_pct) as u32;

        if self.targets.scaling_method == ScalingMethod::TechnicalWeighted {
            if let Some(result) = self.technical_targets(trade, risk, runner_contracts, ctx) {
                return result;
            }
        }

        // R 배수 기반 목표
        let target_1 = trade.premium + risk * self.targets.profit_target_r;
        let runner_target = trade.premium + risk * self.targets.max_runner_target_r;
        let fallback_note = if self.targets.scaling_method == ScalingMethod::TechnicalWeighted {
            " (no usable zones - fell back to R-based)"
        } else {
            ""
        };

        TargetResult {
            target_1: (target_1 * 100.0).round() / 100.0,
            target_1_r: self.targets.profit_target_r,
            runner_contracts,
            runner_target: (runner_target * 100.0).round() / 100.0,
            reasoning: format!(
                "Target 1 at {}R (${:.2}), runner at {}R (${:.2}){}",
                self.targets.profit_target_r,
                target_1,
                self.targets.max_runner_target_r,
                runner_target,
                fallback_note
            ),
        }
    }

    /// 존 기반 목표 산출. 사용 가능한 존/환산 수단이 없으면 None.
    fn technical_targets(
        &self,
        trade: &TradeSpec,
        risk: f64,
        runner_contracts: u32,
        ctx: &PlanContext<'_>,
    ) -> Option<TargetResult> {
        let zones = ctx.zones?;
        let current_price = ctx.current_price?;

        let (first, second) = match trade.option_type {
            OptionType::Call => {
                let mut iter = zones.resistance_zones.iter();
                (iter.next()?, iter.next())
            }
            OptionType::Put => {
                let mut iter = zones.support_zones.iter();
                (iter.next()?, iter.next())
            }
        };

        let to_premium = |zone_price: f64| -> Option<f64> {
            if let Some(snapshot) = ctx.snapshot {
                Some(premium_at_spot(snapshot, zone_price))
            } else {
                ctx.delta.map(|d| {
                    trade.premium + d.abs() * (zone_price - current_price).abs()
                })
            }
        };

        let target_1 = to_premium(first.price)?;
        if target_1 <= trade.premium || risk <= 0.0 {
            return None;
        }

        let runner_target = second
            .and_then(|z| to_premium(z.price))
            .filter(|&t| t > target_1)
            .unwrap_or(trade.premium + risk * self.targets.max_runner_target_r);

        let target_1_r = (target_1 - trade.premium) / risk;

        Some(TargetResult {
            target_1: (target_1 * 100.0).round() / 100.0,
            target_1_r: (target_1_r * 10.0).round() / 10.0,
            runner_contracts,
            runner_target: (runner_target * 100.0).round() / 100.0,
            reasoning: format!(
                "Target 1 at zone ${:.2} (strength {:.0}) -> premium ${:.2} ({:.1}R)",
                first.price, first.strength, target_1, target_1_r
            ),
        })
    }

    /// 규칙 기반 고/노고 판정
    ///
    /// 모든 하드 규칙의 AND입니다. 하나라도 실패하면 해당 사유를 전부
    /// 나열한 NO-GO이며, 점수가 아무리 좋아도 GO로 기본 처리되지
    /// 않습니다.
    pub fn check_go_no_go(
        &self,
        trade: &TradeSpec,
        position: &PositionSize,
        open_positions: usize,
    ) -> (GoNoGo, Vec<String>) {
        let mut reasons = Vec::new();

        if position.risk_percentage > self.account.max_risk_per_trade {
            reasons.push(format!(
                "Risk {:.2}% exceeds max {:.2}%",
                position.risk_percentage * 100.0,
                self.account.max_risk_per_trade * 100.0
            ));
        }

        if trade.premium < self.sizing.min_premium {
            reasons.push(format!(
                "Premium ${:.2} below minimum ${:.2}",
                trade.premium, self.sizing.min_premium
            ));
        }

        if position.contracts < 1 {
            reasons.push("Position size calculation resulted in < 1 contract".to_string());
        }

        let capital_cap = self.account.total_capital * self.account.max_position_pct;
        if position.capital_used > capital_cap {
            reasons.push(format!(
                "Position size ${:.0} exceeds {:.0}% of capital",
                position.capital_used,
                self.account.max_position_pct * 100.0
            ));
        }

        if open_positions >= self.account.max_open_positions {
            reasons.push(format!(
                "Already at max open positions ({})",
                self.account.max_open_positions
            ));
        }

        if reasons.is_empty() {
            (GoNoGo::Go, reasons)
        } else {
            log::warn!("NO-GO: {} - {}", trade, reasons.join(", "));
            (GoNoGo::NoGo, reasons)
        }
    }

    /// 전체 트레이드 플랜 생성
    pub fn create_trade_plan(&self, trade: &TradeSpec, ctx: &PlanContext<'_>) -> TradePlan {
        let position = self.calculate_position(trade);
        let stop = self.calculate_stop(trade, ctx.atr, ctx.delta);
        let targets = self.calculate_targets(trade, stop.stop_loss, position.contracts, ctx);
        let (go_no_go, reasons) = self.check_go_no_go(trade, &position, ctx.open_positions);

        let max_loss_dollars =
            position.contracts as f64 * (trade.premium - stop.stop_loss) * 100.0;
        let max_gain_dollars =
            position.contracts as f64 * (targets.target_1 - trade.premium) * 100.0;

        log::info!(
            "트레이드 플랜 생성: {} - {} ({}계약)",
            trade,
            go_no_go,
            position.contracts
        );

        TradePlan {
            entry_zone: (trade.premium - 0.05, trade.premium + 0.05),
            stop_loss: stop.stop_loss,
            stop_risk_pct: stop.risk_pct,
            target_1: targets.target_1,
            target_1_r: targets.target_1_r,
            runner_contracts: targets.runner_contracts,
            runner_target: targets.runner_target,
            max_loss_dollars: (max_loss_dollars * 100.0).round() / 100.0,
            max_gain_dollars: (max_gain_dollars * 100.0).round() / 100.0,
            go_no_go,
            reasons,
            position,
        }
    }
}
