use crate::config_loader::{ConfigError, ConfigResult, ConfigValidation};
use serde::{Deserialize, Serialize};

/// 계좌 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// 총 운용 자본 (달러)
    pub total_capital: f64,
    /// 트레이드당 최대 리스크 비율
    pub max_risk_per_trade: f64,
    /// 동시 보유 가능 포지션 수
    pub max_open_positions: usize,
    /// 단일 포지션이 차지할 수 있는 자본 비율 상한
    pub max_position_pct: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        AccountConfig {
            total_capital: 100_000.0,
            max_risk_per_trade: 0.02,
            max_open_positions: 5,
            max_position_pct: 0.25,
        }
    }
}

/// 켈리 기준 사이징 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KellyConfig {
    pub enabled: bool,
    /// 프랙셔널 켈리 비율 (풀 켈리는 과도하게 공격적)
    pub fractional: f64,
    /// 켈리 계산에 필요한 최소 청산 트레이드 수
    pub min_trades: usize,
}

impl Default for KellyConfig {
    fn default() -> Self {
        KellyConfig {
            enabled: true,
            fractional: 0.25,
            min_trades: 30,
        }
    }
}

/// IV 랭크 기반 사이징 조정 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilitySizingConfig {
    pub enabled: bool,
    /// 이 랭크 이하면 최대 배수 적용
    pub low_iv_threshold: f64,
    /// 이 랭크 이상이면 최소 배수 적용
    pub high_iv_threshold: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
}

impl Default for VolatilitySizingConfig {
    fn default() -> Self {
        VolatilitySizingConfig {
            enabled: true,
            low_iv_threshold: 30.0,
            high_iv_threshold: 70.0,
            min_multiplier: 0.5,
            max_multiplier: 1.5,
        }
    }
}

/// 포지션 사이징 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// 평가 대상으로 고려할 최소 프리미엄
    pub min_premium: f64,
    /// 리스크 계산 불가 시 기본 계약 수
    pub default_contracts: u32,
    /// 복합 사이징 기본 리스크 비율
    pub base_risk_pct: f64,
    /// 복합 사이징 리스크 비율 하한
    pub min_risk_pct: f64,
    pub kelly: KellyConfig,
    pub volatility: VolatilitySizingConfig,
    /// 셋업 품질 배수 사용 여부
    pub quality_enabled: bool,
}

impl Default for SizingConfig {
    fn default() -> Self {
        SizingConfig {
            min_premium: 0.50,
            default_contracts: 1,
            base_risk_pct: 0.02,
            min_risk_pct: 0.005,
            kelly: KellyConfig::default(),
            volatility: VolatilitySizingConfig::default(),
            quality_enabled: true,
        }
    }
}

/// 손절매 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StopConfig {
    /// 프리미엄 대비 기본 손절 비율
    pub default_pct: f64,
    /// 당일 만기 트레이드의 타이트한 손절 비율
    pub zero_dte_pct: f64,
    /// 계약당 최대 허용 손실 (달러)
    pub max_loss_per_contract: f64,
    /// ATR 기반 손절 배수
    pub atr_multiplier: f64,
    /// 당일 만기 트레이드의 ATR 배수
    pub zero_dte_atr_multiplier: f64,
}

impl Default for StopConfig {
    fn default() -> Self {
        StopConfig {
            default_pct: 0.50,
            zero_dte_pct: 0.30,
            max_loss_per_contract: 500.0,
            atr_multiplier: 1.5,
            zero_dte_atr_multiplier: 1.0,
        }
    }
}

/// 목표가 스케일링 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMethod {
    /// R 배수 기반 고정 목표
    RBased,
    /// 지지/저항 존 기반 목표
    TechnicalWeighted,
}

/// 목표가 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// 1차 목표 R 배수
    pub profit_target_r: f64,
    /// 러너 최대 목표 R 배수
    pub max_runner_target_r: f64,
    /// 러너로 남기는 계약 비율
    pub runner_remaining_pct: f64,
    pub scaling_method: ScalingMethod,
}

impl Default for TargetConfig {
    fn default() -> Self {
        TargetConfig {
            profit_target_r: 2.0,
            max_runner_target_r: 5.0,
            runner_remaining_pct: 0.50,
            scaling_method: ScalingMethod::RBased,
        }
    }
}

/// 지지/저항 존 탐지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// 스윙 포인트 탐지 윈도우 (양쪽 바 수)
    pub swing_window: usize,
    /// 분석 대상 바 수
    pub lookback_bars: usize,
    /// 유효한 존이 되기 위한 최소 터치 횟수
    pub min_touches: usize,
    /// 레벨 클러스터링 거리 임계값 (가격 대비 %)
    pub clustering_pct: f64,
    /// 방향별 최대 존 수
    pub max_levels: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig {
            swing_window: 5,
            lookback_bars: 60,
            min_touches: 2,
            clustering_pct: 0.5,
            max_levels: 5,
        }
    }
}

/// 거래량 분석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// 볼륨 프로파일 가격 구간 수
    pub profile_bins: usize,
    /// 밸류 에어리어 비율
    pub value_area_pct: f64,
    /// 이상 탐지용 평균 거래량 기간
    pub anomaly_lookback: usize,
    /// 스파이크 판정 배수 (드라이업은 역수)
    pub spike_multiplier: f64,
    /// 가격 움직임 확인에 필요한 거래량 증가율 (%)
    pub confirmation_threshold_pct: f64,
    /// VWAP 계산 기간 (0이면 전체)
    pub vwap_period: usize,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        VolumeConfig {
            profile_bins: 50,
            value_area_pct: 0.70,
            anomaly_lookback: 20,
            spike_multiplier: 2.0,
            confirmation_threshold_pct: 50.0,
            vwap_period: 0,
        }
    }
}

/// 캔들 패턴 탐지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// 탐지 대상 후행 윈도우 (바 수)
    pub lookback: usize,
    /// 거래량 확인 요구 여부
    pub require_volume_confirmation: bool,
    /// 거래량 확인 배수 (평균 대비)
    pub volume_confirm_multiplier: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        PatternConfig {
            lookback: 10,
            require_volume_confirmation: true,
            volume_confirm_multiplier: 1.2,
        }
    }
}

/// 추세 분석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// 구조 분석 대상 바 수
    pub structure_lookback: usize,
    /// 구조 스윙 탐지 윈도우
    pub swing_window: usize,
    /// ADX 계산 기간
    pub adx_period: usize,
    /// 이 이상이면 추세장
    pub adx_trend_threshold: f64,
    /// 이 미만이면 약세/횡보장
    pub adx_weak_threshold: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            structure_lookback: 50,
            swing_window: 3,
            adx_period: 14,
            adx_trend_threshold: 25.0,
            adx_weak_threshold: 20.0,
        }
    }
}

/// 옵션 분석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    /// 무위험 이자율 (연환산 소수)
    pub risk_free_rate: f64,
    /// IV 랭크 산출에 필요한 최소 샘플 수
    pub min_historical_samples: usize,
    /// 히스토리 IV 재계산 룩백 상한 (일)
    pub max_lookback_days: usize,
    /// IV 역산 솔버 하한
    pub sigma_low: f64,
    /// IV 역산 솔버 상한
    pub sigma_high: f64,
    /// 실현 변동성 계산 윈도우 (바 수)
    pub realized_vol_window: usize,
    /// 이 미만의 PoP는 레드 플래그
    pub pop_floor: f64,
    /// 이 이상의 IV 랭크는 고평가 경고
    pub iv_rank_high: f64,
    /// 이 이하의 IV 랭크는 매수 우호
    pub iv_rank_low: f64,
    /// 세타가 이보다 음수면 시간가치 잠식 경고
    pub theta_decay_threshold: f64,
    /// 베가가 이보다 크면 IV 민감도 경고
    pub vega_risk_threshold: f64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        OptionsConfig {
            risk_free_rate: 0.05,
            min_historical_samples: 30,
            max_lookback_days: 126,
            sigma_low: 0.001,
            sigma_high: 5.0,
            realized_vol_window: 30,
            pop_floor: 0.40,
            iv_rank_high: 70.0,
            iv_rank_low: 30.0,
            theta_decay_threshold: -0.05,
            vega_risk_threshold: 0.20,
        }
    }
}

/// 셋업 점수 구성 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// 점수 기준점
    pub base_score: f64,
    /// 구조적 규칙 통과 시 보너스
    pub rule_bonus: f64,
    /// 그린 플래그당 보너스
    pub green_flag_bonus: f64,
    /// 그린 플래그 보너스 총합 상한
    pub green_bonus_cap: f64,
    /// 심각도별 레드 플래그 감점
    pub red_high_penalty: f64,
    pub red_medium_penalty: f64,
    pub red_low_penalty: f64,
    /// 방향 일치 패턴 보너스 상한
    pub pattern_bonus_max: f64,
    /// 추세 정렬 보너스
    pub trend_bonus: f64,
    /// 역추세 감점
    pub counter_trend_penalty: f64,
    /// 구조 규칙: 허용 가능한 최대 OTM 거리 (%)
    pub max_otm_distance_pct: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            base_score: 50.0,
            rule_bonus: 10.0,
            green_flag_bonus: 5.0,
            green_bonus_cap: 20.0,
            red_high_penalty: 15.0,
            red_medium_penalty: 8.0,
            red_low_penalty: 3.0,
            pattern_bonus_max: 10.0,
            trend_bonus: 15.0,
            counter_trend_penalty: 15.0,
            max_otm_distance_pct: 10.0,
        }
    }
}

/// 돌파/거부 동시 발생 시 우선순위 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPrecedence {
    /// 거부 우선 (실현 이익 보호)
    RejectionFirst,
    /// 돌파 우선 (러너 연장)
    BreakoutFirst,
}

/// 동적 청산 조정 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitConfig {
    /// 돌파 확인 비율 (0.005 = 존 위 0.5%)
    pub breakout_confirmation_pct: f64,
    /// 돌파 확인 거래량 배수
    pub breakout_volume_multiplier: f64,
    /// 거부 판정 근접 비율
    pub rejection_proximity_pct: f64,
    /// 거부 꼬리 비율 임계값 (범위 대비)
    pub wick_ratio_threshold: f64,
    pub precedence: ExitPrecedence,
}

impl Default for ExitConfig {
    fn default() -> Self {
        ExitConfig {
            breakout_confirmation_pct: 0.005,
            breakout_volume_multiplier: 1.5,
            rejection_proximity_pct: 0.005,
            wick_ratio_threshold: 0.7,
            precedence: ExitPrecedence::RejectionFirst,
        }
    }
}

/// 트레일링 스톱 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailingConfig {
    /// 초기 구간 ATR 배수
    pub initial_atr_multiplier: f64,
    /// 2R 이상 구간 ATR 배수
    pub mid_atr_multiplier: f64,
    /// 4R 이상 구간 ATR 배수
    pub high_atr_multiplier: f64,
    /// 기술적 스톱이 진입가에서 떨어져야 하는 최소 거리 (%)
    pub min_distance_from_entry_pct: f64,
    /// 브레이크이븐 스톱 발동 R 배수
    pub breakeven_r_trigger: f64,
}

impl Default for TrailingConfig {
    fn default() -> Self {
        TrailingConfig {
            initial_atr_multiplier: 1.5,
            mid_atr_multiplier: 2.0,
            high_atr_multiplier: 2.5,
            min_distance_from_entry_pct: 0.5,
            breakeven_r_trigger: 2.0,
        }
    }
}

/// 엔진 전체 설정
///
/// 불변 설정 객체로, 모든 컴포넌트 생성자에 참조로 전달됩니다.
/// 전역 가변 상태를 사용하지 않으므로 서로 다른 설정의 엔진 인스턴스를
/// 동시에 사용해도 안전합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub account: AccountConfig,
    pub sizing: SizingConfig,
    pub stops: StopConfig,
    pub targets: TargetConfig,
    pub zones: ZoneConfig,
    pub volume: VolumeConfig,
    pub patterns: PatternConfig,
    pub trend: TrendConfig,
    pub options: OptionsConfig,
    pub scoring: ScoringConfig,
    pub exits: ExitConfig,
    pub trailing: TrailingConfig,
}

fn require_positive(name: &str, value: f64) -> ConfigResult<()> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ConfigError::ValidationError(format!(
            "{}은(는) 양수여야 합니다: {}",
            name, value
        )));
    }
    Ok(())
}

fn require_ratio(name: &str, value: f64) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{}은(는) 0과 1 사이여야 합니다: {}",
            name, value
        )));
    }
    Ok(())
}

impl ConfigValidation for EngineConfig {
    fn validate(&self) -> ConfigResult<()> {
        require_positive("account.total_capital", self.account.total_capital)?;
        require_ratio("account.max_risk_per_trade", self.account.max_risk_per_trade)?;
        require_ratio("account.max_position_pct", self.account.max_position_pct)?;

        require_positive("sizing.min_premium", self.sizing.min_premium)?;
        require_ratio("sizing.base_risk_pct", self.sizing.base_risk_pct)?;
        require_ratio("sizing.kelly.fractional", self.sizing.kelly.fractional)?;
        if self.sizing.volatility.min_multiplier > self.sizing.volatility.max_multiplier {
            return Err(ConfigError::ValidationError(
                "sizing.volatility: min_multiplier가 max_multiplier보다 큽니다".to_string(),
            ));
        }

        require_ratio("stops.default_pct", self.stops.default_pct)?;
        require_ratio("stops.zero_dte_pct", self.stops.zero_dte_pct)?;
        require_positive("stops.atr_multiplier", self.stops.atr_multiplier)?;

        require_positive("targets.profit_target_r", self.targets.profit_target_r)?;
        require_ratio("targets.runner_remaining_pct", self.targets.runner_remaining_pct)?;

        if self.zones.swing_window == 0 {
            return Err(ConfigError::ValidationError(
                "zones.swing_window은 0보다 커야 합니다".to_string(),
            ));
        }
        require_positive("zones.clustering_pct", self.zones.clustering_pct)?;
        if self.zones.min_touches == 0 {
            return Err(ConfigError::ValidationError(
                "zones.min_touches는 0보다 커야 합니다".to_string(),
            ));
        }

        if self.volume.profile_bins < 2 {
            return Err(ConfigError::ValidationError(
                "volume.profile_bins는 2 이상이어야 합니다".to_string(),
            ));
        }
        require_ratio("volume.value_area_pct", self.volume.value_area_pct)?;
        require_positive("volume.spike_multiplier", self.volume.spike_multiplier)?;

        if self.patterns.lookback == 0 {
            return Err(ConfigError::ValidationError(
                "patterns.lookback은 0보다 커야 합니다".to_string(),
            ));
        }

        if self.trend.adx_period == 0 {
            return Err(ConfigError::ValidationError(
                "trend.adx_period는 0보다 커야 합니다".to_string(),
            ));
        }

        if self.options.sigma_low >= self.options.sigma_high {
            return Err(ConfigError::ValidationError(
                "options: sigma_low는 sigma_high보다 작아야 합니다".to_string(),
            ));
        }
        require_ratio("options.pop_floor", self.options.pop_floor)?;

        require_ratio(
            "exits.breakout_confirmation_pct",
            self.exits.breakout_confirmation_pct,
        )?;
        require_ratio("exits.wick_ratio_threshold", self.exits.wick_ratio_threshold)?;
        require_positive(
            "exits.breakout_volume_multiplier",
            self.exits.breakout_volume_multiplier,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_risk_pct_rejected() {
        let mut config = EngineConfig::default();
        config.account.max_risk_per_trade = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sigma_bounds_rejected() {
        let mut config = EngineConfig::default();
        config.options.sigma_low = 6.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.scoring.base_score, config.scoring.base_score);
        assert_eq!(parsed.targets.scaling_method, config.targets.scaling_method);
    }
}
