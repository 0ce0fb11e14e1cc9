use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt::Display;

/// 엔진 계약 위반 오류
///
/// 상위 협력자의 결함을 나타내는 오류입니다. 조용히 보정하지 않고
/// 생성 시점에 즉시 실패합니다.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 타임스탬프가 단조 증가하지 않는 시계열
    NonMonotonicSeries(String),
    /// 유효하지 않은 트레이드 명세
    InvalidTrade(String),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NonMonotonicSeries(msg) => {
                write!(f, "시계열 순서 오류: {}", msg)
            }
            EngineError::InvalidTrade(msg) => write!(f, "트레이드 명세 오류: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

/// 엔진 연산 결과
pub type EngineResult<T> = Result<T, EngineError>;

/// 일봉/분봉 OHLCV 바
///
/// 외부 수집기가 공급하는 불변 가격 데이터 단위입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> PriceBar {
        PriceBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 몸통 크기 (시가-종가 절대값)
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// 전체 범위 (고가-저가)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// 윗꼬리 길이
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// 아랫꼬리 길이
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// 양봉 여부
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉 여부
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// 대표 가격 (고가+저가+종가)/3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

impl Display for PriceBar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PriceBar(t={}, o={}, h={}, l={}, c={}, v={})",
            self.timestamp, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

/// 옵션 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// 해당 옵션이 수익을 내는 방향
    pub fn direction(&self) -> Direction {
        match self {
            OptionType::Call => Direction::Bullish,
            OptionType::Put => Direction::Bearish,
        }
    }
}

impl Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

/// 시그널 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// 반대 방향 여부
    pub fn opposes(&self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Direction::Bullish, Direction::Bearish) | (Direction::Bearish, Direction::Bullish)
        )
    }
}

/// 평가 대상 트레이드 명세
///
/// 파서 협력자가 공급하는 입력입니다. 프리미엄과 행사가는 양수여야 하며
/// 위반 시 생성이 실패합니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSpec {
    pub ticker: String,
    pub option_type: OptionType,
    pub strike: f64,
    pub premium: f64,
    pub days_to_expiration: u32,
    pub expiration: Option<NaiveDate>,
}

impl TradeSpec {
    /// 새 트레이드 명세 생성
    ///
    /// # Arguments
    /// * `ticker` - 기초자산 심볼
    /// * `option_type` - 옵션 유형 (콜/풋)
    /// * `strike` - 행사가 (양수)
    /// * `premium` - 프리미엄 (양수)
    /// * `days_to_expiration` - 만기까지 일수
    ///
    /// # Returns
    /// * `EngineResult<TradeSpec>` - 생성된 명세 또는 계약 위반 오류
    pub fn new(
        ticker: impl Into<String>,
        option_type: OptionType,
        strike: f64,
        premium: f64,
        days_to_expiration: u32,
    ) -> EngineResult<TradeSpec> {
        if strike <= 0.0 || !strike.is_finite() {
            return Err(EngineError::InvalidTrade(format!(
                "행사가는 양수여야 합니다: {}",
                strike
            )));
        }
        if premium <= 0.0 || !premium.is_finite() {
            return Err(EngineError::InvalidTrade(format!(
                "프리미엄은 양수여야 합니다: {}",
                premium
            )));
        }

        Ok(TradeSpec {
            ticker: ticker.into(),
            option_type,
            strike,
            premium,
            days_to_expiration,
            expiration: None,
        })
    }

    /// 만기일 설정
    pub fn with_expiration(mut self, expiration: NaiveDate) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// 당일 만기(0DTE) 여부. 더 타이트한 리스크 파라미터 적용 대상.
    pub fn is_zero_dte(&self) -> bool {
        self.days_to_expiration == 0
    }

    /// 트레이드가 수익을 내는 방향
    pub fn direction(&self) -> Direction {
        self.option_type.direction()
    }

    /// 현재가 대비 OTM 거리 (%). 콜은 행사가가 위, 풋은 아래일 때 양수.
    pub fn otm_distance_pct(&self, current_price: f64) -> f64 {
        match self.option_type {
            OptionType::Call => (self.strike - current_price) / current_price * 100.0,
            OptionType::Put => (current_price - self.strike) / current_price * 100.0,
        }
    }

    /// 머니니스 라벨 (예: "2.3% OTM call")
    pub fn moneyness_label(&self, current_price: f64) -> String {
        let pct = -self.otm_distance_pct(current_price);
        let side = match self.option_type {
            OptionType::Call => "call",
            OptionType::Put => "put",
        };
        if pct >= 0.0 {
            format!("{:.1}% ITM {}", pct.abs(), side)
        } else {
            format!("{:.1}% OTM {}", pct.abs(), side)
        }
    }
}

impl Display for TradeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ${} @ ${:.2} ({}DTE)",
            self.ticker, self.option_type, self.strike, self.premium, self.days_to_expiration
        )
    }
}

/// 플래그 심각도
///
/// 높은 심각도가 먼저 정렬되도록 순서를 부여합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FlagSeverity {
    High,
    Medium,
    Low,
}

impl Display for FlagSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagSeverity::High => write!(f, "high"),
            FlagSeverity::Medium => write!(f, "medium"),
            FlagSeverity::Low => write!(f, "low"),
        }
    }
}

/// 분석 플래그
///
/// 각 분석 컴포넌트가 독립적으로 생성하는 데이터입니다. 예외가 아니며
/// 중복 제거 없이 모두 전달됩니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flag {
    pub severity: FlagSeverity,
    pub category: String,
    pub message: String,
}

impl Flag {
    pub fn high(category: impl Into<String>, message: impl Into<String>) -> Flag {
        Flag {
            severity: FlagSeverity::High,
            category: category.into(),
            message: message.into(),
        }
    }

    pub fn medium(category: impl Into<String>, message: impl Into<String>) -> Flag {
        Flag {
            severity: FlagSeverity::Medium,
            category: category.into(),
            message: message.into(),
        }
    }

    pub fn low(category: impl Into<String>, message: impl Into<String>) -> Flag {
        Flag {
            severity: FlagSeverity::Low,
            category: category.into(),
            message: message.into(),
        }
    }
}

impl Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)
    }
}

/// 청산 완료된 과거 트레이드 기록
///
/// 저널 협력자가 소유하며 읽기 전용 시퀀스로 전달됩니다.
/// 켈리 기준 및 자산 곡선 기반 사이징에 사용됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClosedTrade {
    /// 실현 손익 (달러)
    pub pnl: f64,
    /// 초기 리스크 대비 손익 배수
    pub r_multiple: f64,
}

impl ClosedTrade {
    pub fn new(pnl: f64, r_multiple: f64) -> ClosedTrade {
        ClosedTrade { pnl, r_multiple }
    }

    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

/// 협력자가 공급하는 옵션 호가 스냅샷
///
/// 필드가 부분적으로 비어 있을 수 있습니다. 비어 있는 필드는 해당
/// 필드에 의존하는 플래그/점수 항목만 생략시키고, 전체 분석을
/// 실패시키지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionQuote {
    /// 연환산 내재변동성 (소수, 예: 0.25)
    pub implied_vol: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    /// 최종 체결가
    pub last: Option<f64>,
    /// 당일 옵션 거래량
    pub volume: Option<u64>,
    pub open_interest: Option<u64>,
    pub delta: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
}

impl OptionQuote {
    /// 호가 스프레드 비율 (중간가 대비). bid/ask 없으면 None.
    pub fn spread_pct(&self) -> Option<f64> {
        let bid = self.bid?;
        let ask = self.ask?;
        let mid = (bid + ask) / 2.0;
        if mid <= 0.0 {
            return None;
        }
        Some((ask - bid) / mid * 100.0)
    }
}
