// 리스크/플랜 엔진 모듈
// 포지션 사이징, 손절/목표가, 고/노고 판정, 동적 청산 조정을 제공합니다.

pub mod exit;
pub mod plan;
pub mod position_sizer;
pub mod trailing_stop;

pub use exit::{ExitAction, ExitAdjuster, ExitAdjustment};
pub use plan::{GoNoGo, PositionSize, RiskEngine, TradePlan};
pub use position_sizer::{PositionSizer, SizingResult};
pub use trailing_stop::{TrailingStop, TrailingStopManager};
