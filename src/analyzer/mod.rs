// 가격 행동 분석기 모듈
// 스윙/존 탐지, 거래량 분석, 캔들 패턴, 추세 분석을 제공합니다.

pub mod pattern;
pub mod swing_zone;
pub mod trend;
pub mod volume;
