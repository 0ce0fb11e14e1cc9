// 옵션 분석 모듈
// 블랙-숄즈 가격/그릭스, 수익 확률, IV 역산과 IV 랭크를 제공합니다.

pub mod black_scholes;
pub mod iv;

pub use black_scholes::{Greeks, OptionSnapshot};
pub use iv::IVRankResult;
