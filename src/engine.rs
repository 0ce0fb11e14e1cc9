use crate::analyzer::pattern::{Pattern, PatternAnalyzer};
use crate::analyzer::swing_zone::{SwingZoneAnalyzer, Zone, ZoneAnalysis};
use crate::analyzer::trend::{TrendAnalyzer, TrendState};
use crate::analyzer::volume::{VolumeAnalysis, VolumeAnalyzer};
use crate::config::EngineConfig;
use crate::indicator::atr::ATRBuilder;
use crate::indicator::ma::{EMABuilder, MA, SMABuilder};
use crate::indicator::macd::MACDBuilder;
use crate::indicator::rsi::RSIBuilder;
use crate::model::{ClosedTrade, Flag, OptionQuote, OptionType, TradeSpec};
use crate::options::black_scholes::{self, Greeks, OptionSnapshot, days_to_years};
use crate::options::iv::{self, IVRankResult};
use crate::risk::exit::{ExitAdjuster, ExitAdjustment};
use crate::risk::plan::{PlanContext, RiskEngine, TradePlan};
use crate::risk::position_sizer::{PositionSizer, SizingResult};
use crate::scorer::{SetupScore, SetupScorer};
use serde::Serialize;

/// 트레이드 분석 결과
///
/// 모든 필드는 평탄한 레코드로 직렬화 가능하며, CLI 리포트·JSON API·UI
/// 등 출력 형식에 대한 지식 없이 소비자에게 전달됩니다. 생략되거나
/// degraded된 계산은 `notes`에 사람이 읽을 수 있는 형태로 남습니다.
#[derive(Debug, Clone, Serialize)]
pub struct TradeAnalysis {
    pub score: SetupScore,
    pub plan: TradePlan,
    /// 복합 사이징 결과 (켈리/IV/품질 반영)
    pub sizing: SizingResult,
    pub trend: TrendState,
    pub zones: ZoneAnalysis,
    pub patterns: Vec<Pattern>,
    pub volume: VolumeAnalysis,
    pub greeks: Option<Greeks>,
    pub iv_rank: Option<IVRankResult>,
    /// 연환산 실현 변동성
    pub realized_vol: Option<f64>,
    pub atr: Option<f64>,
    /// degraded/생략된 계산에 대한 가시적 메모
    pub notes: Vec<String>,
}

/// 셋업 스코어링 & 리스크 플랜 엔진
///
/// 불변 입력에 대한 순수 계산이며 내부 I/O와 공유 가변 상태가
/// 없습니다. 독립적인 트레이드에 대해 동기화 없이 여러 스레드에서
/// 동시에 호출해도 안전합니다.
#[derive(Debug)]
pub struct SetupEngine {
    config: EngineConfig,
    zone_analyzer: SwingZoneAnalyzer,
    volume_analyzer: VolumeAnalyzer,
    pattern_analyzer: PatternAnalyzer,
    trend_analyzer: TrendAnalyzer,
    scorer: SetupScorer,
    risk_engine: RiskEngine,
    position_sizer: PositionSizer,
    exit_adjuster: ExitAdjuster,
}

impl SetupEngine {
    /// 새 엔진 생성
    ///
    /// 설정은 생성 시점에 각 컴포넌트로 복사되며 이후 변경되지
    /// 않습니다.
    pub fn new(config: EngineConfig) -> SetupEngine {
        SetupEngine {
            zone_analyzer: SwingZoneAnalyzer::new(&config.zones),
            volume_analyzer: VolumeAnalyzer::new(&config.volume),
            pattern_analyzer: PatternAnalyzer::new(&config.patterns),
            trend_analyzer: TrendAnalyzer::new(&config.trend),
            scorer: SetupScorer::new(&config),
            risk_engine: RiskEngine::new(&config),
            position_sizer: PositionSizer::new(&config),
            exit_adjuster: ExitAdjuster::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 트레이드 평가 수행
    ///
    /// 입력 부족은 해당 하위 기능만 degraded 값으로 만들고 전체 분석을
    /// 중단하지 않습니다.
    ///
    /// # Arguments
    /// * `trade` - 트레이드 명세
    /// * `series` - 기초자산 가격 시계열
    /// * `quote` - 옵션 호가 스냅샷 (부분 결측 허용)
    /// * `historical_ivs` - 재계산된 일일 IV 시계열 (수집은 협력자 몫)
    /// * `history` - 청산 완료 트레이드 기록 (켈리 사이징용)
    /// * `open_positions` - 현재 열린 포지션 수
    pub fn analyze(
        &self,
        trade: &TradeSpec,
        series: &crate::series::PriceSeries,
        quote: Option<&OptionQuote>,
        historical_ivs: &[f64],
        history: &[ClosedTrade],
        open_positions: usize,
    ) -> TradeAnalysis {
        let mut notes = Vec::new();
        let current_price = match series.last() {
            Some(bar) => bar.close,
            None => {
                notes.push("No price history - price-action features unavailable".to_string());
                0.0
            }
        };

        // 1-5. 가격 행동 피처 추출
        let atr = ATRBuilder::new(14).build(series.bars()).map(|a| a.value);
        let zones = self.zone_analyzer.analyze(series, current_price, atr);
        let volume = self.volume_analyzer.analyze(series, current_price);
        let patterns = self.pattern_analyzer.analyze(series);
        let trend = self.trend_analyzer.analyze(series);

        if zones.support_zones.is_empty() {
            notes.push("No support zones found".to_string());
        }
        if zones.resistance_zones.is_empty() {
            notes.push("No resistance zones found".to_string());
        }
        if trend.adx.is_none() {
            notes.push("ADX unavailable (insufficient bars) - structure-only trend".to_string());
        }

        // 6. 옵션 분석
        let greeks = self.compute_greeks(trade, quote, current_price, &mut notes);
        let iv_rank = self.compute_iv_rank(quote, historical_ivs, &mut notes);
        let realized_vol =
            iv::realized_volatility(series, self.config.options.realized_vol_window);
        if realized_vol.is_none() {
            notes.push("Realized volatility unavailable (insufficient bars)".to_string());
        }

        // 컴포넌트별 플래그 수집 (중복 제거 없음)
        let mut red_flags = Vec::new();
        let mut green_flags = Vec::new();

        let (r, g) = self.zone_analyzer.flags(&zones, trade, current_price);
        red_flags.extend(r);
        green_flags.extend(g);

        let (r, g) = self.volume_analyzer.flags(&volume);
        red_flags.extend(r);
        green_flags.extend(g);

        let (r, g) = self.pattern_analyzer.flags(&patterns, trade);
        red_flags.extend(r);
        green_flags.extend(g);

        let (r, g) = self.trend_analyzer.flags(&trend, trade);
        red_flags.extend(r);
        green_flags.extend(g);

        let (r, g) = self.technical_flags(trade, series, current_price);
        red_flags.extend(r);
        green_flags.extend(g);

        let (r, g) = self.quote_flags(
            trade,
            quote,
            greeks.as_ref(),
            iv_rank.as_ref(),
            realized_vol,
            series,
        );
        red_flags.extend(r);
        green_flags.extend(g);

        // 7. 셋업 점수
        let score = self.scorer.score(
            trade,
            current_price,
            &trend,
            &zones,
            &patterns,
            red_flags,
            green_flags,
        );

        // 8. 리스크 플랜
        let delta = quote
            .and_then(|q| q.delta)
            .or_else(|| greeks.as_ref().map(|g| g.delta));
        let snapshot = self.build_snapshot(trade, quote, current_price);
        let ctx = PlanContext {
            atr,
            delta,
            zones: Some(&zones),
            snapshot: snapshot.as_ref(),
            current_price: if current_price > 0.0 {
                Some(current_price)
            } else {
                None
            },
            open_positions,
        };
        let plan = self.risk_engine.create_trade_plan(trade, &ctx);

        let sizing = self.position_sizer.calculate(
            trade.premium,
            plan.stop_loss,
            score.breakdown.final_score,
            history,
            iv_rank.and_then(|r| r.rank_pct),
            0.0,
        );

        TradeAnalysis {
            score,
            plan,
            sizing,
            trend,
            zones,
            patterns,
            volume,
            greeks,
            iv_rank,
            realized_vol,
            atr,
            notes,
        }
    }

    /// 동적 청산 조정 검사
    ///
    /// 폴링 주기마다 독립적으로 호출되는 무상태 검사입니다.
    pub fn check_exit(
        &self,
        series: &crate::series::PriceSeries,
        trade: &TradeSpec,
        remaining_contracts: u32,
        current_price: f64,
        watched_zone: &Zone,
        zones: &ZoneAnalysis,
    ) -> ExitAdjustment {
        self.exit_adjuster.check(
            series,
            trade,
            remaining_contracts,
            current_price,
            watched_zone,
            zones,
        )
    }

    /// 스냅샷 구성 (IV/현재가/만기 중 하나라도 없으면 None)
    fn build_snapshot(
        &self,
        trade: &TradeSpec,
        quote: Option<&OptionQuote>,
        current_price: f64,
    ) -> Option<OptionSnapshot> {
        let implied_vol = quote?.implied_vol?;
        if current_price <= 0.0 || trade.days_to_expiration == 0 {
            return None;
        }
        Some(OptionSnapshot::new(
            current_price,
            trade.strike,
            trade.option_type,
            days_to_years(trade.days_to_expiration),
            implied_vol,
            self.config.options.risk_free_rate,
        ))
    }

    /// 그릭스 계산. 스냅샷을 만들 수 없으면 None + 메모.
    fn compute_greeks(
        &self,
        trade: &TradeSpec,
        quote: Option<&OptionQuote>,
        current_price: f64,
        notes: &mut Vec<String>,
    ) -> Option<Greeks> {
        let snapshot = match self.build_snapshot(trade, quote, current_price) {
            Some(s) => s,
            None => {
                notes.push("Greeks unavailable (no IV/price/expiry inputs)".to_string());
                return None;
            }
        };

        let breakeven = match trade.option_type {
            OptionType::Call => trade.strike + trade.premium,
            OptionType::Put => trade.strike - trade.premium,
        };

        black_scholes::greeks(&snapshot, breakeven)
    }

    /// IV 랭크 계산. 현재 IV가 없으면 None + 메모, 샘플 부족이면
    /// rank_pct가 None인 결과 + 메모.
    fn compute_iv_rank(
        &self,
        quote: Option<&OptionQuote>,
        historical_ivs: &[f64],
        notes: &mut Vec<String>,
    ) -> Option<IVRankResult> {
        let current_iv = match quote.and_then(|q| q.implied_vol) {
            Some(iv) => iv,
            None => {
                notes.push("IV Rank: N/A (no current IV in quote)".to_string());
                return None;
            }
        };

        let result = iv::iv_rank(
            current_iv,
            historical_ivs,
            self.config.options.min_historical_samples,
        );
        if result.rank_pct.is_none() {
            notes.push(format!(
                "IV Rank: N/A ({} samples < {} minimum)",
                result.sample_count, self.config.options.min_historical_samples
            ));
        }
        Some(result)
    }

    /// 기술적 컨플루언스 플래그 (RSI, MACD, 이동평균)
    ///
    /// 바가 부족한 지표는 해당 검사만 조용히 건너뜁니다.
    fn technical_flags(
        &self,
        trade: &TradeSpec,
        series: &crate::series::PriceSeries,
        current_price: f64,
    ) -> (Vec<Flag>, Vec<Flag>) {
        let mut red = Vec::new();
        let mut green = Vec::new();
        let bars = series.bars();
        let bullish_trade = trade.option_type == OptionType::Call;

        // RSI(14): 과매수는 하락 반전 위험, 과매도는 반등 가능성
        if bars.len() >= 15 {
            let rsi = RSIBuilder::new(14).build(bars);
            if rsi.is_overbought(None) {
                let msg = format!("RSI {:.0} overbought - reversal risk", rsi.value);
                if bullish_trade {
                    red.push(Flag::medium("rsi", msg));
                } else {
                    green.push(Flag::low("rsi", msg));
                }
            } else if rsi.is_oversold(None) {
                let msg = format!("RSI {:.0} oversold - bounce potential", rsi.value);
                if bullish_trade {
                    green.push(Flag::low("rsi", msg));
                } else {
                    red.push(Flag::medium("rsi", msg));
                }
            }
        }

        // MACD(12,26,9): 시그널 라인 대비 모멘텀 방향
        if let Some(macd) = MACDBuilder::new(12, 26, 9).build(bars) {
            if macd.is_bullish() {
                if bullish_trade {
                    green.push(Flag::low("macd", "MACD bullish (above signal line)"));
                } else {
                    red.push(Flag::low("macd", "MACD bullish against put entry"));
                }
            } else if macd.is_bearish() {
                if bullish_trade {
                    red.push(Flag::low("macd", "MACD bearish (below signal line)"));
                } else {
                    green.push(Flag::low("macd", "MACD bearish (below signal line)"));
                }
            }
        }

        // 이동평균 정렬: 단기 20 EMA, 중기 50 SMA
        let above_ema20 = EMABuilder::new(20)
            .build(bars)
            .map(|ema| current_price > ema.get());
        let above_sma50 = SMABuilder::new(50)
            .build(bars)
            .map(|sma| current_price > sma.get());

        match (above_ema20, above_sma50) {
            (Some(true), Some(true)) => {
                if bullish_trade {
                    green.push(Flag::low("ma", "Price above 20 EMA and 50 SMA"));
                } else {
                    red.push(Flag::low("ma", "Price above 20 EMA and 50 SMA"));
                }
            }
            (Some(false), Some(false)) => {
                if bullish_trade {
                    red.push(Flag::low("ma", "Price below 20 EMA and 50 SMA"));
                } else {
                    green.push(Flag::low("ma", "Price below 20 EMA and 50 SMA"));
                }
            }
            _ => {}
        }

        (red, green)
    }

    /// 호가 스냅샷/옵션 분석에서 파생되는 플래그
    ///
    /// 결측 필드는 해당 필드에 의존하는 검사만 건너뜁니다.
    fn quote_flags(
        &self,
        trade: &TradeSpec,
        quote: Option<&OptionQuote>,
        greeks: Option<&Greeks>,
        iv_rank: Option<&IVRankResult>,
        realized_vol: Option<f64>,
        series: &crate::series::PriceSeries,
    ) -> (Vec<Flag>, Vec<Flag>) {
        let mut red = Vec::new();
        let mut green = Vec::new();
        let opts = &self.config.options;

        // DTE 리스크
        if trade.days_to_expiration <= 3 {
            red.push(Flag::medium(
                "dte",
                format!(
                    "Short DTE ({}d) - high theta decay risk",
                    trade.days_to_expiration
                ),
            ));
        } else if trade.days_to_expiration >= 7 {
            green.push(Flag::low(
                "dte",
                format!("Good time buffer ({}d)", trade.days_to_expiration),
            ));
        }

        // 프리미엄 건전성
        if trade.premium >= 1.0 {
            green.push(Flag::low(
                "premium",
                "Healthy premium for position sizing",
            ));
        }

        // 최근 5일 모멘텀
        if let Some(change) = series.pct_change(5) {
            let favorable = match trade.option_type {
                OptionType::Call => change > 3.0,
                OptionType::Put => change < -3.0,
            };
            let adverse = match trade.option_type {
                OptionType::Call => change < -3.0,
                OptionType::Put => change > 3.0,
            };
            if favorable {
                green.push(Flag::low(
                    "momentum",
                    format!("Strong 5-day momentum: {:+.1}%", change),
                ));
            } else if adverse {
                red.push(Flag::medium(
                    "momentum",
                    format!("Against momentum: {:+.1}% (5d)", change),
                ));
            }
        }

        let Some(quote) = quote else {
            return (red, green);
        };

        // 호가 스프레드
        if let Some(spread) = quote.spread_pct() {
            if spread > 10.0 {
                red.push(Flag::medium(
                    "liquidity",
                    format!("Spread too wide ({:.0}% of mid) - slippage risk", spread),
                ));
            }
        }

        // 체결가 대비 프리미엄 괴리 (스테일 알림)
        if let Some(last) = quote.last {
            let diff_pct = (last - trade.premium) / trade.premium * 100.0;
            if diff_pct.abs() > 20.0 {
                red.push(Flag::medium(
                    "stale_quote",
                    format!(
                        "Pasted premium differs {:+.0}% from live price - alert may be stale",
                        diff_pct
                    ),
                ));
            }
        }

        // 미결제약정 유동성 (결측이면 검사 생략)
        if let Some(oi) = quote.open_interest {
            if oi < 100 {
                red.push(Flag::medium(
                    "liquidity",
                    format!("Low open interest ({}) - exit liquidity risk", oi),
                ));
            }
        }

        // 수익 확률 하한
        if let Some(greeks) = greeks {
            if greeks.probability_of_profit < opts.pop_floor {
                red.push(Flag::high(
                    "probability",
                    format!(
                        "PoP {:.0}% below {:.0}% floor",
                        greeks.probability_of_profit * 100.0,
                        opts.pop_floor * 100.0
                    ),
                ));
            }

            if black_scholes::theta_high_decay_risk(
                Some(greeks.theta),
                opts.theta_decay_threshold,
            ) {
                red.push(Flag::low(
                    "theta",
                    format!("High theta decay ({:.4}/day)", greeks.theta),
                ));
            }
            if black_scholes::vega_high_risk(Some(greeks.vega), opts.vega_risk_threshold) {
                red.push(Flag::low(
                    "vega",
                    format!("High vega ({:.2}) - sensitive to IV changes", greeks.vega),
                ));
            }
        }

        // IV 랭크 극단
        if let Some(rank) = iv_rank.and_then(|r| r.rank_pct) {
            if rank >= opts.iv_rank_high {
                red.push(Flag::medium(
                    "iv_rank",
                    format!("High IV rank ({:.0}) - overpriced, crush risk", rank),
                ));
            } else if rank <= opts.iv_rank_low {
                green.push(Flag::low(
                    "iv_rank",
                    format!("Low IV rank ({:.0}) - favorable for buys", rank),
                ));
            }
        }

        // IV 대 실현 변동성
        if let (Some(iv), Some(rv)) = (quote.implied_vol, realized_vol) {
            if iv > rv * 1.2 {
                red.push(Flag::low(
                    "volatility",
                    "IV above realized - options rich vs recent vol",
                ));
            } else if iv < rv * 0.8 {
                green.push(Flag::low(
                    "volatility",
                    "IV below realized - options cheap vs recent vol",
                ));
            }
        }

        (red, green)
    }
}
