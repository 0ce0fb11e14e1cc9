use crate::config::ZoneConfig;
use crate::model::{Flag, OptionType, PriceBar, TradeSpec};
use crate::series::PriceSeries;
use serde::Serialize;
use std::fmt::Display;

/// 스윙 포인트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwingKind {
    High,
    Low,
}

/// 스윙 포인트
///
/// ±W 바 윈도우 내에서 최고가/최저가인 바입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub volume: f64,
    pub kind: SwingKind,
}

/// 존 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZoneKind {
    Support,
    Resistance,
}

impl Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneKind::Support => write!(f, "support"),
            ZoneKind::Resistance => write!(f, "resistance"),
        }
    }
}

/// 지지/저항 존
///
/// 스윙 포인트를 거리 임계값으로 클러스터링한 가격 밴드입니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    /// 터치 가중 평균 가격
    pub price: f64,
    pub kind: ZoneKind,
    /// 터치 횟수
    pub touches: usize,
    /// 기여 바의 누적 거래량
    pub volume: f64,
    /// 존 강도 (0-100)
    pub strength: f64,
    /// 마지막 터치 바 인덱스
    pub last_touch_index: usize,
    pub range_low: f64,
    pub range_high: f64,
}

impl Zone {
    /// 현재가 대비 거리 (%)
    pub fn distance_pct(&self, current_price: f64) -> f64 {
        if current_price == 0.0 {
            return 0.0;
        }
        (self.price - current_price).abs() / current_price * 100.0
    }

    /// 강한 존 여부 (터치 3회 이상, 강도 70 이상)
    pub fn is_strong(&self) -> bool {
        self.touches >= 3 && self.strength >= 70.0
    }
}

impl Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Zone({} ${:.2}, touches: {}, strength: {:.0})",
            self.kind, self.price, self.touches, self.strength
        )
    }
}

/// 존 분석 결과
///
/// 한쪽 방향의 존이 비어 있는 것은 정상적인 저신뢰 입력이며
/// 오류가 아닙니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ZoneAnalysis {
    /// 현재가 아래 지지 존 (가까운 순)
    pub support_zones: Vec<Zone>,
    /// 현재가 위 저항 존 (가까운 순)
    pub resistance_zones: Vec<Zone>,
    pub swing_high_count: usize,
    pub swing_low_count: usize,
}

impl ZoneAnalysis {
    /// 가장 가까운 지지 존
    pub fn nearest_support(&self) -> Option<&Zone> {
        self.support_zones.first()
    }

    /// 가장 가까운 저항 존
    pub fn nearest_resistance(&self) -> Option<&Zone> {
        self.resistance_zones.first()
    }

    /// 기준 레벨보다 위에 있는 다음 저항 존
    pub fn next_resistance_above(&self, level: f64) -> Option<&Zone> {
        self.resistance_zones
            .iter()
            .filter(|z| z.price > level)
            .min_by(|a, b| a.price.partial_cmp(&b.price).unwrap())
    }

    /// 기준 레벨보다 아래에 있는 다음 지지 존
    pub fn next_support_below(&self, level: f64) -> Option<&Zone> {
        self.support_zones
            .iter()
            .filter(|z| z.price < level)
            .max_by(|a, b| a.price.partial_cmp(&b.price).unwrap())
    }
}

/// 클러스터링 전 개별 레벨
#[derive(Debug, Clone, Copy)]
struct Level {
    price: f64,
    volume: f64,
    index: usize,
}

/// 스윙/존 분석기
///
/// 스윙 포인트를 찾아 지지/저항 존으로 클러스터링하고 강도를 매깁니다.
#[derive(Debug)]
pub struct SwingZoneAnalyzer {
    window: usize,
    lookback_bars: usize,
    min_touches: usize,
    clustering_pct: f64,
    max_levels: usize,
}

impl SwingZoneAnalyzer {
    /// 새 스윙/존 분석기 생성
    pub fn new(config: &ZoneConfig) -> SwingZoneAnalyzer {
        SwingZoneAnalyzer {
            window: config.swing_window,
            lookback_bars: config.lookback_bars,
            min_touches: config.min_touches,
            clustering_pct: config.clustering_pct,
            max_levels: config.max_levels,
        }
    }

    /// 존 분석 수행
    ///
    /// # Arguments
    /// * `series` - 가격 시계열
    /// * `current_price` - 현재 기초자산 가격
    /// * `atr` - ATR 값 (있으면 클러스터링 거리에 0.5×ATR 병용)
    ///
    /// # Returns
    /// * `ZoneAnalysis` - 바가 2×W+1개 미만이면 빈 결과
    pub fn analyze(
        &self,
        series: &PriceSeries,
        current_price: f64,
        atr: Option<f64>,
    ) -> ZoneAnalysis {
        let bars = series.tail(self.lookback_bars);
        if bars.len() < self.window * 2 + 1 {
            log::debug!(
                "존 분석에 바가 부족합니다: {} < {}",
                bars.len(),
                self.window * 2 + 1
            );
            return ZoneAnalysis::default();
        }

        let (swing_highs, swing_lows) = self.find_swing_points(bars);
        let swing_high_count = swing_highs.len();
        let swing_low_count = swing_lows.len();

        let resistance_levels: Vec<Level> = swing_highs
            .iter()
            .map(|s| Level {
                price: s.price,
                volume: s.volume,
                index: s.index,
            })
            .collect();
        let support_levels: Vec<Level> = swing_lows
            .iter()
            .map(|s| Level {
                price: s.price,
                volume: s.volume,
                index: s.index,
            })
            .collect();

        let mut resistance_zones =
            self.cluster_levels(&resistance_levels, ZoneKind::Resistance, atr, bars.len());
        let mut support_zones =
            self.cluster_levels(&support_levels, ZoneKind::Support, atr, bars.len());

        // 최소 터치 미달 존 제거
        resistance_zones.retain(|z| z.touches >= self.min_touches);
        support_zones.retain(|z| z.touches >= self.min_touches);

        // 현재가 기준으로 지지(아래)/저항(위) 분리
        support_zones.retain(|z| z.price < current_price);
        resistance_zones.retain(|z| z.price > current_price);

        // 강도순 상위 max_levels개만 남긴 뒤 거리순 정렬
        support_zones.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap());
        resistance_zones.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap());
        support_zones.truncate(self.max_levels);
        resistance_zones.truncate(self.max_levels);

        support_zones.sort_by(|a, b| {
            (current_price - a.price)
                .partial_cmp(&(current_price - b.price))
                .unwrap()
        });
        resistance_zones.sort_by(|a, b| {
            (a.price - current_price)
                .partial_cmp(&(b.price - current_price))
                .unwrap()
        });

        log::debug!(
            "존 분석 완료: 지지 {}개, 저항 {}개 (스윙 {}H/{}L)",
            support_zones.len(),
            resistance_zones.len(),
            swing_high_count,
            swing_low_count
        );

        ZoneAnalysis {
            support_zones,
            resistance_zones,
            swing_high_count,
            swing_low_count,
        }
    }

    /// 스윙 고점/저점 탐지
    ///
    /// 바가 앞뒤 W개 바의 고가(저가)보다 엄격하게 높(낮)으면 스윙으로
    /// 판정합니다. 단조 구간에는 내부 극값이 없습니다.
    fn find_swing_points(&self, bars: &[PriceBar]) -> (Vec<SwingPoint>, Vec<SwingPoint>) {
        let mut highs = Vec::new();
        let mut lows = Vec::new();
        let w = self.window;

        for i in w..bars.len() - w {
            let current_high = bars[i].high;
            let is_swing_high = (i - w..i)
                .chain(i + 1..=i + w)
                .all(|j| bars[j].high < current_high);
            if is_swing_high {
                highs.push(SwingPoint {
                    index: i,
                    price: current_high,
                    volume: bars[i].volume,
                    kind: SwingKind::High,
                });
            }

            let current_low = bars[i].low;
            let is_swing_low = (i - w..i)
                .chain(i + 1..=i + w)
                .all(|j| bars[j].low > current_low);
            if is_swing_low {
                lows.push(SwingPoint {
                    index: i,
                    price: current_low,
                    volume: bars[i].volume,
                    kind: SwingKind::Low,
                });
            }
        }

        (highs, lows)
    }

    /// 인접 레벨을 존으로 클러스터링
    ///
    /// 가격순으로 정렬한 뒤 거리(% 또는 0.5×ATR) 이내 레벨을 탐욕적으로
    /// 병합합니다. 같은 종류의 존은 클러스터링 후 겹치지 않습니다.
    fn cluster_levels(
        &self,
        levels: &[Level],
        kind: ZoneKind,
        atr: Option<f64>,
        total_bars: usize,
    ) -> Vec<Zone> {
        if levels.is_empty() {
            return Vec::new();
        }

        let mut sorted: Vec<Level> = levels.to_vec();
        sorted.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap());

        let mut zones = Vec::new();
        let mut cluster: Vec<Level> = vec![sorted[0]];

        for level in sorted.iter().skip(1) {
            let prev_price = cluster.last().unwrap().price;
            let pct_distance = (level.price - prev_price).abs() / prev_price * 100.0;
            let within_pct = pct_distance <= self.clustering_pct;
            let within_atr = atr
                .map(|a| a > 0.0 && (level.price - prev_price).abs() <= 0.5 * a)
                .unwrap_or(false);

            if within_pct || within_atr {
                cluster.push(*level);
            } else {
                zones.push(self.build_zone(&cluster, kind, total_bars));
                cluster = vec![*level];
            }
        }
        zones.push(self.build_zone(&cluster, kind, total_bars));

        zones
    }

    /// 클러스터에서 존 생성
    fn build_zone(&self, cluster: &[Level], kind: ZoneKind, total_bars: usize) -> Zone {
        let touches = cluster.len();
        let total_volume: f64 = cluster.iter().map(|l| l.volume).sum();
        // 터치 가중 평균 (터치당 가중치 1)
        let weighted_price =
            cluster.iter().map(|l| l.price).sum::<f64>() / touches as f64;
        let last_touch_index = cluster.iter().map(|l| l.index).max().unwrap_or(0);
        let range_low = cluster
            .iter()
            .map(|l| l.price)
            .fold(f64::INFINITY, f64::min);
        let range_high = cluster
            .iter()
            .map(|l| l.price)
            .fold(f64::NEG_INFINITY, f64::max);

        let strength =
            zone_strength(touches, total_volume / touches as f64, last_touch_index, total_bars);

        Zone {
            price: weighted_price,
            kind,
            touches,
            volume: total_volume,
            strength,
            last_touch_index,
            range_low,
            range_high,
        }
    }

    /// 존 컴포넌트의 레드/그린 플래그 생성
    ///
    /// 콜은 저항 근접이 레드, 지지 확보가 그린입니다. 풋은 반대입니다.
    pub fn flags(
        &self,
        analysis: &ZoneAnalysis,
        trade: &TradeSpec,
        current_price: f64,
    ) -> (Vec<Flag>, Vec<Flag>) {
        let mut red = Vec::new();
        let mut green = Vec::new();

        match trade.option_type {
            OptionType::Call => {
                if let Some(resistance) = analysis.nearest_resistance() {
                    let distance = resistance.distance_pct(current_price);
                    if distance < 1.0 {
                        red.push(Flag::high(
                            "resistance",
                            format!(
                                "At resistance ${:.2} (strength: {:.0}) - likely rejection",
                                resistance.price, resistance.strength
                            ),
                        ));
                    } else if distance < 2.0 {
                        red.push(Flag::medium(
                            "resistance",
                            format!(
                                "Near resistance ${:.2} - overhead supply",
                                resistance.price
                            ),
                        ));
                    }
                }
                if let Some(support) = analysis.nearest_support() {
                    if support.distance_pct(current_price) < 2.0 {
                        green.push(Flag::low(
                            "support",
                            format!(
                                "Good support at ${:.2} (strength: {:.0})",
                                support.price, support.strength
                            ),
                        ));
                    }
                }
            }
            OptionType::Put => {
                if let Some(support) = analysis.nearest_support() {
                    let distance = support.distance_pct(current_price);
                    if distance < 1.0 {
                        red.push(Flag::high(
                            "support",
                            format!(
                                "At support ${:.2} (strength: {:.0}) - may bounce",
                                support.price, support.strength
                            ),
                        ));
                    } else if distance < 2.0 {
                        red.push(Flag::medium(
                            "support",
                            format!("Near support ${:.2} - demand below", support.price),
                        ));
                    }
                }
                if let Some(resistance) = analysis.nearest_resistance() {
                    if resistance.distance_pct(current_price) < 2.0 {
                        green.push(Flag::low(
                            "resistance",
                            format!(
                                "Resistance overhead at ${:.2} (strength: {:.0})",
                                resistance.price, resistance.strength
                            ),
                        ));
                    }
                }
            }
        }

        (red, green)
    }
}

/// 존 강도 점수 (0-100)
///
/// 터치 횟수(최대 40) + 거래량(최대 30, 로그 스케일) +
/// 최근성(최대 30, 마지막 터치 이후 바 수로 감쇠).
pub fn zone_strength(
    touches: usize,
    avg_volume: f64,
    last_touch_index: usize,
    total_bars: usize,
) -> f64 {
    let mut score = 0.0;

    // 터치 성분 (0-40점)
    score += ((touches * 10) as f64).min(40.0);

    // 거래량 성분 (0-30점, 로그 스케일)
    if avg_volume > 0.0 {
        score += ((avg_volume + 1.0).log10() * 5.0).min(30.0);
    }

    // 최근성 성분 (0-30점)
    let bars_ago = total_bars.saturating_sub(last_touch_index);
    score += if bars_ago < 7 {
        30.0
    } else if bars_ago < 30 {
        20.0
    } else if bars_ago < 60 {
        10.0
    } else {
        5.0
    };

    score.min(100.0)
}
