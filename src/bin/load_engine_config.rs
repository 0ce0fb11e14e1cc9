use log::{debug, error, info, warn};
use std::env;
use std::path::PathBuf;
use trade_setup_engine::config::EngineConfig;
use trade_setup_engine::config_loader::{ConfigFormat, ConfigLoader};

fn main() {
    // 로그 초기화
    env_logger::init();

    info!("엔진 설정 로더 시작");

    // 커맨드 라인 인수 파싱
    let args: Vec<String> = env::args().collect();
    debug!("커맨드 라인 인수: {:?}", args);

    if args.len() < 2 {
        error!("인수가 충분하지 않습니다. 설정 파일 경로가 필요합니다.");
        println!("사용법: {} <설정_파일_경로>", args[0]);
        println!("지원 형식: TOML(.toml), JSON(.json)");
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    if !config_path.exists() {
        warn!("설정 파일이 존재하지 않습니다: {}", config_path.display());
        println!(
            "경고: 설정 파일이 존재하지 않습니다: {}",
            config_path.display()
        );
        println!("기본 설정을 출력합니다.");
        match toml::to_string_pretty(&EngineConfig::default()) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("기본 설정 직렬화 실패: {}", e),
        }
        return;
    }

    info!("설정 파일: {}", config_path.display());
    println!("설정 파일: {}", config_path.display());

    // 설정 파일 로드 및 유효성 검사
    match ConfigLoader::load_from_file::<EngineConfig>(&config_path, ConfigFormat::Auto) {
        Ok(config) => {
            info!("설정 로드 성공");
            println!("설정 로드 성공:");
            println!(
                "  자본 ${:.0}, 트레이드당 리스크 {:.1}%, 최대 포지션 {}개",
                config.account.total_capital,
                config.account.max_risk_per_trade * 100.0,
                config.account.max_open_positions
            );
            println!(
                "  점수 기준점 {:.0}, 목표 {}R, 손절 {:.0}%",
                config.scoring.base_score,
                config.targets.profit_target_r,
                config.stops.default_pct * 100.0
            );
        }
        Err(err) => {
            let error_msg = format!("설정 로드 실패: {}", err);
            error!("{}", error_msg);
            println!("{}", error_msg);

            // 에러 종류에 따라 추가 정보 제공
            let text = err.to_string();
            if text.contains("파싱 실패") {
                println!("해결 방법: 설정 파일 형식이 올바른지 확인하세요.");
            } else if text.contains("유효성 검사") {
                println!("해결 방법: 설정 값이 유효 범위 내에 있는지 확인하세요.");
            }
        }
    }

    info!("엔진 설정 로더 종료");
}
