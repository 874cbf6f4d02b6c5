//! 과거 시세 배치 수집 CLI.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use quote_collector::modules::{self, BatchRequest, PairStatus};
use quote_collector::{BatchPlan, Broker, CollectorConfig};
use quote_core::logging::{init_logging, LogConfig, LogFormat};
use quote_data::BackfillWalker;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quote-collector")]
#[command(about = "Historical quote backfill collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty", global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// 심볼 × 간격 과거 시세 수집
    Collect {
        #[arg(long, value_enum)]
        broker: Broker,

        #[command(flatten)]
        plan: PlanArgs,

        /// 브로커의 전체 수집 대상 심볼 사용 (FxOpen은 상태 그룹 필터 적용)
        #[arg(long)]
        all_symbols: bool,
    },

    /// 종목 목록 동기화 (refs/tradables.json, refs/filtered_symbols.json)
    Instruments {
        #[arg(long, value_enum, default_value = "fxopen")]
        broker: Broker,

        /// 상태 그룹 (쉼표로 구분, 예: "Forex,Crypto")
        #[arg(long)]
        status_groups: Option<String>,
    },

    /// FxOpen 심볼별 지원 주기 조회 (refs/periodicities.json)
    Periodicities {
        /// 심볼 (쉼표로 구분, 생략 시 refs/filtered_symbols.json)
        #[arg(long)]
        symbols: Option<String>,
    },

    /// 저장된 데이터셋 완결성 평가
    Evaluate {
        #[arg(long, value_enum)]
        broker: Broker,

        #[command(flatten)]
        plan: PlanArgs,

        /// 기대 캔들 대비 최소 비율
        #[arg(long)]
        able_pct: Option<f64>,
    },
}

/// 배치 계획 파일과 CLI 오버라이드
#[derive(Args)]
struct PlanArgs {
    /// 배치 계획 TOML 파일
    #[arg(long)]
    plan: Option<PathBuf>,

    /// 심볼 (쉼표로 구분, 예: "EURUSD,GBPUSD")
    #[arg(long)]
    symbols: Option<String>,

    /// 간격 (쉼표로 구분, 예: "H1,D1")
    #[arg(long)]
    granularities: Option<String>,

    /// 시작 시각 (YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS, RFC 3339)
    #[arg(long)]
    from: Option<String>,

    /// 종료 시각
    #[arg(long)]
    to: Option<String>,
}

impl PlanArgs {
    fn resolve(&self) -> anyhow::Result<BatchPlan> {
        let mut plan = match &self.plan {
            Some(path) => BatchPlan::load(path)
                .with_context(|| format!("배치 계획 로드 실패: {}", path.display()))?,
            None => BatchPlan::default(),
        };

        if let Some(symbols) = &self.symbols {
            plan.symbols = split_list(symbols);
        }
        if let Some(granularities) = &self.granularities {
            plan.granularities = split_list(granularities);
        }
        if let Some(from) = &self.from {
            plan.date_start = Some(from.clone());
        }
        if let Some(to) = &self.to {
            plan.date_end = Some(to.clone());
        }
        Ok(plan)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(LogConfig::new(cli.log_level.clone()).with_format(cli.log_format))
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Quote Collector 시작");

    let config = CollectorConfig::from_env();
    tracing::debug!(?config, "설정 로드 완료");

    tokio::select! {
        result = run(cli.command, &config) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("종료 신호 수신, 수집 중단");
        }
    }

    tracing::info!("Quote Collector 종료");
    Ok(())
}

async fn run(command: Commands, config: &CollectorConfig) -> anyhow::Result<()> {
    match command {
        Commands::Collect {
            broker,
            plan,
            all_symbols,
        } => collect(config, broker, plan.resolve()?, all_symbols).await,
        Commands::Instruments {
            broker,
            status_groups,
        } => {
            let groups = match status_groups {
                Some(raw) => split_list(&raw),
                None => BatchPlan::default().status_groups,
            };
            match broker {
                Broker::FxOpen => {
                    let client = config.fxopen_client()?;
                    let sync =
                        modules::sync_instruments(&client, &config.refs_dir(), &groups).await?;
                    tracing::info!(
                        tradable = sync.tradable,
                        filtered = sync.filtered.len(),
                        path = %sync.filtered_path.display(),
                        "✅ 종목 참조 파일 저장"
                    );
                }
                Broker::Oanda => {
                    let symbols = modules::universe_symbols(config, broker, &groups).await?;
                    tracing::info!(count = symbols.len(), symbols = ?symbols, "✅ Oanda 종목");
                }
            }
            Ok(())
        }
        Commands::Periodicities { symbols } => {
            let symbols = match symbols {
                Some(raw) => split_list(&raw),
                None => modules::load_filtered_symbols(&config.refs_dir())?
                    .context("심볼이 없습니다 (--symbols 또는 refs/filtered_symbols.json)")?,
            };
            let client = config.fxopen_client()?;
            let (periodicities, path) =
                modules::sync_periodicities(&client, &config.refs_dir(), &symbols).await?;
            tracing::info!(
                symbols = periodicities.len(),
                path = %path.display(),
                "✅ 지원 주기 저장"
            );
            Ok(())
        }
        Commands::Evaluate {
            broker,
            plan,
            able_pct,
        } => {
            let mut plan = plan.resolve()?;
            if let Some(pct) = able_pct {
                plan.able_pct = pct;
            }
            evaluate(config, broker, plan)
        }
    }
}

async fn collect(
    config: &CollectorConfig,
    broker: Broker,
    plan: BatchPlan,
    all_symbols: bool,
) -> anyhow::Result<()> {
    let granularities = plan.parsed_granularities()?;
    if granularities.is_empty() {
        bail!("수집할 간격이 없습니다 (--granularities 또는 계획 파일)");
    }
    let (date_start, date_end) = plan.date_range()?;

    let symbols = if all_symbols {
        modules::universe_symbols(config, broker, &plan.status_groups).await?
    } else {
        plan.symbols.clone()
    };
    if symbols.is_empty() {
        bail!("수집할 심볼이 없습니다 (--symbols, --all-symbols 또는 계획 파일)");
    }

    let walker = BackfillWalker::new(config.quote_client(broker)?, config.backfill_config());
    let store = config.store();
    let request = BatchRequest {
        symbols,
        granularities,
        date_start,
        date_end,
    };

    let pb = ProgressBar::new(request.pair_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let (outcomes, stats) = modules::run_batch(
        &walker,
        &store,
        &request,
        config.max_concurrent_pairs,
        &pb,
    )
    .await;
    pb.finish_with_message("Collection completed");

    for outcome in &outcomes {
        if !matches!(outcome.status, PairStatus::Saved { .. }) {
            tracing::warn!(
                symbol = %outcome.symbol,
                granularity = %outcome.granularity,
                status = ?outcome.status,
                "❌ 저장되지 않은 쌍"
            );
        }
    }
    stats.log_summary("과거 시세 수집");
    Ok(())
}

fn evaluate(config: &CollectorConfig, broker: Broker, plan: BatchPlan) -> anyhow::Result<()> {
    let granularities = plan.parsed_granularities()?;
    if granularities.is_empty() {
        bail!("평가할 간격이 없습니다");
    }
    let (date_start, date_end) = plan.date_range()?;

    let symbols = if plan.symbols.is_empty() {
        modules::load_filtered_symbols(&config.refs_dir())?
            .context("심볼이 없습니다 (--symbols 또는 refs/filtered_symbols.json)")?
    } else {
        plan.symbols.clone()
    };

    let evaluation = modules::evaluate_store(
        config,
        broker,
        &symbols,
        &granularities,
        date_start,
        date_end,
        plan.able_pct,
    )?;

    tracing::info!(
        symbols = symbols.len(),
        able = evaluation.able_symbols.len(),
        "✅ 데이터셋 평가 완료"
    );
    Ok(())
}
