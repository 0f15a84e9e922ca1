//! KneePlan 会话驱动程序
//!
//! 读取会话脚本，执行后把最终的规划快照以 JSON 输出到标准输出。
//!
//! 用法：`kneeplan <session.json> [--verbose]`

mod session;

use anyhow::{bail, Result};
use kneeplan_core::prelude::*;
use session::Session;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// 命令行参数
struct Args {
    session: PathBuf,
    verbose: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut session = None;
        let mut verbose = false;

        for arg in args {
            match arg.as_str() {
                "-v" | "--verbose" => verbose = true,
                flag if flag.starts_with('-') => bail!("Unknown option: {}", flag),
                path => {
                    if session.replace(PathBuf::from(path)).is_some() {
                        bail!("Only one session file may be given");
                    }
                }
            }
        }

        match session {
            Some(session) => Ok(Self { session, verbose }),
            None => bail!("Usage: kneeplan <session.json> [--verbose]"),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;

    // 初始化日志（输出到标准错误，标准输出只留给快照）
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish(),
    )?;

    info!("Loading session {}", args.session.display());
    let session = Session::load(&args.session)?;

    let mut engine = PlanEngine::new(session.config.clone())?;
    let snapshot = session.run(&mut engine)?;

    info!(
        "Final distances: medial {:.3}, lateral {:.3}",
        snapshot.measurements[0].distance, snapshot.measurements[1].distance
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
