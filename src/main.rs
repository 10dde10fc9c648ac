// ==========================================
// BMN 资产台账 - 命令行入口
// ==========================================
// 子命令: import / preview / template / bulk / config
// 输出: JSON 报告写 stdout，日志写 stderr
// ==========================================

use anyhow::Context;
use bmn_asset_import::api::ImportApi;
use bmn_asset_import::config::{config_keys, ConfigManager};
use bmn_asset_import::db::{ensure_schema, get_default_db_path, open_sqlite_connection};
use bmn_asset_import::{i18n, logging};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "bmn-asset-import")]
#[command(about = "Import BMN asset spreadsheets into the asset register")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// SQLite 数据库路径（缺省: BMN_ASSET_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 界面语言（id / en）
    #[arg(long, global = true, default_value = "id")]
    locale: String,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 导入表格文件
    Import {
        file: PathBuf,
        #[arg(short, long, default_value = "tanah")]
        category: String,
        /// upsert / insert-only / update-only
        #[arg(short, long)]
        mode: Option<String>,
        #[arg(long)]
        folder_id: Option<String>,
    },
    /// 预览表格文件（不落库）
    Preview {
        file: PathBuf,
        #[arg(short, long, default_value = "tanah")]
        category: String,
    },
    /// 生成导入模板 CSV
    Template {
        #[arg(short, long)]
        category: String,
        /// 输出目录（缺省当前目录）
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// 批量 upsert（JSON 请求体，缺省从 stdin 读取）
    Bulk {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// 查看或修改导入配置
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// 显示当前生效配置
    Show,
    /// 写入 global 配置
    Set { key: String, value: String },
}

fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    i18n::set_locale(&cli.locale);

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    if let Err(error) = runtime.block_on(run(cli)) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!(db_path = %db_path, version = bmn_asset_import::VERSION, "使用数据库");

    {
        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        ensure_schema(&conn).context("数据库初始化失败")?;
    }

    let api = ImportApi::open(&db_path).map_err(to_anyhow)?;

    match cli.command {
        Command::Import {
            file,
            category,
            mode,
            folder_id,
        } => {
            let report = api
                .import_file(&file.to_string_lossy(), &category, mode.as_deref(), folder_id)
                .await
                .map_err(to_anyhow)?;
            print_json(&report)?;
        }
        Command::Preview { file, category } => {
            let report = api
                .preview_file(&file.to_string_lossy(), &category)
                .await
                .map_err(to_anyhow)?;
            print_json(&report)?;
        }
        Command::Template {
            category,
            output_dir,
        } => {
            let template = api.generate_template(&category).map_err(to_anyhow)?;
            let path = output_dir
                .unwrap_or_else(|| PathBuf::from("."))
                .join(&template.file_name);
            std::fs::write(&path, template.content)
                .with_context(|| format!("无法写入模板: {}", path.display()))?;
            println!("{}", path.display());
        }
        Command::Bulk { input } => {
            let body = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("无法读取请求体: {}", path.display()))?,
                None => {
                    let mut body = String::new();
                    std::io::stdin().read_to_string(&mut body)?;
                    body
                }
            };
            let response = api.bulk_upsert(&body).await.map_err(to_anyhow)?;
            print_json(&response)?;
        }
        Command::Config { action } => {
            let manager = ConfigManager::new(&db_path)?;
            match action {
                ConfigAction::Show => print_json(&manager.snapshot().await?)?,
                ConfigAction::Set { key, value } => {
                    if !known_config_key(&key) {
                        anyhow::bail!("未知配置项: {}", key);
                    }
                    manager.set_global_config_value(&key, &value)?;
                    print_json(&manager.snapshot().await?)?;
                }
            }
        }
    }

    Ok(())
}

fn known_config_key(key: &str) -> bool {
    [
        config_keys::HEADER_SCAN_ROWS,
        config_keys::HEADER_KEYWORDS,
        config_keys::DEFAULT_CATEGORY,
        config_keys::SUSPICIOUS_CODE_DIGITS,
        config_keys::MAX_PAYLOAD_BYTES,
    ]
    .contains(&key)
}

fn to_anyhow(err: bmn_asset_import::ApiError) -> anyhow::Error {
    anyhow::anyhow!(err.localized_message())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
