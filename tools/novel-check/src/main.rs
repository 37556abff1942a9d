//! # Novel Check
//!
//! 文档检查工具 - 静态校验编辑器导出的小说 JSON 文档。
//!
//! ## 用法
//!
//! ```bash
//! # 在项目根目录使用 cargo 运行
//! cargo run -p novel-check -- story.json
//! cargo run -p novel-check -- documents/
//! cargo run -p novel-check -- story.json --assets assets
//! cargo run -p novel-check -- story.json --no-assets
//! ```
//!
//! ## 检查内容
//!
//! - JSON 能否解析为文档
//! - 结构缺陷：无场景、悬空的分支目标、重复 ID、查不到的说话人/立绘
//! - 本地资源引用是否存在（带 scheme 的远程 URI 跳过）
//!
//! 播放核心对这些缺陷一律退化处理；这个工具的意义是在发布前
//! 把它们摆到作者面前。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use walkdir::WalkDir;

use novel_runtime::{DiagnosticResult, Novel, analyze_novel, extract_asset_references};

#[derive(Parser)]
#[command(name = "novel-check")]
#[command(about = "文档检查工具 - 静态校验小说 JSON 文档")]
#[command(version)]
struct Cli {
    /// 文档文件或目录（目录下递归查找 .json）
    paths: Vec<PathBuf>,

    /// 资源根目录（默认：各文档所在目录）
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// 跳过资源存在性检查
    #[arg(long)]
    no_assets: bool,
}

/// 缺失的资源信息
struct MissingAsset {
    document: String,
    asset_type: String,
    uri: String,
    location: String,
}

/// 检查结果汇总
#[derive(Default)]
struct CheckResult {
    documents_checked: usize,
    parse_errors: usize,
    diagnostics: DiagnosticResult,
    missing_assets: Vec<MissingAsset>,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("novel-check error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.paths.is_empty() {
        anyhow::bail!("请指定至少一个文档文件或目录");
    }

    let mut files = Vec::new();
    for path in &cli.paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            collect_documents(path, &mut files);
        } else {
            anyhow::bail!("路径不存在: {}", path.display());
        }
    }
    files.sort();
    files.dedup();

    if files.is_empty() {
        eprintln!("未找到文档文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个文档...\n", files.len());

    let mut result = CheckResult::default();
    for file in &files {
        check_document(file, &cli, &mut result);
    }

    print_result(&result);

    if result.parse_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("文档检查发现错误");
    }
    Ok(())
}

/// 收集目录下的所有 .json 文档
fn collect_documents(dir: &Path, files: &mut Vec<PathBuf>) {
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
}

/// 检查单个文档
fn check_document(file: &Path, cli: &Cli, result: &mut CheckResult) {
    let document = file.display().to_string();
    result.documents_checked += 1;

    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", document, e);
            result.parse_errors += 1;
            return;
        }
    };

    let novel = match Novel::from_json(&text) {
        Ok(novel) => novel,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", document, e);
            result.parse_errors += 1;
            return;
        }
    };

    result.diagnostics.merge(analyze_novel(&novel));

    if cli.no_assets {
        return;
    }

    // 资源存在性：相对 URI 以 --assets（缺省为文档所在目录）为根；
    // 带 scheme 的远程 URI 不归本工具管
    let assets_root = cli
        .assets
        .clone()
        .unwrap_or_else(|| file.parent().unwrap_or(Path::new(".")).to_path_buf());

    for reference in extract_asset_references(&novel) {
        if reference.uri.contains("://") {
            continue;
        }
        let path = Path::new(&reference.uri);
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            assets_root.join(path)
        };
        if !resolved.exists() {
            result.missing_assets.push(MissingAsset {
                document: document.clone(),
                asset_type: format!("{}", reference.asset_type),
                uri: reference.uri,
                location: reference.location,
            });
        }
    }
}

/// 输出检查结果
fn print_result(result: &CheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个文档", result.documents_checked);
    eprintln!();

    for diagnostic in &result.diagnostics.diagnostics {
        eprintln!("{}", diagnostic);
    }

    for missing in &result.missing_assets {
        eprintln!(
            "[WARN] {}: 资源不存在 [{}] {} ({})",
            missing.document, missing.asset_type, missing.uri, missing.location
        );
    }

    let error_count = result.parse_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count() + result.missing_assets.len();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
