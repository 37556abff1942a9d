//! # 终端 Host
//!
//! 最小的播放宿主：加载编辑器导出的 JSON 文档，驱动 novel-runtime，
//! 把帧渲染成终端文本，用 rodio 执行音频指令。
//!
//! ## 职责划分
//!
//! - 核心不读时钟：`Command::Schedule` 在这里登记截止时刻，
//!   事件循环在下一个截止时刻前阻塞等待 stdin，到点后把令牌送回核心
//! - 被取代的旧定时器不做取消，到期照样送回 —— 核心的代数检查会丢弃
//! - 退出路径无条件收尾：作废定时器、停掉三条音频通道
//!
//! ## 操作
//!
//! 回车推进；数字选择分支；`m` 静音；`r` 从结束画面重开；`q` 退出。

mod audio;
mod render;
mod scheduler;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::{error, warn};

use novel_runtime::{Command, Novel, NovelPlayer, PlayerInput, analyze_novel};

use crate::audio::AudioPlayer;
use crate::render::Renderer;
use crate::scheduler::TimerQueue;

#[derive(Parser)]
#[command(name = "novel-player")]
#[command(about = "终端视觉小说播放器 - 播放编辑器导出的 JSON 文档")]
#[command(version)]
struct Cli {
    /// 小说文档（JSON）路径
    novel: PathBuf,

    /// 启动时静音
    #[arg(short, long)]
    muted: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();

    if let Err(e) = run(Cli::parse()) {
        error!("{e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&cli.novel)
        .with_context(|| format!("无法读取文档: {}", cli.novel.display()))?;
    let novel = Novel::from_json(&text).context("文档解析失败")?;

    // 体检：有缺陷照样播（核心会退化处理），但要让作者看到
    for diagnostic in &analyze_novel(&novel).diagnostics {
        warn!("{}", diagnostic);
    }

    // 无音频设备：无声继续，等价于浏览器里 autoplay 被拦下
    let base_dir = cli.novel.parent().unwrap_or(Path::new(".")).to_path_buf();
    let mut audio = match AudioPlayer::new(base_dir) {
        Ok(player) => Some(player),
        Err(e) => {
            warn!("{e}，将无声播放");
            None
        }
    };

    let mut player = NovelPlayer::new(novel);
    let mut timers = TimerQueue::new();
    let mut renderer = Renderer::new();

    println!("《{}》", player.novel().title);
    println!("[回车推进 | 数字选择 | m 静音 | r 重开 | q 退出]");

    let commands = player.start();
    execute(commands, &mut timers, &mut audio);
    if cli.muted {
        let commands = player.handle(PlayerInput::ToggleMute);
        execute(commands, &mut timers, &mut audio);
    }
    renderer.render(&player);

    let lines = spawn_stdin_reader();
    'session: loop {
        // 在下一个定时器截止前等待输入；没有定时器就一直等
        let line = match timers.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match lines.recv_timeout(timeout) {
                    Ok(line) => Some(line),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break 'session,
                }
            }
            None => match lines.recv() {
                Ok(line) => Some(line),
                Err(_) => break 'session,
            },
        };

        if let Some(line) = line {
            match parse_line(line.trim(), &player) {
                Action::Input(input) => {
                    let commands = player.handle(input);
                    execute(commands, &mut timers, &mut audio);
                }
                Action::Quit => break 'session,
                Action::Ignored => {}
            }
        }

        for token in timers.pop_due(Instant::now()) {
            let commands = player.handle(PlayerInput::timer(token));
            execute(commands, &mut timers, &mut audio);
        }

        renderer.render(&player);
    }

    // 会话收尾：核心作废所有定时器并停掉三条通道；
    // 本地的队列与音频槽也无条件清空，不允许任何残留
    let commands = player.handle(PlayerInput::Exit);
    execute(commands, &mut timers, &mut audio);
    timers.clear();
    if let Some(audio) = audio.as_mut() {
        audio.stop_all();
    }
    Ok(())
}

/// 一行输入解析出的动作
enum Action {
    /// 转交核心的输入
    Input(PlayerInput),
    /// 退出会话
    Quit,
    /// 无法理解，忽略
    Ignored,
}

fn parse_line(line: &str, player: &NovelPlayer) -> Action {
    match line {
        "" => Action::Input(PlayerInput::Advance),
        "m" => Action::Input(PlayerInput::ToggleMute),
        "r" => Action::Input(PlayerInput::Restart),
        "q" => Action::Quit,
        other => {
            // 数字 -> 当前可见选项的序号（1 起）
            if let Ok(index) = other.parse::<usize>() {
                let frame = player.frame();
                if frame.show_choices
                    && let Some(choice) = frame
                        .presentation
                        .as_ref()
                        .and_then(|p| p.choices.get(index.wrapping_sub(1)))
                {
                    return Action::Input(PlayerInput::choose(choice.id.clone()));
                }
            }
            Action::Ignored
        }
    }
}

/// 执行核心发来的指令
fn execute(commands: Vec<Command>, timers: &mut TimerQueue, audio: &mut Option<AudioPlayer>) {
    for command in commands {
        match command {
            Command::Schedule { token, delay } => timers.schedule(token, delay),
            Command::Audio(audio_command) => {
                if let Some(player) = audio.as_mut() {
                    player.apply(&audio_command);
                }
            }
        }
    }
}

/// stdin 读线程：逐行读入送进通道，主循环带超时地收
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
