//! # Render 模块
//!
//! 把 [`PlayerFrame`] 落到终端上的最薄一层。
//!
//! 渲染是增量式的：打字机每显示一个字符，这里只补打新出现的部分；
//! 换句时另起一行，换场景时打场景头。过渡遮罩期间不输出任何内容。

use std::io::{self, Write};

use novel_runtime::NovelPlayer;

/// 终端渲染器
///
/// 记住上一次渲染到哪里，只输出增量。
#[derive(Debug, Default)]
pub struct Renderer {
    /// 上一次渲染的位置（场景索引, 对白索引）
    position: Option<(usize, usize)>,
    /// 上一次渲染的场景索引（打场景头用）
    scene: Option<usize>,
    /// 当前句已输出的字符数
    printed: usize,
    /// 当前句是否已补过换行
    line_closed: bool,
    /// 当前句的选项是否已列出
    choices_shown: bool,
    /// 结束画面是否已输出
    finish_shown: bool,
}

impl Renderer {
    /// 创建渲染器
    pub fn new() -> Self {
        Self::default()
    }

    /// 渲染当前帧（增量输出）
    pub fn render(&mut self, player: &NovelPlayer) {
        let frame = player.frame();

        if frame.finished {
            if !self.finish_shown {
                self.finish_shown = true;
                // 结束后重开要从头重新输出
                self.position = None;
                self.scene = None;
                println!();
                println!("── 完 ──");
                println!("感谢游玩《{}》。[r 重新开始 | q 退出]", player.novel().title);
            }
            return;
        }
        self.finish_shown = false;

        // 遮罩盖着的时候什么都不画
        if frame.transitioning {
            return;
        }
        let Some(p) = frame.presentation.as_ref() else {
            return;
        };

        let position = (
            player.state().position.scene_index,
            player.state().position.dialogue_index,
        );

        if self.scene != Some(position.0) {
            self.scene = Some(position.0);
            println!();
            println!("══ {} ══", p.scene_name);
        }

        if self.position != Some(position) {
            self.position = Some(position);
            self.printed = 0;
            self.line_closed = false;
            self.choices_shown = false;
            print!("【{}】 ", p.speaker.name);
            let _ = io::stdout().flush();
        }

        // 打字机增量
        let visible = frame.visible_text().unwrap_or_default();
        let chars: Vec<char> = visible.chars().collect();
        if chars.len() > self.printed {
            let tail: String = chars[self.printed..].iter().collect();
            print!("{}", tail);
            let _ = io::stdout().flush();
            self.printed = chars.len();
        }

        if frame.typing_done && !self.line_closed {
            self.line_closed = true;
            println!();
        }

        if frame.show_choices && !self.choices_shown {
            self.choices_shown = true;
            for (index, choice) in p.choices.iter().enumerate() {
                println!("  {}. {}", index + 1, choice.text);
            }
            println!("[输入序号选择]");
        }
    }
}
