//! # Engine 模块
//!
//! 播放引擎：持有文档快照与会话状态，驱动整个播放过程。
//!
//! ## 执行模型
//!
//! ```text
//! Host                                Runtime
//!   │──── PlayerInput ──────────────────►│  handle(input)
//!   │◄─── Vec<Command> ──────────────────│
//!   │     (Schedule 定时器 / Audio 指令)  │
//!   │──── TimerElapsed { token } ───────►│  （到期回调）
//! ```
//!
//! 引擎不读时钟、不做 IO：所有延时都以 [`Command::Schedule`] 委托给
//! Host，回调令牌经代数检查后才生效，过期回调直接丢弃。
//! 画面由 Host 在每批输入后通过 [`NovelPlayer::frame`] 拉取。
//!
//! ## 失败语义
//!
//! 所有操作对非法前置条件（过渡中推进、无分支时选择、越界位置等）
//! 一律无操作 —— 状态机在输入域上防御性全覆盖，从不报错。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::AudioDirector;
use crate::command::Command;
use crate::input::PlayerInput;
use crate::novel::{Novel, SceneTransition};
use crate::presentation::{self, PresentationFrame};
use crate::state::{PlaybackState, TransitionPhase, TypingState};
use crate::timer::{TimerKind, TimerRegistry, TimerToken};

/// 打字机节拍：每拍显示一个字符
pub const TYPE_INTERVAL: Duration = Duration::from_millis(30);

/// 过渡入场时长：遮罩盖上到提交新位置的间隔
///
/// 以**目标场景**的过渡类型为准。
fn enter_delay(kind: SceneTransition) -> Duration {
    match kind {
        SceneTransition::Fade | SceneTransition::Flash => Duration::from_millis(500),
        SceneTransition::Slide | SceneTransition::Zoom => Duration::from_millis(300),
        SceneTransition::None => Duration::ZERO,
    }
}

/// 过渡收尾时长：提交新位置到清除过渡标志的间隔
///
/// 先提交内容再清标志，UI 淡入时画面已经换好，不会跳变。
fn reveal_delay(kind: SceneTransition) -> Duration {
    match kind {
        SceneTransition::None => Duration::ZERO,
        _ => Duration::from_millis(100),
    }
}

/// 播放器帧视图
///
/// 渲染层每次状态变化后拉取的完整快照：
/// 呈现内容 + 打字机进度 + 过渡/结束/静音标志。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerFrame {
    /// 当前句的呈现内容（None = 无内容可画 / 故事已结束）
    pub presentation: Option<PresentationFrame>,
    /// 已显示的字符数
    pub revealed_chars: usize,
    /// 打字机是否已完成
    pub typing_done: bool,
    /// 是否处于场景过渡中
    pub transitioning: bool,
    /// 过渡遮罩的视觉类型（仅过渡中有值，取目标场景的过渡类型）
    pub transition_kind: Option<SceneTransition>,
    /// 是否应当显示分支选项
    pub show_choices: bool,
    /// 是否已播放完毕
    pub finished: bool,
    /// 是否静音
    pub muted: bool,
}

impl PlayerFrame {
    /// 取已显示的文本前缀（按字符截取）
    pub fn visible_text(&self) -> Option<String> {
        self.presentation
            .as_ref()
            .map(|p| p.text.chars().take(self.revealed_chars).collect())
    }
}

/// 播放引擎
///
/// 这是 novel-runtime 的核心类型：持有一部小说的只读快照，
/// 独占播放会话状态，所有状态变更都经由 [`NovelPlayer::handle`]。
///
/// # 使用示例
///
/// ```ignore
/// let novel = Novel::from_json(&text)?;
/// let mut player = NovelPlayer::new(novel);
///
/// execute(player.start());
/// render(player.frame());
///
/// loop {
///     let input = collect_input_or_due_timer();
///     execute(player.handle(input));
///     render(player.frame());
/// }
/// ```
pub struct NovelPlayer {
    /// 文档快照（播放期间只读）
    novel: Novel,
    /// 会话状态
    state: PlaybackState,
    /// 定时器代数登记表
    timers: TimerRegistry,
    /// 音频协调器
    audio: AudioDirector,
    /// 是否已调用过 start
    started: bool,
    /// 会话是否已关闭（关闭后所有输入无效）
    closed: bool,
}

impl NovelPlayer {
    /// 创建播放器
    ///
    /// 文档在会话期间不可变；空文档也能创建，只是无内容可播。
    pub fn new(novel: Novel) -> Self {
        Self {
            novel,
            state: PlaybackState::new(),
            timers: TimerRegistry::new(),
            audio: AudioDirector::new(),
            started: false,
            closed: false,
        }
    }

    /// 开始播放会话
    ///
    /// 启动首场景的音乐与第一句的打字机。重复调用无操作。
    pub fn start(&mut self) -> Vec<Command> {
        if self.closed || self.started {
            return Vec::new();
        }
        self.started = true;
        self.enter_position()
    }

    /// 处理一条输入，返回需要 Host 执行的指令
    pub fn handle(&mut self, input: PlayerInput) -> Vec<Command> {
        if self.closed {
            return Vec::new();
        }
        match input {
            PlayerInput::Advance => self.advance(),
            PlayerInput::Choose { choice_id } => self.choose(&choice_id),
            PlayerInput::Restart => self.restart(),
            PlayerInput::ToggleMute => self.toggle_mute(),
            PlayerInput::TimerElapsed { token } => self.timer_elapsed(token),
            PlayerInput::Exit => self.close(),
        }
    }

    /// 拉取当前帧
    pub fn frame(&self) -> PlayerFrame {
        let presentation = presentation::resolve(
            &self.novel,
            self.state.position.scene_index,
            self.state.position.dialogue_index,
        )
        .ok();

        let typing_done = self.state.typing.is_done();
        let transitioning = self.state.is_transitioning();
        let transition_kind = match self.state.transition {
            TransitionPhase::Idle => None,
            // 遮罩盖上中：目标场景尚未提交，取 pending 的过渡类型
            TransitionPhase::Covering => self
                .state
                .pending_scene
                .and_then(|i| self.novel.scene(i))
                .map(|s| s.transition),
            // 遮罩淡出中：位置已提交，取当前场景的过渡类型
            TransitionPhase::Revealing => self
                .novel
                .scene(self.state.position.scene_index)
                .map(|s| s.transition),
        };
        let has_choices = presentation
            .as_ref()
            .map(|p| !p.choices.is_empty())
            .unwrap_or(false);

        PlayerFrame {
            revealed_chars: self.state.typing.revealed,
            typing_done,
            transitioning,
            transition_kind,
            show_choices: has_choices && typing_done && !transitioning && !self.state.finished,
            finished: self.state.finished,
            muted: self.audio.muted(),
            presentation,
        }
    }

    /// 当前会话状态（只读）
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// 文档快照（只读）
    pub fn novel(&self) -> &Novel {
        &self.novel
    }

    /// 是否已播放完毕
    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    /// 是否静音
    pub fn muted(&self) -> bool {
        self.audio.muted()
    }

    // ── 内部操作 ────────────────────────────────────────────

    /// 推进
    ///
    /// 按优先级依次判定：
    /// 1. 打字未完成 → 补全显示，不移动位置（点击跳过打字机）
    /// 2. 当前句是分支点 → 无操作，必须通过选择推进
    /// 3. 场景内还有对白 → 前进一句
    /// 4. 还有后续场景 → 发起到下一场景的过渡
    /// 5. 最后一场景的最后一句 → 标记播放完毕
    fn advance(&mut self) -> Vec<Command> {
        if self.state.finished || self.state.is_transitioning() {
            return Vec::new();
        }
        let Some(scene) = self.novel.scene(self.state.position.scene_index) else {
            return Vec::new();
        };
        let dialogue_count = scene.dialogue_count();

        if let Some(dialogue) = scene.dialogue(self.state.position.dialogue_index) {
            // 1. 打字未完成：补全
            if !self.state.typing.is_done() {
                self.state.typing.complete();
                self.timers.invalidate(TimerKind::TypeTick);
                return Vec::new();
            }
            // 2. 分支点：阻断线性推进
            if dialogue.has_choices() {
                return Vec::new();
            }
        }

        // 3. 场景内还有对白
        if self.state.position.dialogue_index + 1 < dialogue_count {
            self.state.position.next_dialogue();
            return self.enter_dialogue();
        }

        // 4. 还有后续场景（对白耗尽的空场景也走这里）
        let next_scene = self.state.position.scene_index + 1;
        if next_scene < self.novel.scene_count() {
            return self.begin_transition(next_scene);
        }

        // 5. 全部播完
        self.finish()
    }

    /// 选择分支
    ///
    /// 仅当当前句有分支且无过渡在途时有效。未知选项 ID 或
    /// 悬空的目标场景 ID 都静默忽略 —— 这类文档缺陷由编辑器侧的
    /// [`crate::diagnostic::analyze_novel`] 报告，不是播放策略。
    fn choose(&mut self, choice_id: &str) -> Vec<Command> {
        if self.state.finished || self.state.is_transitioning() {
            return Vec::new();
        }
        let target = {
            let Some(scene) = self.novel.scene(self.state.position.scene_index) else {
                return Vec::new();
            };
            let Some(dialogue) = scene.dialogue(self.state.position.dialogue_index) else {
                return Vec::new();
            };
            let Some(choice) = dialogue.choice(choice_id) else {
                return Vec::new();
            };
            match self.novel.scene_index_by_id(&choice.target_scene_id) {
                Some(index) => index,
                None => return Vec::new(),
            }
        };
        self.begin_transition(target)
    }

    /// 从结束画面重新开始
    ///
    /// 仅在已播放完毕时有效。位置/打字机/过渡全部回到初始状态，
    /// 静音态保留；首场景若还是同一首曲目则恢复播放而非重载。
    fn restart(&mut self) -> Vec<Command> {
        if !self.state.finished {
            return Vec::new();
        }
        self.state = PlaybackState::new();
        self.timers.invalidate_all();
        self.enter_position()
    }

    /// 切换静音（三条音频通道同时生效）
    fn toggle_mute(&mut self) -> Vec<Command> {
        let muted = !self.audio.muted();
        self.audio
            .set_muted(muted)
            .into_iter()
            .map(Command::Audio)
            .collect()
    }

    /// 定时器回调
    ///
    /// 代数不匹配的令牌是被取代的旧定时器，直接丢弃 ——
    /// 过期回调不可能改写已变更的状态。
    fn timer_elapsed(&mut self, token: TimerToken) -> Vec<Command> {
        if !self.timers.is_current(token) {
            return Vec::new();
        }
        match token.kind {
            TimerKind::TypeTick => {
                self.state.typing.reveal_one();
                if self.state.typing.is_done() {
                    Vec::new()
                } else {
                    let token = self.timers.issue(TimerKind::TypeTick);
                    vec![Command::schedule(token, TYPE_INTERVAL)]
                }
            }
            TimerKind::TransitionCommit => self.commit_transition(),
            TimerKind::TransitionReveal => {
                self.state.transition = TransitionPhase::Idle;
                Vec::new()
            }
        }
    }

    /// 关闭会话
    ///
    /// 作废所有定时器、停掉并释放所有音频通道；此后一切输入无效。
    fn close(&mut self) -> Vec<Command> {
        self.closed = true;
        self.timers.invalidate_all();
        self.audio
            .teardown()
            .into_iter()
            .map(Command::Audio)
            .collect()
    }

    /// 发起到目标场景的两段式过渡
    ///
    /// 第一段：盖上遮罩，延时取决于**目标场景**的过渡类型；
    /// 第二段见 [`Self::commit_transition`]。`none` 过渡不经过定时器，
    /// 当场提交。
    fn begin_transition(&mut self, target: usize) -> Vec<Command> {
        let Some(entering) = self.novel.scene(target) else {
            return Vec::new();
        };
        let kind = entering.transition;

        self.state.transition = TransitionPhase::Covering;
        self.state.pending_scene = Some(target);
        // 旧对白的打字机在过渡期间一律作废
        self.timers.invalidate(TimerKind::TypeTick);

        let delay = enter_delay(kind);
        if delay.is_zero() {
            self.commit_transition()
        } else {
            let token = self.timers.issue(TimerKind::TransitionCommit);
            vec![Command::schedule(token, delay)]
        }
    }

    /// 过渡第二段：提交新位置，再安排清除过渡标志
    ///
    /// 提交先于标志清除 —— 依赖"标志清除前内容已换好"的监听方
    /// 始终成立。
    fn commit_transition(&mut self) -> Vec<Command> {
        let Some(target) = self.state.pending_scene.take() else {
            return Vec::new();
        };
        self.state.position.enter_scene(target);
        self.state.transition = TransitionPhase::Revealing;

        let kind = self
            .novel
            .scene(target)
            .map(|s| s.transition)
            .unwrap_or(SceneTransition::None);

        let mut commands = self.enter_position();

        let delay = reveal_delay(kind);
        if delay.is_zero() {
            self.state.transition = TransitionPhase::Idle;
        } else {
            let token = self.timers.issue(TimerKind::TransitionReveal);
            commands.push(Command::schedule(token, delay));
        }
        commands
    }

    /// 最后一句推进：标记播放完毕
    ///
    /// 音乐暂停但不卸载（重开可接着放），语音/音效停掉。
    fn finish(&mut self) -> Vec<Command> {
        self.state.finished = true;
        self.timers.invalidate_all();
        self.audio
            .pause_for_finish()
            .into_iter()
            .map(Command::Audio)
            .collect()
    }

    /// 进入当前位置：同步场景音乐 + 启动当前句
    fn enter_position(&mut self) -> Vec<Command> {
        let bgm = self
            .novel
            .scene(self.state.position.scene_index)
            .and_then(|s| s.bgm_url.clone());

        let mut commands: Vec<Command> = self
            .audio
            .sync_scene(bgm.as_deref())
            .into_iter()
            .map(Command::Audio)
            .collect();
        commands.extend(self.enter_dialogue());
        commands
    }

    /// 进入当前句：重置打字机、触发语音/音效
    fn enter_dialogue(&mut self) -> Vec<Command> {
        let (char_count, voice, sfx) = match self
            .novel
            .scene(self.state.position.scene_index)
            .and_then(|s| s.dialogue(self.state.position.dialogue_index))
        {
            Some(d) => (d.char_count(), d.voice_url.clone(), d.sfx_url.clone()),
            // 空场景：没有可播的句子，语音/音效照样停掉
            None => (0, None, None),
        };

        self.state.typing = TypingState::start(char_count);
        self.timers.invalidate(TimerKind::TypeTick);

        let mut commands = Vec::new();
        if char_count > 0 {
            let token = self.timers.issue(TimerKind::TypeTick);
            commands.push(Command::schedule(token, TYPE_INTERVAL));
        }
        for cmd in self.audio.sync_dialogue(voice.as_deref(), sfx.as_deref()) {
            commands.push(Command::Audio(cmd));
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioCommand;
    use std::collections::VecDeque;

    /// 两场景文档：场景 1 两句普通对白，场景 2 一句带两个分支
    /// （一个指向自身，一个回到场景 1）
    fn branching_novel() -> Novel {
        Novel::from_json(
            r##"{
                "id": "n1",
                "title": "分支测试",
                "characters": [
                    {"id": "c1", "name": "羽", "color": "#f00", "avatarUrl": "a.png"}
                ],
                "scenes": [
                    {
                        "id": "s1", "name": "一", "backgroundUrl": "bg1.jpg",
                        "bgmUrl": "x.mp3",
                        "dialogues": [
                            {"id": "d1", "characterId": "c1", "text": "第一句"},
                            {"id": "d2", "text": "第二句"}
                        ]
                    },
                    {
                        "id": "s2", "name": "二", "backgroundUrl": "bg2.jpg",
                        "bgmUrl": "x.mp3",
                        "transition": "slide",
                        "dialogues": [
                            {"id": "d3", "text": "选吧", "choices": [
                                {"id": "chA", "text": "回到一", "targetSceneId": "s1"},
                                {"id": "chB", "text": "留在二", "targetSceneId": "s2"},
                                {"id": "chX", "text": "黑洞", "targetSceneId": "nowhere"}
                            ]}
                        ]
                    }
                ]
            }"##,
        )
        .unwrap()
    }

    fn linear_novel(lines: &[&str]) -> Novel {
        let dialogues: Vec<String> = lines
            .iter()
            .enumerate()
            .map(|(i, text)| format!(r#"{{"id": "d{i}", "text": "{text}"}}"#))
            .collect();
        let json = format!(
            r#"{{"id": "n", "title": "线性",
                 "scenes": [{{"id": "s1", "name": "S", "backgroundUrl": "bg.jpg",
                              "dialogues": [{}]}}]}}"#,
            dialogues.join(",")
        );
        Novel::from_json(&json).unwrap()
    }

    /// 迷你 Host：把 Schedule 当作立即到期，抽干全部指令，
    /// 返回过程中产生的音频指令序列。
    fn drain(player: &mut NovelPlayer, commands: Vec<Command>) -> Vec<AudioCommand> {
        let mut queue: VecDeque<Command> = commands.into();
        let mut audio = Vec::new();
        while let Some(cmd) = queue.pop_front() {
            match cmd {
                Command::Audio(a) => audio.push(a),
                Command::Schedule { token, .. } => {
                    queue.extend(player.handle(PlayerInput::timer(token)));
                }
            }
        }
        audio
    }

    /// 推进并立刻结清所有定时器（打字机/过渡瞬间完成）
    fn advance_settled(player: &mut NovelPlayer) -> Vec<AudioCommand> {
        let commands = player.handle(PlayerInput::Advance);
        drain(player, commands)
    }

    #[test]
    fn test_initial_frame_matches_first_dialogue() {
        let mut player = NovelPlayer::new(branching_novel());
        let commands = player.start();
        drain(&mut player, commands);

        let frame = player.frame();
        let p = frame.presentation.unwrap();
        assert_eq!(p.speaker.name, "羽");
        assert_eq!(p.text, "第一句");
        assert!(!frame.finished);
    }

    #[test]
    fn test_advance_during_typing_only_completes_reveal() {
        let mut player = NovelPlayer::new(linear_novel(&["很长的一句话", "下一句"]));
        let commands = player.start();
        // 不跑定时器：打字机仍在进行中
        assert!(matches!(commands[0], Command::Schedule { .. }));

        player.handle(PlayerInput::Advance);

        // 位置不变，文本补全
        assert_eq!(player.state().position.dialogue_index, 0);
        assert!(player.state().typing.is_done());
        assert_eq!(player.frame().visible_text().unwrap(), "很长的一句话");
    }

    #[test]
    fn test_typewriter_reveals_one_char_per_tick() {
        let mut player = NovelPlayer::new(linear_novel(&["三个字"]));
        let mut commands = player.start();

        for expected in 1..=3usize {
            let Some(Command::Schedule { token, delay }) = commands.first().cloned() else {
                panic!("应当有打字机节拍被调度");
            };
            assert_eq!(delay, TYPE_INTERVAL);
            commands = player.handle(PlayerInput::timer(token));
            assert_eq!(player.state().typing.revealed, expected);
        }

        // 显示完毕：不再调度
        assert!(commands.is_empty());
        assert!(player.state().typing.is_done());
    }

    #[test]
    fn test_stale_typewriter_tick_is_dropped() {
        let mut player = NovelPlayer::new(linear_novel(&["第一句话", "短"]));
        let commands = player.start();
        let Command::Schedule { token: stale, .. } = commands[0].clone() else {
            panic!()
        };

        // 跳过打字机并推进到下一句：旧节拍令牌被取代
        player.handle(PlayerInput::Advance);
        player.handle(PlayerInput::Advance);
        assert_eq!(player.state().position.dialogue_index, 1);
        let revealed_before = player.state().typing.revealed;

        // 迟到的旧回调：不得在新对白上继续显示字符
        let commands = player.handle(PlayerInput::timer(stale));
        assert!(commands.is_empty());
        assert_eq!(player.state().typing.revealed, revealed_before);
    }

    #[test]
    fn test_linear_novel_reaches_finished() {
        let mut player = NovelPlayer::new(linear_novel(&["一", "二", "三"]));
        let commands = player.start();
        drain(&mut player, commands);

        for _ in 0..3 {
            advance_settled(&mut player);
        }
        assert!(player.is_finished());

        // 结束后继续推进：位置不再变化
        advance_settled(&mut player);
        assert!(player.is_finished());
        assert_eq!(player.state().position.dialogue_index, 2);
    }

    #[test]
    fn test_two_phase_transition_commits_before_clearing() {
        let mut player = NovelPlayer::new(branching_novel());
        let commands = player.start();
        drain(&mut player, commands);

        advance_settled(&mut player); // -> 第二句
        let commands = player.handle(PlayerInput::Advance); // -> 过渡到场景 2

        // 第一段：遮罩盖上，位置未提交
        assert_eq!(player.state().transition, TransitionPhase::Covering);
        assert_eq!(player.state().position.scene_index, 0);
        assert_eq!(player.frame().transition_kind, Some(SceneTransition::Slide));
        let Command::Schedule { token: commit, delay } = commands[0].clone() else {
            panic!()
        };
        // slide 过渡：入场 300ms
        assert_eq!(delay, Duration::from_millis(300));

        // 过渡中推进：无操作
        assert!(player.handle(PlayerInput::Advance).is_empty());

        // 第二段：提交位置，但过渡标志还在
        let commands = player.handle(PlayerInput::timer(commit));
        assert_eq!(player.state().transition, TransitionPhase::Revealing);
        assert_eq!(player.state().position.scene_index, 1);
        assert_eq!(player.state().position.dialogue_index, 0);

        // 收尾定时器之后标志才清除
        let reveal = commands
            .iter()
            .find_map(|c| match c {
                Command::Schedule { token, .. }
                    if token.kind == TimerKind::TransitionReveal =>
                {
                    Some(*token)
                }
                _ => None,
            })
            .expect("应当调度过渡收尾定时器");
        player.handle(PlayerInput::timer(reveal));
        assert_eq!(player.state().transition, TransitionPhase::Idle);
    }

    #[test]
    fn test_choices_block_advance_until_chosen() {
        let mut player = NovelPlayer::new(branching_novel());
        let commands = player.start();
        drain(&mut player, commands);

        advance_settled(&mut player);
        advance_settled(&mut player); // 进入场景 2（分支句）
        assert_eq!(player.state().position.scene_index, 1);

        // 分支句：推进被阻断
        advance_settled(&mut player);
        advance_settled(&mut player);
        assert_eq!(player.state().position.scene_index, 1);
        assert!(!player.is_finished());
        assert!(player.frame().show_choices);

        // 选择回到场景 1
        let commands = player.handle(PlayerInput::choose("chA"));
        drain(&mut player, commands);
        assert_eq!(player.state().position.scene_index, 0);
        assert_eq!(player.state().position.dialogue_index, 0);
    }

    #[test]
    fn test_choice_targeting_same_scene() {
        let mut player = NovelPlayer::new(branching_novel());
        let commands = player.start();
        drain(&mut player, commands);
        advance_settled(&mut player);
        advance_settled(&mut player);

        // 指向自身的选项：重新进入场景 2
        let commands = player.handle(PlayerInput::choose("chB"));
        drain(&mut player, commands);
        assert_eq!(player.state().position.scene_index, 1);
        assert_eq!(player.state().position.dialogue_index, 0);
    }

    #[test]
    fn test_dangling_choice_target_is_noop() {
        let mut player = NovelPlayer::new(branching_novel());
        let commands = player.start();
        drain(&mut player, commands);
        advance_settled(&mut player);
        advance_settled(&mut player);

        let state_before = player.state().clone();
        // 目标场景不存在：状态原样不动，不崩溃也不半途过渡
        assert!(player.handle(PlayerInput::choose("chX")).is_empty());
        assert_eq!(player.state(), &state_before);

        // 未知选项 ID 同样无操作
        assert!(player.handle(PlayerInput::choose("missing")).is_empty());
        assert_eq!(player.state(), &state_before);
    }

    #[test]
    fn test_choose_without_pending_choices_is_noop() {
        let mut player = NovelPlayer::new(branching_novel());
        let commands = player.start();
        drain(&mut player, commands);

        // 普通句上选择：无操作
        assert!(player.handle(PlayerInput::choose("chA")).is_empty());
        assert_eq!(player.state().position.scene_index, 0);
    }

    #[test]
    fn test_restart_resets_position_and_keeps_mute() {
        let mut player = NovelPlayer::new(linear_novel(&["一", "二"]));
        let commands = player.start();
        drain(&mut player, commands);

        player.handle(PlayerInput::ToggleMute);
        advance_settled(&mut player);
        advance_settled(&mut player);
        assert!(player.is_finished());

        let commands = player.handle(PlayerInput::Restart);
        drain(&mut player, commands);

        assert!(!player.is_finished());
        assert_eq!(player.state().position, Default::default());
        // 静音态在重开后保留
        assert!(player.muted());
    }

    #[test]
    fn test_restart_before_finish_is_noop() {
        let mut player = NovelPlayer::new(linear_novel(&["一", "二"]));
        let commands = player.start();
        drain(&mut player, commands);

        assert!(player.handle(PlayerInput::Restart).is_empty());
        assert_eq!(player.state().position.dialogue_index, 0);
    }

    #[test]
    fn test_bgm_continuity_across_scenes_and_restart() {
        let mut player = NovelPlayer::new(branching_novel());
        let commands = player.start();
        let audio = drain(&mut player, commands);
        assert!(audio.contains(&AudioCommand::PlayMusic {
            url: "x.mp3".to_string(),
            looping: true,
        }));

        advance_settled(&mut player);
        // 场景 1 -> 场景 2 同曲：没有任何音乐指令
        let audio = advance_settled(&mut player);
        assert!(
            !audio
                .iter()
                .any(|c| matches!(c, AudioCommand::StopMusic | AudioCommand::PlayMusic { .. }))
        );
    }

    #[test]
    fn test_finish_pauses_music_and_restart_resumes() {
        let mut player = NovelPlayer::new(
            Novel::from_json(
                r#"{"id": "n", "title": "t",
                    "scenes": [{"id": "s1", "name": "S", "backgroundUrl": "bg.jpg",
                                "bgmUrl": "x.mp3",
                                "dialogues": [{"id": "d1", "text": "完"}]}]}"#,
            )
            .unwrap(),
        );
        let commands = player.start();
        drain(&mut player, commands);

        let audio = advance_settled(&mut player);
        assert!(player.is_finished());
        assert_eq!(audio, vec![AudioCommand::PauseMusic]);

        // 重开：同曲恢复而不是重载
        let commands = player.handle(PlayerInput::Restart);
        let audio = drain(&mut player, commands);
        assert!(audio.contains(&AudioCommand::ResumeMusic));
        assert!(!audio.iter().any(|c| matches!(c, AudioCommand::PlayMusic { .. })));
    }

    #[test]
    fn test_exit_stops_audio_and_deadens_input() {
        let mut player = NovelPlayer::new(branching_novel());
        let commands = player.start();
        drain(&mut player, commands);

        let commands = player.handle(PlayerInput::Exit);
        assert!(commands.contains(&Command::Audio(AudioCommand::StopMusic)));

        // 关闭后一切输入无效
        assert!(player.handle(PlayerInput::Advance).is_empty());
        assert!(player.handle(PlayerInput::Restart).is_empty());
        assert_eq!(player.state().position.dialogue_index, 0);
    }

    #[test]
    fn test_empty_novel_is_inert() {
        let mut player =
            NovelPlayer::new(Novel::from_json(r#"{"id": "n", "title": "空"}"#).unwrap());
        let commands = player.start();
        assert!(commands.is_empty());

        let frame = player.frame();
        assert!(frame.presentation.is_none());

        // 没有场景：推进无操作、不崩溃
        assert!(player.handle(PlayerInput::Advance).is_empty());
        assert!(!player.is_finished());
    }

    #[test]
    fn test_empty_scene_falls_through_to_next() {
        let mut player = NovelPlayer::new(
            Novel::from_json(
                r#"{"id": "n", "title": "t",
                    "scenes": [
                        {"id": "s1", "name": "空场景", "backgroundUrl": "a.jpg"},
                        {"id": "s2", "name": "有戏", "backgroundUrl": "b.jpg",
                         "transition": "none",
                         "dialogues": [{"id": "d1", "text": "终于"}]}
                    ]}"#,
            )
            .unwrap(),
        );
        let commands = player.start();
        drain(&mut player, commands);
        assert!(player.frame().presentation.is_none());

        // 空场景上推进：按"已讲完"处理，过渡到下一场景
        advance_settled(&mut player);
        assert_eq!(player.state().position.scene_index, 1);
    }

    #[test]
    fn test_none_transition_commits_inline() {
        let mut player = NovelPlayer::new(
            Novel::from_json(
                r#"{"id": "n", "title": "t",
                    "scenes": [
                        {"id": "s1", "name": "一", "backgroundUrl": "a.jpg",
                         "dialogues": [{"id": "d1", "text": "走"}]},
                        {"id": "s2", "name": "二", "backgroundUrl": "b.jpg",
                         "transition": "none",
                         "dialogues": [{"id": "d2", "text": "到"}]}
                    ]}"#,
            )
            .unwrap(),
        );
        let commands = player.start();
        drain(&mut player, commands);

        // none 过渡：推进当场提交位置，不经过任何过渡定时器
        let commands = player.handle(PlayerInput::Advance);
        assert_eq!(player.state().position.scene_index, 1);
        assert_eq!(player.state().transition, TransitionPhase::Idle);
        assert!(commands.iter().all(|c| !matches!(
            c,
            Command::Schedule { token, .. } if token.kind != TimerKind::TypeTick
        )));
    }

    #[test]
    fn test_mute_toggle_round_trip() {
        let mut player = NovelPlayer::new(linear_novel(&["一"]));
        let commands = player.start();
        drain(&mut player, commands);

        let commands = player.handle(PlayerInput::ToggleMute);
        assert_eq!(
            commands,
            vec![Command::Audio(AudioCommand::SetMuted { muted: true })]
        );
        assert!(player.frame().muted);

        // 静音不影响播放位置
        assert_eq!(player.state().position.dialogue_index, 0);

        let commands = player.handle(PlayerInput::ToggleMute);
        assert_eq!(
            commands,
            vec![Command::Audio(AudioCommand::SetMuted { muted: false })]
        );
    }

    #[test]
    fn test_voice_and_sfx_fire_per_dialogue() {
        let mut player = NovelPlayer::new(
            Novel::from_json(
                r#"{"id": "n", "title": "t",
                    "scenes": [{"id": "s1", "name": "S", "backgroundUrl": "bg.jpg",
                        "dialogues": [
                            {"id": "d1", "text": "一", "voiceUrl": "v.mp3", "sfxUrl": "e.mp3"},
                            {"id": "d2", "text": "二", "voiceUrl": "v.mp3"}
                        ]}]}"#,
            )
            .unwrap(),
        );
        let commands = player.start();
        let audio = drain(&mut player, commands);
        assert_eq!(
            audio,
            vec![
                AudioCommand::PlayVoice {
                    url: "v.mp3".to_string()
                },
                AudioCommand::PlaySfx {
                    url: "e.mp3".to_string()
                },
            ]
        );

        // 第二句同一条语音：仍然先停再播；音效停掉
        let audio = advance_settled(&mut player);
        assert_eq!(
            audio,
            vec![
                AudioCommand::StopVoice,
                AudioCommand::PlayVoice {
                    url: "v.mp3".to_string()
                },
                AudioCommand::StopSfx,
            ]
        );
    }

    #[test]
    fn test_show_choices_waits_for_typing() {
        let mut player = NovelPlayer::new(branching_novel());
        let commands = player.start();
        drain(&mut player, commands);
        advance_settled(&mut player);
        let commands = player.handle(PlayerInput::Advance);

        // 过渡在途：不显示选项
        assert!(!player.frame().show_choices);
        drain(&mut player, commands);

        // 过渡与打字机结清后才显示
        assert!(player.frame().show_choices);
    }
}
