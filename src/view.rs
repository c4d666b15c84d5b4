use crate::{
    activity::ActivityEntry,
    block_feed::BlockList,
    model::WagerKind,
};
use std::{
    collections::{
        HashMap,
        VecDeque,
    },
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
};
use tokio::sync::Notify;

const MAX_ACTIVITY: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Panel {
    WalletAddress,
    WalletMessage,
    Balance,
    Game(WagerKind),
}

/// Visual severity of a panel's content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tone {
    #[default]
    Neutral,
    Success,
    Danger,
    Info,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelContent {
    pub value: String,
    pub tone: Tone,
}

/// The only way protocol code touches the screen.
pub trait ViewPort: Clone + Send + Sync + 'static {
    fn display(&self, panel: Panel, value: String, tone: Tone);

    /// Blocking notice for bad input, dismissed by the user.
    fn prompt(&self, message: String);

    /// Replaces the whole rendered block list.
    fn render_blocks(&self, blocks: BlockList);

    fn append_activity(&self, entry: ActivityEntry);
}

#[derive(Clone, Debug, Default)]
pub struct ViewModel {
    panels: HashMap<Panel, PanelContent>,
    pub prompt: Option<String>,
    /// `None` until the first successful block fetch; the placeholder notice
    /// is drawn instead.
    pub feed: Option<BlockList>,
    /// Newest entry first.
    pub activity: VecDeque<ActivityEntry>,
}

impl ViewModel {
    /// `None` means the panel is hidden.
    pub fn panel(&self, panel: Panel) -> Option<&PanelContent> {
        self.panels.get(&panel)
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        self.panels.contains_key(&panel)
    }
}

/// In-memory view model shared between protocol tasks and the renderer.
#[derive(Clone, Default)]
pub struct SharedView {
    model: Arc<Mutex<ViewModel>>,
    changed: Arc<Notify>,
}

impl SharedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewModel {
        self.lock().clone()
    }

    /// Resolves after the next change to the model.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    pub fn dismiss_prompt(&self) {
        self.update(|model| model.prompt = None);
    }

    fn lock(&self) -> MutexGuard<'_, ViewModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut ViewModel)) {
        apply(&mut self.lock());
        self.changed.notify_one();
    }
}

impl ViewPort for SharedView {
    fn display(&self, panel: Panel, value: String, tone: Tone) {
        self.update(|model| {
            model.panels.insert(panel, PanelContent { value, tone });
        });
    }

    fn prompt(&self, message: String) {
        self.update(|model| model.prompt = Some(message));
    }

    fn render_blocks(&self, blocks: BlockList) {
        self.update(|model| model.feed = Some(blocks));
    }

    fn append_activity(&self, entry: ActivityEntry) {
        self.update(|model| {
            model.activity.push_front(entry);
            model.activity.truncate(MAX_ACTIVITY);
        });
    }
}
