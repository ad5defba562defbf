/// When the control shows its scrollbar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollbarMode {
    /// Visible only while the content overflows the viewport.
    #[default]
    Automatic,
    Never,
    Always,
}

/// The read surface consumed by a scrollbar sub-widget.
///
/// Rendering and drag hit-testing live with the widget; it reads this state
/// and writes back through the control's `scroll_to`/`scroll_by_px`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollbarState {
    pub anchored_index: Option<usize>,
    pub first_visible: Option<usize>,
    pub last_visible: Option<usize>,
    pub can_scroll: bool,
}

/// Main-axis scrollbar wiring: visibility per [`ScrollbarMode`] plus the
/// per-frame state snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scrollbar {
    mode: ScrollbarMode,
    visible: bool,
    state: ScrollbarState,
}

impl Scrollbar {
    pub fn new(mode: ScrollbarMode) -> Self {
        Self {
            mode,
            visible: mode == ScrollbarMode::Always,
            state: ScrollbarState::default(),
        }
    }

    pub fn mode(&self) -> ScrollbarMode {
        self.mode
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn state(&self) -> &ScrollbarState {
        &self.state
    }

    pub(crate) fn sync(&mut self, state: ScrollbarState) {
        self.state = state;
        self.visible = match self.mode {
            ScrollbarMode::Automatic => state.can_scroll,
            ScrollbarMode::Never => false,
            ScrollbarMode::Always => true,
        };
    }
}
