//! The volatile workspace model.
//!
//! A [`Workspace`] is plain data plus the rules that keep it consistent:
//! at least one tab, monotonic counters, and the shared-name rule for sounds
//! placed from the same library content. It never touches storage.

use std::collections::HashSet;

use crate::error::{ModelError, ModelResult};
use crate::ids::{SoundId, StorageKey, TabId};

/// Name given to the tab of a fresh workspace.
pub const DEFAULT_TAB_NAME: &str = "Main Sounds";

/// Clamp a gain to `[0, 1]`; non-finite input resets to full volume.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Take the current value of `counter` and step it forward.
fn advance(counter: &mut u64, what: &'static str) -> ModelResult<u64> {
    let next = counter
        .checked_add(1)
        .ok_or(ModelError::IdentifiersExhausted(what))?;
    Ok(std::mem::replace(counter, next))
}

/// Monotonic identifier counters. They are persisted with every snapshot and
/// never decrease.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub next_tab_id: u64,
    pub next_sound_seq: u64,
    pub next_library_seq: u64,
}

/// A placed, playable reference to content.
#[derive(Clone, Debug, PartialEq)]
pub struct Sound {
    pub id: SoundId,
    pub display_name: String,
    /// `None` only for ephemeral sounds.
    pub storage_key: Option<StorageKey>,
    pub volume: f64,
    pub looping: bool,
    /// Quick-play sounds are never stored and never survive a reload.
    pub ephemeral: bool,
}

impl Sound {
    /// A durably stored sound at full volume.
    pub fn persistent(id: SoundId, display_name: impl Into<String>, key: StorageKey) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            storage_key: Some(key),
            volume: 1.0,
            looping: false,
            ephemeral: false,
        }
    }

    /// A quick-play sound with no storage key.
    pub fn ephemeral(id: SoundId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            storage_key: None,
            volume: 1.0,
            looping: false,
            ephemeral: true,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = clamp_unit(volume);
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// The key this sound contributes to persistence and reachability.
    pub fn persisted_key(&self) -> Option<&StorageKey> {
        if self.ephemeral {
            None
        } else {
            self.storage_key.as_ref()
        }
    }
}

/// A named, ordered group of sounds. Order is playback priority.
#[derive(Clone, Debug, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub name: String,
    pub sounds: Vec<Sound>,
}

impl Tab {
    pub fn new(id: TabId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sounds: Vec::new(),
        }
    }

    pub fn sound(&self, id: &SoundId) -> Option<&Sound> {
        self.sounds.iter().find(|s| &s.id == id)
    }

    fn sound_mut(&mut self, id: &SoundId) -> Option<&mut Sound> {
        self.sounds.iter_mut().find(|s| &s.id == id)
    }

    pub fn sound_ids(&self) -> Vec<SoundId> {
        self.sounds.iter().map(|s| s.id.clone()).collect()
    }
}

/// Content promoted to reusable status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryEntry {
    pub key: StorageKey,
    pub display_name: String,
}

impl LibraryEntry {
    pub fn new(key: StorageKey, display_name: impl Into<String>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
        }
    }
}

/// Raw pieces of a workspace, as reconstructed from a snapshot.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceParts {
    pub tabs: Vec<Tab>,
    pub library: Vec<LibraryEntry>,
    pub active_tab: Option<TabId>,
    pub master_volume: f64,
    pub counters: Counters,
}

/// The full in-memory session state.
#[derive(Clone, Debug, PartialEq)]
pub struct Workspace {
    tabs: Vec<Tab>,
    library: Vec<LibraryEntry>,
    active_tab: TabId,
    master_volume: f64,
    counters: Counters,
}

impl Workspace {
    /// A fresh workspace holding one empty tab with id 0.
    pub fn new(default_tab_name: &str) -> Self {
        let first = TabId::new(0);
        Self {
            tabs: vec![Tab::new(first, default_tab_name)],
            library: Vec::new(),
            active_tab: first,
            master_volume: 1.0,
            counters: Counters {
                next_tab_id: 1,
                ..Counters::default()
            },
        }
    }

    /// Assemble a workspace from restored parts.
    ///
    /// Duplicate tab ids, sound ids within a tab, and library keys keep their
    /// first occurrence. An empty tab list gets one default tab. Counters are
    /// raised past every identifier present.
    pub fn from_parts(parts: WorkspaceParts) -> Self {
        let mut seen_tabs = HashSet::new();
        let mut tabs: Vec<Tab> = Vec::with_capacity(parts.tabs.len());
        for mut tab in parts.tabs {
            if !seen_tabs.insert(tab.id) {
                continue;
            }
            let mut seen_sounds = HashSet::new();
            tab.sounds.retain(|s| seen_sounds.insert(s.id.clone()));
            tabs.push(tab);
        }

        let mut seen_keys = HashSet::new();
        let library = parts
            .library
            .into_iter()
            .filter(|e| seen_keys.insert(e.key.clone()))
            .collect();

        let mut ws = Self {
            tabs,
            library,
            active_tab: TabId::new(0),
            master_volume: clamp_unit(parts.master_volume),
            counters: parts.counters,
        };
        ws.reconcile_counters();

        if ws.tabs.is_empty() {
            // no tabs, so id 0 is free even when the counter is spent
            let id = ws.issue_tab_id().unwrap_or_default();
            ws.tabs.push(Tab::new(id, DEFAULT_TAB_NAME));
        }
        ws.active_tab = match parts.active_tab {
            Some(id) if ws.tab(id).is_some() => id,
            _ => ws.tabs[0].id,
        };
        ws
    }

    // ---- Queries ----

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn library(&self) -> &[LibraryEntry] {
        &self.library
    }

    pub fn library_entry(&self, key: &StorageKey) -> Option<&LibraryEntry> {
        self.library.iter().find(|e| &e.key == key)
    }

    pub fn active_tab(&self) -> TabId {
        self.active_tab
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Look up a sound, failing if either the tab or the sound is unknown.
    pub fn sound(&self, tab: TabId, sound: &SoundId) -> ModelResult<&Sound> {
        self.tab(tab)
            .ok_or(ModelError::UnknownTab(tab))?
            .sound(sound)
            .ok_or_else(|| ModelError::UnknownSound {
                tab,
                sound: sound.clone(),
            })
    }

    fn tab_mut(&mut self, id: TabId) -> ModelResult<&mut Tab> {
        self.tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ModelError::UnknownTab(id))
    }

    fn sound_mut(&mut self, tab: TabId, sound: &SoundId) -> ModelResult<&mut Sound> {
        self.tab_mut(tab)?
            .sound_mut(sound)
            .ok_or_else(|| ModelError::UnknownSound {
                tab,
                sound: sound.clone(),
            })
    }

    // ---- Identifier issue ----
    //
    // A counter at `u64::MAX` is spent: the last value is never handed out,
    // so a saturated counter cannot issue an identifier already in use.

    pub fn issue_tab_id(&mut self) -> ModelResult<TabId> {
        let n = advance(&mut self.counters.next_tab_id, "tab ids")?;
        Ok(TabId::new(n))
    }

    pub fn issue_sound_id(&mut self) -> ModelResult<SoundId> {
        let n = advance(&mut self.counters.next_sound_seq, "sound ids")?;
        Ok(SoundId::issue(n))
    }

    pub fn issue_storage_key(&mut self) -> ModelResult<StorageKey> {
        let n = advance(&mut self.counters.next_library_seq, "storage keys")?;
        Ok(StorageKey::issue(n))
    }

    /// Raise counters past every identifier in the workspace. Never lowers
    /// them; an identifier at `u64::MAX` saturates its counter.
    pub fn reconcile_counters(&mut self) {
        let c = &mut self.counters;
        for tab in &self.tabs {
            c.next_tab_id = c.next_tab_id.max(tab.id.get().saturating_add(1));
            for sound in &tab.sounds {
                if let Some(seq) = sound.id.seq() {
                    c.next_sound_seq = c.next_sound_seq.max(seq.saturating_add(1));
                }
                if let Some(seq) = sound.storage_key.as_ref().and_then(StorageKey::seq) {
                    c.next_library_seq = c.next_library_seq.max(seq.saturating_add(1));
                }
            }
        }
        for entry in &self.library {
            if let Some(seq) = entry.key.seq() {
                c.next_library_seq = c.next_library_seq.max(seq.saturating_add(1));
            }
        }
    }

    // ---- Tabs ----

    /// Append an empty tab and make it active. A blank name becomes `Tab <n>`.
    pub fn create_tab(&mut self, name: &str) -> ModelResult<TabId> {
        let id = self.issue_tab_id()?;
        let name = match name.trim() {
            "" => format!("Tab {}", id.get() + 1),
            trimmed => trimmed.to_string(),
        };
        self.tabs.push(Tab::new(id, name));
        self.active_tab = id;
        Ok(id)
    }

    /// Rename a tab. Unknown ids and blank names are ignored; returns whether
    /// anything changed.
    pub fn rename_tab(&mut self, id: TabId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match self.tab_mut(id) {
            Ok(tab) => {
                tab.name = name.to_string();
                true
            }
            Err(_) => false,
        }
    }

    /// Detach a tab and hand it back with its sounds so the caller can release
    /// them. Activity falls to the first remaining tab.
    pub fn remove_tab(&mut self, id: TabId) -> ModelResult<Tab> {
        let pos = self
            .tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or(ModelError::UnknownTab(id))?;
        if self.tabs.len() == 1 {
            return Err(ModelError::LastTab);
        }
        let tab = self.tabs.remove(pos);
        if self.active_tab == id {
            self.active_tab = self.tabs[0].id;
        }
        Ok(tab)
    }

    pub fn switch_active(&mut self, id: TabId) -> ModelResult<()> {
        self.tab_mut(id)?;
        self.active_tab = id;
        Ok(())
    }

    // ---- Sounds ----

    /// Append a sound to a tab.
    pub fn push_sound(&mut self, tab: TabId, sound: Sound) -> ModelResult<()> {
        self.tab_mut(tab)?.sounds.push(sound);
        Ok(())
    }

    /// Place a library entry's content into a tab as a new persistent sound.
    pub fn place_from_library(&mut self, tab: TabId, key: &StorageKey) -> ModelResult<SoundId> {
        self.tab_mut(tab)?;
        let name = self
            .library_entry(key)
            .ok_or_else(|| ModelError::UnknownLibraryEntry(key.clone()))?
            .display_name
            .clone();
        let id = self.issue_sound_id()?;
        self.push_sound(tab, Sound::persistent(id.clone(), name, key.clone()))?;
        Ok(id)
    }

    /// Rename a sound. When its key belongs to a library entry the name is a
    /// property of the content: the entry and every sound placing that key
    /// are renamed together. Blank names are ignored.
    pub fn rename_sound(&mut self, tab: TabId, sound: &SoundId, name: &str) -> ModelResult<bool> {
        let shared = self
            .sound(tab, sound)?
            .persisted_key()
            .filter(|k| self.library_entry(k).is_some())
            .cloned();
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        match shared {
            Some(key) => self.propagate_name(&key, name),
            None => self.sound_mut(tab, sound)?.display_name = name.to_string(),
        }
        Ok(true)
    }

    /// Detach a sound and hand it back so the caller can release its content.
    pub fn remove_sound(&mut self, tab: TabId, sound: &SoundId) -> ModelResult<Sound> {
        let t = self.tab_mut(tab)?;
        let pos = t
            .sounds
            .iter()
            .position(|s| &s.id == sound)
            .ok_or_else(|| ModelError::UnknownSound {
                tab,
                sound: sound.clone(),
            })?;
        Ok(t.sounds.remove(pos))
    }

    /// Detach every sound of a tab.
    pub fn clear_tab(&mut self, tab: TabId) -> ModelResult<Vec<Sound>> {
        Ok(std::mem::take(&mut self.tab_mut(tab)?.sounds))
    }

    /// Replace a tab's ordering. `order` must be a permutation of its sound ids.
    pub fn reorder_sounds(&mut self, tab: TabId, order: &[SoundId]) -> ModelResult<()> {
        let t = self.tab_mut(tab)?;
        let mut current = t.sound_ids();
        let mut wanted = order.to_vec();
        current.sort();
        wanted.sort();
        if current != wanted {
            return Err(ModelError::NotAPermutation { tab });
        }
        t.sounds.sort_by_key(|s| {
            order
                .iter()
                .position(|id| id == &s.id)
                .unwrap_or(usize::MAX)
        });
        Ok(())
    }

    pub fn set_sound_volume(&mut self, tab: TabId, sound: &SoundId, volume: f64) -> ModelResult<()> {
        self.sound_mut(tab, sound)?.volume = clamp_unit(volume);
        Ok(())
    }

    /// Flip a sound's loop flag and return the new value.
    pub fn toggle_loop(&mut self, tab: TabId, sound: &SoundId) -> ModelResult<bool> {
        let s = self.sound_mut(tab, sound)?;
        s.looping = !s.looping;
        Ok(s.looping)
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = clamp_unit(volume);
    }

    // ---- Library ----

    /// Insert a library entry, replacing the name of an existing one.
    pub fn upsert_library_entry(&mut self, entry: LibraryEntry) {
        match self.library.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => existing.display_name = entry.display_name,
            None => self.library.push(entry),
        }
    }

    /// Rename a library entry and every sound placing its key.
    pub fn rename_library_entry(&mut self, key: &StorageKey, name: &str) -> ModelResult<bool> {
        if self.library_entry(key).is_none() {
            return Err(ModelError::UnknownLibraryEntry(key.clone()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        self.propagate_name(key, name);
        Ok(true)
    }

    pub fn remove_library_entry(&mut self, key: &StorageKey) -> ModelResult<LibraryEntry> {
        let pos = self
            .library
            .iter()
            .position(|e| &e.key == key)
            .ok_or_else(|| ModelError::UnknownLibraryEntry(key.clone()))?;
        Ok(self.library.remove(pos))
    }

    fn propagate_name(&mut self, key: &StorageKey, name: &str) {
        if let Some(entry) = self.library.iter_mut().find(|e| &e.key == key) {
            entry.display_name = name.to_string();
        }
        for sound in self.tabs.iter_mut().flat_map(|t| t.sounds.iter_mut()) {
            if sound.persisted_key() == Some(key) {
                sound.display_name = name.to_string();
            }
        }
    }
}
