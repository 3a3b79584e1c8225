//! Source-to-surface bindings and per-source bookkeeping.
//!
//! [`SourceRegistry`] is a plain data structure; the controller keeps it
//! behind a single mutex so bindings are never observed half-updated.

use std::collections::{BTreeMap, HashMap, HashSet};

use texlink_core::{PlayerHandle, PublishChannel, TextureId, VideoSourceType};

#[derive(Debug, Default)]
pub struct SourceRegistry {
    captured: HashMap<PublishChannel, TextureId>,
    remote: HashMap<String, TextureId>,
    players: HashMap<PlayerHandle, TextureId>,
    alpha: HashMap<TextureId, bool>,
    // Ordered so the lowest screen-capture channel wins.
    source_channels: BTreeMap<PublishChannel, VideoSourceType>,
    captured_first_frame: HashSet<PublishChannel>,
    player_first_frame: HashSet<PlayerHandle>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Capture channels

    /// Bind `channel` to `id`, returning the binding it replaced.
    pub fn bind_capture(&mut self, channel: PublishChannel, id: TextureId) -> Option<TextureId> {
        self.captured.insert(channel, id)
    }

    pub fn unbind_capture(&mut self, channel: PublishChannel) -> Option<TextureId> {
        self.captured_first_frame.remove(&channel);
        self.captured.remove(&channel)
    }

    pub fn captured(&self, channel: PublishChannel) -> Option<TextureId> {
        self.captured.get(&channel).copied()
    }

    // Remote streams

    pub fn bind_stream(&mut self, stream_id: &str, id: TextureId) -> Option<TextureId> {
        self.remote.insert(stream_id.to_string(), id)
    }

    pub fn unbind_stream(&mut self, stream_id: &str) -> Option<TextureId> {
        self.remote.remove(stream_id)
    }

    pub fn stream(&self, stream_id: &str) -> Option<TextureId> {
        self.remote.get(stream_id).copied()
    }

    // Media players

    pub fn bind_player(&mut self, player: PlayerHandle, id: TextureId) -> Option<TextureId> {
        self.players.insert(player, id)
    }

    pub fn unbind_player(&mut self, player: PlayerHandle) -> Option<TextureId> {
        self.player_first_frame.remove(&player);
        self.players.remove(&player)
    }

    pub fn player(&self, player: PlayerHandle) -> Option<TextureId> {
        self.players.get(&player).copied()
    }

    // Alpha

    pub fn set_alpha(&mut self, id: TextureId, enabled: bool) {
        self.alpha.insert(id, enabled);
    }

    pub fn alpha_enabled(&self, id: TextureId) -> bool {
        self.alpha.get(&id).copied().unwrap_or(false)
    }

    pub fn forget_alpha(&mut self, id: TextureId) {
        self.alpha.remove(&id);
    }

    // Video source channels

    pub fn set_source_channel_type(&mut self, channel: PublishChannel, source: VideoSourceType) {
        self.source_channels.insert(channel, source);
    }

    /// The channel currently fed by screen capture, if any.
    pub fn screen_capture_channel(&self) -> Option<PublishChannel> {
        self.source_channels
            .iter()
            .find(|(_, source)| **source == VideoSourceType::ScreenCapture)
            .map(|(channel, _)| *channel)
    }

    // First-frame tracking

    /// Record a rendered frame on `channel`. True the first time since reset.
    pub fn mark_capture_first_frame(&mut self, channel: PublishChannel) -> bool {
        self.captured_first_frame.insert(channel)
    }

    /// Record a rendered frame for `player`. True the first time since reset.
    pub fn mark_player_first_frame(&mut self, player: PlayerHandle) -> bool {
        self.player_first_frame.insert(player)
    }

    pub fn reset_player_first_frame(&mut self, player: PlayerHandle) {
        self.player_first_frame.remove(&player);
    }

    pub fn reset_all_first_frames(&mut self) {
        self.captured_first_frame.clear();
        self.player_first_frame.clear();
    }

    /// Drop every binding, flag and side-table entry.
    pub fn clear(&mut self) {
        self.captured.clear();
        self.remote.clear();
        self.players.clear();
        self.alpha.clear();
        self.source_channels.clear();
        self.captured_first_frame.clear();
        self.player_first_frame.clear();
    }

    /// Total number of live source bindings across all source kinds.
    pub fn binding_count(&self) -> usize {
        self.captured.len() + self.remote.len() + self.players.len()
    }
}
