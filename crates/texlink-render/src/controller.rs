//! The renderer controller: lifecycle and the control surface the bridge
//! layer calls into. Frame entry points live in [`crate::ingest`].

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use texlink_core::{
    FrameBuffer, PlayerHandle, PublishChannel, TexlinkConfig, TexlinkResult, TextureId,
    VideoSourceType, ViewMode,
};

use crate::engine::{
    CustomVideoRenderHandler, EngineEventHandler, MediaEngine, MediaPlayer, MediaPlayerVideoHandler,
};
use crate::notifier::{ChangeNotifier, EventChannelHost};
use crate::registrar::TextureRegistrar;
use crate::registry::SourceRegistry;
use crate::surface::{SurfaceTable, TextureSurface};

/// Routes media-engine frames to texture surfaces.
///
/// Constructed once by the plugin layer and shared as an `Arc`. Every method
/// may be called from any thread.
pub struct TextureRendererController {
    pub(crate) config: TexlinkConfig,
    pub(crate) engine: Arc<dyn MediaEngine>,
    pub(crate) engine_events: Arc<dyn EngineEventHandler>,
    pub(crate) surfaces: SurfaceTable,
    pub(crate) registry: Mutex<SourceRegistry>,
    pub(crate) notifier: Arc<ChangeNotifier>,
    pub(crate) render_observer: RwLock<Option<Arc<dyn CustomVideoRenderHandler>>>,
    pub(crate) player_observer: RwLock<Option<Arc<dyn MediaPlayerVideoHandler>>>,
    initialized: Mutex<bool>,
}

impl TextureRendererController {
    pub fn new(
        config: TexlinkConfig,
        engine: Arc<dyn MediaEngine>,
        engine_events: Arc<dyn EngineEventHandler>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            engine,
            engine_events,
            surfaces: SurfaceTable::new(),
            registry: Mutex::new(SourceRegistry::new()),
            notifier: Arc::new(ChangeNotifier::new()),
            render_observer: RwLock::new(None),
            player_observer: RwLock::new(None),
            initialized: Mutex::new(false),
        })
    }

    // ──────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ──────────────────────────────────────────────────────────────────────

    /// Open the UI event channel and become the engine's custom renderer.
    ///
    /// A no-op while already initialized. Returns whether this call did the
    /// initialization.
    pub fn init(self: &Arc<Self>, host: &dyn EventChannelHost) -> bool {
        let mut initialized = self.initialized.lock();
        if *initialized {
            return false;
        }

        host.open_event_channel(&self.config.event_channel.name, self.notifier.clone());
        self.engine
            .enable_custom_video_render(true, &self.config.custom_render);
        let handler: Arc<dyn CustomVideoRenderHandler> = self.clone();
        self.engine.set_custom_video_render_handler(Some(handler));

        *initialized = true;
        tracing::info!(
            "[init] event channel '{}', custom render {:?}",
            self.config.event_channel.name,
            self.config.custom_render
        );
        true
    }

    /// Clear every binding and destroy every surface. Safe to call at any time.
    pub fn uninit(&self) {
        let mut initialized = self.initialized.lock();
        if *initialized {
            self.engine.set_custom_video_render_handler(None);
        }
        let destroyed = self.teardown();
        *initialized = false;
        tracing::info!("[uninit] destroyed {} surfaces", destroyed);
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.lock()
    }

    fn teardown(&self) -> usize {
        self.registry.lock().clear();
        self.surfaces.destroy_all()
    }

    // ──────────────────────────────────────────────────────────────────────
    // Surfaces
    // ──────────────────────────────────────────────────────────────────────

    /// Fails only if the registrar hands out an id that is still live.
    pub fn create_texture_renderer(
        &self,
        registrar: Arc<dyn TextureRegistrar>,
        width: u32,
        height: u32,
    ) -> TexlinkResult<TextureId> {
        let id = self.surfaces.create(registrar, width, height).map_err(|err| {
            tracing::warn!("[createTextureRenderer] {}", err);
            err
        })?;
        tracing::info!(
            "[createTextureRenderer] textureID: {}, width: {}, height: {}",
            id,
            width,
            height
        );
        Ok(id)
    }

    /// Release a surface. Bindings that still point at it go inert.
    pub fn destroy_texture_renderer(&self, texture_id: TextureId) -> bool {
        tracing::info!("[destroyTextureRenderer] textureID: {}", texture_id);
        let destroyed = self.surfaces.destroy(texture_id);
        if destroyed {
            self.registry.lock().forget_alpha(texture_id);
        }
        destroyed
    }

    /// The surface behind `texture_id`, for compositing reads.
    pub fn surface(&self, texture_id: TextureId) -> Option<Arc<TextureSurface>> {
        self.surfaces.get(texture_id)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    // ──────────────────────────────────────────────────────────────────────
    // Bindings
    // ──────────────────────────────────────────────────────────────────────

    fn prepare_binding(&self, texture_id: TextureId, view_mode: ViewMode) -> bool {
        match self.surfaces.require(texture_id) {
            Ok(surface) => {
                surface.set_view_mode(view_mode);
                true
            }
            Err(err) => {
                tracing::warn!("binding rejected: {}", err);
                false
            }
        }
    }

    pub fn add_captured_renderer(
        &self,
        texture_id: TextureId,
        channel: PublishChannel,
        view_mode: ViewMode,
    ) -> bool {
        tracing::info!(
            "[addCapturedRenderer] textureID: {}, channel: {}, viewMode: {:?}",
            texture_id,
            channel,
            view_mode
        );
        if !self.prepare_binding(texture_id, view_mode) {
            return false;
        }
        self.registry.lock().bind_capture(channel, texture_id);
        true
    }

    pub fn remove_captured_renderer(&self, channel: PublishChannel) {
        tracing::info!("[removeCapturedRenderer] channel: {}", channel);
        self.registry.lock().unbind_capture(channel);
    }

    pub fn add_remote_renderer(
        &self,
        texture_id: TextureId,
        stream_id: &str,
        view_mode: ViewMode,
    ) -> bool {
        tracing::info!(
            "[addRemoteRenderer] textureID: {}, streamID: {}, viewMode: {:?}",
            texture_id,
            stream_id,
            view_mode
        );
        if !self.prepare_binding(texture_id, view_mode) {
            return false;
        }
        self.registry.lock().bind_stream(stream_id, texture_id);
        true
    }

    pub fn remove_remote_renderer(&self, stream_id: &str) {
        tracing::info!("[removeRemoteRenderer] streamID: {}", stream_id);
        self.registry.lock().unbind_stream(stream_id);
    }

    pub fn add_media_player_renderer(
        &self,
        texture_id: TextureId,
        player: &dyn MediaPlayer,
        view_mode: ViewMode,
    ) -> bool {
        tracing::info!(
            "[addMediaPlayerRenderer] textureID: {}, index: {}, viewMode: {:?}",
            texture_id,
            player.index(),
            view_mode
        );
        if !self.prepare_binding(texture_id, view_mode) {
            return false;
        }
        self.registry.lock().bind_player(player.handle(), texture_id);
        true
    }

    /// Disarm the player's frame handler, then drop its binding.
    ///
    /// After this returns no frame from `player` reaches a surface.
    pub fn remove_media_player_renderer(&self, player: &dyn MediaPlayer) {
        tracing::info!("[removeMediaPlayerRenderer] index: {}", player.index());
        player.set_video_handler(None, self.config.media_player.frame_format);
        self.registry.lock().unbind_player(player.handle());
    }

    // ──────────────────────────────────────────────────────────────────────
    // Configuration
    // ──────────────────────────────────────────────────────────────────────

    /// Premultiply frames written to `texture_id`. Ignored for unknown ids.
    pub fn enable_texture_alpha(&self, enable: bool, texture_id: TextureId) {
        tracing::info!(
            "[enableTextureAlpha] textureID: {}, enable: {}",
            texture_id,
            enable
        );
        if !self.surfaces.contains(texture_id) {
            return;
        }
        self.registry.lock().set_alpha(texture_id, enable);
    }

    pub fn set_video_source_channel(&self, channel: PublishChannel, source: VideoSourceType) {
        tracing::info!(
            "[setVideoSourceChannel] channel: {}, sourceType: {:?}",
            channel,
            source
        );
        self.registry.lock().set_source_channel_type(channel, source);
    }

    pub fn reset_media_player_render_first_frame(&self, player: PlayerHandle) {
        tracing::info!("[resetMediaPlayerRenderFirstFrame] player: {}", player);
        self.registry.lock().reset_player_first_frame(player);
    }

    pub fn reset_all_render_first_frame(&self) {
        tracing::info!("[resetAllRenderFirstFrame]");
        self.registry.lock().reset_all_first_frames();
    }

    /// Kept for bridge compatibility; rendering is always driven by frames.
    pub fn start_rendering(&self) {}

    pub fn stop_rendering(&self) {}

    // ──────────────────────────────────────────────────────────────────────
    // External observers
    // ──────────────────────────────────────────────────────────────────────

    /// Receive every capture/remote frame after local rendering.
    pub fn set_custom_video_render_handler(
        &self,
        handler: Option<Arc<dyn CustomVideoRenderHandler>>,
    ) {
        *self.render_observer.write() = handler;
    }

    /// Receive every media-player frame after local rendering.
    pub fn set_media_player_video_handler(
        &self,
        handler: Option<Arc<dyn MediaPlayerVideoHandler>>,
    ) {
        *self.player_observer.write() = handler;
    }

    // ──────────────────────────────────────────────────────────────────────
    // Player snapshots
    // ──────────────────────────────────────────────────────────────────────

    fn player_surface(&self, player: PlayerHandle) -> Option<Arc<TextureSurface>> {
        let registry = self.registry.lock();
        registry
            .player(player)
            .and_then(|id| self.surfaces.get(id))
    }

    /// Size of the surface bound to `player`, `(0, 0)` if unbound.
    pub fn media_player_size(&self, player: PlayerHandle) -> (u32, u32) {
        self.player_surface(player)
            .map(|s| s.size())
            .unwrap_or((0, 0))
    }

    pub fn media_player_frame(&self, player: PlayerHandle) -> Option<Vec<u8>> {
        self.player_surface(player).map(|s| s.frame())
    }

    /// Row stride of the player's last frame, 0 if unbound.
    pub fn media_player_frame_stride(&self, player: PlayerHandle) -> u32 {
        self.player_surface(player)
            .map(|s| s.frame_stride())
            .unwrap_or(0)
    }

    pub fn media_player_snapshot(&self, player: PlayerHandle) -> Option<FrameBuffer> {
        self.player_surface(player).map(|s| s.snapshot())
    }
}

impl Drop for TextureRendererController {
    fn drop(&mut self) {
        self.teardown();
    }
}
