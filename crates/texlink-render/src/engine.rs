use std::sync::Arc;

use texlink_core::{
    CustomRenderConfig, EncodedFrameParam, FlipMode, MediaPlayerFirstFrameEvent, PlayerHandle,
    PublishChannel, VideoFrameFormat, VideoFrameParam,
};

// ──────────────────────────────────────────────────────────────────────────────
// Media engine
// ──────────────────────────────────────────────────────────────────────────────

/// The slice of the media engine SDK the controller drives.
pub trait MediaEngine: Send + Sync {
    /// Switch the engine to handing raw frames to a custom renderer.
    fn enable_custom_video_render(&self, enable: bool, config: &CustomRenderConfig);

    /// Install (or with `None`, remove) the target of raw-frame callbacks.
    fn set_custom_video_render_handler(&self, handler: Option<Arc<dyn CustomVideoRenderHandler>>);
}

/// Receiver of frames for local previews and remote streams.
///
/// Called on the engine's own threads. `data` is the first plane of the
/// frame and stays owned by the engine.
pub trait CustomVideoRenderHandler: Send + Sync {
    fn on_captured_video_frame_raw_data(
        &self,
        data: &[u8],
        param: &VideoFrameParam,
        flip_mode: FlipMode,
        channel: PublishChannel,
    );

    fn on_remote_video_frame_raw_data(&self, data: &[u8], param: &VideoFrameParam, stream_id: &str);

    fn on_remote_video_frame_encoded_data(
        &self,
        _data: &[u8],
        _param: &EncodedFrameParam,
        _reference_time_ms: u64,
        _stream_id: &str,
    ) {
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Media player
// ──────────────────────────────────────────────────────────────────────────────

/// A media player instance owned by the engine wrapper.
pub trait MediaPlayer: Send + Sync {
    /// Stable identity of this player, used as a registry key.
    fn handle(&self) -> PlayerHandle;

    /// Engine-side index, for logging.
    fn index(&self) -> i32;

    /// Install or remove the handler that receives this player's frames.
    ///
    /// Once this returns with `None`, no further frame callback may start.
    fn set_video_handler(
        &self,
        handler: Option<Arc<dyn MediaPlayerVideoHandler>>,
        format: VideoFrameFormat,
    );
}

/// Receiver of decoded media-player frames.
pub trait MediaPlayerVideoHandler: Send + Sync {
    fn on_video_frame(&self, player: PlayerHandle, data: &[u8], param: &VideoFrameParam);

    fn on_video_frame_with_extra_info(
        &self,
        _player: PlayerHandle,
        _data: &[u8],
        _param: &VideoFrameParam,
        _extra_info: &str,
    ) {
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Engine events
// ──────────────────────────────────────────────────────────────────────────────

/// One-shot milestones reported back to the bridge layer.
pub trait EngineEventHandler: Send + Sync {
    fn on_publisher_render_video_first_frame(&self, channel: PublishChannel);

    fn on_media_player_first_frame_event(
        &self,
        player: PlayerHandle,
        event: MediaPlayerFirstFrameEvent,
    );
}
