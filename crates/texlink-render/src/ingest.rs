//! Frame entry points, called on media-engine threads.
//!
//! Each entry point resolves its source and writes the surface inside one
//! registry critical section, then forwards the engine's untouched buffer to
//! the external observer outside it. A binding removed before the lock is
//! taken is never written; one removed after waits for the write to finish.

use texlink_core::{
    EncodedFrameParam, FlipMode, MediaPlayerFirstFrameEvent, PlayerHandle, PublishChannel,
    VideoFrameParam,
};

use crate::controller::TextureRendererController;
use crate::engine::{CustomVideoRenderHandler, MediaPlayerVideoHandler};
use crate::surface::TextureSurface;

impl TextureRendererController {
    /// Notify, apply the mirror flag and copy the frame. False if nothing was written.
    fn render_frame(
        &self,
        surface: &TextureSurface,
        data: &[u8],
        param: &VideoFrameParam,
        is_mirror: Option<bool>,
        premultiply: bool,
    ) -> bool {
        self.notifier
            .notify_if_changed(surface, param.width, param.height, is_mirror);
        if let Some(mirror) = is_mirror {
            surface.set_mirror(mirror);
        }
        match surface.update_buffer(data, param, premultiply) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("dropped frame for surface {}: {}", surface.id(), err);
                false
            }
        }
    }

    /// A local preview frame for `channel`.
    pub fn on_captured_video_frame(
        &self,
        data: &[u8],
        param: &VideoFrameParam,
        flip_mode: FlipMode,
        channel: PublishChannel,
    ) {
        {
            let mut registry = self.registry.lock();
            let surface = registry
                .captured(channel)
                .and_then(|id| self.surfaces.get(id));
            if let Some(surface) = surface {
                let premultiply = registry.alpha_enabled(surface.id());
                let written = self.render_frame(
                    &surface,
                    data,
                    param,
                    Some(flip_mode.is_mirror()),
                    premultiply,
                );
                if written && registry.mark_capture_first_frame(channel) {
                    tracing::debug!("first captured frame rendered on channel {}", channel);
                    self.engine_events
                        .on_publisher_render_video_first_frame(channel);
                }
            }
        }

        let observer = self.render_observer.read().clone();
        if let Some(observer) = observer {
            observer.on_captured_video_frame_raw_data(data, param, flip_mode, channel);
        }
    }

    /// A frame from a played remote stream.
    pub fn on_remote_video_frame(&self, data: &[u8], param: &VideoFrameParam, stream_id: &str) {
        {
            let registry = self.registry.lock();
            let surface = registry
                .stream(stream_id)
                .and_then(|id| self.surfaces.get(id));
            if let Some(surface) = surface {
                let premultiply = registry.alpha_enabled(surface.id());
                self.render_frame(&surface, data, param, None, premultiply);
            }
        }

        let observer = self.render_observer.read().clone();
        if let Some(observer) = observer {
            observer.on_remote_video_frame_raw_data(data, param, stream_id);
        }
    }

    /// Encoded remote frames are never rendered locally, only forwarded.
    pub fn on_remote_video_frame_encoded(
        &self,
        data: &[u8],
        param: &EncodedFrameParam,
        reference_time_ms: u64,
        stream_id: &str,
    ) {
        let observer = self.render_observer.read().clone();
        if let Some(observer) = observer {
            observer.on_remote_video_frame_encoded_data(data, param, reference_time_ms, stream_id);
        }
    }

    /// A decoded frame from a media player.
    pub fn on_media_player_video_frame(
        &self,
        player: PlayerHandle,
        data: &[u8],
        param: &VideoFrameParam,
    ) {
        {
            let mut registry = self.registry.lock();
            let surface = registry
                .player(player)
                .and_then(|id| self.surfaces.get(id));
            if let Some(surface) = surface {
                let written = self.render_frame(&surface, data, param, None, false);
                if written && registry.mark_player_first_frame(player) {
                    tracing::debug!("first video frame rendered for {}", player);
                    self.engine_events.on_media_player_first_frame_event(
                        player,
                        MediaPlayerFirstFrameEvent::VideoRendered,
                    );
                }
            }
        }

        let observer = self.player_observer.read().clone();
        if let Some(observer) = observer {
            observer.on_video_frame(player, data, param);
        }
    }

    /// Player frames carrying extra info are only forwarded.
    pub fn on_media_player_video_frame_with_extra_info(
        &self,
        player: PlayerHandle,
        data: &[u8],
        param: &VideoFrameParam,
        extra_info: &str,
    ) {
        let observer = self.player_observer.read().clone();
        if let Some(observer) = observer {
            observer.on_video_frame_with_extra_info(player, data, param, extra_info);
        }
    }

    /// A screen-capture frame with no channel attached.
    ///
    /// Routed to whichever channel is registered as screen capture. Dropped
    /// entirely, observer included, when there is none. Returns whether the
    /// frame was routed.
    pub fn send_screen_captured_video_frame(
        &self,
        data: &[u8],
        param: &VideoFrameParam,
        flip_mode: FlipMode,
    ) -> bool {
        let channel = self.registry.lock().screen_capture_channel();
        match channel {
            Some(channel) => {
                self.on_captured_video_frame(data, param, flip_mode, channel);
                true
            }
            None => {
                tracing::debug!("screen capture frame dropped: no screen capture channel");
                false
            }
        }
    }
}

impl CustomVideoRenderHandler for TextureRendererController {
    fn on_captured_video_frame_raw_data(
        &self,
        data: &[u8],
        param: &VideoFrameParam,
        flip_mode: FlipMode,
        channel: PublishChannel,
    ) {
        self.on_captured_video_frame(data, param, flip_mode, channel);
    }

    fn on_remote_video_frame_raw_data(
        &self,
        data: &[u8],
        param: &VideoFrameParam,
        stream_id: &str,
    ) {
        self.on_remote_video_frame(data, param, stream_id);
    }

    fn on_remote_video_frame_encoded_data(
        &self,
        data: &[u8],
        param: &EncodedFrameParam,
        reference_time_ms: u64,
        stream_id: &str,
    ) {
        self.on_remote_video_frame_encoded(data, param, reference_time_ms, stream_id);
    }
}

impl MediaPlayerVideoHandler for TextureRendererController {
    fn on_video_frame(&self, player: PlayerHandle, data: &[u8], param: &VideoFrameParam) {
        self.on_media_player_video_frame(player, data, param);
    }

    fn on_video_frame_with_extra_info(
        &self,
        player: PlayerHandle,
        data: &[u8],
        param: &VideoFrameParam,
        extra_info: &str,
    ) {
        self.on_media_player_video_frame_with_extra_info(player, data, param, extra_info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use texlink_core::{
        CustomRenderConfig, RendererEvent, TexlinkConfig, TextureId, VideoSourceType, ViewMode,
    };

    use super::*;
    use crate::engine::{EngineEventHandler, MediaEngine};
    use crate::notifier::EventSink;
    use crate::registrar::HeadlessRegistrar;

    struct NullEngine;

    impl MediaEngine for NullEngine {
        fn enable_custom_video_render(&self, _enable: bool, _config: &CustomRenderConfig) {}

        fn set_custom_video_render_handler(
            &self,
            _handler: Option<Arc<dyn CustomVideoRenderHandler>>,
        ) {
        }
    }

    #[derive(Default)]
    struct Recorder {
        first_frames: Mutex<Vec<PublishChannel>>,
        player_first_frames: Mutex<Vec<PlayerHandle>>,
        events: Mutex<Vec<RendererEvent>>,
        observed: Mutex<Vec<Vec<u8>>>,
    }

    impl EngineEventHandler for Recorder {
        fn on_publisher_render_video_first_frame(&self, channel: PublishChannel) {
            self.first_frames.lock().push(channel);
        }

        fn on_media_player_first_frame_event(
            &self,
            player: PlayerHandle,
            _event: MediaPlayerFirstFrameEvent,
        ) {
            self.player_first_frames.lock().push(player);
        }
    }

    impl EventSink for Recorder {
        fn success(&self, event: &RendererEvent) {
            self.events.lock().push(event.clone());
        }
    }

    impl CustomVideoRenderHandler for Recorder {
        fn on_captured_video_frame_raw_data(
            &self,
            data: &[u8],
            _param: &VideoFrameParam,
            _flip_mode: FlipMode,
            _channel: PublishChannel,
        ) {
            self.observed.lock().push(data.to_vec());
        }

        fn on_remote_video_frame_raw_data(
            &self,
            data: &[u8],
            _param: &VideoFrameParam,
            _stream_id: &str,
        ) {
            self.observed.lock().push(data.to_vec());
        }
    }

    fn setup() -> (Arc<TextureRendererController>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let controller = TextureRendererController::new(
            TexlinkConfig::default(),
            Arc::new(NullEngine),
            recorder.clone(),
        );
        controller.notifier.attach(recorder.clone());
        controller.set_custom_video_render_handler(Some(recorder.clone()));
        (controller, recorder)
    }

    fn surface(controller: &TextureRendererController, width: u32, height: u32) -> TextureId {
        controller
            .create_texture_renderer(Arc::new(HeadlessRegistrar::new()), width, height)
            .unwrap()
    }

    fn capture(controller: &TextureRendererController, data: &[u8], size: u32, flip: FlipMode) {
        controller.on_captured_video_frame(
            data,
            &VideoFrameParam::rgba(size, size),
            flip,
            PublishChannel::Main,
        );
    }

    #[test]
    fn test_premultiplied_surface_original_to_observer() {
        let (controller, recorder) = setup();
        let id = surface(&controller, 1, 1);
        controller.add_remote_renderer(id, "s", ViewMode::AspectFit);
        controller.enable_texture_alpha(true, id);

        let data = vec![200, 100, 50, 128];
        controller.on_remote_video_frame(&data, &VideoFrameParam::rgba(1, 1), "s");

        assert_eq!(controller.surface(id).unwrap().frame(), vec![100, 50, 25, 128]);
        assert_eq!(recorder.observed.lock().as_slice(), &[data]);
        // Remote frames have no first-frame tracking.
        assert!(recorder.first_frames.lock().is_empty());
    }

    #[test]
    fn test_capture_premultiplies_when_alpha_enabled() {
        let (controller, recorder) = setup();
        let id = surface(&controller, 1, 1);
        controller.add_captured_renderer(id, PublishChannel::Main, ViewMode::AspectFit);
        controller.enable_texture_alpha(true, id);

        let data = vec![255, 0, 255, 0];
        capture(&controller, &data, 1, FlipMode::None);

        assert_eq!(controller.surface(id).unwrap().frame(), vec![0, 0, 0, 0]);
        assert_eq!(recorder.observed.lock().as_slice(), &[data]);
        assert_eq!(*recorder.first_frames.lock(), vec![PublishChannel::Main]);
    }

    #[test]
    fn test_capture_mirror_flag_follows_flip_mode() {
        let (controller, recorder) = setup();
        let id = surface(&controller, 2, 2);
        controller.add_captured_renderer(id, PublishChannel::Main, ViewMode::AspectFit);

        let data = vec![0u8; 16];
        capture(&controller, &data, 2, FlipMode::X);
        assert!(controller.surface(id).unwrap().is_mirror());
        assert_eq!(
            recorder.events.lock().as_slice(),
            &[RendererEvent::update(id, 2, 2, Some(true))]
        );

        capture(&controller, &data, 2, FlipMode::Y);
        assert!(!controller.surface(id).unwrap().is_mirror());
        assert_eq!(recorder.events.lock().len(), 2);
    }

    #[test]
    fn test_malformed_frame_not_written_but_forwarded() {
        let (controller, recorder) = setup();
        let id = surface(&controller, 2, 2);
        controller.add_captured_renderer(id, PublishChannel::Main, ViewMode::AspectFit);

        capture(&controller, &[0u8; 3], 2, FlipMode::None);

        assert!(controller.surface(id).unwrap().frame().is_empty());
        assert!(recorder.first_frames.lock().is_empty());
        assert_eq!(recorder.observed.lock().len(), 1);
    }

    #[test]
    fn test_narrow_stride_frame_is_refused() {
        let (controller, recorder) = setup();
        let registrar = Arc::new(HeadlessRegistrar::new());
        let id = controller.create_texture_renderer(registrar.clone(), 4, 4).unwrap();
        controller.add_captured_renderer(id, PublishChannel::Main, ViewMode::AspectFit);

        let mut param = VideoFrameParam::rgba(4, 4);
        param.strides[0] = 4;
        controller.on_captured_video_frame(
            &[0u8; 16],
            &param,
            FlipMode::None,
            PublishChannel::Main,
        );

        assert_eq!(registrar.frames_available(id), Some(0));
        assert!(controller.surface(id).unwrap().frame().is_empty());
        assert!(recorder.first_frames.lock().is_empty());
    }

    #[test]
    fn test_screen_capture_routing() {
        let (controller, recorder) = setup();
        let id = surface(&controller, 1, 1);
        controller.add_captured_renderer(id, PublishChannel::Aux, ViewMode::AspectFit);
        let data = vec![1, 2, 3, 4];
        let param = VideoFrameParam::rgba(1, 1);

        assert!(!controller.send_screen_captured_video_frame(&data, &param, FlipMode::None));
        assert!(recorder.observed.lock().is_empty());

        controller.set_video_source_channel(PublishChannel::Aux, VideoSourceType::ScreenCapture);
        assert!(controller.send_screen_captured_video_frame(&data, &param, FlipMode::None));
        assert_eq!(controller.surface(id).unwrap().frame(), data);
        assert_eq!(*recorder.first_frames.lock(), vec![PublishChannel::Aux]);
        assert_eq!(recorder.observed.lock().len(), 1);
    }

    #[test]
    fn test_destroyed_surface_binding_is_inert() {
        let (controller, recorder) = setup();
        let id = surface(&controller, 1, 1);
        controller.add_captured_renderer(id, PublishChannel::Main, ViewMode::AspectFit);
        controller.destroy_texture_renderer(id);

        capture(&controller, &[0; 4], 1, FlipMode::None);
        assert!(recorder.first_frames.lock().is_empty());
        assert!(recorder.events.lock().is_empty());
        assert_eq!(recorder.observed.lock().len(), 1);
    }
}
