//! Synthetic media engine used by `texlink simulate`.
//!
//! Spins one thread per source that pushes generated RGBA frames through the
//! controller the same way a real engine would, while the main thread acts as
//! the UI/control thread.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use texlink_core::{
    CustomRenderConfig, FlipMode, FrameBuffer, MediaPlayerFirstFrameEvent, PlayerHandle,
    PublishChannel, RendererEvent, TexlinkConfig, TextureId, VideoFrameFormat, VideoFrameParam,
    VideoSourceType, ViewMode,
};
use texlink_render::{
    CustomVideoRenderHandler, EngineEventHandler, EventChannelHost, EventSink, EventStreamHandler,
    HeadlessRegistrar, MediaEngine, MediaPlayer, MediaPlayerVideoHandler,
    TextureRendererController,
};

/// Knobs for one simulation run.
#[derive(Debug, Clone)]
pub struct SimOptions {
    pub channels: usize,
    pub streams: usize,
    pub players: usize,
    pub frames: u32,
    pub width: u32,
    pub height: u32,
    pub resize_every: u32,
    pub alpha: bool,
    pub mirror: bool,
    pub screen_capture: bool,
    pub interval: Duration,
    pub print_events: bool,
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub texture_id: TextureId,
    pub frames_rendered: u64,
    pub final_size: (u32, u32),
    pub content_hash: String,
}

#[derive(Debug, Serialize)]
pub struct SimReport {
    pub elapsed_ms: u128,
    pub frames_delivered: u64,
    pub update_events: usize,
    pub publisher_first_frames: usize,
    pub player_first_frames: usize,
    pub sources: Vec<SourceReport>,
}

// ──────────────────────────────────────────────────────────────────────────────
// Fake collaborators
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SimEngine {
    handler: RwLock<Option<Arc<dyn CustomVideoRenderHandler>>>,
}

impl SimEngine {
    fn handler(&self) -> Option<Arc<dyn CustomVideoRenderHandler>> {
        self.handler.read().clone()
    }
}

impl MediaEngine for SimEngine {
    fn enable_custom_video_render(&self, enable: bool, config: &CustomRenderConfig) {
        tracing::debug!("engine custom render {} ({:?})", enable, config);
    }

    fn set_custom_video_render_handler(&self, handler: Option<Arc<dyn CustomVideoRenderHandler>>) {
        *self.handler.write() = handler;
    }
}

struct SimPlayer {
    handle: PlayerHandle,
    handler: RwLock<Option<Arc<dyn MediaPlayerVideoHandler>>>,
}

impl SimPlayer {
    fn new(index: u64) -> Self {
        Self {
            handle: PlayerHandle(index),
            handler: RwLock::new(None),
        }
    }

    fn deliver(&self, data: &[u8], param: &VideoFrameParam) -> bool {
        // Held for the whole callback so disarming waits for it to finish.
        let guard = self.handler.read();
        match guard.as_ref() {
            Some(handler) => {
                handler.on_video_frame(self.handle, data, param);
                true
            }
            None => false,
        }
    }
}

impl MediaPlayer for SimPlayer {
    fn handle(&self) -> PlayerHandle {
        self.handle
    }

    fn index(&self) -> i32 {
        self.handle.0 as i32
    }

    fn set_video_handler(
        &self,
        handler: Option<Arc<dyn MediaPlayerVideoHandler>>,
        format: VideoFrameFormat,
    ) {
        tracing::debug!("{} video handler armed={} ({:?})", self.handle, handler.is_some(), format);
        *self.handler.write() = handler;
    }
}

#[derive(Default)]
struct EventLog {
    print: bool,
    updates: Mutex<Vec<RendererEvent>>,
    publisher_first_frames: Mutex<Vec<PublishChannel>>,
    player_first_frames: Mutex<Vec<PlayerHandle>>,
}

impl EventSink for EventLog {
    fn success(&self, event: &RendererEvent) {
        if self.print {
            match event.to_map() {
                Ok(map) => println!("{}", serde_json::Value::Object(map)),
                Err(err) => tracing::warn!("failed to encode event: {}", err),
            }
        }
        self.updates.lock().push(event.clone());
    }
}

impl EngineEventHandler for EventLog {
    fn on_publisher_render_video_first_frame(&self, channel: PublishChannel) {
        tracing::info!("publisher first frame rendered on {}", channel);
        self.publisher_first_frames.lock().push(channel);
    }

    fn on_media_player_first_frame_event(
        &self,
        player: PlayerHandle,
        event: MediaPlayerFirstFrameEvent,
    ) {
        tracing::info!("{} first frame event {:?}", player, event);
        self.player_first_frames.lock().push(player);
    }
}

struct SimHost(Arc<EventLog>);

impl EventChannelHost for SimHost {
    fn open_event_channel(&self, name: &str, handler: Arc<dyn EventStreamHandler>) {
        tracing::info!("event channel '{}' opened", name);
        handler.on_listen(self.0.clone());
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Frame generation
// ──────────────────────────────────────────────────────────────────────────────

/// A moving RGBA gradient with a horizontal alpha ramp.
fn pattern(width: u32, height: u32, seq: u32, seed: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = ((x + seq) % 256) as u8;
            let g = ((y + seq) % 256) as u8;
            let a = if width > 1 { (x * 255 / (width - 1)) as u8 } else { 255 };
            data.extend_from_slice(&[r, g, seed, a]);
        }
    }
    data
}

fn frame_size(opts: &SimOptions, seq: u32) -> (u32, u32) {
    if opts.resize_every > 0 && (seq / opts.resize_every) % 2 == 1 {
        (opts.width * 2, opts.height * 2)
    } else {
        (opts.width, opts.height)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Run
// ──────────────────────────────────────────────────────────────────────────────

pub fn run(config: TexlinkConfig, opts: SimOptions) -> Result<SimReport> {
    let started = Instant::now();
    let engine = Arc::new(SimEngine::default());
    let log = Arc::new(EventLog {
        print: opts.print_events,
        ..Default::default()
    });
    let registrar = Arc::new(HeadlessRegistrar::new());
    let frame_format = config.media_player.frame_format;

    let controller = TextureRendererController::new(config, engine.clone(), log.clone());
    controller.init(&SimHost(log.clone()));

    // Bind every source to a fresh surface.
    let mut bound: BTreeMap<String, TextureId> = BTreeMap::new();
    let channels: Vec<PublishChannel> = PublishChannel::ALL
        .iter()
        .copied()
        .take(opts.channels.min(PublishChannel::ALL.len()))
        .collect();
    for (i, channel) in channels.iter().enumerate() {
        let id = controller.create_texture_renderer(registrar.clone(), opts.width, opts.height)?;
        controller.add_captured_renderer(id, *channel, ViewMode::AspectFit);
        let is_screen = opts.screen_capture && i + 1 == channels.len();
        let source = if is_screen {
            VideoSourceType::ScreenCapture
        } else {
            VideoSourceType::Camera
        };
        controller.set_video_source_channel(*channel, source);
        controller.enable_texture_alpha(opts.alpha, id);
        bound.insert(format!("capture:{}", channel), id);
    }

    let stream_ids: Vec<String> = (0..opts.streams).map(|i| format!("stream-{}", i)).collect();
    for stream_id in &stream_ids {
        let id = controller.create_texture_renderer(registrar.clone(), opts.width, opts.height)?;
        controller.add_remote_renderer(id, stream_id, ViewMode::AspectFill);
        controller.enable_texture_alpha(opts.alpha, id);
        bound.insert(format!("stream:{}", stream_id), id);
    }

    let players: Vec<Arc<SimPlayer>> = (0..opts.players as u64)
        .map(|i| Arc::new(SimPlayer::new(i + 1)))
        .collect();
    for player in &players {
        let id = controller.create_texture_renderer(registrar.clone(), opts.width, opts.height)?;
        controller.add_media_player_renderer(id, player.as_ref(), ViewMode::AspectFit);
        player.set_video_handler(Some(controller.clone()), frame_format);
        bound.insert(format!("player:{}", player.handle.0), id);
    }

    let delivered = Arc::new(AtomicU64::new(0));
    let mut workers = Vec::new();

    for (i, channel) in channels.iter().copied().enumerate() {
        let engine = engine.clone();
        let controller = controller.clone();
        let opts = opts.clone();
        let delivered = delivered.clone();
        let is_screen = opts.screen_capture && i + 1 == channels.len();
        workers.push(thread::spawn(move || {
            for seq in 0..opts.frames {
                let (w, h) = frame_size(&opts, seq);
                let data = pattern(w, h, seq, i as u8 * 60);
                let param = VideoFrameParam::rgba(w, h);
                let flip = if opts.mirror { FlipMode::X } else { FlipMode::None };
                if is_screen {
                    controller.send_screen_captured_video_frame(&data, &param, flip);
                } else if let Some(handler) = engine.handler() {
                    handler.on_captured_video_frame_raw_data(&data, &param, flip, channel);
                }
                delivered.fetch_add(1, Ordering::Relaxed);
                thread::sleep(opts.interval);
            }
        }));
    }

    for (i, stream_id) in stream_ids.iter().cloned().enumerate() {
        let engine = engine.clone();
        let opts = opts.clone();
        let delivered = delivered.clone();
        workers.push(thread::spawn(move || {
            for seq in 0..opts.frames {
                let (w, h) = frame_size(&opts, seq);
                let data = pattern(w, h, seq, (i as u8).wrapping_mul(40));
                let param = VideoFrameParam::rgba(w, h);
                if let Some(handler) = engine.handler() {
                    handler.on_remote_video_frame_raw_data(&data, &param, &stream_id);
                }
                delivered.fetch_add(1, Ordering::Relaxed);
                thread::sleep(opts.interval);
            }
        }));
    }

    for player in &players {
        let player = player.clone();
        let opts = opts.clone();
        let delivered = delivered.clone();
        workers.push(thread::spawn(move || {
            for seq in 0..opts.frames {
                let (w, h) = frame_size(&opts, seq);
                let data = pattern(w, h, seq, 255);
                if player.deliver(&data, &VideoFrameParam::rgba(w, h)) {
                    delivered.fetch_add(1, Ordering::Relaxed);
                }
                thread::sleep(opts.interval);
            }
        }));
    }

    for worker in workers {
        worker
            .join()
            .map_err(|_| anyhow::anyhow!("media thread panicked"))?;
    }

    if let Some(path) = &opts.snapshot {
        let snapshot = match players.first() {
            Some(player) => controller.media_player_snapshot(player.handle),
            None => bound
                .values()
                .next()
                .and_then(|id| controller.surface(*id))
                .map(|s| s.snapshot()),
        };
        let snapshot = snapshot.context("no surface to snapshot")?;
        write_png(&snapshot, path)?;
        tracing::info!("snapshot written to {}", path.display());
    }

    let sources = bound
        .iter()
        .filter_map(|(source, id)| {
            let surface = controller.surface(*id)?;
            Some(SourceReport {
                source: source.clone(),
                texture_id: *id,
                frames_rendered: registrar.frames_available(*id).unwrap_or(0),
                final_size: surface.size(),
                content_hash: texlink_core::hash::hash_frame(&surface.snapshot()).to_hex(),
            })
        })
        .collect();

    for player in &players {
        controller.remove_media_player_renderer(player.as_ref());
    }
    controller.uninit();

    let report = SimReport {
        elapsed_ms: started.elapsed().as_millis(),
        frames_delivered: delivered.load(Ordering::Relaxed),
        update_events: log.updates.lock().len(),
        publisher_first_frames: log.publisher_first_frames.lock().len(),
        player_first_frames: log.player_first_frames.lock().len(),
        sources,
    };
    Ok(report)
}

fn write_png(frame: &FrameBuffer, path: &std::path::Path) -> Result<()> {
    let row_len = frame.width as usize * 4;
    let mut packed = Vec::with_capacity(row_len * frame.height as usize);
    for row in frame.data.chunks(frame.stride.max(1) as usize) {
        packed.extend_from_slice(&row[..row_len.min(row.len())]);
    }
    let image = image::RgbaImage::from_raw(frame.width, frame.height, packed)
        .context("snapshot buffer does not match its dimensions")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
