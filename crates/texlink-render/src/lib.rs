//! # texlink-render
//!
//! The Texlink renderer controller. Media-engine callback threads push raw
//! frames in; the controller routes each frame to the texture surface bound to
//! its source, premultiplies alpha when asked to, tracks first-frame
//! milestones and tells the UI when a surface changes shape.
//!
//! Everything outside that routing layer (the host's texture registry, the UI
//! event channel transport, the media engine SDK) is reached through the
//! traits in [`engine`], [`registrar`] and [`notifier`].

pub mod controller;
pub mod engine;
pub mod ingest;
pub mod notifier;
pub mod registrar;
pub mod registry;
pub mod surface;

pub use controller::TextureRendererController;
pub use engine::{
    CustomVideoRenderHandler, EngineEventHandler, MediaEngine, MediaPlayer,
    MediaPlayerVideoHandler,
};
pub use notifier::{ChangeNotifier, EventChannelHost, EventSink, EventStreamHandler};
pub use registrar::{HeadlessRegistrar, TextureRegistrar};
pub use registry::SourceRegistry;
pub use surface::{SurfaceTable, TextureSurface};
