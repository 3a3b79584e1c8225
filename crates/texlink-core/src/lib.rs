//! # texlink-core
//!
//! Core types and primitives for the Texlink texture renderer.
//! This crate contains the value types shared across all Texlink crates:
//! surface ids, source keys, frame parameters, the RGBA backing store,
//! UI events, configuration and error types.

pub mod config;
pub mod error;
pub mod event;
pub mod frame;
pub mod hash;
pub mod types;

pub use config::*;

pub use error::{TexlinkError, TexlinkResult};
pub use event::RendererEvent;
pub use frame::{premultiply_alpha, EncodedFrameParam, FrameBuffer, VideoFrameParam};
pub use types::{
    FlipMode, MediaPlayerFirstFrameEvent, PlayerHandle, PublishChannel, TextureId,
    VideoBufferType, VideoEncodedFrameFormat, VideoFrameFormat, VideoFrameFormatSeries,
    VideoSourceType, ViewMode,
};
