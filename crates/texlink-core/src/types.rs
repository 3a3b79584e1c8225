use serde::{Deserialize, Serialize};

/// Opaque handle of a texture surface, as handed out by the host's texture registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureId(pub i64);

impl std::fmt::Display for TextureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of a media player instance.
///
/// The value is a token owned by the media engine wrapper. It is compared and
/// hashed, never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerHandle(pub u64);

impl std::fmt::Display for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Publish channel of a local capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishChannel {
    Main,
    Aux,
    Third,
    Fourth,
}

impl PublishChannel {
    /// All channels, in ascending order.
    pub const ALL: [PublishChannel; 4] = [
        PublishChannel::Main,
        PublishChannel::Aux,
        PublishChannel::Third,
        PublishChannel::Fourth,
    ];
}

impl std::fmt::Display for PublishChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishChannel::Main => write!(f, "main"),
            PublishChannel::Aux => write!(f, "aux"),
            PublishChannel::Third => write!(f, "third"),
            PublishChannel::Fourth => write!(f, "fourth"),
        }
    }
}

/// Display scaling policy the UI applies when compositing a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Scale uniformly until one side fits; the rest is letterboxed.
    #[default]
    AspectFit,
    /// Scale uniformly until both sides are filled; overflow is cropped.
    AspectFill,
    /// Stretch to fill, ignoring the aspect ratio.
    ScaleToFill,
}

/// Flip applied by the capture pipeline to a local preview frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipMode {
    #[default]
    None,
    /// Horizontal flip. The only mode that marks a surface as mirrored.
    X,
    Y,
    XY,
}

impl FlipMode {
    pub fn is_mirror(self) -> bool {
        self == FlipMode::X
    }
}

/// Kind of source feeding a publish channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSourceType {
    None,
    Camera,
    Custom,
    MainPublishChannel,
    Player,
    ScreenCapture,
}

/// Buffer type the media engine delivers to a custom renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoBufferType {
    #[default]
    RawData,
    EncodedData,
}

/// Pixel format family requested from the media engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFrameFormatSeries {
    #[default]
    Rgb,
    Yuv,
}

/// Concrete pixel layout of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFrameFormat {
    Unknown,
    I420,
    Nv12,
    Bgra32,
    #[default]
    Rgba32,
    Argb32,
    Abgr32,
}

impl VideoFrameFormat {
    /// Bytes per pixel for packed 32-bit formats, None for planar ones.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            VideoFrameFormat::Bgra32
            | VideoFrameFormat::Rgba32
            | VideoFrameFormat::Argb32
            | VideoFrameFormat::Abgr32 => Some(4),
            _ => None,
        }
    }
}

/// Codec of an encoded remote frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoEncodedFrameFormat {
    AvcAvcc,
    AvcAnnexB,
    Vp8,
    HevcAvcc,
    HevcAnnexB,
}

/// First-frame milestone reported for a media player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaPlayerFirstFrameEvent {
    AudioRendered,
    VideoRendered,
}
