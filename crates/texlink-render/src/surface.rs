//! Texture surfaces and the master table that owns them.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use texlink_core::{
    FrameBuffer, TexlinkError, TexlinkResult, TextureId, VideoFrameParam, ViewMode,
};

use crate::registrar::TextureRegistrar;

struct SurfaceState {
    width: u32,
    height: u32,
    mirror: bool,
    view_mode: ViewMode,
    frame: FrameBuffer,
    released: bool,
}

/// One GPU-visible texture plus the metadata the UI needs to composite it.
///
/// The backing store is replaced wholesale by every frame write. Once
/// [`destroy`](Self::destroy) has run, writes are refused.
pub struct TextureSurface {
    id: TextureId,
    registrar: Arc<dyn TextureRegistrar>,
    state: Mutex<SurfaceState>,
}

impl TextureSurface {
    /// Register a new texture with the host and wrap it.
    pub fn create(registrar: Arc<dyn TextureRegistrar>, width: u32, height: u32) -> Arc<Self> {
        let id = registrar.register_texture(width, height);
        Arc::new(Self {
            id,
            registrar,
            state: Mutex::new(SurfaceState {
                width,
                height,
                mirror: false,
                view_mode: ViewMode::default(),
                frame: FrameBuffer::default(),
                released: false,
            }),
        })
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        let state = self.state.lock();
        (state.width, state.height)
    }

    pub fn is_mirror(&self) -> bool {
        self.state.lock().mirror
    }

    pub fn set_mirror(&self, mirror: bool) {
        self.state.lock().mirror = mirror;
    }

    pub fn view_mode(&self) -> ViewMode {
        self.state.lock().view_mode
    }

    pub fn set_view_mode(&self, view_mode: ViewMode) {
        self.state.lock().view_mode = view_mode;
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Copy a frame into the backing store and signal the host.
    ///
    /// With `premultiply` set, the copy (never `data`) is alpha-premultiplied.
    /// Size follows the frame.
    pub fn update_buffer(
        &self,
        data: &[u8],
        param: &VideoFrameParam,
        premultiply: bool,
    ) -> TexlinkResult<()> {
        let mut state = self.state.lock();
        if state.released {
            return Err(TexlinkError::SurfaceReleased(self.id));
        }
        state.frame.copy_from(data, param)?;
        if premultiply {
            state.frame.premultiply_alpha();
        }
        state.width = param.width;
        state.height = param.height;
        // Signalled under the lock so it cannot trail `destroy`.
        self.registrar.mark_frame_available(self.id);
        Ok(())
    }

    /// Copy of the current backing store bytes.
    pub fn frame(&self) -> Vec<u8> {
        self.state.lock().frame.data.clone()
    }

    pub fn frame_stride(&self) -> u32 {
        self.state.lock().frame.stride
    }

    /// Copy of the whole backing store, for compositing or snapshots.
    pub fn snapshot(&self) -> FrameBuffer {
        self.state.lock().frame.clone()
    }

    /// Release the host texture. Returns false if already released.
    pub fn destroy(&self) -> bool {
        {
            let mut state = self.state.lock();
            if state.released {
                return false;
            }
            state.released = true;
            state.frame = FrameBuffer::default();
        }
        self.registrar.unregister_texture(self.id);
        true
    }
}

impl std::fmt::Debug for TextureSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TextureSurface")
            .field("id", &self.id)
            .field("width", &state.width)
            .field("height", &state.height)
            .field("mirror", &state.mirror)
            .field("view_mode", &state.view_mode)
            .field("released", &state.released)
            .finish()
    }
}

/// The sole owner of every live surface, keyed by id.
///
/// Sharded internally, so creation and destruction never wait on the
/// controller's registry lock.
pub struct SurfaceTable {
    surfaces: DashMap<TextureId, Arc<TextureSurface>>,
}

impl SurfaceTable {
    pub fn new() -> Self {
        Self {
            surfaces: DashMap::new(),
        }
    }

    /// Register a new surface with `registrar` and take ownership of it.
    ///
    /// A live surface is never replaced: if the registrar hands out an id
    /// already in the table, the new texture is released again and
    /// [`TexlinkError::DuplicateSurface`] is returned.
    pub fn create(
        &self,
        registrar: Arc<dyn TextureRegistrar>,
        width: u32,
        height: u32,
    ) -> TexlinkResult<TextureId> {
        let surface = TextureSurface::create(registrar, width, height);
        let id = surface.id();
        let rejected = match self.surfaces.entry(id) {
            Entry::Occupied(_) => surface,
            Entry::Vacant(slot) => {
                slot.insert(surface);
                return Ok(id);
            }
        };
        // Released outside the shard lock.
        rejected.destroy();
        Err(TexlinkError::DuplicateSurface(id))
    }

    /// Remove and release a surface. Returns false if `id` is unknown.
    pub fn destroy(&self, id: TextureId) -> bool {
        match self.surfaces.remove(&id) {
            Some((_, surface)) => {
                surface.destroy();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: TextureId) -> Option<Arc<TextureSurface>> {
        self.surfaces.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn require(&self, id: TextureId) -> TexlinkResult<Arc<TextureSurface>> {
        self.get(id).ok_or(TexlinkError::UnknownSurface(id))
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.surfaces.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Release every surface. Returns how many were destroyed.
    pub fn destroy_all(&self) -> usize {
        let ids: Vec<TextureId> = self.surfaces.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter(|id| self.destroy(*id)).count()
    }
}

impl Default for SurfaceTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::HeadlessRegistrar;

    /// A host registry that keeps handing out the same id.
    #[derive(Default)]
    struct FixedIdRegistrar {
        registered: Mutex<u32>,
    }

    impl TextureRegistrar for FixedIdRegistrar {
        fn register_texture(&self, _width: u32, _height: u32) -> TextureId {
            *self.registered.lock() += 1;
            TextureId(7)
        }

        fn mark_frame_available(&self, _id: TextureId) {}

        fn unregister_texture(&self, _id: TextureId) {
            *self.registered.lock() -= 1;
        }
    }

    fn rgba_frame(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        pixel.repeat((width * height) as usize)
    }

    #[test]
    fn test_create_registers_with_host() {
        let registrar = Arc::new(HeadlessRegistrar::new());
        let table = SurfaceTable::new();
        let id = table.create(registrar.clone(), 640, 480).unwrap();

        assert!(registrar.is_registered(id));
        assert_eq!(table.get(id).unwrap().size(), (640, 480));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_destroy_unknown_returns_false() {
        let table = SurfaceTable::new();
        assert!(!table.destroy(TextureId(42)));
    }

    #[test]
    fn test_update_buffer_tracks_size_and_signals() {
        let registrar = Arc::new(HeadlessRegistrar::new());
        let surface = TextureSurface::create(registrar.clone(), 1, 1);
        let data = rgba_frame(2, 3, [1, 2, 3, 4]);

        surface
            .update_buffer(&data, &VideoFrameParam::rgba(2, 3), false)
            .unwrap();

        assert_eq!(surface.size(), (2, 3));
        assert_eq!(surface.frame_stride(), 8);
        assert_eq!(surface.frame(), data);
        assert_eq!(registrar.frames_available(surface.id()), Some(1));
    }

    #[test]
    fn test_premultiply_touches_copy_only() {
        let registrar = Arc::new(HeadlessRegistrar::new());
        let surface = TextureSurface::create(registrar, 1, 1);
        let data = rgba_frame(1, 1, [200, 100, 50, 0]);

        surface
            .update_buffer(&data, &VideoFrameParam::rgba(1, 1), true)
            .unwrap();

        assert_eq!(surface.frame(), vec![0, 0, 0, 0]);
        assert_eq!(data, vec![200, 100, 50, 0]);
    }

    #[test]
    fn test_released_surface_refuses_writes() {
        let registrar = Arc::new(HeadlessRegistrar::new());
        let table = SurfaceTable::new();
        let id = table.create(registrar.clone(), 4, 4).unwrap();
        let surface = table.get(id).unwrap();

        assert!(table.destroy(id));
        assert!(!registrar.is_registered(id));
        assert!(surface.is_released());

        let err = surface
            .update_buffer(&rgba_frame(4, 4, [0; 4]), &VideoFrameParam::rgba(4, 4), false)
            .unwrap_err();
        assert!(matches!(err, TexlinkError::SurfaceReleased(_)));
        assert!(!surface.destroy());
    }

    #[test]
    fn test_destroy_all() {
        let registrar = Arc::new(HeadlessRegistrar::new());
        let table = SurfaceTable::new();
        table.create(registrar.clone(), 1, 1).unwrap();
        table.create(registrar.clone(), 1, 1).unwrap();

        assert_eq!(table.destroy_all(), 2);
        assert!(table.is_empty());
        assert_eq!(registrar.registered_count(), 0);
    }

    #[test]
    fn test_colliding_id_never_replaces_live_surface() {
        let first = Arc::new(FixedIdRegistrar::default());
        let second = Arc::new(FixedIdRegistrar::default());
        let table = SurfaceTable::new();

        let id = table.create(first.clone(), 640, 480).unwrap();
        let err = table.create(second.clone(), 320, 240).unwrap_err();

        assert!(matches!(err, TexlinkError::DuplicateSurface(TextureId(7))));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(id).unwrap().size(), (640, 480));
        assert_eq!(*first.registered.lock(), 1);
        assert_eq!(*second.registered.lock(), 0);
    }
}
