use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;
use texlink_core::TextureId;

/// The host's texture registry.
///
/// Hands out texture ids, is told when a surface holds a new frame, and
/// forgets textures on release. Implementations synchronize internally.
pub trait TextureRegistrar: Send + Sync {
    fn register_texture(&self, width: u32, height: u32) -> TextureId;

    fn mark_frame_available(&self, id: TextureId);

    fn unregister_texture(&self, id: TextureId);
}

/// Texture ids are unique across every headless registrar in the process.
static NEXT_TEXTURE_ID: AtomicI64 = AtomicI64::new(1);

/// An in-process registrar with no GPU behind it.
///
/// Counts frame-available signals per texture. Used by the CLI simulator,
/// benches and tests.
pub struct HeadlessRegistrar {
    textures: Mutex<HashMap<TextureId, u64>>,
}

impl HeadlessRegistrar {
    pub fn new() -> Self {
        Self {
            textures: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_registered(&self, id: TextureId) -> bool {
        self.textures.lock().contains_key(&id)
    }

    /// Number of frame-available signals received for `id`, None if unknown.
    pub fn frames_available(&self, id: TextureId) -> Option<u64> {
        self.textures.lock().get(&id).copied()
    }

    pub fn registered_count(&self) -> usize {
        self.textures.lock().len()
    }
}

impl Default for HeadlessRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureRegistrar for HeadlessRegistrar {
    fn register_texture(&self, _width: u32, _height: u32) -> TextureId {
        let id = TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed));
        self.textures.lock().insert(id, 0);
        id
    }

    fn mark_frame_available(&self, id: TextureId) {
        if let Some(count) = self.textures.lock().get_mut(&id) {
            *count += 1;
        }
    }

    fn unregister_texture(&self, id: TextureId) {
        self.textures.lock().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let registrar = HeadlessRegistrar::new();
        let a = registrar.register_texture(1, 1);
        let b = registrar.register_texture(1, 1);
        assert_ne!(a, b);
        assert_eq!(registrar.registered_count(), 2);
    }

    #[test]
    fn test_ids_are_unique_across_registrars() {
        let first = HeadlessRegistrar::new();
        let second = HeadlessRegistrar::new();
        let a = first.register_texture(1, 1);
        let b = second.register_texture(1, 1);
        assert_ne!(a, b);
        assert!(first.is_registered(a) && !first.is_registered(b));
        assert!(second.is_registered(b) && !second.is_registered(a));
    }

    #[test]
    fn test_frame_signals_counted_until_unregister() {
        let registrar = HeadlessRegistrar::new();
        let id = registrar.register_texture(2, 2);
        registrar.mark_frame_available(id);
        registrar.mark_frame_available(id);
        assert_eq!(registrar.frames_available(id), Some(2));

        registrar.unregister_texture(id);
        registrar.mark_frame_available(id);
        assert_eq!(registrar.frames_available(id), None);
        assert!(!registrar.is_registered(id));
    }
}
