//! UI event channel plumbing and surface change detection.

use std::sync::Arc;

use parking_lot::RwLock;
use texlink_core::RendererEvent;

use crate::surface::TextureSurface;

/// Outgoing end of an open event stream.
pub trait EventSink: Send + Sync {
    fn success(&self, event: &RendererEvent);
}

/// Listen/cancel callbacks the host drives for one event channel.
pub trait EventStreamHandler: Send + Sync {
    fn on_listen(&self, sink: Arc<dyn EventSink>);

    fn on_cancel(&self);
}

/// The host framework's messenger, able to open named event channels.
pub trait EventChannelHost: Send + Sync {
    fn open_event_channel(&self, name: &str, handler: Arc<dyn EventStreamHandler>);
}

/// Emits `update` events when a frame's geometry differs from its surface.
///
/// Holds no size state of its own; the surface is the baseline. With no sink
/// attached, events are dropped.
pub struct ChangeNotifier {
    sink: RwLock<Option<Arc<dyn EventSink>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            sink: RwLock::new(None),
        }
    }

    pub fn attach(&self, sink: Arc<dyn EventSink>) {
        *self.sink.write() = Some(sink);
    }

    pub fn detach(&self) {
        *self.sink.write() = None;
    }

    pub fn is_attached(&self) -> bool {
        self.sink.read().is_some()
    }

    /// Compare an incoming frame against `surface` and emit if they differ.
    ///
    /// `is_mirror` is None for sources that carry no flip mode; the mirror
    /// flag then takes no part in the comparison. Returns whether an event
    /// was delivered.
    pub fn notify_if_changed(
        &self,
        surface: &TextureSurface,
        width: u32,
        height: u32,
        is_mirror: Option<bool>,
    ) -> bool {
        let guard = self.sink.read();
        let Some(sink) = guard.as_ref() else {
            return false;
        };

        let (old_width, old_height) = surface.size();
        let mirror_changed = is_mirror.is_some_and(|m| m != surface.is_mirror());
        if old_width == width && old_height == height && !mirror_changed {
            return false;
        }

        let event = RendererEvent::update(surface.id(), width, height, is_mirror);
        tracing::debug!(
            "surface {} changed {}x{} -> {}x{} (mirror {:?})",
            surface.id(),
            old_width,
            old_height,
            width,
            height,
            is_mirror
        );
        sink.success(&event);
        true
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStreamHandler for ChangeNotifier {
    fn on_listen(&self, sink: Arc<dyn EventSink>) {
        tracing::info!("renderer event channel listening");
        self.attach(sink);
    }

    fn on_cancel(&self) {
        tracing::info!("renderer event channel cancelled");
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::HeadlessRegistrar;
    use parking_lot::Mutex;
    use texlink_core::VideoFrameParam;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<RendererEvent>>,
    }

    impl EventSink for RecordingSink {
        fn success(&self, event: &RendererEvent) {
            self.events.lock().push(event.clone());
        }
    }

    fn surface(width: u32, height: u32) -> Arc<TextureSurface> {
        TextureSurface::create(Arc::new(HeadlessRegistrar::new()), width, height)
    }

    #[test]
    fn test_no_sink_drops_event() {
        let notifier = ChangeNotifier::new();
        assert!(!notifier.notify_if_changed(&surface(1, 1), 2, 2, None));
    }

    #[test]
    fn test_same_geometry_no_event() {
        let notifier = ChangeNotifier::new();
        let sink = Arc::new(RecordingSink::default());
        notifier.attach(sink.clone());

        assert!(!notifier.notify_if_changed(&surface(640, 480), 640, 480, Some(false)));
        assert!(sink.events.lock().is_empty());
    }

    #[test]
    fn test_size_change_emits_new_values() {
        let notifier = ChangeNotifier::new();
        let sink = Arc::new(RecordingSink::default());
        notifier.attach(sink.clone());
        let s = surface(640, 480);

        assert!(notifier.notify_if_changed(&s, 1280, 720, None));
        assert_eq!(
            sink.events.lock().as_slice(),
            &[RendererEvent::update(s.id(), 1280, 720, None)]
        );
        // Notifying does not mutate the baseline.
        assert_eq!(s.size(), (640, 480));
    }

    #[test]
    fn test_mirror_change_alone_emits() {
        let notifier = ChangeNotifier::new();
        let sink = Arc::new(RecordingSink::default());
        notifier.attach(sink.clone());
        let s = surface(8, 8);

        assert!(notifier.notify_if_changed(&s, 8, 8, Some(true)));
        s.set_mirror(true);
        assert!(!notifier.notify_if_changed(&s, 8, 8, Some(true)));
        // Sources without flip mode ignore the mirror flag.
        assert!(!notifier.notify_if_changed(&s, 8, 8, None));
        assert_eq!(sink.events.lock().len(), 1);
    }

    #[test]
    fn test_listen_and_cancel() {
        let notifier = ChangeNotifier::new();
        notifier.on_listen(Arc::new(RecordingSink::default()));
        assert!(notifier.is_attached());
        notifier.on_cancel();
        assert!(!notifier.is_attached());

        let s = surface(1, 1);
        s.update_buffer(&[0; 16], &VideoFrameParam::rgba(2, 2), false)
            .unwrap();
        assert!(!notifier.notify_if_changed(&s, 4, 4, None));
    }
}
