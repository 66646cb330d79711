//! Fixed-capacity instance buffer mirrored to a GPU vertex buffer
//!
//! The CPU array is the source of truth; the GPU buffer only matches it
//! immediately after [`InstanceBuffer::sync_to_device`]. Every sync
//! re-uploads the full live range - there is no dirty tracking, matching
//! the whole-buffer re-upload the demos are built to measure.

use thiserror::Error;

use crate::backend::traits::{BackendError, BufferHandle, GraphicsBackend};
use crate::backend::types::{BufferDescriptor, BufferUsage};
use crate::instance::record::InstanceRecord;

/// Instance storage errors
#[derive(Error, Debug)]
pub enum InstanceError {
    #[error("failed to allocate instance storage for {requested} records")]
    Allocation {
        requested: usize,
        #[source]
        source: BackendError,
    },
    #[error("record index {index} out of range (live count {live})")]
    IndexOutOfRange { index: usize, live: usize },
}

/// CPU-side record array of fixed capacity paired with a GPU vertex buffer.
pub struct InstanceBuffer<R: InstanceRecord> {
    records: Vec<R>,
    capacity: usize,
    gpu: BufferHandle,
}

impl<R: InstanceRecord> InstanceBuffer<R> {
    /// Allocate CPU storage and an empty GPU vertex buffer sized for
    /// `capacity` records.
    pub fn create<B: GraphicsBackend>(
        backend: &mut B,
        capacity: usize,
        label: &str,
    ) -> Result<Self, InstanceError> {
        let gpu = backend
            .create_buffer(&BufferDescriptor {
                label: Some(label.to_string()),
                size: (capacity * std::mem::size_of::<R>()) as u64,
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            })
            .map_err(|source| InstanceError::Allocation {
                requested: capacity,
                source,
            })?;

        log::debug!(
            "instance buffer '{}': {} records x {} bytes",
            label,
            capacity,
            std::mem::size_of::<R>()
        );

        Ok(Self {
            records: Vec::with_capacity(capacity),
            capacity,
            gpu,
        })
    }

    /// Number of live records
    pub fn live_count(&self) -> usize {
        self.records.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.records.len() == self.capacity
    }

    /// Append a record. Returns false (and drops the record) at capacity;
    /// this is the defined steady state once a population saturates, not an
    /// error.
    pub fn append(&mut self, record: R) -> bool {
        if self.records.len() == self.capacity {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Append records from an iterator until the buffer is full. Returns the
    /// number appended. Static populations fill all slots once at creation.
    pub fn extend_from(&mut self, records: impl IntoIterator<Item = R>) -> usize {
        let mut appended = 0;
        for record in records {
            if !self.append(record) {
                break;
            }
            appended += 1;
        }
        appended
    }

    /// Replace a live record in place.
    pub fn overwrite(&mut self, index: usize, record: R) -> Result<(), InstanceError> {
        debug_assert!(
            index < self.records.len(),
            "overwrite index {} out of range (live count {})",
            index,
            self.records.len()
        );
        match self.records.get_mut(index) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(InstanceError::IndexOutOfRange {
                index,
                live: self.records.len(),
            }),
        }
    }

    /// The live records
    pub fn live(&self) -> &[R] {
        &self.records
    }

    /// Mutable access to the live records (per-frame simulation updates)
    pub fn live_mut(&mut self) -> &mut [R] {
        &mut self.records
    }

    /// Upload `records[0..live_count)` to the GPU buffer, replacing its
    /// prior content. Must run after mutation and before any draw that
    /// reads the new entries; until then the GPU side shows stale data.
    /// Cost is O(live_count) every call.
    pub fn sync_to_device<B: GraphicsBackend>(&self, backend: &mut B) {
        if !self.records.is_empty() {
            backend.write_buffer(self.gpu, 0, bytemuck::cast_slice(&self.records));
        }
    }

    /// Handle to the GPU-side vertex buffer
    pub fn gpu_handle(&self) -> BufferHandle {
        self.gpu
    }

    /// Release the GPU buffer. The CPU array drops with the value.
    pub fn destroy<B: GraphicsBackend>(self, backend: &mut B) {
        backend.destroy_buffer(self.gpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::RecordingBackend;
    use crate::instance::record::SpriteInstance;
    use glam::Vec2;

    fn sprite(x: f32) -> SpriteInstance {
        SpriteInstance::new(Vec2::new(x, 0.0), Vec2::ZERO, [255; 4])
    }

    #[test]
    fn append_never_exceeds_capacity() {
        let mut backend = RecordingBackend::new();
        let mut buffer =
            InstanceBuffer::<SpriteInstance>::create(&mut backend, 3, "test").unwrap();

        assert!(buffer.append(sprite(0.0)));
        assert!(buffer.append(sprite(1.0)));
        assert!(buffer.append(sprite(2.0)));
        assert_eq!(buffer.live_count(), 3);
        assert!(buffer.is_full());

        // Further appends are dropped no-ops
        for i in 0..10 {
            assert!(!buffer.append(sprite(i as f32)));
            assert_eq!(buffer.live_count(), 3);
        }
    }

    #[test]
    fn extend_from_stops_at_capacity() {
        let mut backend = RecordingBackend::new();
        let mut buffer =
            InstanceBuffer::<SpriteInstance>::create(&mut backend, 5, "test").unwrap();

        let appended = buffer.extend_from((0..100).map(|i| sprite(i as f32)));
        assert_eq!(appended, 5);
        assert_eq!(buffer.live_count(), 5);
    }

    #[test]
    fn overwrite_replaces_live_record() {
        let mut backend = RecordingBackend::new();
        let mut buffer =
            InstanceBuffer::<SpriteInstance>::create(&mut backend, 2, "test").unwrap();
        buffer.append(sprite(0.0));

        buffer.overwrite(0, sprite(9.0)).unwrap();
        assert_eq!(buffer.live()[0].position.x, 9.0);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "out of range"))]
    fn overwrite_past_live_count_is_rejected() {
        let mut backend = RecordingBackend::new();
        let mut buffer =
            InstanceBuffer::<SpriteInstance>::create(&mut backend, 2, "test").unwrap();
        buffer.append(sprite(0.0));

        // Index 1 is within capacity but beyond the live range
        let result = buffer.overwrite(1, sprite(1.0));
        assert!(matches!(
            result,
            Err(InstanceError::IndexOutOfRange { index: 1, live: 1 })
        ));
    }

    #[test]
    fn sync_uploads_live_range_byte_for_byte() {
        let mut backend = RecordingBackend::new();
        let mut buffer =
            InstanceBuffer::<SpriteInstance>::create(&mut backend, 8, "test").unwrap();

        for i in 0..3 {
            buffer.append(SpriteInstance::new(
                Vec2::new(i as f32, i as f32 * 2.0),
                Vec2::new(0.5, -0.5),
                [i as u8, 2, 3, 255],
            ));
        }

        buffer.sync_to_device(&mut backend);

        let uploaded = backend.buffer_contents(buffer.gpu_handle());
        let expected: &[u8] = bytemuck::cast_slice(buffer.live());
        assert_eq!(&uploaded[..expected.len()], expected);

        // The tail past the live range is untouched GPU storage
        assert_eq!(
            uploaded.len(),
            buffer.capacity() * std::mem::size_of::<SpriteInstance>()
        );
    }

    #[test]
    fn destroy_releases_the_gpu_buffer() {
        let mut backend = RecordingBackend::new();
        let buffer =
            InstanceBuffer::<SpriteInstance>::create(&mut backend, 4, "test").unwrap();
        let handle = buffer.gpu_handle();

        buffer.destroy(&mut backend);
        assert!(backend.destroyed_buffers.contains(&handle.0));
    }

    #[test]
    fn gpu_state_is_stale_until_next_sync() {
        let mut backend = RecordingBackend::new();
        let mut buffer =
            InstanceBuffer::<SpriteInstance>::create(&mut backend, 4, "test").unwrap();

        buffer.append(sprite(1.0));
        buffer.sync_to_device(&mut backend);
        let before = backend.buffer_contents(buffer.gpu_handle()).to_vec();

        // CPU-side mutation does not reach the device by itself
        buffer.overwrite(0, sprite(42.0)).unwrap();
        assert_eq!(backend.buffer_contents(buffer.gpu_handle()), &before[..]);

        buffer.sync_to_device(&mut backend);
        assert_ne!(backend.buffer_contents(buffer.gpu_handle()), &before[..]);
    }
}
