//! Sprite population simulation
//!
//! Owns the live sprite records inside an [`InstanceBuffer`] and advances
//! them every frame. The population only grows: once the buffer is full,
//! further spawn requests are silently dropped.

use glam::Vec2;
use rand::Rng;

use crate::backend::traits::GraphicsBackend;
use crate::instance::buffer::{InstanceBuffer, InstanceError};
use crate::instance::record::SpriteInstance;

/// Inclusive per-channel color ranges for spawned sprites, alpha fixed
/// at 255.
#[derive(Debug, Clone, Copy)]
pub struct ColorPolicy {
    pub r: (u8, u8),
    pub g: (u8, u8),
    pub b: (u8, u8),
}

impl Default for ColorPolicy {
    fn default() -> Self {
        Self {
            r: (50, 240),
            g: (80, 240),
            b: (100, 240),
        }
    }
}

impl ColorPolicy {
    pub fn sample(&self, rng: &mut impl Rng) -> [u8; 4] {
        [
            rng.gen_range(self.r.0..=self.r.1),
            rng.gen_range(self.g.0..=self.g.1),
            rng.gen_range(self.b.0..=self.b.1),
            255,
        ]
    }
}

/// Per-axis velocity ranges, in pixels per frame at the 60 FPS target.
#[derive(Debug, Clone, Copy)]
pub struct VelocityPolicy {
    pub x: (f32, f32),
    pub y: (f32, f32),
}

impl VelocityPolicy {
    /// Symmetric speed range on both axes
    pub fn scatter(max_per_second: f32) -> Self {
        let v = max_per_second / 60.0;
        Self {
            x: (-v, v),
            y: (-v, v),
        }
    }

    /// Zero horizontal velocity, downward speed up to the given rate
    pub fn falling(max_per_second: f32) -> Self {
        Self {
            x: (0.0, 0.0),
            y: (0.0, max_per_second / 60.0),
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Vec2 {
        Vec2::new(sample_range(self.x, &mut *rng), sample_range(self.y, rng))
    }
}

fn sample_range(range: (f32, f32), rng: &mut impl Rng) -> f32 {
    if range.0 == range.1 {
        range.0
    } else {
        rng.gen_range(range.0..=range.1)
    }
}

/// Lifetime range in seconds assigned at spawn. The simulation decrements
/// the field but never consults it; sprites do not expire.
#[derive(Debug, Clone, Copy)]
pub struct LifetimePolicy {
    pub range: (f32, f32),
}

impl LifetimePolicy {
    pub fn none() -> Self {
        Self { range: (0.0, 0.0) }
    }

    pub fn seconds(min: f32, max: f32) -> Self {
        Self { range: (min, max) }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        sample_range(self.range, rng)
    }
}

/// Rectangular motion bounds in pixel space
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }
}

/// A growing population of 2D sprites backed by an instance buffer.
pub struct SpritePopulation {
    buffer: InstanceBuffer<SpriteInstance>,
}

impl SpritePopulation {
    pub fn create<B: GraphicsBackend>(
        backend: &mut B,
        capacity: usize,
        label: &str,
    ) -> Result<Self, InstanceError> {
        Ok(Self {
            buffer: InstanceBuffer::create(backend, capacity, label)?,
        })
    }

    /// Spawn up to `count` sprites at `origin` with randomized color,
    /// velocity, and lifetime. Stops early once the buffer is full; a
    /// partial (or empty) burst is the expected steady state at capacity.
    /// Returns the number actually spawned.
    pub fn spawn_burst(
        &mut self,
        origin: Vec2,
        count: usize,
        colors: &ColorPolicy,
        velocities: &VelocityPolicy,
        lifetimes: &LifetimePolicy,
        rng: &mut impl Rng,
    ) -> usize {
        let mut spawned = 0;
        for _ in 0..count {
            let sprite = SpriteInstance::new(
                origin,
                velocities.sample(rng),
                colors.sample(rng),
            )
            .with_lifetime(lifetimes.sample(rng));
            if !self.buffer.append(sprite) {
                break;
            }
            spawned += 1;
        }
        spawned
    }

    /// Advance every live sprite by one frame: position += velocity
    /// (velocities are in per-frame units, so displacement is coupled to
    /// frame rate like the throughput demos this reproduces), lifetime
    /// decremented by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        for sprite in self.buffer.live_mut() {
            sprite.position += sprite.velocity;
            sprite.lifetime -= dt;
        }
    }

    /// As [`advance`](Self::advance), then reflect velocity components of
    /// sprites whose bounds cross an edge. The sprite's half extent is
    /// added to its position before the comparison, and the same offset
    /// point is tested against both edges of each axis.
    pub fn advance_bounced(&mut self, dt: f32, bounds: Bounds, half_extent: Vec2) {
        for sprite in self.buffer.live_mut() {
            sprite.position += sprite.velocity;
            sprite.lifetime -= dt;

            let probe = sprite.position + half_extent;
            if probe.x > bounds.max.x || probe.x < bounds.min.x {
                sprite.velocity.x = -sprite.velocity.x;
            }
            if probe.y > bounds.max.y || probe.y < bounds.min.y {
                sprite.velocity.y = -sprite.velocity.y;
            }
        }
    }

    pub fn live_count(&self) -> usize {
        self.buffer.live_count()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn buffer(&self) -> &InstanceBuffer<SpriteInstance> {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut InstanceBuffer<SpriteInstance> {
        &mut self.buffer
    }

    /// Upload the live range to the GPU. See
    /// [`InstanceBuffer::sync_to_device`].
    pub fn sync_to_device<B: GraphicsBackend>(&self, backend: &mut B) {
        self.buffer.sync_to_device(backend);
    }

    pub fn destroy<B: GraphicsBackend>(self, backend: &mut B) {
        self.buffer.destroy(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::RecordingBackend;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn population(capacity: usize) -> (SpritePopulation, RecordingBackend) {
        let mut backend = RecordingBackend::new();
        let population = SpritePopulation::create(&mut backend, capacity, "test").unwrap();
        (population, backend)
    }

    fn spawn(
        population: &mut SpritePopulation,
        origin: Vec2,
        count: usize,
        rng: &mut StdRng,
    ) -> usize {
        population.spawn_burst(
            origin,
            count,
            &ColorPolicy::default(),
            &VelocityPolicy::scatter(250.0),
            &LifetimePolicy::none(),
            rng,
        )
    }

    #[test]
    fn spawn_bursts_plateau_at_capacity() {
        let (mut population, _backend) = population(500);
        let mut rng = StdRng::seed_from_u64(1);

        let expected = [100, 200, 300, 400, 500, 500, 500];
        for count in expected {
            spawn(&mut population, Vec2::ZERO, 100, &mut rng);
            assert_eq!(population.live_count(), count);
        }
    }

    #[test]
    fn partial_burst_reports_spawned_count() {
        let (mut population, _backend) = population(150);
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(spawn(&mut population, Vec2::ZERO, 100, &mut rng), 100);
        assert_eq!(spawn(&mut population, Vec2::ZERO, 100, &mut rng), 50);
        assert_eq!(spawn(&mut population, Vec2::ZERO, 100, &mut rng), 0);
    }

    #[test]
    fn spawned_colors_respect_channel_ranges() {
        let (mut population, _backend) = population(1000);
        let mut rng = StdRng::seed_from_u64(3);
        spawn(&mut population, Vec2::ZERO, 1000, &mut rng);

        for sprite in population.buffer().live() {
            let [r, g, b, a] = sprite.color;
            assert!((50..=240).contains(&r));
            assert!((80..=240).contains(&g));
            assert!((100..=240).contains(&b));
            assert_eq!(a, 255);
        }
    }

    #[test]
    fn advance_integrates_per_frame_velocity() {
        let (mut population, _backend) = population(4);
        population
            .buffer_mut()
            .append(crate::instance::SpriteInstance::new(
                Vec2::new(10.0, 20.0),
                Vec2::new(2.0, -1.0),
                [255; 4],
            ));

        population.advance(1.0 / 60.0);
        let sprite = population.buffer().live()[0];
        assert_eq!(sprite.position, Vec2::new(12.0, 19.0));

        population.advance(1.0 / 60.0);
        assert_eq!(population.buffer().live()[0].position, Vec2::new(14.0, 18.0));
    }

    #[test]
    fn lifetime_decrements_but_sprites_never_expire() {
        let (mut population, _backend) = population(4);
        population
            .buffer_mut()
            .append(
                crate::instance::SpriteInstance::new(Vec2::ZERO, Vec2::ZERO, [255; 4])
                    .with_lifetime(0.05),
            );

        for _ in 0..100 {
            population.advance(1.0 / 60.0);
        }
        let sprite = population.buffer().live()[0];
        assert!(sprite.lifetime < 0.0);
        assert_eq!(population.live_count(), 1);
    }

    #[test]
    fn right_edge_crossing_flips_x_velocity() {
        let (mut population, _backend) = population(4);
        let bounds = Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
        let half = Vec2::new(5.0, 5.0);

        population
            .buffer_mut()
            .append(crate::instance::SpriteInstance::new(
                Vec2::new(93.0, 50.0),
                Vec2::new(4.0, 1.0),
                [255; 4],
            ));

        // 93 + 4 + 5 > 100: the crossing is detected on this advance
        population.advance_bounced(1.0 / 60.0, bounds, half);
        let sprite = population.buffer().live()[0];
        assert_eq!(sprite.velocity.x, -4.0);
        assert_eq!(sprite.velocity.y, 1.0);
    }

    #[test]
    fn bottom_edge_crossing_flips_y_velocity() {
        let (mut population, _backend) = population(4);
        let bounds = Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
        let half = Vec2::new(5.0, 5.0);

        population
            .buffer_mut()
            .append(crate::instance::SpriteInstance::new(
                Vec2::new(50.0, 94.0),
                Vec2::new(1.0, 3.0),
                [255; 4],
            ));

        population.advance_bounced(1.0 / 60.0, bounds, half);
        let sprite = population.buffer().live()[0];
        assert_eq!(sprite.velocity.x, 1.0);
        assert_eq!(sprite.velocity.y, -3.0);
    }

    #[test]
    fn corner_crossing_flips_both_components() {
        let (mut population, _backend) = population(4);
        let bounds = Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
        let half = Vec2::new(5.0, 5.0);

        population
            .buffer_mut()
            .append(crate::instance::SpriteInstance::new(
                Vec2::new(93.0, 94.0),
                Vec2::new(4.0, 3.0),
                [255; 4],
            ));

        population.advance_bounced(1.0 / 60.0, bounds, half);
        let sprite = population.buffer().live()[0];
        assert_eq!(sprite.velocity, Vec2::new(-4.0, -3.0));
    }

    #[test]
    fn top_bar_offset_reflects_upward_sprites() {
        let (mut population, _backend) = population(4);
        // Bunnymark keeps sprites below a 40 px stats bar
        let bounds = Bounds::new(Vec2::new(0.0, 40.0), Vec2::new(800.0, 450.0));
        let half = Vec2::new(8.0, 10.0);

        population
            .buffer_mut()
            .append(crate::instance::SpriteInstance::new(
                Vec2::new(400.0, 32.0),
                Vec2::new(0.0, -4.0),
                [255; 4],
            ));

        // 32 - 4 + 10 = 38 < 40: crossing detected
        population.advance_bounced(1.0 / 60.0, bounds, half);
        assert_eq!(population.buffer().live()[0].velocity.y, 4.0);
    }

    #[test]
    fn falling_velocity_policy_has_no_horizontal_motion() {
        let policy = VelocityPolicy::falling(250.0);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let v = policy.sample(&mut rng);
            assert_eq!(v.x, 0.0);
            assert!(v.y >= 0.0 && v.y <= 250.0 / 60.0);
        }
    }
}
