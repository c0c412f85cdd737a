//! Minimal particle emitters for the walking and dash effects.
//!
//! An emitter either emits on demand (`emit`) or continuously, one burst per
//! step, while it exists. Destroying an emitter removes its live particles
//! with it.

use glam::Vec2;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterId(u32);

#[derive(Debug, Clone, Copy)]
pub struct EmitterConfig {
    pub lifespan_us: u64,
    pub speed_min: f32,
    pub speed_max: f32,
    pub size_start: f32,
    pub size_end: f32,
    pub alpha_start: f32,
    pub alpha_end: f32,
    pub color: [f32; 3],
    /// Particles emitted every step while the emitter lives. Zero means the
    /// emitter only emits on demand.
    pub per_step: u32,
}

impl EmitterConfig {
    pub fn walking(speed: f32) -> Self {
        Self {
            lifespan_us: 350_000,
            speed_min: 0.0,
            speed_max: speed,
            size_start: 2.0,
            size_end: 7.0,
            alpha_start: 1.0,
            alpha_end: 0.1,
            color: [0.85, 0.85, 0.85],
            per_step: 0,
        }
    }

    pub fn dash() -> Self {
        Self {
            lifespan_us: 300_000,
            speed_min: 400.0,
            speed_max: 600.0,
            size_start: 9.0,
            size_end: 0.0,
            alpha_start: 1.0,
            alpha_end: 0.0,
            color: [1.0, 0.95, 0.7],
            per_step: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub age_us: u64,
}

#[derive(Debug, Clone)]
struct Emitter {
    id: EmitterId,
    config: EmitterConfig,
    origin: Vec2,
    particles: Vec<Particle>,
}

#[derive(Debug, Clone, Copy)]
pub struct ParticleSprite {
    pub position: Vec2,
    pub size: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Default)]
pub struct ParticleSystem {
    emitters: Vec<Emitter>,
    next_id: u32,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_emitter(&mut self, config: EmitterConfig, origin: Vec2) -> EmitterId {
        let id = EmitterId(self.next_id);
        self.next_id += 1;
        self.emitters.push(Emitter {
            id,
            config,
            origin,
            particles: Vec::new(),
        });
        id
    }

    pub fn destroy(&mut self, id: EmitterId) -> bool {
        let before = self.emitters.len();
        self.emitters.retain(|e| e.id != id);
        self.emitters.len() != before
    }

    pub fn contains(&self, id: EmitterId) -> bool {
        self.emitters.iter().any(|e| e.id == id)
    }

    pub fn emit<R: Rng>(&mut self, id: EmitterId, count: u32, at: Vec2, rng: &mut R) {
        if let Some(emitter) = self.emitters.iter_mut().find(|e| e.id == id) {
            for _ in 0..count {
                let particle = spawn_particle(&emitter.config, at, rng);
                emitter.particles.push(particle);
            }
        }
    }

    /// Ages and moves every particle, culls expired ones, then lets
    /// continuous emitters emit their per-step burst.
    pub fn update<R: Rng>(&mut self, dt_us: u64, rng: &mut R) {
        let dt = dt_us as f32 / 1_000_000.0;
        for emitter in &mut self.emitters {
            let lifespan = emitter.config.lifespan_us;
            emitter.particles.retain_mut(|p| {
                p.age_us += dt_us;
                p.position += p.velocity * dt;
                p.age_us < lifespan
            });
            for _ in 0..emitter.config.per_step {
                let particle = spawn_particle(&emitter.config, emitter.origin, rng);
                emitter.particles.push(particle);
            }
        }
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    pub fn particle_count(&self) -> usize {
        self.emitters.iter().map(|e| e.particles.len()).sum()
    }

    pub fn sprites(&self) -> impl Iterator<Item = ParticleSprite> + '_ {
        self.emitters.iter().flat_map(|emitter| {
            let config = emitter.config;
            emitter.particles.iter().map(move |p| {
                let t = (p.age_us as f32 / config.lifespan_us as f32).clamp(0.0, 1.0);
                let [r, g, b] = config.color;
                ParticleSprite {
                    position: p.position,
                    size: lerp(config.size_start, config.size_end, t),
                    color: [r, g, b, lerp(config.alpha_start, config.alpha_end, t)],
                }
            })
        })
    }
}

fn spawn_particle<R: Rng>(config: &EmitterConfig, at: Vec2, rng: &mut R) -> Particle {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let speed = if config.speed_max > config.speed_min {
        rng.gen_range(config.speed_min..config.speed_max)
    } else {
        config.speed_min
    };
    Particle {
        position: at,
        velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
        age_us: 0,
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const STEP: u64 = 16_667;

    #[test]
    fn on_demand_emitter_only_emits_when_asked() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut system = ParticleSystem::new();
        let walking = system.add_emitter(EmitterConfig::walking(50.0), Vec2::ZERO);
        system.update(STEP, &mut rng);
        assert_eq!(system.particle_count(), 0);

        system.emit(walking, 2, Vec2::new(10.0, 10.0), &mut rng);
        assert_eq!(system.particle_count(), 2);
    }

    #[test]
    fn particles_expire_after_their_lifespan() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut system = ParticleSystem::new();
        let walking = system.add_emitter(EmitterConfig::walking(50.0), Vec2::ZERO);
        system.emit(walking, 3, Vec2::ZERO, &mut rng);
        for _ in 0..20 {
            system.update(STEP, &mut rng);
        }
        assert_eq!(system.particle_count(), 3);
        for _ in 0..2 {
            system.update(STEP, &mut rng);
        }
        assert_eq!(system.particle_count(), 0);
    }

    #[test]
    fn destroying_an_emitter_removes_its_particles() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut system = ParticleSystem::new();
        let dash = system.add_emitter(EmitterConfig::dash(), Vec2::new(40.0, 40.0));
        for _ in 0..5 {
            system.update(STEP, &mut rng);
        }
        assert_eq!(system.particle_count(), 5);
        assert!(system.destroy(dash));
        assert!(!system.contains(dash));
        assert_eq!(system.particle_count(), 0);
        assert!(!system.destroy(dash));
    }

    #[test]
    fn sprites_fade_over_their_life() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut system = ParticleSystem::new();
        let walking = system.add_emitter(EmitterConfig::walking(0.0), Vec2::ZERO);
        system.emit(walking, 1, Vec2::new(5.0, 5.0), &mut rng);
        let fresh = system.sprites().next().expect("one sprite");
        assert_eq!(fresh.color[3], 1.0);
        assert_eq!(fresh.position, Vec2::new(5.0, 5.0));
        for _ in 0..10 {
            system.update(STEP, &mut rng);
        }
        let older = system.sprites().next().expect("still alive");
        assert!(older.color[3] < 1.0);
        assert!(older.size > fresh.size);
    }
}
