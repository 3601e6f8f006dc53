//! The globe, its organisms, and the id pool they draw from.

use crate::config::GameConfig;
use crate::palette::{Palette, FIRST_ORGANISM_ID};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use renderer::{Gradient, Lighting, PickId, SphereDesc, SphereGeometry, SphereObject};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const ORGANISM_RADIUS: f32 = 0.05;
pub const ORGANISM_SPECULAR: f32 = 0.02;
/// Scale added to every axis of a growing organism each frame.
pub const GROWTH_PER_FRAME: f32 = 0.00008;
/// Organisms stop growing once their scale reaches this.
pub const MAX_ORGANISM_SCALE: f32 = GROWTH_PER_FRAME * 5000.0;
/// Radius of the globe organisms sit on.
pub const GLOBE_RADIUS: f32 = 1.0;

/// Free organism ids. An id is either here or on exactly one live organism.
#[derive(Debug, Clone)]
pub struct IdPool {
    free: BTreeSet<PickId>,
}

impl IdPool {
    /// Pool holding `count` consecutive ids starting at `first`.
    pub fn new(first: u32, count: u32) -> Self {
        let free = (first..first.saturating_add(count))
            .filter_map(|id| PickId::new(id).ok())
            .collect();
        Self { free }
    }

    /// Remove and return a uniformly chosen free id.
    pub fn take_random(&mut self, rng: &mut impl Rng) -> Option<PickId> {
        if self.free.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.free.len());
        let id = self.free.iter().nth(index).copied()?;
        self.free.remove(&id);
        Some(id)
    }

    /// Return an id. False if it was already free.
    pub fn release(&mut self, id: PickId) -> bool {
        self.free.insert(id)
    }

    pub fn contains(&self, id: PickId) -> bool {
        self.free.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PickId> + '_ {
        self.free.iter().copied()
    }
}

/// Uniformly distributed unit vector (rejection-sampled from the unit ball).
pub fn random_direction(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let len2 = v.length_squared();
        if len2 > 1e-6 && len2 <= 1.0 {
            return v / len2.sqrt();
        }
    }
}

pub struct Scene {
    globe: SphereObject,
    /// Live organisms in spawn order.
    organisms: Vec<SphereObject>,
    pool: IdPool,
    palette: Palette,
    geometry: Arc<SphereGeometry>,
    max_organisms: u32,
    spawn_frequency: u32,
    rng: StdRng,
}

impl Scene {
    pub fn new(config: &GameConfig) -> Self {
        let config = config.clone().clamped();
        let geometry = Arc::new(SphereGeometry::generate(config.sphere_resolution));
        let globe = SphereObject::with_geometry(
            geometry.clone(),
            SphereDesc {
                radius: GLOBE_RADIUS,
                gradient: Gradient::default(),
                pick_id: PickId::GLOBE,
                ..Default::default()
            },
        );
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            globe,
            organisms: Vec::new(),
            pool: IdPool::new(FIRST_ORGANISM_ID, config.max_bacteria),
            palette: Palette::new(config.max_bacteria),
            geometry,
            max_organisms: config.max_bacteria,
            spawn_frequency: config.spawn_frequency,
            rng,
        }
    }

    pub fn globe(&self) -> &SphereObject {
        &self.globe
    }

    pub fn organisms(&self) -> &[SphereObject] {
        &self.organisms
    }

    pub fn organism(&self, id: PickId) -> Option<&SphereObject> {
        self.organisms.iter().find(|o| o.pick_id() == id)
    }

    pub fn organism_mut(&mut self, id: PickId) -> Option<&mut SphereObject> {
        self.organisms.iter_mut().find(|o| o.pick_id() == id)
    }

    pub fn pool(&self) -> &IdPool {
        &self.pool
    }

    pub fn max_organisms(&self) -> u32 {
        self.max_organisms
    }

    /// Spawn with probability `1 / spawn_frequency`.
    pub fn maybe_spawn(&mut self) -> Option<PickId> {
        if self.rng.gen_ratio(1, self.spawn_frequency) {
            self.spawn()
        } else {
            None
        }
    }

    /// Put a new organism at a random point on the globe, if below the cap.
    pub fn spawn(&mut self) -> Option<PickId> {
        if self.organisms.len() as u32 >= self.max_organisms {
            return None;
        }
        let id = self.pool.take_random(&mut self.rng)?;
        let direction = random_direction(&mut self.rng);

        let mut organism = SphereObject::with_geometry(
            self.geometry.clone(),
            SphereDesc {
                radius: ORGANISM_RADIUS,
                gradient: self.palette.gradient_for(id),
                lighting: Lighting {
                    specular: ORGANISM_SPECULAR,
                    ..Default::default()
                },
                pick_id: id,
                ..Default::default()
            },
        );
        organism.place_on_surface(direction, GLOBE_RADIUS);
        log::debug!("Spawned organism {id} at {direction:?}");

        self.organisms.push(organism);
        Some(id)
    }

    /// Grow every organism still below full size.
    pub fn grow(&mut self) {
        for organism in &mut self.organisms {
            if organism.transform().scale.x < MAX_ORGANISM_SCALE {
                organism.transform_mut().grow(GROWTH_PER_FRAME);
                organism.recompute_model();
            }
        }
    }

    /// Remove a live organism and return its id to the pool.
    pub fn remove(&mut self, id: PickId) -> Option<SphereObject> {
        let index = self.organisms.iter().position(|o| o.pick_id() == id)?;
        let organism = self.organisms.remove(index);
        self.pool.release(id);
        Some(organism)
    }

    /// Globe first, then organisms in spawn order.
    pub fn draw_list(&self) -> Vec<&SphereObject> {
        std::iter::once(&self.globe).chain(&self.organisms).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn config(max_bacteria: u32) -> GameConfig {
        GameConfig {
            max_bacteria,
            sphere_resolution: 1,
            spawn_frequency: 1,
            seed: Some(42),
            ..Default::default()
        }
    }

    fn assert_population(scene: &Scene) {
        let live: HashSet<PickId> = scene.organisms().iter().map(|o| o.pick_id()).collect();
        let free: HashSet<PickId> = scene.pool().iter().collect();
        assert_eq!(live.len(), scene.organisms().len(), "duplicate live id");
        assert!(live.is_disjoint(&free));
        assert_eq!(live.len() + free.len(), scene.max_organisms() as usize);
    }

    #[test]
    fn pool_starts_at_two() {
        let pool = IdPool::new(FIRST_ORGANISM_ID, 3);
        let ids: Vec<u32> = pool.iter().map(PickId::get).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn take_and_release() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = IdPool::new(2, 2);
        let a = pool.take_random(&mut rng).unwrap();
        let b = pool.take_random(&mut rng).unwrap();
        assert_ne!(a, b);
        assert!(pool.take_random(&mut rng).is_none());
        assert!(pool.release(a));
        assert!(!pool.release(a));
        assert!(pool.contains(a));
    }

    #[test]
    fn random_directions_are_unit() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            assert!((random_direction(&mut rng).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn spawn_respects_cap_and_pool() {
        let mut scene = Scene::new(&config(3));
        for _ in 0..10 {
            scene.spawn();
            assert_population(&scene);
        }
        assert_eq!(scene.organisms().len(), 3);
        assert!(scene.pool().is_empty());
        assert!(scene.spawn().is_none());
    }

    #[test]
    fn spawned_organism_sits_on_globe_facing_out() {
        let mut scene = Scene::new(&config(1));
        let id = scene.spawn().unwrap();
        let organism = scene.organism(id).unwrap();
        let centre = organism.transform().translation;
        assert!((centre.length() - GLOBE_RADIUS).abs() < 1e-5);
        let pole = organism.model_matrix().transform_point3(Vec3::Z);
        assert!((pole - centre * (1.0 + ORGANISM_RADIUS)).length() < 1e-4);
        assert_eq!(organism.lighting().specular, ORGANISM_SPECULAR);
    }

    #[test]
    fn remove_returns_id_and_keeps_order() {
        let mut scene = Scene::new(&config(4));
        let ids: Vec<PickId> = (0..4).filter_map(|_| scene.spawn()).collect();
        assert!(scene.remove(ids[1]).is_some());
        assert!(scene.pool().contains(ids[1]));
        let remaining: Vec<PickId> = scene.organisms().iter().map(|o| o.pick_id()).collect();
        assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
        assert!(scene.remove(ids[1]).is_none());
        assert_population(&scene);
    }

    #[test]
    fn growth_stops_at_max_scale() {
        let mut scene = Scene::new(&config(1));
        let id = scene.spawn().unwrap();
        for _ in 0..6000 {
            scene.grow();
        }
        let scale = scene.organism(id).unwrap().transform().scale.x;
        assert!(scale >= MAX_ORGANISM_SCALE);
        assert!(scale < MAX_ORGANISM_SCALE + GROWTH_PER_FRAME * 1.5);
    }

    #[test]
    fn growth_updates_model_matrix() {
        let mut scene = Scene::new(&config(1));
        let id = scene.spawn().unwrap();
        let before = scene.organism(id).unwrap().model_matrix();
        scene.grow();
        assert_ne!(scene.organism(id).unwrap().model_matrix(), before);
    }

    #[test]
    fn oversized_resolution_is_clamped_before_generating() {
        let scene = Scene::new(&GameConfig {
            sphere_resolution: 30,
            ..config(1)
        });
        let order = crate::config::MAX_SPHERE_RESOLUTION;
        assert_eq!(
            scene.globe().mesh().geometry().positions.len(),
            SphereGeometry::vertex_count_for(order)
        );
    }

    #[test]
    fn draw_list_puts_globe_first() {
        let mut scene = Scene::new(&config(2));
        let a = scene.spawn().unwrap();
        let b = scene.spawn().unwrap();
        let order: Vec<PickId> = scene.draw_list().iter().map(|o| o.pick_id()).collect();
        assert_eq!(order, vec![PickId::GLOBE, a, b]);
    }

    #[test]
    fn organism_colours_follow_palette() {
        let mut scene = Scene::new(&config(3));
        let id = scene.spawn().unwrap();
        let expected = crate::palette::organism_gradient(id.get() - FIRST_ORGANISM_ID, 3);
        let mesh = scene.organism(id).unwrap().mesh();
        for (point, colour) in mesh.geometry().positions.iter().zip(mesh.colours()).take(8) {
            assert_eq!(*colour, expected.colour_at(*point));
        }
    }
}
