//! Round state and the pointer handlers that drive it.

use crate::config::GameConfig;
use crate::hud::Hud;
use crate::scene::Scene;
use audio::{Cue, CuePlayer};
use engine_core::Countdown;
use glam::Vec2;
use input::{ArcBall, PointerEvent};
use renderer::{Camera, Frame, Light, PickId, Picker};
use std::time::Duration;

/// Per-round overrides of the configured limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundSettings {
    pub duration: Option<Duration>,
    pub max_bacteria: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Hit(PickId),
    Miss,
}

pub struct Game {
    scene: Scene,
    camera: Camera,
    light: Light,
    arcball: ArcBall,
    countdown: Countdown,
    score: u32,
    hud: Hud,
    cues: Box<dyn CuePlayer>,
    width: u32,
    height: u32,
    started: bool,
}

impl Game {
    pub fn new(
        config: &GameConfig,
        settings: RoundSettings,
        cues: Box<dyn CuePlayer>,
        width: u32,
        height: u32,
    ) -> Self {
        let mut config = config.clone();
        if let Some(max) = settings.max_bacteria {
            config.max_bacteria = max;
        }
        let countdown = Countdown::new(settings.duration.unwrap_or_else(|| config.round_time()));

        let mut camera = Camera::default();
        camera.set_aspect(width, height);

        Self {
            scene: Scene::new(&config),
            camera,
            light: Light::default(),
            arcball: ArcBall::new(width, height),
            hud: Hud::new(width, height, 0, &countdown),
            countdown,
            score: 0,
            cues,
            width,
            height,
            started: false,
        }
    }

    /// Begin the round. Ticks before this are ignored.
    pub fn start(&mut self) {
        if !self.started {
            log::info!(
                "Round started: {} organisms max, {}s on the clock",
                self.scene.max_organisms(),
                self.countdown.remaining().as_secs()
            );
        }
        self.started = true;
    }

    /// One frame of simulation.
    pub fn tick(&mut self, elapsed: Duration) {
        if !self.started {
            return;
        }
        if self.countdown.advance(elapsed) {
            self.hud.refresh(self.score, &self.countdown);
        }
        self.scene.maybe_spawn();
        self.scene.grow();
    }

    /// Draw list for this frame: overlay, globe, then organisms.
    pub fn frame(&self, include_overlay: bool) -> Frame<'_> {
        Frame {
            camera: &self.camera,
            light: self.light,
            objects: self.scene.draw_list(),
            overlay: include_overlay.then(|| self.hud.overlay()),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.camera.set_aspect(self.width, self.height);
        self.arcball.resize(self.width, self.height);
        self.hud.resize(self.width, self.height, self.score, &self.countdown);
    }

    /// Kill whatever organism is under the pointer.
    pub fn click(&mut self, pointer: Vec2, picker: &mut dyn Picker) -> ClickOutcome {
        let id = self.pick(pointer, picker);
        if self.scene.remove(id).is_some() {
            if self.countdown.is_running() {
                self.score += 1;
            }
            self.hud.refresh(self.score, &self.countdown);
            self.cues.play(Cue::Hit);
            log::debug!("Hit {id}, score {}", self.score);
            ClickOutcome::Hit(id)
        } else {
            self.cues.play(Cue::Miss);
            log::debug!("Miss ({id}) at {pointer:?}");
            ClickOutcome::Miss
        }
    }

    fn pick(&self, pointer: Vec2, picker: &mut dyn Picker) -> PickId {
        if pointer.x < 0.0 || pointer.y < 0.0 {
            return PickId::BACKGROUND;
        }
        let frame = self.frame(false);
        match picker.pick(&frame, pointer.x as u32, pointer.y as u32) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Pick failed: {e:#}");
                PickId::BACKGROUND
            }
        }
    }

    pub fn drag_start(&mut self, pointer: Vec2) {
        self.arcball.begin(pointer, self.camera.view);
    }

    pub fn drag_move(&mut self, pointer: Vec2) {
        if let Some(view) = self.arcball.drag_to(pointer) {
            self.camera.view = view;
        }
    }

    pub fn drag_end(&mut self, pointer: Vec2) {
        self.drag_move(pointer);
        self.arcball.end();
    }

    /// Pointer left mid-drag: keep the view where it is and stop rotating.
    pub fn capture_lost(&mut self) {
        self.arcball.cancel();
    }

    /// The drawing surface never shows a context menu. Returns true (suppressed).
    pub fn context_menu(&mut self, _pointer: Vec2) -> bool {
        true
    }

    /// Route a pointer event to its handler.
    pub fn handle_pointer(&mut self, event: PointerEvent, picker: &mut dyn Picker) {
        match event {
            PointerEvent::Click(p) => {
                self.click(p, picker);
            }
            PointerEvent::DragStart(p) => self.drag_start(p),
            PointerEvent::DragMove(p) => self.drag_move(p),
            PointerEvent::DragEnd(p) => self.drag_end(p),
            PointerEvent::CaptureLost => self.capture_lost(),
            PointerEvent::ContextMenu(p) => {
                self.context_menu(p);
            }
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use renderer::RayPicker;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    const W: u32 = 800;
    const H: u32 = 600;
    const FRAME: Duration = Duration::from_millis(16);

    #[derive(Clone, Default)]
    struct RecordingCues(Rc<RefCell<Vec<Cue>>>);

    impl CuePlayer for RecordingCues {
        fn play(&mut self, cue: Cue) {
            self.0.borrow_mut().push(cue);
        }
    }

    fn game(settings: RoundSettings) -> (Game, Rc<RefCell<Vec<Cue>>>) {
        let config = GameConfig {
            sphere_resolution: 1,
            seed: Some(7),
            ..Default::default()
        };
        let cues = RecordingCues::default();
        let log = cues.0.clone();
        let mut game = Game::new(&config, settings, Box::new(cues), W, H);
        game.start();
        (game, log)
    }

    fn tick_until_spawn(game: &mut Game) -> PickId {
        for _ in 0..10_000 {
            game.tick(FRAME);
            if let Some(organism) = game.scene().organisms().first() {
                return organism.pick_id();
            }
        }
        panic!("nothing spawned");
    }

    fn assert_population(game: &Game) {
        let scene = game.scene();
        let live: HashSet<PickId> = scene.organisms().iter().map(|o| o.pick_id()).collect();
        let free: HashSet<PickId> = scene.pool().iter().collect();
        assert!(live.is_disjoint(&free));
        assert_eq!(live.len() + free.len(), scene.max_organisms() as usize);
    }

    /// Move an organism to face the camera and return its on-screen centre.
    fn bring_to_front(game: &mut Game, id: PickId) -> Vec2 {
        let organism = game.scene_mut().organism_mut(id).unwrap();
        organism.place_on_surface(Vec3::Z, 1.0);
        let centre = organism.transform().translation;
        game.camera().project_to_screen(centre, W, H)
    }

    #[test]
    fn clicking_an_organism_scores() {
        let (mut game, cues) = game(RoundSettings {
            max_bacteria: Some(1),
            ..Default::default()
        });
        let id = tick_until_spawn(&mut game);
        let pointer = bring_to_front(&mut game, id);

        let outcome = game.click(pointer, &mut RayPicker::new(W, H));

        assert_eq!(outcome, ClickOutcome::Hit(id));
        assert!(game.scene().organisms().is_empty());
        assert!(game.scene().pool().contains(id));
        assert_eq!(game.score(), 1);
        assert_eq!(*cues.borrow(), vec![Cue::Hit]);
    }

    #[test]
    fn clicking_an_organism_where_it_spawned_scores() {
        // Find a seed whose first organism lands on the hemisphere facing the camera.
        let (mut game, cues, id) = (0..500)
            .find_map(|seed| {
                let config = GameConfig {
                    sphere_resolution: 1,
                    spawn_frequency: 1,
                    max_bacteria: 1,
                    seed: Some(seed),
                    ..Default::default()
                };
                let cues = RecordingCues::default();
                let log = cues.0.clone();
                let mut game = Game::new(&config, RoundSettings::default(), Box::new(cues), W, H);
                game.start();
                game.tick(FRAME);
                let organism = game.scene().organisms().first()?;
                let id = organism.pick_id();
                (organism.transform().translation.z > 0.5).then_some((game, log, id))
            })
            .expect("some seed spawns facing the camera");

        let centre = game.scene().organism(id).unwrap().transform().translation;
        let pointer = game.camera().project_to_screen(centre, W, H);
        assert_eq!(game.click(pointer, &mut RayPicker::new(W, H)), ClickOutcome::Hit(id));
        assert!(game.scene().organisms().is_empty());
        assert_eq!(game.score(), 1);
        assert_eq!(*cues.borrow(), vec![Cue::Hit]);
    }

    #[test]
    fn clicking_background_misses() {
        let (mut game, cues) = game(RoundSettings {
            max_bacteria: Some(1),
            ..Default::default()
        });
        tick_until_spawn(&mut game);

        let outcome = game.click(Vec2::new(1.0, 1.0), &mut RayPicker::new(W, H));

        assert_eq!(outcome, ClickOutcome::Miss);
        assert_eq!(game.scene().organisms().len(), 1);
        assert_eq!(game.score(), 0);
        assert_eq!(*cues.borrow(), vec![Cue::Miss]);
    }

    #[test]
    fn clicking_the_globe_misses() {
        let (mut game, cues) = game(RoundSettings::default());
        let centre = Vec2::new(W as f32 / 2.0, H as f32 / 2.0);
        assert_eq!(game.click(centre, &mut RayPicker::new(W, H)), ClickOutcome::Miss);
        assert_eq!(*cues.borrow(), vec![Cue::Miss]);
    }

    #[test]
    fn no_score_after_time_runs_out() {
        let (mut game, cues) = game(RoundSettings {
            duration: Some(Duration::from_secs(1)),
            max_bacteria: Some(1),
        });
        let id = tick_until_spawn(&mut game);
        game.tick(Duration::from_secs(2));
        assert!(!game.countdown().is_running());

        let pointer = bring_to_front(&mut game, id);
        assert_eq!(game.click(pointer, &mut RayPicker::new(W, H)), ClickOutcome::Hit(id));
        assert_eq!(game.score(), 0);
        assert_eq!(*cues.borrow(), vec![Cue::Hit]);
    }

    #[test]
    fn countdown_stops_at_zero() {
        let (mut game, _) = game(RoundSettings {
            duration: Some(Duration::from_secs(5 * 60)),
            ..Default::default()
        });
        game.tick(Duration::from_secs(5 * 60));
        assert_eq!(game.countdown().remaining(), Duration::ZERO);
        for _ in 0..10 {
            game.tick(FRAME);
            assert_eq!(game.countdown().remaining(), Duration::ZERO);
        }
    }

    #[test]
    fn hud_refreshes_on_whole_seconds() {
        let (mut game, _) = game(RoundSettings {
            duration: Some(Duration::from_millis(10_500)),
            max_bacteria: Some(0),
        });
        let before = game.hud().generation();
        game.tick(Duration::from_millis(100));
        assert_eq!(game.hud().generation(), before);
        game.tick(Duration::from_millis(500));
        assert_eq!(game.hud().generation(), before + 1);
    }

    #[test]
    fn population_and_score_invariants_hold() {
        let (mut game, _) = game(RoundSettings {
            max_bacteria: Some(5),
            ..Default::default()
        });
        let mut picker = RayPicker::new(W, H);
        let mut score = game.score();
        for step in 0..3000 {
            game.tick(FRAME);
            if step % 25 == 0 {
                if let Some(id) = game.scene().organisms().first().map(|o| o.pick_id()) {
                    let pointer = bring_to_front(&mut game, id);
                    game.click(pointer, &mut picker);
                } else {
                    game.click(Vec2::ZERO, &mut picker);
                }
            }
            assert!(game.score() >= score);
            score = game.score();
            assert_population(&game);
        }
        assert!(score > 0);
    }

    #[test]
    fn ticks_before_start_do_nothing() {
        let config = GameConfig {
            sphere_resolution: 1,
            spawn_frequency: 1,
            ..Default::default()
        };
        let mut game = Game::new(&config, RoundSettings::default(), Box::new(audio::SilentCues), W, H);
        let remaining = game.countdown().remaining();
        game.tick(FRAME);
        assert_eq!(game.countdown().remaining(), remaining);
        assert!(game.scene().organisms().is_empty());
    }

    #[test]
    fn frame_draws_globe_then_organisms() {
        let (mut game, _) = game(RoundSettings::default());
        tick_until_spawn(&mut game);
        let frame = game.frame(true);
        assert!(frame.overlay.is_some());
        assert_eq!(frame.objects[0].pick_id(), PickId::GLOBE);
        assert_eq!(frame.objects.len(), 1 + game.scene().organisms().len());
        assert!(game.frame(false).overlay.is_none());
    }

    #[test]
    fn drag_rotates_view_and_capture_loss_stops_it() {
        let (mut game, _) = game(RoundSettings::default());
        let start = game.camera().view;
        game.drag_start(Vec2::new(400.0, 300.0));
        game.drag_move(Vec2::new(450.0, 300.0));
        let rotated = game.camera().view;
        assert_ne!(rotated, start);

        game.capture_lost();
        game.drag_move(Vec2::new(500.0, 300.0));
        assert_eq!(game.camera().view, rotated);
        assert!(game.context_menu(Vec2::ZERO));
    }
}
