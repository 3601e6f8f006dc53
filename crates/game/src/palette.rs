//! Organism colours: one evenly spaced hue per id, alternating darker and lighter.

use glam::Vec3;
use renderer::{Gradient, PickId};

/// First id handed to organisms; 0 and 1 belong to the background and the globe.
pub const FIRST_ORGANISM_ID: u32 = 2;

/// HSL to RGB. `hue` in degrees, `saturation` and `lightness` in [0, 1].
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let hp = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let m = lightness - 0.5 * c;
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Vec3::new(r + m, g + m, b + m)
}

/// Gradient for organism `index` of `count`.
pub fn organism_gradient(index: u32, count: u32) -> Gradient {
    let hue = index as f32 * 360.0 / count.max(1) as f32;
    let shade = 0.2 * (index % 2) as f32;
    Gradient::new(
        hsl_to_rgb(hue, 1.0, 0.4 - shade).extend(1.0),
        hsl_to_rgb(hue, 1.0, 0.8 - shade).extend(1.0),
    )
}

/// Fixed colour assignment for every organism id.
#[derive(Debug, Clone)]
pub struct Palette {
    gradients: Vec<Gradient>,
}

impl Palette {
    pub fn new(count: u32) -> Self {
        Self {
            gradients: (0..count).map(|i| organism_gradient(i, count)).collect(),
        }
    }

    /// Gradient for an organism id; ids outside the pool get the globe's colours.
    pub fn gradient_for(&self, id: PickId) -> Gradient {
        id.get()
            .checked_sub(FIRST_ORGANISM_ID)
            .and_then(|i| self.gradients.get(i as usize))
            .copied()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.gradients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn primary_hues() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(hsl_to_rgb(120.0, 1.0, 0.5), Vec3::new(0.0, 1.0, 0.0)));
        assert!(close(hsl_to_rgb(240.0, 1.0, 0.5), Vec3::new(0.0, 0.0, 1.0)));
        assert!(close(hsl_to_rgb(60.0, 1.0, 0.5), Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn lightness_extremes() {
        assert!(close(hsl_to_rgb(200.0, 1.0, 0.0), Vec3::ZERO));
        assert!(close(hsl_to_rgb(200.0, 1.0, 1.0), Vec3::ONE));
        assert!(close(hsl_to_rgb(200.0, 0.0, 0.3), Vec3::splat(0.3)));
    }

    #[test]
    fn odd_indices_are_darker() {
        let even = organism_gradient(0, 10);
        let odd = organism_gradient(1, 10);
        assert!(close(even.start.truncate(), hsl_to_rgb(0.0, 1.0, 0.4)));
        assert!(close(even.stop.truncate(), hsl_to_rgb(0.0, 1.0, 0.8)));
        assert!(close(odd.start.truncate(), hsl_to_rgb(36.0, 1.0, 0.2)));
        assert!(close(odd.stop.truncate(), hsl_to_rgb(36.0, 1.0, 0.6)));
        assert_eq!(even.start.w, 1.0);
    }

    #[test]
    fn palette_maps_ids_from_two() {
        let palette = Palette::new(4);
        assert_eq!(palette.len(), 4);
        assert_eq!(palette.gradient_for(PickId::new(2).unwrap()), organism_gradient(0, 4));
        assert_eq!(palette.gradient_for(PickId::new(5).unwrap()), organism_gradient(3, 4));
        assert_eq!(palette.gradient_for(PickId::GLOBE), Gradient::default());
        assert_eq!(palette.gradient_for(PickId::new(6).unwrap()), Gradient::default());
    }
}
