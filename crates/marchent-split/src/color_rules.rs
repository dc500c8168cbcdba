//! Reference colour rules. None of them ever returns `Color::EMPTY`.

use crate::ColorRule;
use marchent_core::{Color, Error, Result};
use rand::{Rng, RngCore};

/// Exponential darkening: every lit channel is scaled by `factor` and floored
/// at 1 so a lineage fades but stays visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Darken {
    factor: f64,
}

impl Darken {
    pub fn new(factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0 && factor <= 1.0) {
            return Err(Error::Validation(format!(
                "Darken factor must lie in (0, 1], got {}",
                factor
            )));
        }
        Ok(Self { factor })
    }
}

impl Default for Darken {
    fn default() -> Self {
        Self { factor: 0.9 }
    }
}

impl ColorRule for Darken {
    fn derive(&self, color: Color, _rng: &mut dyn RngCore) -> Color {
        let channels = color.channels().map(|c| {
            if c == 0 {
                0
            } else {
                ((c as f64 * self.factor).floor() as u8).max(1)
            }
        });
        Color(channels).or_visible()
    }

    fn name(&self) -> &str {
        "darken"
    }
}

/// Rotates the hue in HSV space, keeping saturation and value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueShift {
    degrees: f32,
}

impl HueShift {
    pub fn new(degrees: f32) -> Result<Self> {
        if !degrees.is_finite() {
            return Err(Error::Validation(format!("Hue shift must be finite, got {}", degrees)));
        }
        Ok(Self { degrees })
    }
}

impl ColorRule for HueShift {
    fn derive(&self, color: Color, _rng: &mut dyn RngCore) -> Color {
        let (hue, saturation, value) = color.to_hsv();
        Color::from_hsv(hue + self.degrees, saturation, value).or_visible()
    }

    fn name(&self) -> &str {
        "hue_shift"
    }
}

/// Raises HSV value by `step`, saturating at full brightness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighten {
    step: f32,
}

impl Lighten {
    pub fn new(step: f32) -> Result<Self> {
        if !(step.is_finite() && step >= 0.0) {
            return Err(Error::Validation(format!(
                "Lighten step must be a non-negative number, got {}",
                step
            )));
        }
        Ok(Self { step })
    }
}

impl ColorRule for Lighten {
    fn derive(&self, color: Color, _rng: &mut dyn RngCore) -> Color {
        let (hue, saturation, value) = color.to_hsv();
        Color::from_hsv(hue, saturation, (value + self.step).min(1.0)).or_visible()
    }

    fn name(&self) -> &str {
        "lighten"
    }
}

/// Steps through a fixed palette. A colour outside the palette restarts it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCycle {
    palette: Vec<Color>,
}

impl ColorCycle {
    pub fn new(palette: Vec<Color>) -> Result<Self> {
        if palette.is_empty() {
            return Err(Error::Validation("Colour cycle needs a palette".to_string()));
        }
        if palette.iter().any(Color::is_empty) {
            return Err(Error::Validation(
                "Colour cycle palette contains the empty colour".to_string(),
            ));
        }
        Ok(Self { palette })
    }
}

impl ColorRule for ColorCycle {
    fn derive(&self, color: Color, _rng: &mut dyn RngCore) -> Color {
        match self.palette.iter().position(|c| *c == color) {
            Some(i) => self.palette[(i + 1) % self.palette.len()],
            None => self.palette[0],
        }
    }

    fn name(&self) -> &str {
        "cycle"
    }
}

/// Ignores the parent and picks any visible colour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomColor;

impl RandomColor {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Color {
        Color(rng.gen::<[u8; 3]>()).or_visible()
    }
}

impl ColorRule for RandomColor {
    fn derive(&self, _color: Color, rng: &mut dyn RngCore) -> Color {
        Self::sample(rng)
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_darken_floors_at_one() {
        let rule = Darken::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert_eq!(rule.derive(Color::gray(100), &mut rng), Color::gray(90));
        assert_eq!(rule.derive(Color::rgb(255, 0, 1), &mut rng), Color::rgb(229, 0, 1));

        let mut color = Color::gray(255);
        for _ in 0..200 {
            color = rule.derive(color, &mut rng);
            assert!(!color.is_empty());
        }
        assert_eq!(color, Color::gray(1));
    }

    #[test]
    fn test_darken_rejects_bad_factor() {
        assert!(Darken::new(0.0).is_err());
        assert!(Darken::new(1.5).is_err());
        assert!(Darken::new(f64::NAN).is_err());
        assert!(Darken::new(0.5).is_ok());
    }

    #[test]
    fn test_hue_shift_walks_the_wheel() {
        let rule = HueShift::new(120.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let green = rule.derive(Color::rgb(255, 0, 0), &mut rng);
        assert_eq!(green, Color::rgb(0, 255, 0));
        let blue = rule.derive(green, &mut rng);
        assert_eq!(blue, Color::rgb(0, 0, 255));
        assert_eq!(rule.derive(blue, &mut rng), Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_lighten_saturates() {
        let rule = Lighten::new(0.5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let lighter = rule.derive(Color::rgb(0, 64, 0), &mut rng);
        assert!(lighter.channels()[1] > 64);
        let full = rule.derive(rule.derive(lighter, &mut rng), &mut rng);
        assert_eq!(full, Color::rgb(0, 255, 0));
    }

    #[test]
    fn test_cycle_wraps_and_restarts() {
        let palette = vec![Color::gray(10), Color::gray(20), Color::gray(30)];
        let rule = ColorCycle::new(palette).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert_eq!(rule.derive(Color::gray(10), &mut rng), Color::gray(20));
        assert_eq!(rule.derive(Color::gray(30), &mut rng), Color::gray(10));
        assert_eq!(rule.derive(Color::rgb(1, 2, 3), &mut rng), Color::gray(10));

        assert!(ColorCycle::new(vec![Color::gray(5), Color::EMPTY]).is_err());
    }

    #[test]
    fn test_random_color_is_visible() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..1000 {
            assert!(!RandomColor.derive(Color::gray(1), &mut rng).is_empty());
        }
    }
}
