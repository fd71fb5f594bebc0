use rand::Rng;

/// Flat RGB color with every channel either 0.0 or 1.0.
///
/// Randomly drawn colors are never black (invisible on the cleared
/// background) nor white.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Color {
        Color { r, g, b }
    }

    /// Draw each channel uniformly from {0, 1}, redrawing until the result is
    /// neither black nor white.
    pub fn random_vivid<R: Rng + ?Sized>(rng: &mut R) -> Color {
        loop {
            let c = Color {
                r: channel(rng),
                g: channel(rng),
                b: channel(rng),
            };
            if !c.is_black() && !c.is_white() {
                return c;
            }
        }
    }

    #[inline]
    pub fn is_black(&self) -> bool {
        *self == Color::BLACK
    }

    #[inline]
    pub fn is_white(&self) -> bool {
        *self == Color::WHITE
    }

    /// Channels as an array, in the layout a vertex color buffer expects.
    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

#[inline]
fn channel<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    if rng.random_bool(0.5) {
        1.0
    } else {
        0.0
    }
}
