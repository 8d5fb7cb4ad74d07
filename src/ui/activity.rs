use rand::{rngs::StdRng, Rng, SeedableRng};

const CAPACITY: usize = 100;
const SPAWN_PER_STEP: f32 = 5.0;

/// One mote on the activity strip. `x` is normalized to the strip width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mote {
    pub x: f32,
    pub vx: f32,
    pub life: f32,
    pub decay: f32,
    pub warm: bool,
}

/// Ambient particles that thicken while the writer types quickly.
pub struct ActivityStrip {
    motes: Vec<Mote>,
    rng: StdRng,
}

impl ActivityStrip {
    pub fn new(rng: StdRng) -> Self {
        Self {
            motes: Vec::with_capacity(CAPACITY),
            rng,
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn motes(&self) -> &[Mote] {
        &self.motes
    }

    /// Spawns `floor(velocity * 5)` motes near the middle, then ages the rest.
    pub fn step(&mut self, velocity: f32) {
        let spawn = (velocity.clamp(0.0, 1.0) * SPAWN_PER_STEP).floor() as usize;
        for _ in 0..spawn {
            if self.motes.len() >= CAPACITY {
                break;
            }
            let mote = Mote {
                x: 0.5 + self.rng.gen_range(-0.1..0.1),
                vx: self.rng.gen_range(-0.012..0.012),
                life: 1.0,
                decay: 1.0 / self.rng.gen_range(60.0..120.0),
                warm: self.rng.r#gen::<bool>(),
            };
            self.motes.push(mote);
        }

        for mote in &mut self.motes {
            mote.vx += self.rng.gen_range(-0.001..0.001);
            mote.x += mote.vx;
            mote.life -= mote.decay;
        }
        self.motes
            .retain(|m| m.life > 0.0 && (0.0..=1.0).contains(&m.x));
    }

    /// Glyph and warmth per column; `None` where the strip is empty.
    pub fn cells(&self, width: usize) -> Vec<Option<(char, bool)>> {
        let mut cells = vec![None; width];
        if width == 0 {
            return cells;
        }
        let mut strength = vec![0.0_f32; width];
        for mote in &self.motes {
            let col = ((mote.x * width as f32) as usize).min(width - 1);
            if mote.life > strength[col] {
                strength[col] = mote.life;
                cells[col] = Some((glyph(mote.life), mote.warm));
            }
        }
        cells
    }
}

fn glyph(life: f32) -> char {
    if life > 0.66 {
        '•'
    } else if life > 0.33 {
        '∙'
    } else {
        '·'
    }
}
