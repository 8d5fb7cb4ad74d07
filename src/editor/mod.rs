//! Draft editing: the live draft, its debounced persistence, typing velocity
//! and the fade that empties an untouched draft over a day.

mod autosave;
mod fade;
mod session;
mod velocity;

pub use autosave::{Autosave, PendingWrite};
pub use fade::{FadeClock, FadePhase};
pub use session::DraftSession;
pub use velocity::VelocityTracker;
