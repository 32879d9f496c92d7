pub mod transition_guard;

pub use transition_guard::TransitionGuard;
