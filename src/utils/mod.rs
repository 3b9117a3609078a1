pub mod cancel;
pub mod clock;
pub mod validation;
