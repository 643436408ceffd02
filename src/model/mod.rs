pub mod observable;
pub mod performance;
pub mod settings;
pub mod term;
