pub mod bridge;
pub mod context;
pub mod settings_vm;
