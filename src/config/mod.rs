pub mod env;
pub mod inputs;
pub mod resolver;
pub mod settings;

pub use env::{Env, MapEnv, OsEnv};
pub use inputs::Inputs;
pub use resolver::{resolve, resolve_region, Resolved};
