pub mod clients;
pub mod tools;
mod toolkit;

pub use toolkit::Toolkit;
