pub mod defaults;
mod resolver;

pub use resolver::GuidanceResolver;
