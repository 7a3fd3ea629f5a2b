pub mod patterns;
pub mod resolver;
pub mod rule;

pub use patterns::PatternList;
pub use resolver::{ConfigResolver, ResolvedMatch};
pub use rule::WatchRule;
