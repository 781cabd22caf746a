pub mod accessor;
pub mod command;
pub mod decode;
pub mod fetch;
pub mod http;
pub mod registry;
pub mod resolver;
pub mod spec;
pub mod synthetic;

pub use accessor::{Accessor, ConnectionProvider};
pub use fetch::fetch_all;
pub use registry::{IssueListFn, ToolRegistry};
pub use resolver::{ConnectionResolver, Resolution};
pub use spec::{BuildContext, SourceSpec};
pub use synthetic::{SyntheticAccessor, SyntheticProvider};
