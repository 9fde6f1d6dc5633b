mod as_value;
mod column;
mod compiler;
mod config;
mod driver;
mod error;
mod exec_value;
mod executor;
mod expression;
mod model;
mod preload;
mod query;
mod registry;
mod report;
mod session;
mod sql_writer;
mod template;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use column::*;
pub use compiler::*;
pub use config::*;
pub use driver::*;
pub use error::*;
pub use exec_value::*;
pub use executor::*;
pub use expression::*;
pub use model::*;
pub use preload::*;
pub use query::*;
pub use registry::*;
pub use report::*;
pub use session::*;
pub use sql_writer::*;
pub use template::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
