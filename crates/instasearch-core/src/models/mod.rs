pub mod error;
pub mod query;
pub mod request;
pub mod response;

pub use error::{SearchError, SearchErrorKind};
pub use query::{Post, QueryContext};
pub use request::SearchRequest;
pub use response::{RoundTrip, SearchResponse};
