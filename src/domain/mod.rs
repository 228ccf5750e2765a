pub mod entry;
pub mod feed;
pub mod route;
pub mod row;
pub mod view;

pub use entry::{Entry, EntryCursor, EntrySettings};
pub use feed::{Feed, FeedUpdate};
pub use route::{FeedSelector, ListContext};
pub use row::ListRow;
pub use view::{ViewDescriptor, ViewType};
