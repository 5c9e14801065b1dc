mod snapshot;
mod store;

pub use snapshot::ProfileSnapshot;
pub use store::FileProfileStore;
