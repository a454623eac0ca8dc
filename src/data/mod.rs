mod parse;
mod provider;
mod records;

pub use provider::{DataProvider, JsonFileProvider, StaticProvider, fetch_all};
pub use records::{
    DataSet, Profile, RelationshipRecord, RepositoryRecord, UserRecord, user_key,
};
